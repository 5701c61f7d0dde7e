//! Race session
//!
//! Owns one race from the starting line to Complete or Crashed and advances
//! it one host frame at a time.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::autopilot;
use super::bounds::Aabb;
use super::collectibles::CollectibleSpawner;
use super::difficulty::{DifficultyCurve, DifficultyParams, DifficultyState};
use super::lanes::{LaneCenters, Viewport, lane_centers};
use super::spawn::{SpawnContext, SpawnRequest};
use super::state::{
    Collectible, LaneChange, LaneDwellTable, Obstacle, PlayerVehicle, RaceEvent, RaceState,
};
use super::traffic::TrafficSpawner;
use crate::consts::MAX_TICK_DT;
use crate::error::ConfigError;
use crate::stage::StageConfig;
use crate::tuning::Tuning;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Discrete lane-change request
    pub lane_change: LaneChange,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode: the autopilot drives and `lane_change` is ignored
    pub autopilot: bool,
}

/// Snapshot handed back to the host after every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    pub state: RaceState,
    /// Game meters covered so far
    pub distance: f32,
    pub collected_count: u32,
    pub player_lane: usize,
    pub player: Aabb,
    pub scroll_speed: f32,
    pub paused: bool,
    pub obstacles: Vec<Obstacle>,
    pub collectibles: Vec<Collectible>,
    /// Everything that happened during this tick
    pub events: Vec<RaceEvent>,
}

/// Entities on the road plus the events raised while placing and removing them
#[derive(Debug, Clone, Default)]
struct Track {
    obstacles: Vec<Obstacle>,
    collectibles: Vec<Collectible>,
    next_id: u32,
    events: Vec<RaceEvent>,
}

impl Track {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn add_obstacle(
        &mut self,
        req: SpawnRequest,
        lanes: &LaneCenters,
        size: Vec2,
        speed: f32,
    ) -> u32 {
        let id = self.next_id();
        self.obstacles.push(Obstacle {
            id,
            lane: req.lane,
            bounds: Aabb::centered_at(lanes.x(req.lane), req.y, size),
            speed,
        });
        self.events.push(if req.forced {
            RaceEvent::StickSpawned { id, lane: req.lane }
        } else {
            RaceEvent::ObstacleSpawned { id, lane: req.lane }
        });
        id
    }

    fn add_collectible(&mut self, req: SpawnRequest, lanes: &LaneCenters, size: Vec2) -> u32 {
        let id = self.next_id();
        self.collectibles.push(Collectible {
            id,
            lane: req.lane,
            bounds: Aabb::centered_at(lanes.x(req.lane), req.y, size),
            collected: false,
        });
        self.events.push(RaceEvent::CollectibleSpawned { id, lane: req.lane });
        id
    }

    /// Scroll everything toward the player and drop what left the screen
    fn advance(&mut self, dt: f32, scroll_speed: f32) {
        for o in &mut self.obstacles {
            o.advance(dt, scroll_speed);
        }
        for c in &mut self.collectibles {
            c.advance(dt, scroll_speed);
        }
        self.obstacles.retain(|o| o.bounds.top() >= 0.0);
        self.collectibles.retain(|c| !c.collected && c.bounds.top() >= 0.0);
    }

    fn realign(&mut self, lanes: &LaneCenters) {
        for o in &mut self.obstacles {
            o.bounds.set_center_x(lanes.x(o.lane));
        }
        for c in &mut self.collectibles {
            c.bounds.set_center_x(lanes.x(c.lane));
        }
    }

    fn clear(&mut self) {
        self.obstacles.clear();
        self.collectibles.clear();
    }
}

/// Rival speed for a new obstacle, never below the configured floor
fn obstacle_speed(
    curve: &DifficultyCurve,
    rng: &mut Pcg32,
    scroll_speed: f32,
    floor: f32,
) -> f32 {
    (scroll_speed * curve.rival_speed_factor(rng)).max(floor)
}

/// One race on one stage
#[derive(Debug, Clone)]
pub struct RaceSession {
    config: StageConfig,
    tuning: Tuning,
    curve: DifficultyCurve,
    viewport: Viewport,
    lanes: LaneCenters,
    clock: DifficultyState,
    params: DifficultyParams,
    player: PlayerVehicle,
    dwell: LaneDwellTable,
    track: Track,
    traffic: TrafficSpawner,
    coins: CollectibleSpawner,
    rng: Pcg32,
    seed: u64,
    state: RaceState,
    paused: bool,
    distance: f32,
    collected: u32,
    time_ticks: u64,
}

impl RaceSession {
    /// Start a race with the default tuning
    pub fn start(config: StageConfig, viewport: Viewport, seed: u64) -> Result<Self, ConfigError> {
        Self::start_with_tuning(config, Tuning::default(), viewport, seed)
    }

    pub fn start_with_tuning(
        config: StageConfig,
        tuning: Tuning,
        viewport: Viewport,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        tuning.validate()?;
        config.validate(&tuning)?;
        let viewport = Viewport::new(viewport.width, viewport.height)?;

        let profile = tuning.stage(config.stage_index)?.clone();
        let curve = DifficultyCurve::new(profile, &config, &tuning);
        let clock = DifficultyState::default();
        let params = curve.sample(clock.elapsed_seconds);
        let lanes = lane_centers(viewport.width, config.lane_count, config.inset_fraction);
        let player = PlayerVehicle::new(&lanes, &tuning);
        let dwell = LaneDwellTable::new(config.lane_count, tuning.dwell_cap, tuning.dwell_decay);

        log::info!(
            "race start: stage {} with {} lanes, goal {}m, seed {}",
            config.stage_index,
            config.lane_count,
            config.goal_distance_m,
            seed
        );

        Ok(Self {
            config,
            tuning,
            curve,
            viewport,
            lanes,
            clock,
            params,
            player,
            dwell,
            track: Track::default(),
            traffic: TrafficSpawner::new(),
            coins: CollectibleSpawner::new(),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            state: RaceState::Racing,
            paused: false,
            distance: 0.0,
            collected: 0,
            time_ticks: 0,
        })
    }

    /// Advance one frame with just a lane-change request
    pub fn tick(&mut self, dt: f32, lane_change: LaneChange) -> TickResult {
        self.tick_input(
            dt,
            &TickInput {
                lane_change,
                ..Default::default()
            },
        )
    }

    /// Advance one frame.
    ///
    /// `dt` is clamped to `[0, MAX_TICK_DT]`. A zero delta still applies the
    /// lane request but moves nothing else.
    pub fn tick_input(&mut self, dt: f32, input: &TickInput) -> TickResult {
        self.track.events.clear();
        if self.state.is_terminal() {
            return self.snapshot();
        }

        if input.pause {
            self.paused = !self.paused;
            self.track.events.push(if self.paused {
                RaceEvent::Paused
            } else {
                RaceEvent::Resumed
            });
            log::debug!("paused: {}", self.paused);
        }
        if self.paused {
            return self.snapshot();
        }

        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_TICK_DT)
        } else {
            0.0
        };

        if self.state == RaceState::Racing {
            let change = if input.autopilot {
                autopilot::steer(
                    &self.player,
                    &self.lanes,
                    &self.track.obstacles,
                    &self.track.collectibles,
                    self.params.scroll_speed,
                    &self.tuning,
                )
            } else {
                input.lane_change
            };
            if self.player.request(change, &self.lanes) {
                self.track.events.push(RaceEvent::LaneChanged {
                    lane: self.player.lane,
                });
            }
        }

        if dt <= 0.0 {
            return self.snapshot();
        }

        self.time_ticks += 1;
        self.clock.advance(dt);
        self.params = self.curve.sample(self.clock.elapsed_seconds);
        self.refresh_lanes();

        match self.state {
            RaceState::Racing => self.step_racing(dt),
            RaceState::Finishing { timer } => self.step_finishing(dt, timer),
            RaceState::Complete { .. } | RaceState::Crashed { .. } => {}
        }

        self.snapshot()
    }

    fn step_racing(&mut self, dt: f32) {
        let params = self.params;
        self.player.update(dt, params.scroll_speed, self.tuning.lateral_speed);
        self.dwell.update(self.player.lane, dt);
        self.traffic.observe_player(self.player.lane, dt);

        self.spawn(dt);
        self.track.advance(dt, params.scroll_speed);
        self.collect();

        if self
            .track
            .obstacles
            .iter()
            .any(|o| o.bounds.overlaps(&self.player.bounds))
        {
            self.state = RaceState::Crashed {
                final_distance: self.distance,
            };
            self.track.events.push(RaceEvent::Crashed {
                distance: self.distance,
            });
            log::info!("crashed at {:.1}m", self.distance);
            return;
        }

        self.distance += params.scroll_speed * dt * self.tuning.distance_scale;
        if self.distance >= self.config.goal_distance_m {
            self.state = RaceState::Finishing { timer: 0.0 };
            self.track.events.push(RaceEvent::Finishing {
                distance: self.distance,
            });
            log::info!("goal reached at {:.1}m", self.distance);
        }
    }

    fn step_finishing(&mut self, dt: f32, timer: f32) {
        let params = self.params;
        self.player.update(dt, params.scroll_speed, self.tuning.lateral_speed);
        self.player.bounds.translate_y(self.tuning.finish_glide_speed * dt);
        self.track.advance(dt, params.scroll_speed);
        self.distance += params.scroll_speed * dt * self.tuning.distance_scale;

        let timer = timer + dt;
        if timer >= self.tuning.finish_duration {
            self.state = RaceState::Complete {
                final_distance: self.distance,
                collected: self.collected,
            };
            self.track.clear();
            self.track.events.push(RaceEvent::Complete {
                distance: self.distance,
                collected: self.collected,
            });
            log::info!(
                "stage {} complete: {:.1}m, {} collected",
                self.config.stage_index,
                self.distance,
                self.collected
            );
        } else {
            self.state = RaceState::Finishing { timer };
        }
    }

    /// Run the obstacle waves, the stuck-lane breaker and the token spawner
    fn spawn(&mut self, dt: f32) {
        let params = self.params;
        let ctx = SpawnContext {
            tuning: &self.tuning,
            dwell: &self.dwell,
            params,
            lane_count: self.lanes.len(),
            stage_index: self.config.stage_index,
            two_lane_opener: self.config.is_two_lane_opener(),
            spawn_y: self.viewport.height + self.tuning.spawn_margin,
            player_lane: self.player.lane,
            player_bounds: self.player.bounds,
        };

        let wave = self.traffic.advance(dt, &ctx, &self.track.obstacles, &mut self.rng);
        for req in wave {
            let speed = obstacle_speed(
                &self.curve,
                &mut self.rng,
                params.scroll_speed,
                self.tuning.min_obstacle_speed,
            );
            self.track.add_obstacle(req, &self.lanes, self.tuning.obstacle_size, speed);
        }

        if let Some(req) = self.traffic.try_force_stick_spawn(&ctx, &self.track.obstacles) {
            let speed = obstacle_speed(
                &self.curve,
                &mut self.rng,
                params.scroll_speed,
                self.tuning.min_obstacle_speed,
            );
            self.track.add_obstacle(req, &self.lanes, self.tuning.obstacle_size, speed);
        }

        if let Some(req) = self.coins.advance(dt, &ctx, &self.track.obstacles, &mut self.rng) {
            self.track.add_collectible(req, &self.lanes, self.tuning.coin_size);
        }
    }

    fn collect(&mut self) {
        let player = self.player.bounds;
        for c in &mut self.track.collectibles {
            if !c.collected && c.bounds.overlaps(&player) {
                c.collected = true;
                self.collected += 1;
                self.track.events.push(RaceEvent::Collected {
                    id: c.id,
                    total: self.collected,
                });
            }
        }
        self.track.collectibles.retain(|c| !c.collected);
    }

    /// Recompute lane centers and move everything onto the new centers if they shifted
    fn refresh_lanes(&mut self) {
        let lanes = lane_centers(
            self.viewport.width,
            self.config.lane_count,
            self.config.inset_fraction,
        );
        if lanes == self.lanes {
            return;
        }
        let shift = lanes.x(self.player.lane) - self.lanes.x(self.player.lane);
        self.player.bounds.pos.x += shift;
        self.player.retarget(&lanes);
        self.track.realign(&lanes);
        self.lanes = lanes;
    }

    /// Replace the viewport; lanes follow on the next tick
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), ConfigError> {
        self.viewport = Viewport::new(width, height)?;
        self.refresh_lanes();
        Ok(())
    }

    /// Put an obstacle at `(lane, y)` directly. Returns `None` for an unknown lane.
    pub fn place_obstacle(&mut self, lane: usize, y: f32) -> Option<u32> {
        if lane >= self.lanes.len() {
            return None;
        }
        let speed = obstacle_speed(
            &self.curve,
            &mut self.rng,
            self.params.scroll_speed,
            self.tuning.min_obstacle_speed,
        );
        Some(self.track.add_obstacle(
            SpawnRequest::at(lane, y),
            &self.lanes,
            self.tuning.obstacle_size,
            speed,
        ))
    }

    /// Put a token at `(lane, y)` directly. Returns `None` for an unknown lane.
    pub fn place_collectible(&mut self, lane: usize, y: f32) -> Option<u32> {
        if lane >= self.lanes.len() {
            return None;
        }
        Some(self.track.add_collectible(
            SpawnRequest::at(lane, y),
            &self.lanes,
            self.tuning.coin_size,
        ))
    }

    pub fn snapshot(&self) -> TickResult {
        TickResult {
            state: self.state,
            distance: self.distance,
            collected_count: self.collected,
            player_lane: self.player.lane,
            player: self.player.bounds,
            scroll_speed: self.params.scroll_speed,
            paused: self.paused,
            obstacles: self.track.obstacles.clone(),
            collectibles: self.track.collectibles.clone(),
            events: self.track.events.clone(),
        }
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn player(&self) -> &PlayerVehicle {
        &self.player
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.track.obstacles
    }

    pub fn collectibles(&self) -> &[Collectible] {
        &self.track.collectibles
    }

    /// Events raised by the most recent tick
    pub fn events(&self) -> &[RaceEvent] {
        &self.track.events
    }

    pub fn traffic(&self) -> &TrafficSpawner {
        &self.traffic
    }

    pub fn dwell(&self) -> &LaneDwellTable {
        &self.dwell
    }

    pub fn params(&self) -> DifficultyParams {
        self.params
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.clock.elapsed_seconds
    }

    pub fn lanes(&self) -> &LaneCenters {
        &self.lanes
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }
}
