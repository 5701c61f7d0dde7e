//! Race entities and state
//!
//! Everything the session mutates during a tick lives here.

use serde::{Deserialize, Serialize};

use super::bounds::Aabb;
use super::lanes::LaneCenters;
use crate::lerp;
use crate::tuning::Tuning;

/// Race progression. Racing -> Finishing -> Complete, or Racing -> Crashed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RaceState {
    /// Active gameplay
    Racing,
    /// Goal reached; traffic drains while the player glides off
    Finishing { timer: f32 },
    /// Stage cleared
    Complete { final_distance: f32, collected: u32 },
    /// Hit an obstacle
    Crashed { final_distance: f32 },
}

impl RaceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RaceState::Complete { .. } | RaceState::Crashed { .. })
    }
}

/// Discrete, edge-triggered lane-change request for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneChange {
    #[default]
    None,
    Left,
    Right,
}

/// Notifications produced by a tick, for the host's audio and UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RaceEvent {
    LaneChanged { lane: usize },
    ObstacleSpawned { id: u32, lane: usize },
    /// Obstacle placed to break up a player camping in one lane
    StickSpawned { id: u32, lane: usize },
    CollectibleSpawned { id: u32, lane: usize },
    Collected { id: u32, total: u32 },
    Paused,
    Resumed,
    Finishing { distance: f32 },
    Complete { distance: f32, collected: u32 },
    Crashed { distance: f32 },
}

/// An obstacle vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub lane: usize,
    pub bounds: Aabb,
    /// Own downward speed on top of the scroll speed (px/s)
    pub speed: f32,
}

impl Obstacle {
    pub fn advance(&mut self, dt: f32, scroll_speed: f32) {
        self.bounds.translate_y(-(scroll_speed + self.speed) * dt);
    }
}

/// A collectible token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u32,
    pub lane: usize,
    pub bounds: Aabb,
    pub collected: bool,
}

impl Collectible {
    /// Tokens have no speed of their own
    pub fn advance(&mut self, dt: f32, scroll_speed: f32) {
        self.bounds.translate_y(-scroll_speed * dt);
    }
}

/// The player-controlled vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerVehicle {
    pub lane: usize,
    pub bounds: Aabb,
    /// Left edge the lateral animation is heading for
    pub target_x: f32,
    /// Simulated rider effort, as a multiplier of the scroll speed
    pub effort_factor: f32,
    /// Forward speed reported to the HUD (px/s)
    pub speed: f32,
    effort_phase: f32,
}

impl PlayerVehicle {
    /// Start in the middle lane (right of center for an even lane count)
    pub fn new(lanes: &LaneCenters, tuning: &Tuning) -> Self {
        let lane = lanes.len() / 2;
        let bounds = Aabb::centered_at(lanes.x(lane), tuning.player_y, tuning.player_size);
        Self {
            lane,
            target_x: bounds.pos.x,
            bounds,
            effort_factor: 1.0,
            speed: 0.0,
            effort_phase: 0.0,
        }
    }

    /// Apply a lane-change request. Returns true if the lane changed.
    ///
    /// Requests retarget the running animation; they never queue.
    pub fn request(&mut self, change: LaneChange, lanes: &LaneCenters) -> bool {
        let next = match change {
            LaneChange::Left if self.lane > 0 => self.lane - 1,
            LaneChange::Right if self.lane + 1 < lanes.len() => self.lane + 1,
            _ => return false,
        };
        self.lane = next;
        self.retarget(lanes);
        true
    }

    /// Point the animation at the current lane's center
    pub fn retarget(&mut self, lanes: &LaneCenters) {
        self.target_x = lanes.x(self.lane) - self.bounds.size.x / 2.0;
    }

    /// Slide toward the target lane and update the effort model
    pub fn update(&mut self, dt: f32, scroll_speed: f32, lateral_speed: f32) {
        let alpha = (dt * lateral_speed).min(1.0);
        self.bounds.pos.x = lerp(self.bounds.pos.x, self.target_x, alpha);

        self.effort_phase += 0.1;
        let effort = 50.0 + self.effort_phase.sin() * 20.0;
        self.effort_factor = 0.95 + (effort / 400.0).min(0.15);
        self.speed = scroll_speed * self.effort_factor;
    }

    pub fn is_settled(&self) -> bool {
        (self.bounds.pos.x - self.target_x).abs() < 0.5
    }
}

/// Per-lane seconds the player has spent in each lane, capped and decaying
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneDwellTable {
    dwell: Vec<f32>,
    cap: f32,
    decay: f32,
}

impl LaneDwellTable {
    pub fn new(lane_count: usize, cap: f32, decay: f32) -> Self {
        Self {
            dwell: vec![0.0; lane_count],
            cap,
            decay,
        }
    }

    /// Grow the current lane, decay the others
    pub fn update(&mut self, current_lane: usize, dt: f32) {
        for (lane, value) in self.dwell.iter_mut().enumerate() {
            if lane == current_lane {
                *value = (*value + dt).min(self.cap);
            } else {
                *value = (*value - dt * self.decay).max(0.0);
            }
        }
    }

    pub fn get(&self, lane: usize) -> f32 {
        self.dwell.get(lane).copied().unwrap_or(0.0)
    }

    /// Dwell scaled to [0, 1]
    pub fn normalized(&self, lane: usize) -> f32 {
        if self.cap <= 0.0 {
            0.0
        } else {
            (self.get(lane) / self.cap).min(1.0)
        }
    }

    pub fn cap(&self) -> f32 {
        self.cap
    }

    pub fn values(&self) -> &[f32] {
        &self.dwell
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, lane: usize, value: f32) {
        self.dwell[lane] = value.clamp(0.0, self.cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::lanes::lane_centers;

    #[test]
    fn test_dwell_grows_caps_and_decays() {
        let mut table = LaneDwellTable::new(3, 2.0, 0.5);
        for _ in 0..300 {
            table.update(1, 1.0 / 60.0);
        }
        assert!((table.get(1) - 2.0).abs() < 1e-5);
        assert_eq!(table.get(0), 0.0);
        assert!((table.normalized(1) - 1.0).abs() < 1e-5);

        table.update(0, 1.0);
        assert!((table.get(1) - 1.5).abs() < 1e-5);
        assert!((table.get(0) - 1.0).abs() < 1e-5);
        for _ in 0..10 {
            table.update(0, 1.0);
        }
        assert_eq!(table.get(1), 0.0);
        assert!(table.values().iter().all(|v| (0.0..=2.0).contains(v)));
    }

    #[test]
    fn test_player_lane_requests_clamp() {
        let tuning = Tuning::default();
        let lanes = lane_centers(800.0, 3, 0.22);
        let mut player = PlayerVehicle::new(&lanes, &tuning);
        assert_eq!(player.lane, 1);

        assert!(player.request(LaneChange::Left, &lanes));
        assert_eq!(player.lane, 0);
        assert!(!player.request(LaneChange::Left, &lanes));
        assert_eq!(player.lane, 0);

        assert!(player.request(LaneChange::Right, &lanes));
        assert!(player.request(LaneChange::Right, &lanes));
        assert!(!player.request(LaneChange::Right, &lanes));
        assert_eq!(player.lane, 2);
        assert!(!player.request(LaneChange::None, &lanes));
    }

    #[test]
    fn test_player_slides_to_target() {
        let tuning = Tuning::default();
        let lanes = lane_centers(800.0, 2, 0.15);
        let mut player = PlayerVehicle::new(&lanes, &tuning);
        let start_x = player.bounds.pos.x;

        player.request(LaneChange::Left, &lanes);
        player.update(1.0 / 60.0, 200.0, tuning.lateral_speed);
        // Interpolated, not instantaneous
        assert!(player.bounds.pos.x < start_x);
        assert!(player.bounds.pos.x > player.target_x);

        for _ in 0..120 {
            player.update(1.0 / 60.0, 200.0, tuning.lateral_speed);
        }
        assert!(player.is_settled());
        assert!((player.bounds.center().x - lanes.x(0)).abs() < 0.5);
    }

    #[test]
    fn test_effort_factor_range() {
        let tuning = Tuning::default();
        let lanes = lane_centers(800.0, 2, 0.15);
        let mut player = PlayerVehicle::new(&lanes, &tuning);
        for _ in 0..200 {
            player.update(1.0 / 60.0, 300.0, tuning.lateral_speed);
            assert!(player.effort_factor >= 0.95 && player.effort_factor <= 1.1);
            assert!((player.speed - 300.0 * player.effort_factor).abs() < 1e-3);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!RaceState::Racing.is_terminal());
        assert!(!RaceState::Finishing { timer: 0.0 }.is_terminal());
        assert!(RaceState::Crashed { final_distance: 1.0 }.is_terminal());
        assert!(
            RaceState::Complete {
                final_distance: 1.0,
                collected: 0
            }
            .is_terminal()
        );
    }
}
