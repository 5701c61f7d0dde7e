//! Obstacle traffic spawner
//!
//! Decides once per wave which lanes receive a new obstacle. The goal is
//! traffic that stays winnable (there is always an escape lane) while
//! still pressuring the player: lanes the player camps in attract more
//! traffic, and long runs of "harmless" spawns far from the player are cut
//! short.

use rand::Rng;

use super::spawn::{SpawnContext, SpawnRequest, has_clearance, top_y_by_lane};
use super::state::{LaneDwellTable, Obstacle};
use crate::tuning::Tuning;

/// Weight of one candidate lane in the biased draw
pub fn lane_weight(
    lane: usize,
    player_lane: usize,
    dwell: &LaneDwellTable,
    tuning: &Tuning,
) -> f32 {
    let falloff = match lane.abs_diff(player_lane) {
        0 => tuning.falloff_same_lane,
        1 => tuning.falloff_adjacent,
        _ => tuning.falloff_far,
    };
    1.0 + tuning.bias_strength * dwell.normalized(lane) * falloff
}

/// Draw a lane with probability proportional to [`lane_weight`].
///
/// Returns `None` only for an empty candidate list.
pub fn pick_lane_weighted<R: Rng + ?Sized>(
    candidates: &[usize],
    player_lane: usize,
    dwell: &LaneDwellTable,
    tuning: &Tuning,
    rng: &mut R,
) -> Option<usize> {
    match candidates {
        [] => return None,
        [only] => return Some(*only),
        _ => {}
    }

    let weights: Vec<f32> = candidates
        .iter()
        .map(|&lane| lane_weight(lane, player_lane, dwell, tuning))
        .collect();
    let total: f32 = weights.iter().sum();

    let r = rng.random::<f32>() * total;
    let mut acc = 0.0;
    for (lane, w) in candidates.iter().zip(&weights) {
        acc += w;
        if acc >= r {
            return Some(*lane);
        }
    }
    candidates.last().copied()
}

fn pick_uniform<R: Rng + ?Sized>(candidates: &[usize], rng: &mut R) -> usize {
    candidates[rng.random_range(0..candidates.len())]
}

/// Spawn timers and anti-repetition counters
#[derive(Debug, Clone, Default)]
pub struct TrafficSpawner {
    spawn_timer: f32,
    /// Two lanes: consecutive waves aimed at the lane the player is not in
    opposite_streak: u32,
    /// Three or four lanes: consecutive waves two or more lanes from the player
    far_streak: u32,
    same_lane_time: f32,
    last_lane: Option<usize>,
    stick_cooldown: f32,
}

impl TrafficSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_timer(&self) -> f32 {
        self.spawn_timer
    }

    pub fn opposite_streak(&self) -> u32 {
        self.opposite_streak
    }

    pub fn far_streak(&self) -> u32 {
        self.far_streak
    }

    /// Seconds the player has continuously held the current lane
    pub fn same_lane_time(&self) -> f32 {
        self.same_lane_time
    }

    pub fn stick_cooldown(&self) -> f32 {
        self.stick_cooldown
    }

    /// Track how long the player has held one lane; ticks the stick cooldown
    pub fn observe_player(&mut self, lane: usize, dt: f32) {
        if self.last_lane == Some(lane) {
            self.same_lane_time += dt;
        } else {
            self.same_lane_time = 0.0;
            self.last_lane = Some(lane);
        }
        if self.stick_cooldown > 0.0 {
            self.stick_cooldown -= dt;
        }
    }

    /// Advance the wave timer and run a wave when it elapses.
    ///
    /// A wave that places nothing leaves the timer elapsed, so the next tick
    /// tries again.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &SpawnContext<'_>,
        obstacles: &[Obstacle],
        rng: &mut R,
    ) -> Vec<SpawnRequest> {
        self.spawn_timer += dt;
        if self.spawn_timer < ctx.params.spawn_interval {
            return Vec::new();
        }

        let wave = self.spawn_wave(ctx, obstacles, rng);
        if !wave.is_empty() {
            self.spawn_timer = if ctx.two_lane_opener {
                -ctx.tuning.two_lane_wave_delay
            } else {
                0.0
            };
        }
        wave
    }

    /// Choose the lanes for one wave: a primary obstacle and maybe a second
    pub fn spawn_wave<R: Rng + ?Sized>(
        &mut self,
        ctx: &SpawnContext<'_>,
        obstacles: &[Obstacle],
        rng: &mut R,
    ) -> Vec<SpawnRequest> {
        let lane_count = ctx.lane_count;
        let mut blocked = ctx.blocked_lanes(obstacles);
        let blocked_count = blocked.iter().filter(|b| **b).count();
        if blocked_count >= lane_count {
            log::trace!("wave skipped: every lane blocked ahead of the player");
            return Vec::new();
        }

        let top = top_y_by_lane(obstacles, lane_count);
        let gap = ctx.params.lane_gap_min;
        let mut candidates: Vec<usize> = (0..lane_count)
            .filter(|&lane| has_clearance(ctx.spawn_y, top[lane], gap))
            .collect();

        // One lane left open: only stack onto lanes that are already closed.
        let mut allow_double = true;
        if blocked_count + 1 >= lane_count {
            candidates.retain(|&lane| blocked[lane]);
            allow_double = false;
        }
        if candidates.is_empty() {
            log::trace!("wave skipped: no lane with clearance");
            return Vec::new();
        }

        let primary = if lane_count == 2 {
            self.pick_two_lane(ctx, &candidates, rng)
        } else {
            self.pick_multi_lane(ctx, &candidates, rng)
        };
        let mut wave = vec![SpawnRequest::at(primary, ctx.spawn_y)];
        candidates.retain(|&lane| lane != primary);

        // The primary may have closed a lane; the second car must not close the last one.
        blocked[primary] = true;
        if blocked.iter().filter(|b| **b).count() + 1 >= lane_count {
            candidates.retain(|&lane| blocked[lane]);
        }

        if allow_double
            && !candidates.is_empty()
            && rng.random::<f32>() < ctx.params.double_spawn_prob
        {
            let secondary = if ctx.stage_index >= 2 {
                pick_lane_weighted(&candidates, ctx.player_lane, ctx.dwell, ctx.tuning, rng)
                    .unwrap_or(candidates[0])
            } else {
                pick_uniform(&candidates, rng)
            };

            let t = ctx.tuning;
            let jitter = t.double_jitter_min + rng.random::<f32>() * t.double_jitter_range;
            let mut y = ctx.spawn_y + jitter.max(t.double_min_delta);
            if secondary == ctx.player_lane {
                y = y.max(ctx.player_bounds.top() + t.stick_safe_front);
            }
            wave.push(SpawnRequest::at(secondary, y));
        }

        log::debug!(
            "wave: lanes {:?} (player lane {}, blocked {})",
            wave.iter().map(|s| s.lane).collect::<Vec<_>>(),
            ctx.player_lane,
            blocked_count
        );
        wave
    }

    fn pick_two_lane<R: Rng + ?Sized>(
        &mut self,
        ctx: &SpawnContext<'_>,
        candidates: &[usize],
        rng: &mut R,
    ) -> usize {
        let t = ctx.tuning;
        let player = ctx.player_lane;
        let opposite = 1 - player.min(1);
        let player_free = candidates.contains(&player);
        let dwell_high = ctx.dwell.get(player) >= t.two_lane_dwell_bias_secs;
        let streak_capped = self.opposite_streak >= t.two_lane_streak_cap;

        let lane = if player_free && (dwell_high || streak_capped) {
            player
        } else if player_free && rng.random::<f32>() < t.two_lane_player_lane_chance {
            player
        } else {
            pick_uniform(candidates, rng)
        };

        if lane == opposite {
            self.opposite_streak += 1;
        } else {
            self.opposite_streak = 0;
        }
        lane
    }

    fn pick_multi_lane<R: Rng + ?Sized>(
        &mut self,
        ctx: &SpawnContext<'_>,
        candidates: &[usize],
        rng: &mut R,
    ) -> usize {
        let player = ctx.player_lane;
        let mut lane = pick_lane_weighted(candidates, player, ctx.dwell, ctx.tuning, rng)
            .unwrap_or(candidates[0]);

        if lane.abs_diff(player) <= 1 {
            self.far_streak = 0;
        } else {
            self.far_streak += 1;
        }

        if self.far_streak >= ctx.tuning.far_streak_cap {
            let near: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|l| l.abs_diff(player) <= 1)
                .collect();
            if !near.is_empty() {
                lane = pick_uniform(&near, rng);
            }
            self.far_streak = 0;
        }
        lane
    }

    /// Put an obstacle in front of a player who has camped in one lane too long.
    ///
    /// Fires at most once per cooldown. Falls back to the nearest lane with
    /// clearance and gives up silently when there is none.
    pub fn try_force_stick_spawn(
        &mut self,
        ctx: &SpawnContext<'_>,
        obstacles: &[Obstacle],
    ) -> Option<SpawnRequest> {
        let t = ctx.tuning;
        if self.same_lane_time < t.stick_threshold || self.stick_cooldown > 0.0 {
            return None;
        }

        let blocked = ctx.blocked_lanes(obstacles);
        let blocked_count = blocked.iter().filter(|b| **b).count();
        if blocked_count >= ctx.lane_count {
            return None;
        }
        let top = top_y_by_lane(obstacles, ctx.lane_count);
        let gap = ctx.params.lane_gap_min;
        // Same escape-lane rule as the waves: never close the last open lane.
        let usable = |lane: usize| {
            (blocked[lane] || blocked_count + 1 < ctx.lane_count)
                && has_clearance(ctx.spawn_y, top[lane], gap)
        };
        let target = ctx.player_lane;
        let lane = if usable(target) {
            target
        } else {
            nearest_lane_where(ctx.lane_count, target, usable)?
        };

        let mut y = ctx.spawn_y.max(ctx.player_bounds.top() + t.stick_safe_front);
        if ctx.two_lane_opener {
            // Keep the two lanes staggered so the forced car never forms a wall.
            let other_top = top[1 - lane.min(1)];
            if other_top > 0.0 && y - other_top < t.two_lane_stagger_min {
                y = other_top + t.two_lane_stagger;
            }
        }

        self.same_lane_time = 0.0;
        self.stick_cooldown = t.stick_cooldown;
        log::debug!("stick spawn in lane {lane} at y={y:.0}");
        Some(SpawnRequest {
            lane,
            y,
            forced: true,
        })
    }
}

/// Search outward from `center`, left before right at each distance
fn nearest_lane_where(
    lane_count: usize,
    center: usize,
    accept: impl Fn(usize) -> bool,
) -> Option<usize> {
    for d in 1..lane_count {
        if let Some(left) = center.checked_sub(d) {
            if accept(left) {
                return Some(left);
            }
        }
        let right = center + d;
        if right < lane_count && accept(right) {
            return Some(right);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bounds::Aabb;
    use crate::sim::difficulty::DifficultyParams;
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    const SPAWN_Y: f32 = 640.0;

    struct Fixture {
        tuning: Tuning,
        dwell: LaneDwellTable,
        params: DifficultyParams,
        lane_count: usize,
        stage_index: u32,
        player_lane: usize,
        spawn_y: f32,
    }

    impl Fixture {
        fn new(lane_count: usize, stage_index: u32, player_lane: usize) -> Self {
            let tuning = Tuning::default();
            let dwell = LaneDwellTable::new(lane_count, tuning.dwell_cap, tuning.dwell_decay);
            Self {
                tuning,
                dwell,
                params: DifficultyParams {
                    scroll_speed: 300.0,
                    spawn_interval: 1.0,
                    double_spawn_prob: 0.0,
                    lane_gap_min: 300.0,
                    coin_interval: 1.0,
                },
                lane_count,
                stage_index,
                player_lane,
                spawn_y: SPAWN_Y,
            }
        }

        fn ctx(&self) -> SpawnContext<'_> {
            SpawnContext {
                tuning: &self.tuning,
                dwell: &self.dwell,
                params: self.params,
                lane_count: self.lane_count,
                stage_index: self.stage_index,
                two_lane_opener: self.stage_index == 1 && self.lane_count == 2,
                spawn_y: self.spawn_y,
                player_lane: self.player_lane,
                // Player box 80..160
                player_bounds: Aabb::new(Vec2::new(0.0, 80.0), Vec2::new(40.0, 80.0)),
            }
        }
    }

    fn obstacle(id: u32, lane: usize, y: f32) -> Obstacle {
        Obstacle {
            id,
            lane,
            bounds: Aabb::new(Vec2::new(0.0, y), Vec2::new(48.0, 96.0)),
            speed: 60.0,
        }
    }

    #[test]
    fn test_all_lanes_blocked_skips_wave() {
        let fx = Fixture::new(3, 2, 1);
        let mut spawner = TrafficSpawner::new();
        let mut rng = Pcg32::seed_from_u64(1);
        // Centers at 250, inside the 160..520 danger zone
        let obstacles: Vec<_> = (0..3).map(|l| obstacle(l as u32, l, 202.0)).collect();
        assert!(spawner.spawn_wave(&fx.ctx(), &obstacles, &mut rng).is_empty());
    }

    #[test]
    fn test_escape_lane_is_never_closed() {
        let mut fx = Fixture::new(3, 2, 1);
        fx.params.double_spawn_prob = 1.0;
        let mut rng = Pcg32::seed_from_u64(2);
        // Lanes 0 and 1 blocked low in the zone (still clear at the spawn line)
        let obstacles = vec![obstacle(1, 0, 170.0), obstacle(2, 1, 180.0)];
        for _ in 0..200 {
            let mut spawner = TrafficSpawner::new();
            let wave = spawner.spawn_wave(&fx.ctx(), &obstacles, &mut rng);
            assert_eq!(wave.len(), 1, "double spawn must be disabled");
            assert_ne!(wave[0].lane, 2, "escape lane must stay open");
        }
    }

    #[test]
    fn test_no_candidate_skips_wave() {
        let fx = Fixture::new(4, 3, 0);
        let mut spawner = TrafficSpawner::new();
        let mut rng = Pcg32::seed_from_u64(3);
        // Every lane has an obstacle just below the spawn line
        let obstacles: Vec<_> = (0..4).map(|l| obstacle(l as u32, l, 600.0)).collect();
        assert!(spawner.spawn_wave(&fx.ctx(), &obstacles, &mut rng).is_empty());
    }

    #[test]
    fn test_two_lane_opposite_streak_is_capped() {
        let fx = Fixture::new(2, 1, 0);
        let mut spawner = TrafficSpawner::new();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut run = 0;
        for _ in 0..500 {
            let wave = spawner.spawn_wave(&fx.ctx(), &[], &mut rng);
            assert_eq!(wave.len(), 1);
            if wave[0].lane == 1 {
                run += 1;
            } else {
                run = 0;
            }
            assert!(run <= fx.tuning.two_lane_streak_cap);
        }
    }

    #[test]
    fn test_two_lane_high_dwell_targets_player() {
        let mut fx = Fixture::new(2, 1, 1);
        fx.dwell.set(1, 3.0);
        let mut spawner = TrafficSpawner::new();
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..50 {
            let wave = spawner.spawn_wave(&fx.ctx(), &[], &mut rng);
            assert_eq!(wave[0].lane, 1);
            assert_eq!(spawner.opposite_streak(), 0);
        }
    }

    #[test]
    fn test_far_streak_forces_near_pick() {
        let fx = Fixture::new(4, 3, 0);
        let mut spawner = TrafficSpawner::new();
        let mut rng = Pcg32::seed_from_u64(6);
        let mut far_run = 0;
        for _ in 0..1000 {
            let wave = spawner.spawn_wave(&fx.ctx(), &[], &mut rng);
            if wave[0].lane >= 2 {
                far_run += 1;
            } else {
                far_run = 0;
            }
            assert!(far_run < fx.tuning.far_streak_cap);
        }
    }

    #[test]
    fn test_secondary_spawn_offsets() {
        let mut fx = Fixture::new(3, 2, 1);
        fx.params.double_spawn_prob = 1.0;
        // Low spawn line so the player-lane clearance rule matters
        fx.spawn_y = 150.0;
        fx.params.lane_gap_min = 50.0;
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen_player_lane = false;
        for _ in 0..300 {
            let mut spawner = TrafficSpawner::new();
            let wave = spawner.spawn_wave(&fx.ctx(), &[], &mut rng);
            assert_eq!(wave.len(), 2);
            let (first, second) = (wave[0], wave[1]);
            assert_ne!(first.lane, second.lane);
            assert!(second.y - first.y >= fx.tuning.double_min_delta - 1e-3);
            if second.lane == fx.player_lane {
                seen_player_lane = true;
                assert!(second.y >= 160.0 + fx.tuning.stick_safe_front);
            }
        }
        assert!(seen_player_lane);
    }

    #[test]
    fn test_advance_waits_for_interval_and_retries() {
        let fx = Fixture::new(3, 2, 1);
        let mut spawner = TrafficSpawner::new();
        let mut rng = Pcg32::seed_from_u64(8);
        assert!(spawner.advance(0.5, &fx.ctx(), &[], &mut rng).is_empty());
        assert_eq!(spawner.advance(0.5, &fx.ctx(), &[], &mut rng).len(), 1);
        assert_eq!(spawner.spawn_timer(), 0.0);

        // Nothing fits: timer stays elapsed and the next tick tries again
        let full: Vec<_> = (0..3).map(|l| obstacle(l as u32, l, 600.0)).collect();
        for _ in 0..2 {
            assert!(spawner.advance(0.5, &fx.ctx(), &full, &mut rng).is_empty());
        }
        assert!(spawner.spawn_timer() >= 1.0);
        assert_eq!(spawner.advance(0.0, &fx.ctx(), &[], &mut rng).len(), 1);
    }

    #[test]
    fn test_opener_adds_wave_delay() {
        let fx = Fixture::new(2, 1, 0);
        let mut spawner = TrafficSpawner::new();
        let mut rng = Pcg32::seed_from_u64(9);
        assert_eq!(spawner.advance(1.0, &fx.ctx(), &[], &mut rng).len(), 1);
        assert_eq!(spawner.spawn_timer(), -fx.tuning.two_lane_wave_delay);
    }

    #[test]
    fn test_stick_spawn_fires_and_resets() {
        let fx = Fixture::new(3, 2, 0);
        let mut spawner = TrafficSpawner::new();
        let dt = 1.0 / 60.0;
        let mut fired = None;
        for _ in 0..120 {
            spawner.observe_player(0, dt);
            if let Some(req) = spawner.try_force_stick_spawn(&fx.ctx(), &[]) {
                fired = Some(req);
                break;
            }
        }
        let req = fired.expect("stick spawn should fire");
        assert!(req.forced);
        assert_eq!(req.lane, 0);
        assert!(req.y >= 160.0 + fx.tuning.stick_safe_front);
        assert_eq!(spawner.same_lane_time(), 0.0);
        assert!(spawner.stick_cooldown() > 0.0);
    }

    #[test]
    fn test_stick_spawn_falls_back_to_neighbour() {
        let fx = Fixture::new(4, 3, 2);
        let mut spawner = TrafficSpawner::new();
        spawner.observe_player(2, 0.0);
        spawner.observe_player(2, 2.0);
        // Player lane and its left neighbour are full at the spawn line
        let obstacles = vec![obstacle(1, 2, 600.0), obstacle(2, 1, 600.0)];
        let req = spawner.try_force_stick_spawn(&fx.ctx(), &obstacles).unwrap();
        assert_eq!(req.lane, 3);

        let mut spawner = TrafficSpawner::new();
        spawner.observe_player(2, 0.0);
        spawner.observe_player(2, 2.0);
        let full: Vec<_> = (0..4).map(|l| obstacle(l as u32, l, 600.0)).collect();
        assert!(spawner.try_force_stick_spawn(&fx.ctx(), &full).is_none());
        // A failed attempt does not consume the timer
        assert!(spawner.same_lane_time() >= fx.tuning.stick_threshold);
    }

    #[test]
    fn test_stick_spawn_staggers_on_opener() {
        // A short danger zone leaves the other lane's fresh car unblocked
        let mut fx = Fixture::new(2, 1, 0);
        fx.tuning.danger_zone_length = Some(360.0);
        let mut spawner = TrafficSpawner::new();
        spawner.observe_player(0, 0.0);
        spawner.observe_player(0, 2.0);
        let obstacles = vec![obstacle(1, 1, 600.0)];
        let req = spawner.try_force_stick_spawn(&fx.ctx(), &obstacles).unwrap();
        assert_eq!(req.lane, 0);
        assert_eq!(req.y, 600.0 + fx.tuning.two_lane_stagger);
    }

    #[test]
    fn test_wave_after_forced_spawn_keeps_other_lane_open() {
        let fx = Fixture::new(2, 1, 0);
        let mut rng = Pcg32::seed_from_u64(10);

        // Forced car just placed in lane 0 at the spawn line: nothing fits
        let fresh = vec![obstacle(1, 0, SPAWN_Y)];
        for _ in 0..100 {
            let mut spawner = TrafficSpawner::new();
            assert!(spawner.spawn_wave(&fx.ctx(), &fresh, &mut rng).is_empty());
        }

        // Once it has moved on, waves may only stack behind it
        let moved = vec![obstacle(1, 0, 300.0)];
        for _ in 0..100 {
            let mut spawner = TrafficSpawner::new();
            let wave = spawner.spawn_wave(&fx.ctx(), &moved, &mut rng);
            assert!(!wave.is_empty());
            assert!(wave.iter().all(|req| req.lane == 0));
        }
    }

    #[test]
    fn test_forced_spawn_never_closes_last_lane() {
        let fx = Fixture::new(2, 1, 0);
        let mut spawner = TrafficSpawner::new();
        spawner.observe_player(0, 0.0);
        spawner.observe_player(0, 2.0);

        // Lane 1 holds a fresh wave car; the camped lane is the only way through
        let fresh = vec![obstacle(1, 1, SPAWN_Y)];
        assert!(spawner.try_force_stick_spawn(&fx.ctx(), &fresh).is_none());
        assert!(spawner.same_lane_time() >= fx.tuning.stick_threshold);

        let moved = vec![obstacle(1, 1, 300.0)];
        let req = spawner.try_force_stick_spawn(&fx.ctx(), &moved).unwrap();
        assert_eq!(req.lane, 1);
    }

    #[test]
    fn test_secondary_never_closes_last_lane() {
        let mut fx = Fixture::new(3, 2, 1);
        fx.params.double_spawn_prob = 1.0;
        let mut rng = Pcg32::seed_from_u64(11);
        let obstacles = vec![obstacle(1, 0, 300.0)];
        for _ in 0..300 {
            let mut spawner = TrafficSpawner::new();
            let wave = spawner.spawn_wave(&fx.ctx(), &obstacles, &mut rng);
            let mut closed = [true, false, false];
            for req in &wave {
                closed[req.lane] = true;
            }
            assert!(closed.iter().filter(|c| **c).count() < 3, "{wave:?}");
        }
    }

    #[test]
    fn test_weighted_draw_uniform_inputs() {
        // Equal dwell everywhere: four lanes drawn about equally often
        let tuning = Tuning::default();
        let dwell = LaneDwellTable::new(4, tuning.dwell_cap, tuning.dwell_decay);
        let mut rng = Pcg32::seed_from_u64(42);
        let candidates = [0, 1, 2, 3];
        let mut counts = [0u32; 4];
        for _ in 0..50 {
            let lane = pick_lane_weighted(&candidates, 1, &dwell, &tuning, &mut rng).unwrap();
            counts[lane] += 1;
        }
        assert_eq!(counts.iter().sum::<u32>(), 50);
        for c in counts {
            // Expected 12.5 each, sd ~3.1
            assert!((3..=23).contains(&c), "{counts:?}");
        }
    }

    #[test]
    fn test_weighted_draw_matches_weights() {
        let tuning = Tuning::default();
        let mut dwell = LaneDwellTable::new(4, tuning.dwell_cap, tuning.dwell_decay);
        for lane in 0..4 {
            dwell.set(lane, tuning.dwell_cap);
        }
        let player = 0;
        let weights: Vec<f32> = (0..4).map(|l| lane_weight(l, player, &dwell, &tuning)).collect();
        let total: f32 = weights.iter().sum();
        // 2.2, 1.84, 1.42, 1.42
        assert!((weights[0] - 2.2).abs() < 1e-5);
        assert!((weights[1] - 1.84).abs() < 1e-5);

        let mut rng = Pcg32::seed_from_u64(99);
        let draws = 8000;
        let mut counts = [0u32; 4];
        for _ in 0..draws {
            let lane = pick_lane_weighted(&[0, 1, 2, 3], player, &dwell, &tuning, &mut rng);
            counts[lane.unwrap()] += 1;
        }
        for lane in 0..4 {
            let expected = weights[lane] / total;
            let observed = counts[lane] as f32 / draws as f32;
            assert!((expected - observed).abs() < 0.03, "lane {lane}: {observed} vs {expected}");
        }
    }

    #[test]
    fn test_weighted_draw_edge_cases() {
        let tuning = Tuning::default();
        let dwell = LaneDwellTable::new(3, tuning.dwell_cap, tuning.dwell_decay);
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(pick_lane_weighted(&[], 0, &dwell, &tuning, &mut rng), None);
        assert_eq!(pick_lane_weighted(&[2], 0, &dwell, &tuning, &mut rng), Some(2));
    }

    proptest! {
        #[test]
        fn prop_wave_respects_range_and_gap(
            seed in any::<u64>(),
            lane_count in 2usize..=4,
            player_lane in 0usize..4,
            double in 0.0f32..=1.0,
            heights in proptest::collection::vec((0usize..4, -100.0f32..700.0), 0..10),
        ) {
            let player_lane = player_lane % lane_count;
            let mut fx = Fixture::new(lane_count, 2, player_lane);
            fx.params.double_spawn_prob = double;
            let obstacles: Vec<_> = heights
                .iter()
                .enumerate()
                .map(|(i, (lane, y))| obstacle(i as u32, lane % lane_count, *y))
                .collect();
            let top = top_y_by_lane(&obstacles, lane_count);
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut spawner = TrafficSpawner::new();
            for req in spawner.spawn_wave(&fx.ctx(), &obstacles, &mut rng) {
                prop_assert!(req.lane < lane_count);
                prop_assert!(req.y - top[req.lane] > fx.params.lane_gap_min);
            }
        }

        #[test]
        fn prop_stick_respects_cooldown(seed in any::<u64>(), steps in 100usize..2000) {
            let fx = Fixture::new(3, 2, 1);
            let mut spawner = TrafficSpawner::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut clock = 0.0f32;
            let mut last_fire: Option<f32> = None;
            for _ in 0..steps {
                let dt = rng.random_range(0.0f32..(1.0 / 60.0));
                clock += dt;
                spawner.observe_player(1, dt);
                if spawner.try_force_stick_spawn(&fx.ctx(), &[]).is_some() {
                    if let Some(prev) = last_fire {
                        prop_assert!(clock - prev >= fx.tuning.stick_cooldown - 1e-3);
                    }
                    last_fire = Some(clock);
                }
            }
        }
    }
}
