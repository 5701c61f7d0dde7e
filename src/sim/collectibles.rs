//! Collectible token spawner
//!
//! Tokens are placed mostly in or next to the player's lane, on a looser
//! gap than obstacles use.

use rand::Rng;

use super::spawn::{SpawnContext, SpawnRequest, has_clearance, top_y_by_lane};
use super::state::Obstacle;

#[derive(Debug, Clone, Default)]
pub struct CollectibleSpawner {
    timer: f32,
}

impl CollectibleSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Advance the spawn timer and place a token when it elapses
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &SpawnContext<'_>,
        obstacles: &[Obstacle],
        rng: &mut R,
    ) -> Option<SpawnRequest> {
        self.timer += dt;
        if self.timer < ctx.params.coin_interval {
            return None;
        }
        let placed = self.place(ctx, obstacles, rng);
        if placed.is_some() {
            self.timer = 0.0;
        }
        placed
    }

    /// Pick a lane for one token, or `None` when no lane has room
    pub fn place<R: Rng + ?Sized>(
        &self,
        ctx: &SpawnContext<'_>,
        obstacles: &[Obstacle],
        rng: &mut R,
    ) -> Option<SpawnRequest> {
        let t = ctx.tuning;
        let top = top_y_by_lane(obstacles, ctx.lane_count);
        let gap = (ctx.params.lane_gap_min * t.coin_gap_factor).max(t.coin_gap_floor);

        let free: Vec<usize> = (0..ctx.lane_count)
            .filter(|&lane| has_clearance(ctx.spawn_y, top[lane], gap))
            .collect();
        if free.is_empty() {
            return None;
        }

        let player = ctx.player_lane;
        let near: Vec<usize> = free
            .iter()
            .copied()
            .filter(|lane| lane.abs_diff(player) <= 1)
            .collect();

        let r = rng.random::<f32>();
        let mut lane = if free.contains(&player) && r < t.coin_player_lane_chance {
            player
        } else if !near.is_empty() && r < t.coin_player_lane_chance + t.coin_neighbor_chance {
            near[rng.random_range(0..near.len())]
        } else {
            free[rng.random_range(0..free.len())]
        };

        // Marginal slot: prefer a nearby lane with more headroom if there is one.
        let roomy = gap + t.coin_extra_safe;
        if !has_clearance(ctx.spawn_y, top[lane], roomy) {
            if let Some(&better) = near
                .iter()
                .find(|&&l| has_clearance(ctx.spawn_y, top[l], roomy))
            {
                lane = better;
            }
        }

        Some(SpawnRequest::at(lane, ctx.spawn_y))
    }
}
