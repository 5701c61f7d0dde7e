//! Shared spawn plumbing
//!
//! Spawners only decide *where* something appears. They return
//! [`SpawnRequest`]s and the session turns them into entities.

use serde::{Deserialize, Serialize};

use super::bounds::Aabb;
use super::difficulty::DifficultyParams;
use super::state::{LaneDwellTable, Obstacle};
use crate::tuning::Tuning;

/// Where to place a new entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub lane: usize,
    /// Bottom edge of the new entity
    pub y: f32,
    /// Placed by the stuck-lane breaker rather than the wave timer
    pub forced: bool,
}

impl SpawnRequest {
    pub fn at(lane: usize, y: f32) -> Self {
        Self {
            lane,
            y,
            forced: false,
        }
    }
}

/// Read-only view of the race handed to the spawners for one decision
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub tuning: &'a Tuning,
    pub dwell: &'a LaneDwellTable,
    pub params: DifficultyParams,
    pub lane_count: usize,
    pub stage_index: u32,
    /// Stage 1 with two lanes
    pub two_lane_opener: bool,
    /// Spawn line just above the viewport
    pub spawn_y: f32,
    pub player_lane: usize,
    pub player_bounds: Aabb,
}

impl SpawnContext<'_> {
    /// Y-band ahead of the player where new walls would be unavoidable.
    ///
    /// Without a configured length the band is open-ended, so obstacles that
    /// were just placed at or above the spawn line count too.
    pub fn danger_zone(&self) -> (f32, f32) {
        let start = self.player_bounds.top() + self.tuning.danger_zone_offset;
        let end = self
            .tuning
            .danger_zone_length
            .map_or(f32::INFINITY, |len| start + len);
        (start, end)
    }

    /// Lanes with an obstacle centered inside the danger zone
    pub fn blocked_lanes(&self, obstacles: &[Obstacle]) -> Vec<bool> {
        let (start, end) = self.danger_zone();
        let mut blocked = vec![false; self.lane_count];
        for o in obstacles {
            let cy = o.bounds.center().y;
            if cy >= start && cy <= end {
                if let Some(slot) = blocked.get_mut(o.lane) {
                    *slot = true;
                }
            }
        }
        blocked
    }
}

/// Bottom edge of the highest obstacle in each lane (`-inf` for empty lanes)
pub fn top_y_by_lane(obstacles: &[Obstacle], lane_count: usize) -> Vec<f32> {
    let mut top = vec![f32::NEG_INFINITY; lane_count];
    for o in obstacles {
        if let Some(slot) = top.get_mut(o.lane) {
            *slot = slot.max(o.bounds.bottom());
        }
    }
    top
}

/// True when a spawn at `spawn_y` clears the lane's highest obstacle by more than `gap`
#[inline]
pub fn has_clearance(spawn_y: f32, lane_top: f32, gap: f32) -> bool {
    spawn_y - lane_top > gap
}
