//! Demo-mode driver
//!
//! Picks a lane change for the player so the race can run unattended behind
//! a menu or in the headless runner. Each candidate lane is tried by replaying
//! the player's lateral slide and the visible traffic a short way into the
//! future; the lane that stays clear longest wins.

use std::cmp::Reverse;

use glam::Vec2;

use super::bounds::Aabb;
use super::lanes::LaneCenters;
use super::state::{Collectible, LaneChange, Obstacle, PlayerVehicle};
use crate::consts::MAX_TICK_DT;
use crate::lerp;
use crate::tuning::Tuning;

/// Vertical padding around the player while predicting contacts
const CONTACT_MARGIN: f32 = 6.0;

/// Frozen view of the road used to score candidate lanes
struct Forecast<'a> {
    player: &'a PlayerVehicle,
    lanes: &'a LaneCenters,
    /// Obstacles not yet behind the player
    threats: Vec<&'a Obstacle>,
    scroll_speed: f32,
    alpha: f32,
    /// Horizontal distance from the target at which the next step may be requested
    step_slack: f32,
    steps: u32,
}

impl Forecast<'_> {
    /// Ticks the player survives when heading for `target` one lane at a time
    fn survival(&self, target: usize) -> u32 {
        let half_width = self.player.bounds.size.x / 2.0;
        let mut lane = self.player.lane;
        let mut x = self.player.bounds.pos.x;
        let mut target_x = self.player.target_x;
        let body_y = self.player.bounds.pos.y - CONTACT_MARGIN;
        let body_size = self.player.bounds.size + Vec2::new(0.0, 2.0 * CONTACT_MARGIN);

        for step in 1..=self.steps {
            if lane != target && (x - target_x).abs() < self.step_slack {
                lane = if target < lane { lane - 1 } else { lane + 1 };
                target_x = self.lanes.x(lane) - half_width;
            }
            x = lerp(x, target_x, self.alpha);

            let t = step as f32 * MAX_TICK_DT;
            let body = Aabb::new(Vec2::new(x, body_y), body_size);
            let hit = self.threats.iter().any(|o| {
                let mut future = o.bounds;
                future.translate_y(-(self.scroll_speed + o.speed) * t);
                future.overlaps(&body)
            });
            if hit {
                return step - 1;
            }
        }
        self.steps
    }

    fn ready(&self) -> bool {
        (self.player.bounds.pos.x - self.player.target_x).abs() < self.step_slack
    }

    fn step_toward(&self, lane: usize) -> LaneChange {
        let current = self.player.lane;
        if lane == current || !self.ready() {
            LaneChange::None
        } else if lane < current {
            LaneChange::Left
        } else {
            LaneChange::Right
        }
    }
}

/// Choose this tick's lane change.
///
/// Stays put while the current lane is clear for the whole horizon, drifting
/// only toward a token in a neighbouring lane that is just as clear.
/// Otherwise heads for the lane that survives longest, nearest first on ties.
pub fn steer(
    player: &PlayerVehicle,
    lanes: &LaneCenters,
    obstacles: &[Obstacle],
    collectibles: &[Collectible],
    scroll_speed: f32,
    tuning: &Tuning,
) -> LaneChange {
    let forecast = Forecast {
        player,
        lanes,
        threats: obstacles
            .iter()
            .filter(|o| o.bounds.top() > player.bounds.bottom() - CONTACT_MARGIN)
            .collect(),
        scroll_speed,
        alpha: (MAX_TICK_DT * tuning.lateral_speed).min(1.0),
        step_slack: (player.bounds.size.x + tuning.obstacle_size.x) / 2.0,
        steps: (tuning.autopilot_horizon / MAX_TICK_DT).ceil().max(1.0) as u32,
    };

    let current = player.lane;
    if forecast.survival(current) == forecast.steps {
        let token_lane = collectibles
            .iter()
            .filter(|c| !c.collected && c.bounds.bottom() > player.bounds.top())
            .filter(|c| c.lane.abs_diff(current) == 1)
            .min_by(|a, b| a.bounds.bottom().total_cmp(&b.bounds.bottom()))
            .map(|c| c.lane);
        return match token_lane {
            Some(lane) if forecast.survival(lane) == forecast.steps => forecast.step_toward(lane),
            _ => LaneChange::None,
        };
    }

    (0..lanes.len())
        .map(|lane| (lane, forecast.survival(lane)))
        .max_by_key(|&(lane, survived)| (survived, Reverse(lane.abs_diff(current))))
        .map_or(LaneChange::None, |(lane, _)| forecast.step_toward(lane))
}
