//! Difficulty curve
//!
//! Every parameter eases in along an exponential-saturation ramp of elapsed
//! stage time, so difficulty rises quickly at first and then levels off.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clamp01;
use crate::stage::StageConfig;
use crate::tuning::{StageProfile, Tuning};

/// `1 - e^(-t/tau)`, clamped to `t >= 0`.
///
/// Uses `expm1` so small `t` keeps precision; large `t` saturates to exactly
/// 1.0 instead of producing NaN.
#[inline]
pub fn ramp(t: f32, tau: f32) -> f32 {
    if tau <= 0.0 {
        return 1.0;
    }
    let t = t.max(0.0);
    clamp01(-(-t / tau).exp_m1())
}

/// Curve output for one instant of the stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// World scroll speed (px/s)
    pub scroll_speed: f32,
    /// Seconds between obstacle waves
    pub spawn_interval: f32,
    /// Chance that a wave carries a second obstacle
    pub double_spawn_prob: f32,
    /// Minimum vertical separation between obstacles in one lane (px)
    pub lane_gap_min: f32,
    /// Seconds between collectible spawns
    pub coin_interval: f32,
}

/// Elapsed stage time; only ever moves forward
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub elapsed_seconds: f32,
}

impl DifficultyState {
    pub fn advance(&mut self, dt: f32) {
        if dt > 0.0 {
            self.elapsed_seconds += dt;
        }
    }
}

/// Stage-specific curve, built once per race
#[derive(Debug, Clone)]
pub struct DifficultyCurve {
    profile: StageProfile,
    double_spawn_enabled: bool,
    coin_interval_floor: f32,
    coin_interval_ramp: f32,
    coin_ramp_secs: f32,
}

impl DifficultyCurve {
    pub fn new(profile: StageProfile, config: &StageConfig, tuning: &Tuning) -> Self {
        Self {
            profile,
            // Two lanes on the opening stage leave no room for a second car.
            double_spawn_enabled: !config.is_two_lane_opener(),
            coin_interval_floor: tuning.coin_interval_floor,
            coin_interval_ramp: tuning.coin_interval_ramp,
            coin_ramp_secs: tuning.coin_ramp_secs,
        }
    }

    pub fn profile(&self) -> &StageProfile {
        &self.profile
    }

    pub fn scroll_speed(&self, t: f32) -> f32 {
        let p = &self.profile;
        p.speed_base + p.speed_add * ramp(t, p.speed_tau)
    }

    pub fn spawn_interval(&self, t: f32) -> f32 {
        let p = &self.profile;
        let span = p.spawn_interval_start - p.spawn_interval_min;
        (p.spawn_interval_start - span * ramp(t, p.spawn_tau)).max(p.spawn_interval_min)
    }

    pub fn double_spawn_prob(&self, t: f32) -> f32 {
        if !self.double_spawn_enabled {
            return 0.0;
        }
        let p = &self.profile;
        (p.double_spawn_max * ramp(t, p.spawn_tau)).min(p.double_spawn_max)
    }

    pub fn lane_gap_min(&self, t: f32) -> f32 {
        let p = &self.profile;
        let span = p.lane_gap_start - p.lane_gap_min;
        (p.lane_gap_start - span * ramp(t, p.lane_gap_tau)).max(p.lane_gap_min)
    }

    pub fn coin_interval(&self, t: f32) -> f32 {
        let progress = clamp01(t.max(0.0) / self.coin_ramp_secs);
        (self.profile.coin_interval_base - self.coin_interval_ramp * progress)
            .max(self.coin_interval_floor)
    }

    /// Full parameter set at elapsed time `t`
    pub fn sample(&self, t: f32) -> DifficultyParams {
        DifficultyParams {
            scroll_speed: self.scroll_speed(t),
            spawn_interval: self.spawn_interval(t),
            double_spawn_prob: self.double_spawn_prob(t),
            lane_gap_min: self.lane_gap_min(t),
            coin_interval: self.coin_interval(t),
        }
    }

    /// Per-obstacle speed multiplier, uniform in the stage's rival range
    pub fn rival_speed_factor<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let p = &self.profile;
        if p.rival_speed_hi <= p.rival_speed_lo {
            return p.rival_speed_lo;
        }
        rng.random_range(p.rival_speed_lo..p.rival_speed_hi)
    }
}
