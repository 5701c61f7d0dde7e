//! Data-driven game balance
//!
//! Every gameplay-feel constant lives here so that it can be tweaked from a
//! JSON file instead of being baked into the spawners.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Difficulty-curve constants and defaults for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProfile {
    /// Default number of lanes for this stage
    pub lane_count: usize,
    /// Default lateral inset (fraction of screen width on each side)
    pub inset_fraction: f32,
    /// Default distance goal (game meters)
    pub goal_distance_m: f32,

    // === Scroll speed (px/s) ===
    pub speed_base: f32,
    pub speed_add: f32,
    pub speed_tau: f32,

    // === Obstacle cadence (seconds) ===
    pub spawn_interval_start: f32,
    pub spawn_interval_min: f32,
    pub spawn_tau: f32,
    /// Ceiling for the double-spawn probability
    pub double_spawn_max: f32,

    // === Same-lane vertical separation (px) ===
    pub lane_gap_start: f32,
    pub lane_gap_min: f32,
    pub lane_gap_tau: f32,

    // === Rival speed, as a fraction of scroll speed ===
    pub rival_speed_lo: f32,
    pub rival_speed_hi: f32,

    /// Collectible cadence at the start of the stage (seconds)
    pub coin_interval_base: f32,
}

impl StageProfile {
    /// Stage 1: two wide lanes, gentle ramp
    pub fn stage_one() -> Self {
        Self {
            lane_count: 2,
            inset_fraction: 0.15,
            goal_distance_m: 500.0,
            speed_base: 200.0,
            speed_add: 140.0,
            speed_tau: 45.0,
            spawn_interval_start: 1.6,
            spawn_interval_min: 0.95,
            spawn_tau: 50.0,
            double_spawn_max: 0.15,
            lane_gap_start: 420.0,
            lane_gap_min: 300.0,
            lane_gap_tau: 60.0,
            rival_speed_lo: 0.10,
            rival_speed_hi: 0.25,
            coin_interval_base: 1.2,
        }
    }

    /// Stage 2: three lanes
    pub fn stage_two() -> Self {
        Self {
            lane_count: 3,
            inset_fraction: 0.22,
            goal_distance_m: 1200.0,
            speed_base: 300.0,
            speed_add: 200.0,
            speed_tau: 40.0,
            spawn_interval_start: 1.3,
            spawn_interval_min: 0.7,
            spawn_tau: 45.0,
            double_spawn_max: 0.35,
            lane_gap_start: 380.0,
            lane_gap_min: 260.0,
            lane_gap_tau: 50.0,
            rival_speed_lo: 0.15,
            rival_speed_hi: 0.35,
            coin_interval_base: 1.0,
        }
    }

    /// Stage 3: four narrow lanes, highest ceiling
    pub fn stage_three() -> Self {
        Self {
            lane_count: 4,
            inset_fraction: 0.235,
            goal_distance_m: 1200.0,
            speed_base: 400.0,
            speed_add: 260.0,
            speed_tau: 35.0,
            spawn_interval_start: 1.1,
            spawn_interval_min: 0.55,
            spawn_tau: 40.0,
            double_spawn_max: 0.5,
            lane_gap_start: 340.0,
            lane_gap_min: 220.0,
            lane_gap_tau: 45.0,
            rival_speed_lo: 0.2,
            rival_speed_hi: 0.45,
            coin_interval_base: 0.9,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=4).contains(&self.lane_count) {
            return Err(ConfigError::InvalidLaneCount(self.lane_count));
        }
        if !(self.inset_fraction > 0.0 && self.inset_fraction < 0.5) {
            return Err(ConfigError::InvalidInset(self.inset_fraction));
        }
        if !(self.goal_distance_m.is_finite() && self.goal_distance_m > 0.0) {
            return Err(ConfigError::InvalidGoalDistance(self.goal_distance_m));
        }
        if !(self.speed_base > 0.0 && self.speed_add >= 0.0) {
            return Err(ConfigError::tuning("speed_base", "scroll speed must be positive"));
        }
        for (field, tau) in [
            ("speed_tau", self.speed_tau),
            ("spawn_tau", self.spawn_tau),
            ("lane_gap_tau", self.lane_gap_tau),
        ] {
            if !(tau >= 0.0) {
                return Err(ConfigError::tuning(
                    field,
                    format!("must not be negative (got {tau})"),
                ));
            }
        }
        if !(self.spawn_interval_min > 0.0
            && self.spawn_interval_start >= self.spawn_interval_min)
        {
            return Err(ConfigError::tuning(
                "spawn_interval_min",
                "needs 0 < spawn_interval_min <= spawn_interval_start",
            ));
        }
        if !(0.0..=1.0).contains(&self.double_spawn_max) {
            return Err(ConfigError::tuning("double_spawn_max", "must be a probability"));
        }
        if !(self.lane_gap_min > 0.0 && self.lane_gap_start >= self.lane_gap_min) {
            return Err(ConfigError::tuning(
                "lane_gap_min",
                "needs 0 < lane_gap_min <= lane_gap_start",
            ));
        }
        if !(self.rival_speed_lo >= 0.0 && self.rival_speed_hi >= self.rival_speed_lo) {
            return Err(ConfigError::tuning(
                "rival_speed_lo",
                "needs 0 <= rival_speed_lo <= rival_speed_hi",
            ));
        }
        if self.coin_interval_base <= 0.0 {
            return Err(ConfigError::tuning("coin_interval_base", "must be positive"));
        }
        Ok(())
    }
}

/// Gameplay tuning shared by every stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Dwell bias ===
    /// Maximum dwell seconds stored per lane
    pub dwell_cap: f32,
    /// Decay rate for lanes the player is not in (per second)
    pub dwell_decay: f32,
    /// How strongly dwell pulls the weighted lane draw
    pub bias_strength: f32,
    pub falloff_same_lane: f32,
    pub falloff_adjacent: f32,
    pub falloff_far: f32,

    // === Streaks ===
    /// Two-lane: dwell seconds after which the player's lane is forced
    pub two_lane_dwell_bias_secs: f32,
    /// Two-lane: chance to aim at the player's lane when it is free
    pub two_lane_player_lane_chance: f32,
    pub two_lane_streak_cap: u32,
    pub far_streak_cap: u32,
    /// Two-lane stage 1: spawn timer restarts at minus this after each wave
    pub two_lane_wave_delay: f32,

    // === Danger zone (px ahead of the player's top edge) ===
    pub danger_zone_offset: f32,
    /// Band length; `None` covers everything ahead of the player up to and
    /// beyond the spawn line
    pub danger_zone_length: Option<f32>,

    // === Forced "stuck lane" spawns ===
    pub stick_threshold: f32,
    pub stick_cooldown: f32,
    pub stick_safe_front: f32,
    pub two_lane_stagger_min: f32,
    pub two_lane_stagger: f32,

    // === Secondary spawn ===
    pub double_jitter_min: f32,
    pub double_jitter_range: f32,
    pub double_min_delta: f32,

    // === Collectibles ===
    pub coin_interval_floor: f32,
    pub coin_interval_ramp: f32,
    pub coin_ramp_secs: f32,
    pub coin_gap_floor: f32,
    pub coin_gap_factor: f32,
    pub coin_extra_safe: f32,
    pub coin_player_lane_chance: f32,
    pub coin_neighbor_chance: f32,

    // === Entities ===
    pub player_size: Vec2,
    /// Bottom edge of the player box
    pub player_y: f32,
    /// Lateral interpolation rate (1/s)
    pub lateral_speed: f32,
    pub obstacle_size: Vec2,
    pub coin_size: Vec2,
    pub min_obstacle_speed: f32,
    /// Spawn line distance above the top of the viewport
    pub spawn_margin: f32,

    /// Seconds of traffic the autopilot simulates ahead before picking a lane
    pub autopilot_horizon: f32,

    // === Race ===
    /// Pixels to game meters
    pub distance_scale: f32,
    pub finish_duration: f32,
    pub finish_glide_speed: f32,

    /// Per-stage curve constants, stage N at index N-1
    pub stages: Vec<StageProfile>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            dwell_cap: 6.0,
            dwell_decay: 0.6,
            bias_strength: 1.2,
            falloff_same_lane: 1.0,
            falloff_adjacent: 0.7,
            falloff_far: 0.35,

            two_lane_dwell_bias_secs: 1.2,
            two_lane_player_lane_chance: 0.65,
            two_lane_streak_cap: 2,
            far_streak_cap: 3,
            two_lane_wave_delay: 0.35,

            danger_zone_offset: 0.0,
            danger_zone_length: None,

            stick_threshold: 1.2,
            stick_cooldown: 1.4,
            stick_safe_front: 200.0,
            two_lane_stagger_min: 160.0,
            two_lane_stagger: 180.0,

            double_jitter_min: 70.0,
            double_jitter_range: 110.0,
            double_min_delta: 140.0,

            coin_interval_floor: 0.55,
            coin_interval_ramp: 0.35,
            coin_ramp_secs: 60.0,
            coin_gap_floor: 120.0,
            coin_gap_factor: 0.65,
            coin_extra_safe: 60.0,
            coin_player_lane_chance: 0.6,
            coin_neighbor_chance: 0.3,

            player_size: Vec2::new(40.0, 80.0),
            player_y: 80.0,
            lateral_speed: 18.0,
            obstacle_size: Vec2::new(48.0, 96.0),
            coin_size: Vec2::new(32.0, 32.0),
            min_obstacle_speed: 60.0,
            spawn_margin: 40.0,
            autopilot_horizon: 1.2,

            distance_scale: 0.035,
            finish_duration: 2.0,
            finish_glide_speed: 260.0,

            stages: vec![
                StageProfile::stage_one(),
                StageProfile::stage_two(),
                StageProfile::stage_three(),
            ],
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Profile for a 1-based stage index
    pub fn stage(&self, index: u32) -> Result<&StageProfile, ConfigError> {
        (index as usize)
            .checked_sub(1)
            .and_then(|i| self.stages.get(i))
            .ok_or(ConfigError::UnknownStage {
                index,
                available: self.stages.len(),
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::tuning("stages", "at least one stage is required"));
        }
        for stage in &self.stages {
            stage.validate()?;
        }

        let positive = [
            ("dwell_cap", self.dwell_cap),
            ("lateral_speed", self.lateral_speed),
            ("min_obstacle_speed", self.min_obstacle_speed),
            ("distance_scale", self.distance_scale),
            ("coin_interval_floor", self.coin_interval_floor),
            ("coin_ramp_secs", self.coin_ramp_secs),
            ("autopilot_horizon", self.autopilot_horizon),
            ("player_size.x", self.player_size.x),
            ("player_size.y", self.player_size.y),
            ("obstacle_size.x", self.obstacle_size.x),
            ("obstacle_size.y", self.obstacle_size.y),
            ("coin_size.x", self.coin_size.x),
            ("coin_size.y", self.coin_size.y),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::tuning(
                    field,
                    format!("must be positive (got {value})"),
                ));
            }
        }

        let non_negative = [
            ("dwell_decay", self.dwell_decay),
            ("bias_strength", self.bias_strength),
            ("falloff_same_lane", self.falloff_same_lane),
            ("falloff_adjacent", self.falloff_adjacent),
            ("falloff_far", self.falloff_far),
            ("two_lane_dwell_bias_secs", self.two_lane_dwell_bias_secs),
            ("two_lane_wave_delay", self.two_lane_wave_delay),
            ("danger_zone_offset", self.danger_zone_offset),
            ("danger_zone_length", self.danger_zone_length.unwrap_or(0.0)),
            ("stick_threshold", self.stick_threshold),
            ("stick_cooldown", self.stick_cooldown),
            ("stick_safe_front", self.stick_safe_front),
            ("two_lane_stagger_min", self.two_lane_stagger_min),
            ("two_lane_stagger", self.two_lane_stagger),
            ("double_jitter_min", self.double_jitter_min),
            ("double_jitter_range", self.double_jitter_range),
            ("double_min_delta", self.double_min_delta),
            ("coin_interval_ramp", self.coin_interval_ramp),
            ("coin_gap_floor", self.coin_gap_floor),
            ("coin_gap_factor", self.coin_gap_factor),
            ("coin_extra_safe", self.coin_extra_safe),
            ("player_y", self.player_y),
            ("finish_duration", self.finish_duration),
            ("finish_glide_speed", self.finish_glide_speed),
            ("spawn_margin", self.spawn_margin),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::tuning(
                    field,
                    format!("must not be negative (got {value})"),
                ));
            }
        }

        let probabilities = [
            ("two_lane_player_lane_chance", self.two_lane_player_lane_chance),
            ("coin_player_lane_chance", self.coin_player_lane_chance),
            ("coin_neighbor_chance", self.coin_neighbor_chance),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::tuning(
                    field,
                    format!("must be within [0, 1] (got {value})"),
                ));
            }
        }
        if self.coin_player_lane_chance + self.coin_neighbor_chance > 1.0 {
            return Err(ConfigError::tuning(
                "coin_neighbor_chance",
                "player lane and neighbour chances must sum to at most 1",
            ));
        }
        Ok(())
    }
}
