//! Stage configuration
//!
//! A `StageConfig` is fixed for the lifetime of a race. Out-of-range values
//! are rejected here instead of being clamped into range.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_LANES, MIN_LANES};
use crate::error::ConfigError;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub lane_count: usize,
    /// Fraction of the screen width left empty on each side of the track
    pub inset_fraction: f32,
    pub goal_distance_m: f32,
    /// 1-based stage index
    pub stage_index: u32,
}

impl StageConfig {
    /// Stage defaults as defined by the tuning profile
    pub fn preset(stage_index: u32, tuning: &Tuning) -> Result<Self, ConfigError> {
        let profile = tuning.stage(stage_index)?;
        Ok(Self {
            lane_count: profile.lane_count,
            inset_fraction: profile.inset_fraction,
            goal_distance_m: profile.goal_distance_m,
            stage_index,
        })
    }

    pub fn validate(&self, tuning: &Tuning) -> Result<(), ConfigError> {
        if !(MIN_LANES..=MAX_LANES).contains(&self.lane_count) {
            return Err(ConfigError::InvalidLaneCount(self.lane_count));
        }
        if !(self.inset_fraction > 0.0 && self.inset_fraction < 0.5) {
            return Err(ConfigError::InvalidInset(self.inset_fraction));
        }
        if !(self.goal_distance_m.is_finite() && self.goal_distance_m > 0.0) {
            return Err(ConfigError::InvalidGoalDistance(self.goal_distance_m));
        }
        tuning.stage(self.stage_index)?;
        Ok(())
    }

    /// Stage 1 on two lanes gets the gentler spawn rules
    pub fn is_two_lane_opener(&self) -> bool {
        self.stage_index == 1 && self.lane_count == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        let tuning = Tuning::default();
        for stage in 1..=3 {
            let config = StageConfig::preset(stage, &tuning).unwrap();
            assert!(config.validate(&tuning).is_ok());
            assert_eq!(config.stage_index, stage);
        }
        let opener = StageConfig::preset(1, &tuning).unwrap();
        assert!(opener.is_two_lane_opener());
        assert_eq!(opener.goal_distance_m, 500.0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let tuning = Tuning::default();
        let base = StageConfig::preset(2, &tuning).unwrap();

        let bad_lanes = StageConfig { lane_count: 5, ..base };
        assert!(matches!(bad_lanes.validate(&tuning), Err(ConfigError::InvalidLaneCount(5))));
        let one_lane = StageConfig { lane_count: 1, ..base };
        assert!(matches!(one_lane.validate(&tuning), Err(ConfigError::InvalidLaneCount(1))));

        let bad_inset = StageConfig { inset_fraction: 0.5, ..base };
        assert!(matches!(bad_inset.validate(&tuning), Err(ConfigError::InvalidInset(_))));

        let bad_goal = StageConfig { goal_distance_m: 0.0, ..base };
        assert!(matches!(bad_goal.validate(&tuning), Err(ConfigError::InvalidGoalDistance(_))));

        let bad_stage = StageConfig { stage_index: 9, ..base };
        assert!(matches!(bad_stage.validate(&tuning), Err(ConfigError::UnknownStage { .. })));
    }
}
