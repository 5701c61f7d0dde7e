//! Configuration errors
//!
//! Only session start, tuning load and viewport changes can fail. Everything
//! that happens inside a tick is infallible.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("lane count must be 2, 3 or 4 (got {0})")]
    InvalidLaneCount(usize),

    #[error("lateral inset fraction must be inside (0, 0.5) (got {0})")]
    InvalidInset(f32),

    #[error("goal distance must be a positive number of meters (got {0})")]
    InvalidGoalDistance(f32),

    #[error("unknown stage {index} (tuning defines stages 1..={available})")]
    UnknownStage { index: u32, available: usize },

    #[error("viewport must have a positive size (got {width}x{height})")]
    InvalidViewport { width: f32, height: f32 },

    #[error("invalid tuning value `{field}`: {reason}")]
    InvalidTuning { field: &'static str, reason: String },

    #[error("failed to parse tuning JSON")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn tuning(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidTuning {
            field,
            reason: reason.into(),
        }
    }
}
