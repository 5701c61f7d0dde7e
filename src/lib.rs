//! Lane Runner - difficulty and traffic core for a lane-based endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (difficulty curve, lanes, spawners, race session)
//! - `tuning`: Data-driven game balance
//! - `stage`: Per-race stage configuration
//! - `error`: Configuration errors
//!
//! Rendering, audio, input polling and menus belong to the host. The host
//! calls [`sim::RaceSession::tick`] once per frame with the frame delta and
//! the lane-change request for that frame.

pub mod error;
pub mod sim;
pub mod stage;
pub mod tuning;

pub use error::ConfigError;
pub use sim::{LaneChange, RaceSession, RaceState, TickInput, TickResult, Viewport};
pub use stage::StageConfig;
pub use tuning::{StageProfile, Tuning};

/// Engine constants that are structural rather than balance
pub mod consts {
    /// Largest delta a single tick may consume (frame hitches are clamped)
    pub const MAX_TICK_DT: f32 = 1.0 / 60.0;

    /// Supported lane counts
    pub const MIN_LANES: usize = 2;
    pub const MAX_LANES: usize = 4;

    /// Default viewport used by the headless runner
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 800.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 600.0;
}

/// Clamp to [0, 1]
#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Linear interpolation from `a` toward `b`
#[inline]
pub fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
    a + (b - a) * alpha
}
