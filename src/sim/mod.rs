//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied frame delta, clamped per tick
//! - One seeded RNG per race
//! - Stable entity IDs in spawn order
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod bounds;
pub mod collectibles;
pub mod difficulty;
pub mod lanes;
pub mod session;
pub mod spawn;
pub mod state;
pub mod traffic;

pub use bounds::Aabb;
pub use collectibles::CollectibleSpawner;
pub use difficulty::{DifficultyCurve, DifficultyParams, DifficultyState, ramp};
pub use lanes::{LaneCenters, Viewport, lane_centers, nearest_lane};
pub use session::{RaceSession, TickInput, TickResult};
pub use spawn::{SpawnContext, SpawnRequest};
pub use state::{
    Collectible, LaneChange, LaneDwellTable, Obstacle, PlayerVehicle, RaceEvent, RaceState,
};
pub use traffic::{TrafficSpawner, pick_lane_weighted};
