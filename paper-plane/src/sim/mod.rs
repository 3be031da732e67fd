//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool slot index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod phase;
pub mod pool;
pub mod spawn;
pub mod state;
pub mod tick;

pub use difficulty::DifficultyController;
pub use phase::{PhaseKind, PhaseScheduler};
pub use pool::{Pool, SlotIndex};
pub use state::{Entity, EntityKind, GameEvent, GameState, RunPhase, RunSnapshot};
pub use tick::{TickInput, tick};
