//! # Frontier Core
//!
//! Deterministic tick core for a territory-conquest strategy game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (structures draw from seeded generators)
//! - No floating-point math in the tick path (uses fixed-point)
//!
//! This separation enables:
//! - Lockstep multiplayer (identical simulation across clients)
//! - Replay verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`game`] - Authoritative game state: tiles, players, units, updates
//! - [`execution`] - Per-tick behaviors (structures and player orchestration)
//! - [`simulation`] - Execution scheduler and tick loop
//! - [`config`] - Numeric tunables loaded from RON
//! - [`random`] - Seeded per-structure randomness
//! - [`math`] - Fixed-point helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod execution;
pub mod game;
pub mod map;
pub mod math;
pub mod player;
pub mod random;
pub mod simulation;
pub mod unit;
pub mod updates;

/// Simulation tick counter.
pub type Tick = u64;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::GameConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::execution::{
        DefensePostExecution, Execution, ExecutionPhase, PlayerExecution,
        RecruitmentCenterExecution,
    };
    pub use crate::game::Game;
    pub use crate::map::{GameMap, Terrain, TileRef};
    pub use crate::math::Fixed;
    pub use crate::player::{Player, PlayerId};
    pub use crate::simulation::{Simulation, TickUpdates};
    pub use crate::unit::{CaptureRule, Unit, UnitId, UnitKind};
    pub use crate::updates::GameUpdate;
    pub use crate::Tick;
}
