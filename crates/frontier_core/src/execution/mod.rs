//! Per-tick behaviors.
//!
//! An [`Execution`] binds one piece of game behavior (a structure's upkeep,
//! a player's territory bookkeeping) to the tick loop. The scheduler in
//! [`crate::simulation`] stores executions as `Box<dyn Execution>` and calls
//! them in a fixed order every tick.
//!
//! # Lifecycle
//!
//! 1. [`Execution::init`] is called once when the execution is registered.
//! 2. [`Execution::tick`] is called every tick while [`Execution::is_active`]
//!    returns `true`.
//! 3. Once inactive, the execution is dropped and never ticked again.

mod defense_post;
mod player;
mod recruitment_center;
mod structure;

pub use defense_post::DefensePostExecution;
pub use player::PlayerExecution;
pub use recruitment_center::RecruitmentCenterExecution;

use crate::game::Game;
use crate::Tick;

/// Ordering bucket within a tick.
///
/// All `Territory` executions run before any `Structure` execution, so
/// ownership adjudication is visible to structures in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExecutionPhase {
    /// Player-level bookkeeping: adjudication, hamlets, troop growth.
    Territory,
    /// Structure behaviors.
    Structure,
}

/// A unit of per-tick behavior.
///
/// Object-safe so executions can be stored as `Box<dyn Execution>`.
pub trait Execution {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// One-time setup, called when the execution is registered.
    fn init(&mut self, game: &mut Game, ticks: Tick);

    /// Advance one tick.
    fn tick(&mut self, game: &mut Game, ticks: Tick);

    /// `true` until the execution terminates.
    fn is_active(&self) -> bool;

    /// Whether this execution runs before the spawn phase ends.
    fn active_during_spawn_phase(&self) -> bool;

    /// Ordering bucket within a tick.
    fn phase(&self) -> ExecutionPhase {
        ExecutionPhase::Structure
    }
}
