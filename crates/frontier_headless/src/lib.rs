//! Headless scenario runner for CI and determinism verification.
//!
//! This crate runs the territory simulation without any presentation layer:
//!
//! - **Scenario runs**: Load a RON scenario, simulate it and write a JSON
//!   report of the final state
//! - **Determinism checks**: Run the same scenario on many threads and
//!   compare final state hashes
//!
//! # Example
//!
//! ```bash
//! # Run the built-in scenario
//! cargo run -p frontier_headless -- run --ticks 2000 --output results/report.json
//!
//! # Run a scenario file with custom rules
//! cargo run -p frontier_headless -- run --scenario scenarios/border_skirmish.ron --config scenarios/default_config.ron
//!
//! # Verify determinism
//! cargo run -p frontier_headless -- verify --runs 8
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{PlayerReport, RunReport, ScenarioRunner, VerifyReport};
pub use scenario::{Area, PlayerSetup, Scenario, ScenarioError, ScriptedConquest, StructurePlacement};

use std::path::Path;

use frontier_core::config::GameConfig;

/// Load a scenario from a file, or fall back to a built-in scenario by name.
pub fn load_scenario(name_or_path: &str) -> Result<Scenario, ScenarioError> {
    match Scenario::builtin(name_or_path) {
        Some(scenario) => Ok(scenario),
        None => Scenario::load(name_or_path),
    }
}

/// Load a RON config file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<GameConfig, ScenarioError> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(GameConfig::from_ron_str(&contents)?)
}
