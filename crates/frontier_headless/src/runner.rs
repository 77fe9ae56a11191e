//! Scenario execution and reporting.
//!
//! [`ScenarioRunner`] turns a [`Scenario`] into a [`Simulation`], runs it for
//! a number of ticks while applying scripted conquests, and summarizes the
//! outcome in a [`RunReport`].

use std::collections::BTreeMap;
use std::path::Path;
use std::result::Result;

use frontier_core::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scenario::{Scenario, ScenarioError};

/// Final state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReport {
    /// Player name.
    pub name: String,
    /// Troops at the end of the run.
    pub troops: u32,
    /// Tiles held at the end of the run.
    pub tiles: usize,
    /// Whether the player ended with no land.
    pub eliminated: bool,
    /// Sum of active structure levels by structure name.
    pub structures: BTreeMap<String, u32>,
}

/// Summary of a scenario run, written as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: String,
    /// Ticks executed.
    pub ticks_run: u64,
    /// Tick counter after the run.
    pub final_tick: u64,
    /// Final state hash, hex encoded.
    pub state_hash: String,
    /// Per-player outcome in id order.
    pub players: Vec<PlayerReport>,
    /// Defense post tracers emitted.
    pub tracers: u64,
    /// Hamlets spawned during the run.
    pub hamlets_spawned: u64,
    /// Structures that changed hands.
    pub structures_captured: u64,
    /// Structures that lost a level without being destroyed.
    pub structures_downgraded: u64,
    /// Structures destroyed.
    pub structures_destroyed: u64,
}

impl RunReport {
    /// Save the report as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load a report from JSON.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Number of runs.
    pub runs: usize,
    /// Ticks per run.
    pub ticks: u64,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
}

impl VerifyReport {
    /// Whether every run ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Update counters collected while running.
#[derive(Debug, Default, Clone, Copy)]
struct UpdateTally {
    tracers: u64,
    hamlets: u64,
    captured: u64,
    downgraded: u64,
    destroyed: u64,
}

impl UpdateTally {
    fn record(&mut self, updates: &TickUpdates) {
        for update in &updates.updates {
            match update {
                GameUpdate::DefensePostTracer { .. } => self.tracers += 1,
                GameUpdate::UnitBuilt {
                    kind: UnitKind::Hamlet,
                    ..
                } => self.hamlets += 1,
                GameUpdate::UnitBuilt { .. } => {}
                GameUpdate::UnitCaptured { .. } => self.captured += 1,
                GameUpdate::UnitDowngraded { .. } => self.downgraded += 1,
                GameUpdate::UnitDestroyed { .. } => self.destroyed += 1,
            }
        }
    }
}

/// Structure waiting to be raised to its scenario level.
#[derive(Debug, Clone, Copy)]
struct PendingUpgrade {
    kind: UnitKind,
    tile: TileRef,
    level: u32,
}

/// A scenario ready to be simulated.
struct Prepared {
    sim: Simulation,
    players: Vec<PlayerId>,
    upgrades: Vec<PendingUpgrade>,
}

/// Runs scenarios headlessly.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    scenario: Scenario,
    config: GameConfig,
}

impl ScenarioRunner {
    /// Create a runner for `scenario` with rule tunables `config`.
    #[must_use]
    pub fn new(scenario: Scenario, config: GameConfig) -> Self {
        Self { scenario, config }
    }

    /// The scenario being run.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Build the initial simulation: map, players, territory, alliances and
    /// structure executions.
    fn prepare(&self) -> Result<Prepared, ScenarioError> {
        let scenario = &self.scenario;
        scenario.validate()?;

        let (width, height) = scenario.map_size;
        let mut map = GameMap::new(width, height);
        for &column in &scenario.water_columns {
            for y in 0..height {
                let tile = map.ref_at(column, y);
                map.set_terrain(tile, Terrain::Water);
            }
        }

        let mut game = Game::new(map, self.config.clone());
        let mut players = Vec::with_capacity(scenario.players.len());
        for setup in &scenario.players {
            let id = game.add_player(setup.name.clone(), setup.troops);
            for (x, y) in setup.territory.coords() {
                let tile = game.map().ref_at(x, y);
                if game.map().is_land(tile) {
                    game.conquer(id, tile)?;
                }
            }
            players.push(id);
        }

        for (a, b) in &scenario.alliances {
            let a = players[scenario.player_index(a)?];
            let b = players[scenario.player_index(b)?];
            game.set_alliance(a, b)?;
        }

        let mut sim = Simulation::new(game);
        for &id in &players {
            sim.add_execution(Box::new(PlayerExecution::new(id)));
        }

        let mut upgrades = Vec::new();
        for placement in &scenario.structures {
            let owner = players[scenario.player_index(&placement.owner)?];
            let tile = sim.game().map().ref_at(placement.x, placement.y);
            match placement.kind {
                UnitKind::DefensePost => {
                    sim.add_execution(Box::new(DefensePostExecution::new(owner, tile)));
                }
                UnitKind::RecruitmentCenter => {
                    sim.add_execution(Box::new(RecruitmentCenterExecution::new(owner, tile)));
                }
                UnitKind::City | UnitKind::Hamlet => {
                    let game = sim.game_mut();
                    let anchor = game.can_build(owner, placement.kind, tile)?;
                    game.build_unit(owner, placement.kind, anchor)?;
                }
            }
            if placement.level > 1 {
                upgrades.push(PendingUpgrade {
                    kind: placement.kind,
                    tile,
                    level: placement.level,
                });
            }
        }

        let mut prepared = Prepared {
            sim,
            players,
            upgrades,
        };
        apply_upgrades(&mut prepared);
        Ok(prepared)
    }

    /// Apply the scripted conquests scheduled for the current tick.
    fn apply_conquests(&self, prepared: &mut Prepared) -> Result<(), ScenarioError> {
        let now = prepared.sim.ticks();
        for conquest in self.scenario.conquests.iter().filter(|c| c.at_tick == now) {
            let player = prepared.players[self.scenario.player_index(&conquest.player)?];
            let game = prepared.sim.game_mut();
            let mut taken = 0usize;
            for (x, y) in conquest.area.coords() {
                let tile = game.map().ref_at(x, y);
                if !game.map().is_land(tile) {
                    continue;
                }
                game.conquer(player, tile)?;
                taken += 1;
            }
            info!(tick = now, player = %conquest.player, tiles = taken, "scripted conquest");
        }
        Ok(())
    }

    /// Run for `ticks` ticks and return the final simulation with its tally.
    fn simulate(&self, ticks: u64) -> Result<(Prepared, UpdateTally), ScenarioError> {
        let mut prepared = self.prepare()?;
        let mut tally = UpdateTally::default();

        for _ in 0..ticks {
            self.apply_conquests(&mut prepared)?;
            let updates = prepared.sim.tick();
            tally.record(&updates);
            if !prepared.upgrades.is_empty() {
                apply_upgrades(&mut prepared);
            }
        }

        Ok((prepared, tally))
    }

    /// Run the scenario and summarize the result.
    pub fn run(&self, ticks: u64) -> Result<RunReport, ScenarioError> {
        info!(scenario = %self.scenario.name, ticks, "running scenario");
        let (prepared, tally) = self.simulate(ticks)?;
        let game = prepared.sim.game();

        let players = prepared
            .players
            .iter()
            .zip(&self.scenario.players)
            .map(|(&id, setup)| {
                let mut structures = BTreeMap::new();
                for kind in UnitKind::ALL {
                    let levels: u32 = game.units_of(id, kind).iter().map(|u| u.level()).sum();
                    if levels > 0 {
                        structures.insert(kind.display_name().to_string(), levels);
                    }
                }
                let tiles = game.player(id).map_or(0, Player::tile_count);
                PlayerReport {
                    name: setup.name.clone(),
                    troops: game.troops(id),
                    tiles,
                    eliminated: tiles == 0,
                    structures,
                }
            })
            .collect();

        let report = RunReport {
            scenario: self.scenario.name.clone(),
            ticks_run: ticks,
            final_tick: game.ticks(),
            state_hash: format!("{:016x}", game.state_hash()),
            players,
            tracers: tally.tracers,
            hamlets_spawned: tally.hamlets,
            structures_captured: tally.captured,
            structures_downgraded: tally.downgraded,
            structures_destroyed: tally.destroyed,
        };
        info!(
            scenario = %report.scenario,
            state_hash = %report.state_hash,
            tracers = report.tracers,
            "scenario finished"
        );
        Ok(report)
    }

    /// Final state hash after `ticks` ticks.
    pub fn run_hash(&self, ticks: u64) -> Result<u64, ScenarioError> {
        let (prepared, _) = self.simulate(ticks)?;
        Ok(prepared.sim.state_hash())
    }

    /// Run the scenario `runs` times in parallel and collect final hashes.
    pub fn verify_determinism(&self, runs: usize, ticks: u64) -> Result<VerifyReport, ScenarioError> {
        let hashes = (0..runs)
            .into_par_iter()
            .map(|run| {
                let hash = self.run_hash(ticks)?;
                debug!(run, state_hash = hash, "verification run finished");
                Ok(hash)
            })
            .collect::<Result<Vec<u64>, ScenarioError>>()?;

        Ok(VerifyReport { runs, ticks, hashes })
    }
}

/// Raise placed structures to their scenario level once they stand.
fn apply_upgrades(prepared: &mut Prepared) {
    let game = prepared.sim.game_mut();
    prepared.upgrades.retain(|pending| {
        let Some(unit) = game.unit_at(pending.tile).filter(|u| u.kind() == pending.kind) else {
            return true;
        };
        let (id, mut level) = (unit.id(), unit.level());
        while level < pending.level {
            match game.increase_level(id) {
                Ok(raised) => level = raised,
                Err(err) => {
                    warn!(unit = ?id, error = %err, "structure upgrade failed");
                    break;
                }
            }
        }
        false
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Area, PlayerSetup, ScriptedConquest, StructurePlacement};

    fn quick_config() -> GameConfig {
        GameConfig {
            spawn_phase_ticks: 5,
            defense_post_attack_rate: 20,
            ..GameConfig::default()
        }
    }

    fn duel_scenario() -> Scenario {
        Scenario {
            name: "duel".to_string(),
            description: String::new(),
            map_size: (20, 10),
            water_columns: vec![10],
            players: vec![
                PlayerSetup {
                    name: "a".to_string(),
                    troops: 1000,
                    territory: Area::new(0, 0, 9, 9),
                },
                PlayerSetup {
                    name: "b".to_string(),
                    troops: 1000,
                    territory: Area::new(11, 0, 19, 9),
                },
            ],
            alliances: Vec::new(),
            structures: vec![
                StructurePlacement::new(UnitKind::DefensePost, "a", 8, 5).with_level(3),
                StructurePlacement::new(UnitKind::City, "b", 15, 5),
            ],
            conquests: Vec::new(),
            ticks: 100,
        }
    }

    #[test]
    fn test_water_columns_stay_unowned() {
        let runner = ScenarioRunner::new(duel_scenario(), quick_config());
        let prepared = runner.prepare().unwrap();
        let game = prepared.sim.game();
        let water = game.map().ref_at(10, 3);
        assert!(!game.map().is_land(water));
        assert_eq!(game.owner(water), None);
        assert_eq!(game.player(prepared.players[0]).unwrap().tile_count(), 100);
        assert_eq!(game.player(prepared.players[1]).unwrap().tile_count(), 90);
    }

    #[test]
    fn test_post_upgraded_after_placement() {
        let runner = ScenarioRunner::new(duel_scenario(), quick_config());
        let report = runner.run(10).unwrap();
        assert_eq!(report.players[0].structures.get("Defense Post"), Some(&3));
        assert_eq!(report.players[1].structures.get("City"), Some(&1));
    }

    #[test]
    fn test_post_drains_across_river() {
        let runner = ScenarioRunner::new(duel_scenario(), quick_config());
        let report = runner.run(100).unwrap();
        assert!(report.tracers >= 3);
        assert!(!report.players[1].eliminated);
    }

    #[test]
    fn test_allies_are_not_drained() {
        let mut scenario = duel_scenario();
        scenario.alliances.push(("a".to_string(), "b".to_string()));
        let report = ScenarioRunner::new(scenario, quick_config()).run(100).unwrap();
        assert_eq!(report.tracers, 0);
    }

    #[test]
    fn test_scripted_conquest_captures_city() {
        let mut scenario = duel_scenario();
        scenario.conquests.push(ScriptedConquest {
            at_tick: 20,
            player: "a".to_string(),
            area: Area::new(11, 0, 19, 9),
        });
        let report = ScenarioRunner::new(scenario, quick_config()).run(30).unwrap();

        assert_eq!(report.structures_captured, 1);
        assert!(report.players[1].eliminated);
        assert_eq!(report.players[0].structures.get("City"), Some(&1));
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = ScenarioRunner::new(duel_scenario(), quick_config())
            .run(10)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("report.json");
        report.save(&path).unwrap();
        assert_eq!(RunReport::load(&path).unwrap(), report);
    }

    #[test]
    fn test_verify_is_deterministic() {
        let runner = ScenarioRunner::new(Scenario::border_skirmish(), GameConfig::default());
        let report = runner.verify_determinism(3, 450).unwrap();
        assert_eq!(report.hashes.len(), 3);
        assert!(report.is_deterministic());
    }

    #[test]
    fn test_invalid_scenario_reported() {
        let mut scenario = duel_scenario();
        scenario.players.clear();
        let runner = ScenarioRunner::new(scenario, quick_config());
        assert!(matches!(runner.run(1), Err(ScenarioError::Invalid(_))));
    }
}
