//! Test fixtures and helpers.
//!
//! Pre-built maps, configs and simulations for consistent testing.

use fixed::types::I32F32;
use frontier_core::prelude::*;

/// Map width used by [`duel`].
pub const DUEL_MAP_SIZE: u32 = 100;

/// Troops each player starts with in [`duel`].
pub const STARTING_TROOPS: u32 = 1000;

/// Fraction as a config file would load it from a decimal such as `0.05`.
#[must_use]
pub fn fraction(decimal: f64) -> I32F32 {
    I32F32::from_num(decimal)
}

/// Config with a short spawn phase and fast hamlet checks.
#[must_use]
pub fn test_config() -> GameConfig {
    GameConfig {
        spawn_phase_ticks: 10,
        hamlet_hold_duration_ticks: 5,
        hamlet_check_interval_ticks: 1,
        hamlet_checks_per_interval: 100,
        ..GameConfig::default()
    }
}

/// Render a config as pretty RON.
///
/// # Panics
///
/// Panics if the config cannot be serialized.
#[must_use]
pub fn config_to_ron(config: &GameConfig) -> String {
    ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::default())
        .expect("config serializes to RON")
}

/// All-land map of the given size.
#[must_use]
pub fn plains(width: u32, height: u32) -> GameMap {
    GameMap::new(width, height)
}

/// Give every tile in the inclusive rectangle to `player`.
///
/// # Panics
///
/// Panics if any tile is off the map or water.
pub fn claim_rect(game: &mut Game, player: PlayerId, from: (u32, u32), to: (u32, u32)) {
    for x in from.0..=to.0 {
        for y in from.1..=to.1 {
            let tile = game.map().ref_at(x, y);
            game.conquer(player, tile).expect("claimable tile");
        }
    }
}

/// Advance `sim` by `ticks` ticks.
pub fn execute_ticks(sim: &mut Simulation, ticks: u64) {
    for _ in 0..ticks {
        sim.tick();
    }
}

/// First land tile at least ten tiles from the edge whose neighbors are all
/// land.
#[must_use]
pub fn find_interior_land_tile(game: &Game) -> Option<TileRef> {
    let map = game.map();
    for x in 10..map.width().saturating_sub(10) {
        for y in 10..map.height().saturating_sub(10) {
            let candidate = map.ref_at(x, y);
            if !map.is_land(candidate) {
                continue;
            }
            if map.neighbors(candidate).iter().all(|n| map.is_land(*n)) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Two players on open plains, past the spawn phase, with the first
/// player's orchestrator registered.
#[derive(Debug)]
pub struct Duel {
    /// The running simulation.
    pub sim: Simulation,
    /// Player with a [`PlayerExecution`].
    pub player: PlayerId,
    /// Opponent, without an orchestrator.
    pub other: PlayerId,
}

impl Duel {
    /// Tile at `(x, y)`.
    #[must_use]
    pub fn tile(&self, x: u32, y: u32) -> TileRef {
        self.sim.game().map().ref_at(x, y)
    }

    /// Give `tile` to `player`.
    ///
    /// # Panics
    ///
    /// Panics if the tile cannot be conquered.
    pub fn conquer(&mut self, player: PlayerId, tile: TileRef) {
        self.sim
            .game_mut()
            .conquer(player, tile)
            .expect("conquerable tile");
    }
}

/// Build a [`Duel`] on a [`DUEL_MAP_SIZE`] square map.
#[must_use]
pub fn duel() -> Duel {
    duel_with_config(test_config())
}

/// Build a [`Duel`] with a custom config.
#[must_use]
pub fn duel_with_config(config: GameConfig) -> Duel {
    let mut game = Game::new(plains(DUEL_MAP_SIZE, DUEL_MAP_SIZE), config);
    let player = game.add_player("player", STARTING_TROOPS);
    let other = game.add_player("other", STARTING_TROOPS);

    let mut sim = Simulation::new(game);
    while sim.game().in_spawn_phase() {
        sim.tick();
    }
    sim.add_execution(Box::new(PlayerExecution::new(player)));

    Duel { sim, player, other }
}
