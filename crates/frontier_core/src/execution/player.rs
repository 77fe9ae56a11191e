//! Per-player orchestration.
//!
//! [`PlayerExecution`] runs in the [`ExecutionPhase::Territory`] phase, before
//! any structure execution of the same tick. Each tick it:
//!
//! 1. **Adjudicates** structures whose tile no longer belongs to the player.
//!    Defense posts lose a level (and are destroyed at level 0); every other
//!    structure changes hands intact. Structures left on unowned tiles are
//!    destroyed.
//! 2. **Records conquests** into its `held_since` ledger.
//! 3. **Grows troops** by the configured rate, up to the player's cap.
//! 4. **Scans for hamlets** every `hamlet_check_interval_ticks`, examining at
//!    most `hamlet_checks_per_interval` ledger entries so that the cost per
//!    scan does not depend on territory size.
//!
//! The execution terminates once a player that held land holds none.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::execution::{Execution, ExecutionPhase};
use crate::game::Game;
use crate::map::TileRef;
use crate::player::PlayerId;
use crate::unit::{CaptureRule, UnitId, UnitKind};
use crate::Tick;

/// Execution driving one player's territory bookkeeping.
#[derive(Debug)]
pub struct PlayerExecution {
    player: PlayerId,
    active: bool,
    /// Tick since which each tile has been held without interruption.
    held_since: BTreeMap<TileRef, Tick>,
    /// Last tile examined by the hamlet scan.
    scan_cursor: Option<TileRef>,
    last_scan: Tick,
    has_held_land: bool,
}

impl PlayerExecution {
    /// Create the orchestrator for `player`.
    #[must_use]
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            active: true,
            held_since: BTreeMap::new(),
            scan_cursor: None,
            last_scan: 0,
            has_held_land: false,
        }
    }

    /// Player this execution manages.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Tick since which `tile` has been continuously held, if tracked.
    #[must_use]
    pub fn held_since(&self, tile: TileRef) -> Option<Tick> {
        self.held_since.get(&tile).copied()
    }

    /// Number of tiles in the hamlet ledger.
    #[must_use]
    pub fn tracked_tiles(&self) -> usize {
        self.held_since.len()
    }

    fn adjudicate(&self, game: &mut Game) {
        let Some(player) = game.player(self.player) else {
            return;
        };
        let units: Vec<UnitId> = player.units().iter().copied().collect();

        for id in units {
            let Some(unit) = game.unit(id) else {
                continue;
            };
            if !unit.is_active() || unit.owner() != self.player {
                continue;
            }
            let (kind, tile) = (unit.kind(), unit.tile());

            let result = match game.owner(tile) {
                Some(owner) if owner == self.player => continue,
                Some(conqueror) => match kind.capture_rule() {
                    CaptureRule::Downgrade => game.downgrade_unit(id).and_then(|level| {
                        if level > 0 {
                            game.capture_unit(id, conqueror)
                        } else {
                            Ok(())
                        }
                    }),
                    CaptureRule::Transfer => game.capture_unit(id, conqueror),
                },
                None => game.delete_unit(id),
            };

            if let Err(err) = result {
                tracing::error!(unit = ?id, ?kind, ?tile, error = %err, "adjudication failed");
            }
        }
    }

    fn record_gains(&mut self, game: &mut Game) {
        for gain in game.take_gained_tiles(self.player) {
            self.held_since.insert(gain.tile, gain.tick);
        }
    }

    fn grow_troops(&self, game: &mut Game) {
        let troops = game.troops(self.player);
        let headroom = game.max_troops(self.player).saturating_sub(troops);
        let growth = game.troop_increase_rate(self.player).min(headroom);
        if growth == 0 {
            return;
        }
        if let Err(err) = game.add_troops(self.player, growth) {
            tracing::warn!(player = ?self.player, error = %err, "troop growth failed");
        }
    }

    /// Examine the next batch of ledger entries, wrapping around the end.
    fn scan_for_hamlets(&mut self, game: &mut Game, ticks: Tick) {
        let budget = game.config().hamlet_checks_per_interval as usize;
        let hold = game.config().hamlet_hold_duration_ticks;

        let (tail, head) = match self.scan_cursor {
            Some(cursor) => (Bound::Excluded(cursor), Bound::Included(cursor)),
            None => (Bound::Unbounded, Bound::Excluded(TileRef(0))),
        };
        let batch: Vec<(TileRef, Tick)> = self
            .held_since
            .range((tail, Bound::Unbounded))
            .chain(self.held_since.range((Bound::Unbounded, head)))
            .take(budget)
            .map(|(tile, since)| (*tile, *since))
            .collect();

        for (tile, since) in batch {
            self.scan_cursor = Some(tile);

            if game.owner(tile) != Some(self.player) {
                self.held_since.remove(&tile);
                continue;
            }
            if ticks.saturating_sub(since) < hold || !is_enclosed(game, self.player, tile) {
                continue;
            }
            if game.can_build(self.player, UnitKind::Hamlet, tile).is_err() {
                continue;
            }

            match game.build_unit(self.player, UnitKind::Hamlet, tile) {
                Ok(unit) => {
                    tracing::debug!(player = ?self.player, ?tile, ?unit, held_for = ticks - since, "hamlet spawned");
                    self.held_since.remove(&tile);
                }
                Err(err) => {
                    tracing::warn!(player = ?self.player, ?tile, error = %err, "hamlet spawn failed");
                }
            }
        }
    }
}

/// Land tile whose neighbors are all held by `player` or by nobody.
fn is_enclosed(game: &Game, player: PlayerId, tile: TileRef) -> bool {
    game.map().is_land(tile)
        && game
            .map()
            .neighbors(tile)
            .into_iter()
            .all(|neighbor| game.owner(neighbor).map_or(true, |owner| owner == player))
}

impl Execution for PlayerExecution {
    fn name(&self) -> &'static str {
        "PlayerExecution"
    }

    fn init(&mut self, game: &mut Game, ticks: Tick) {
        self.last_scan = ticks;
        let Some(player) = game.player(self.player) else {
            tracing::warn!(player = ?self.player, "player execution for unknown player");
            self.active = false;
            return;
        };
        self.has_held_land = player.is_alive();
        self.held_since = player.tiles().iter().map(|tile| (*tile, ticks)).collect();
        if let Err(err) = game.track_gains(self.player, true) {
            tracing::warn!(player = ?self.player, error = %err, "conquest journal unavailable");
        }
    }

    fn tick(&mut self, game: &mut Game, ticks: Tick) {
        if !self.active {
            return;
        }

        self.adjudicate(game);
        self.record_gains(game);
        self.grow_troops(game);

        if ticks.saturating_sub(self.last_scan) >= game.config().hamlet_check_interval_ticks {
            self.last_scan = ticks;
            self.scan_for_hamlets(game, ticks);
        }

        let alive = game.player(self.player).is_some_and(|p| p.is_alive());
        if alive {
            self.has_held_land = true;
        } else if self.has_held_land {
            tracing::info!(player = ?self.player, tick = ticks, "player eliminated");
            self.active = false;
            self.held_since.clear();
            if let Err(err) = game.track_gains(self.player, false) {
                tracing::warn!(player = ?self.player, error = %err, "conquest journal not released");
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }

    fn phase(&self) -> ExecutionPhase {
        ExecutionPhase::Territory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::map::GameMap;

    fn setup() -> (Game, PlayerId, PlayerId) {
        let config = GameConfig {
            spawn_phase_ticks: 0,
            hamlet_hold_duration_ticks: 5,
            hamlet_check_interval_ticks: 1,
            hamlet_checks_per_interval: 100,
            ..GameConfig::default()
        };
        let mut game = Game::new(GameMap::new(12, 12), config);
        let red = game.add_player("red", 1000);
        let blue = game.add_player("blue", 1000);
        (game, red, blue)
    }

    fn run(game: &mut Game, exec: &mut PlayerExecution, ticks: u64) {
        for _ in 0..ticks {
            let now = game.ticks();
            if exec.is_active() {
                exec.tick(game, now);
            }
            game.advance_tick();
        }
    }

    #[test]
    fn test_defense_post_downgraded_and_transferred() {
        let (mut game, red, blue) = setup();
        let tile = game.map().ref_at(5, 5);
        game.conquer(red, tile).unwrap();
        game.conquer(red, game.map().ref_at(0, 0)).unwrap();
        let post = game.build_unit(red, UnitKind::DefensePost, tile).unwrap();
        game.increase_level(post).unwrap();
        game.increase_level(post).unwrap();

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);

        game.conquer(blue, tile).unwrap();
        run(&mut game, &mut exec, 1);

        let unit = game.unit(post).unwrap();
        assert_eq!(unit.level(), 2);
        assert_eq!(unit.owner(), blue);
        assert!(unit.is_active());

        // Already transferred: red's execution must not touch it again
        run(&mut game, &mut exec, 3);
        assert!(exec.is_active());
        assert_eq!(game.unit(post).unwrap().level(), 2);
    }

    #[test]
    fn test_level_one_defense_post_destroyed() {
        let (mut game, red, blue) = setup();
        let tile = game.map().ref_at(5, 5);
        game.conquer(red, tile).unwrap();
        game.conquer(red, game.map().ref_at(0, 0)).unwrap();
        let post = game.build_unit(red, UnitKind::DefensePost, tile).unwrap();

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        game.conquer(blue, tile).unwrap();
        run(&mut game, &mut exec, 1);

        assert!(!game.is_unit_active(post));
        assert_eq!(game.unit_count(UnitKind::DefensePost), 0);
        assert!(game.units_of(blue, UnitKind::DefensePost).is_empty());
    }

    #[test]
    fn test_structure_on_relinquished_tile_destroyed() {
        let (mut game, red, _) = setup();
        let tile = game.map().ref_at(5, 5);
        game.conquer(red, tile).unwrap();
        game.conquer(red, game.map().ref_at(0, 0)).unwrap();
        let city = game.build_unit(red, UnitKind::City, tile).unwrap();

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        game.relinquish(tile).unwrap();
        run(&mut game, &mut exec, 1);

        assert!(!game.is_unit_active(city));
    }

    #[test]
    fn test_hamlet_scan_respects_budget() {
        let (mut game, red, _) = setup();
        game.config_mut().hamlet_checks_per_interval = 2;
        game.config_mut().hamlet_hold_duration_ticks = 0;
        for x in 0..6 {
            game.conquer(red, game.map().ref_at(x, 0)).unwrap();
        }

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        assert_eq!(exec.tracked_tiles(), 6);

        // Tick 0 does not scan; tick 1 examines two tiles
        run(&mut game, &mut exec, 2);
        assert_eq!(game.unit_count(UnitKind::Hamlet), 2);

        run(&mut game, &mut exec, 1);
        assert_eq!(game.unit_count(UnitKind::Hamlet), 4);

        run(&mut game, &mut exec, 1);
        assert_eq!(game.unit_count(UnitKind::Hamlet), 6);
        assert_eq!(exec.tracked_tiles(), 0);
    }

    #[test]
    fn test_non_qualifying_tiles_consume_scan_budget() {
        let (mut game, red, blue) = setup();
        game.config_mut().hamlet_checks_per_interval = 2;
        game.config_mut().hamlet_hold_duration_ticks = 0;
        for x in 0..6 {
            game.conquer(red, game.map().ref_at(x, 0)).unwrap();
        }
        // Enemy land below the first four tiles keeps them contested
        for x in 0..4 {
            game.conquer(blue, game.map().ref_at(x, 1)).unwrap();
        }

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        assert_eq!(exec.tracked_tiles(), 6);

        // Ticks 1 and 2 spend the whole budget on contested tiles
        run(&mut game, &mut exec, 2);
        assert_eq!(exec.scan_cursor, Some(game.map().ref_at(1, 0)));
        assert_eq!(game.unit_count(UnitKind::Hamlet), 0);

        run(&mut game, &mut exec, 1);
        assert_eq!(exec.scan_cursor, Some(game.map().ref_at(3, 0)));
        assert_eq!(game.unit_count(UnitKind::Hamlet), 0);

        run(&mut game, &mut exec, 1);
        assert_eq!(game.unit_count(UnitKind::Hamlet), 2);
        assert!(game.unit_at(game.map().ref_at(4, 0)).is_some());
        assert!(game.unit_at(game.map().ref_at(5, 0)).is_some());
        assert_eq!(exec.tracked_tiles(), 4);

        // The cursor wraps back to the start of the ledger
        run(&mut game, &mut exec, 1);
        assert_eq!(exec.scan_cursor, Some(game.map().ref_at(1, 0)));
        assert_eq!(game.unit_count(UnitKind::Hamlet), 2);
    }

    #[test]
    fn test_hamlet_requires_hold_duration() {
        let (mut game, red, _) = setup();
        let tile = game.map().ref_at(5, 5);

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        run(&mut game, &mut exec, 3);

        game.conquer(red, tile).unwrap();
        run(&mut game, &mut exec, 5);
        assert_eq!(exec.held_since(tile), Some(3));
        assert_eq!(game.unit_count(UnitKind::Hamlet), 0);

        run(&mut game, &mut exec, 1);
        assert_eq!(game.unit_at(tile).map(|u| u.kind()), Some(UnitKind::Hamlet));
    }

    #[test]
    fn test_hamlet_blocked_by_enemy_neighbor() {
        let (mut game, red, blue) = setup();
        let tile = game.map().ref_at(5, 5);
        game.conquer(red, tile).unwrap();
        game.conquer(blue, game.map().ref_at(6, 5)).unwrap();

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        run(&mut game, &mut exec, 20);

        assert_eq!(game.unit_count(UnitKind::Hamlet), 0);
    }

    #[test]
    fn test_regained_tile_resets_hold() {
        let (mut game, red, blue) = setup();
        let tile = game.map().ref_at(5, 5);
        game.conquer(red, game.map().ref_at(0, 0)).unwrap();
        game.conquer(red, tile).unwrap();
        game.config_mut().hamlet_checks_per_interval = 0;

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        run(&mut game, &mut exec, 4);

        game.conquer(blue, tile).unwrap();
        run(&mut game, &mut exec, 1);
        game.conquer(red, tile).unwrap();
        run(&mut game, &mut exec, 1);

        assert_eq!(exec.held_since(tile), Some(5));
    }

    #[test]
    fn test_troop_growth_capped() {
        let (mut game, red, _) = setup();
        game.conquer(red, game.map().ref_at(1, 1)).unwrap();
        let cap = game.max_troops(red);

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        run(&mut game, &mut exec, 1);
        assert_eq!(game.troops(red), 1000 + game.troop_increase_rate(red));

        run(&mut game, &mut exec, 10_000);
        assert_eq!(game.troops(red), cap);
    }

    #[test]
    fn test_terminates_when_eliminated() {
        let (mut game, red, blue) = setup();
        let tile = game.map().ref_at(1, 1);
        game.conquer(red, tile).unwrap();

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        run(&mut game, &mut exec, 1);
        assert!(exec.is_active());

        game.conquer(blue, tile).unwrap();
        run(&mut game, &mut exec, 1);
        assert!(!exec.is_active());
    }

    #[test]
    fn test_eliminated_player_stops_journaling() {
        let (mut game, red, blue) = setup();
        let tile = game.map().ref_at(1, 1);
        game.conquer(red, tile).unwrap();

        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        game.conquer(blue, tile).unwrap();
        run(&mut game, &mut exec, 1);
        assert!(!exec.is_active());
        assert_eq!(exec.tracked_tiles(), 0);

        for _ in 0..100 {
            game.conquer(red, tile).unwrap();
            game.conquer(blue, tile).unwrap();
        }
        assert!(game.take_gained_tiles(red).is_empty());
    }

    #[test]
    fn test_landless_player_stays_active() {
        let (mut game, red, _) = setup();
        let mut exec = PlayerExecution::new(red);
        exec.init(&mut game, 0);
        run(&mut game, &mut exec, 5);
        assert!(exec.is_active());
    }
}
