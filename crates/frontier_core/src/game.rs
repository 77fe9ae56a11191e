//! Authoritative game state.
//!
//! [`Game`] owns the map, players and units and is the only writer of tile
//! ownership, unit ownership and unit levels. Executions receive `&mut Game`
//! each tick and go through the methods here, which keep the three views
//! (tile owner, player tile set, player unit list) consistent.
//!
//! # Determinism
//!
//! All collections are ordered (`BTreeMap`/`BTreeSet`), so iteration order is
//! identical on every run and every platform.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::map::{GameMap, TileRef};
use crate::player::{Player, PlayerId, TileGain};
use crate::unit::{Unit, UnitId, UnitKind};
use crate::updates::GameUpdate;
use crate::Tick;

/// The game world shared by all executions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Current simulation tick.
    tick: Tick,
    /// Rule tunables.
    config: GameConfig,
    /// Terrain and tile ownership.
    map: GameMap,
    /// Players by id.
    players: BTreeMap<PlayerId, Player>,
    /// Every unit ever built, including destroyed ones.
    units: BTreeMap<UnitId, Unit>,
    /// Active structure standing on each tile.
    structures: BTreeMap<TileRef, UnitId>,
    /// Next unit id to assign.
    next_unit_id: u32,
    /// Updates emitted during the current tick.
    #[serde(skip)]
    updates: Vec<GameUpdate>,
}

impl Game {
    /// Create a game on `map` with no players.
    #[must_use]
    pub fn new(map: GameMap, config: GameConfig) -> Self {
        Self {
            tick: 0,
            config,
            map,
            players: BTreeMap::new(),
            units: BTreeMap::new(),
            structures: BTreeMap::new(),
            next_unit_id: 1,
            updates: Vec::new(),
        }
    }

    /// Current tick.
    #[must_use]
    pub const fn ticks(&self) -> Tick {
        self.tick
    }

    /// Whether the game is still in its spawn phase.
    #[must_use]
    pub const fn in_spawn_phase(&self) -> bool {
        self.tick < self.config.spawn_phase_ticks
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Rule tunables.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Mutable access to tunables, for scenario setup and tests.
    pub fn config_mut(&mut self) -> &mut GameConfig {
        &mut self.config
    }

    /// Terrain and tile queries.
    #[must_use]
    pub const fn map(&self) -> &GameMap {
        &self.map
    }

    /// Owner of a tile.
    #[must_use]
    pub fn owner(&self, tile: TileRef) -> Option<PlayerId> {
        self.map.owner(tile)
    }

    /// Check if a tile is owned by anyone.
    #[must_use]
    pub fn has_owner(&self, tile: TileRef) -> bool {
        self.map.has_owner(tile)
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Register a new player and return its id.
    pub fn add_player(&mut self, name: impl Into<String>, troops: u32) -> PlayerId {
        let next = self
            .players
            .keys()
            .next_back()
            .map_or(0, |id| id.0.saturating_add(1));
        let id = PlayerId(next);
        self.players.insert(id, Player::new(id, name, troops));
        id
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .get_mut(&id)
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// All players in ascending id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Troop count of a player, 0 if unknown.
    #[must_use]
    pub fn troops(&self, id: PlayerId) -> u32 {
        self.player(id).map_or(0, Player::troops)
    }

    /// Add troops to a player.
    pub fn add_troops(&mut self, id: PlayerId, amount: u32) -> Result<()> {
        self.player_mut(id)?.add_troops(amount);
        Ok(())
    }

    /// Remove up to `amount` troops from a player.
    ///
    /// Returns the amount actually removed; 0 for unknown players.
    pub fn remove_troops(&mut self, id: PlayerId, amount: u32) -> u32 {
        self.players
            .get_mut(&id)
            .map_or(0, |player| player.remove_troops(amount))
    }

    /// Make two players allies of each other.
    pub fn set_alliance(&mut self, a: PlayerId, b: PlayerId) -> Result<()> {
        if a == b {
            return Err(GameError::InvalidState(
                "a player cannot ally itself".to_string(),
            ));
        }
        self.player(b).ok_or(GameError::UnknownPlayer(b))?;
        self.player_mut(a)?.add_ally(b);
        self.player_mut(b)?.add_ally(a);
        Ok(())
    }

    /// Dissolve an alliance between two players.
    pub fn break_alliance(&mut self, a: PlayerId, b: PlayerId) -> Result<()> {
        self.player(b).ok_or(GameError::UnknownPlayer(b))?;
        self.player_mut(a)?.remove_ally(b);
        self.player_mut(b)?.remove_ally(a);
        Ok(())
    }

    /// Check if `other` is friendly to `player`.
    #[must_use]
    pub fn is_friendly(&self, player: PlayerId, other: PlayerId) -> bool {
        self.player(player)
            .is_some_and(|p| p.is_friendly(other))
    }

    /// Troop growth per tick for a player under the current config.
    #[must_use]
    pub fn troop_increase_rate(&self, id: PlayerId) -> u32 {
        let Some(player) = self.player(id) else {
            return 0;
        };
        let recruitment_levels = self
            .units_of(id, UnitKind::RecruitmentCenter)
            .iter()
            .map(|unit| unit.level())
            .sum();
        self.config
            .troop_increase_rate(player.tile_count(), recruitment_levels)
    }

    /// Troop cap for a player under the current config.
    #[must_use]
    pub fn max_troops(&self, id: PlayerId) -> u32 {
        self.player(id)
            .map_or(0, |player| self.config.max_troops(player.tile_count()))
    }

    // ------------------------------------------------------------------
    // Territory
    // ------------------------------------------------------------------

    /// Give a tile to `player`, taking it from its previous owner.
    ///
    /// Structures on the tile are left alone; their fate is decided by the
    /// previous owner's adjudication on the next tick.
    pub fn conquer(&mut self, player: PlayerId, tile: TileRef) -> Result<()> {
        if !self.map.is_valid_ref(tile) {
            return Err(GameError::InvalidTile(tile));
        }
        if !self.map.is_land(tile) {
            return Err(GameError::InvalidState(format!(
                "cannot conquer water tile {tile:?}"
            )));
        }
        self.player(player).ok_or(GameError::UnknownPlayer(player))?;

        let previous = self.map.set_owner(tile, Some(player));
        if previous == Some(player) {
            return Ok(());
        }
        if let Some(previous) = previous {
            self.player_mut(previous)?.lose_tile(tile);
        }
        let tick = self.tick;
        self.player_mut(player)?.gain_tile(tile, tick);

        tracing::trace!(?tile, ?player, ?previous, "tile conquered");
        Ok(())
    }

    /// Make a tile unowned.
    pub fn relinquish(&mut self, tile: TileRef) -> Result<()> {
        if !self.map.is_valid_ref(tile) {
            return Err(GameError::InvalidTile(tile));
        }
        if let Some(previous) = self.map.set_owner(tile, None) {
            self.player_mut(previous)?.lose_tile(tile);
            tracing::trace!(?tile, ?previous, "tile relinquished");
        }
        Ok(())
    }

    /// Journal `id`'s conquests until turned off again.
    pub(crate) fn track_gains(&mut self, id: PlayerId, enabled: bool) -> Result<()> {
        self.player_mut(id)?.set_journal_gains(enabled);
        Ok(())
    }

    pub(crate) fn take_gained_tiles(&mut self, id: PlayerId) -> Vec<TileGain> {
        self.players
            .get_mut(&id)
            .map(Player::take_gained_tiles)
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Check whether `player` may place a `kind` structure on `tile`.
    ///
    /// Returns the tile the structure would be anchored to.
    pub fn can_build(&self, player: PlayerId, kind: UnitKind, tile: TileRef) -> Result<TileRef> {
        let reject = |reason| GameError::CannotBuild { kind, tile, reason };

        if !self.map.is_valid_ref(tile) {
            return Err(reject("tile is off the map"));
        }
        if self.player(player).is_none() {
            return Err(GameError::UnknownPlayer(player));
        }
        if !self.map.is_land(tile) {
            return Err(reject("tile is not land"));
        }
        if self.map.owner(tile) != Some(player) {
            return Err(reject("tile is not owned by the builder"));
        }
        if self.structures.contains_key(&tile) {
            return Err(reject("tile is already occupied"));
        }
        Ok(tile)
    }

    /// Place a level-1 structure for `player` on `tile`.
    ///
    /// Only checks that the tile is free and the player exists; callers that
    /// want the full placement rules call [`Game::can_build`] first.
    pub fn build_unit(&mut self, player: PlayerId, kind: UnitKind, tile: TileRef) -> Result<UnitId> {
        if !self.map.is_valid_ref(tile) {
            return Err(GameError::InvalidTile(tile));
        }
        if self.structures.contains_key(&tile) {
            return Err(GameError::CannotBuild {
                kind,
                tile,
                reason: "tile is already occupied",
            });
        }

        let id = UnitId(self.next_unit_id);
        self.player_mut(player)?.add_unit(id);
        self.next_unit_id += 1;
        self.units.insert(id, Unit::new(id, kind, player, tile));
        self.structures.insert(tile, id);

        tracing::debug!(unit = ?id, ?kind, owner = ?player, ?tile, "unit built");
        self.add_update(GameUpdate::UnitBuilt {
            unit: id,
            kind,
            owner: player,
            tile,
        });
        Ok(id)
    }

    /// Look up a unit, active or not.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Check if a unit exists and is active.
    #[must_use]
    pub fn is_unit_active(&self, id: UnitId) -> bool {
        self.unit(id).is_some_and(Unit::is_active)
    }

    /// Active structure standing on a tile.
    #[must_use]
    pub fn unit_at(&self, tile: TileRef) -> Option<&Unit> {
        self.structures.get(&tile).and_then(|id| self.unit(*id))
    }

    /// Active units of `kind` owned by `player`, by ascending id.
    #[must_use]
    pub fn units_of(&self, player: PlayerId, kind: UnitKind) -> Vec<&Unit> {
        let Some(owner) = self.player(player) else {
            return Vec::new();
        };
        owner
            .units()
            .iter()
            .filter_map(|id| self.unit(*id))
            .filter(|unit| unit.kind() == kind && unit.is_active())
            .collect()
    }

    /// Sum of levels of all active units of `kind`.
    #[must_use]
    pub fn unit_count(&self, kind: UnitKind) -> u32 {
        self.units
            .values()
            .filter(|unit| unit.kind() == kind && unit.is_active())
            .map(Unit::level)
            .sum()
    }

    /// Raise a unit's level by one, returning the new level.
    pub fn increase_level(&mut self, id: UnitId) -> Result<u32> {
        let unit = self.active_unit_mut(id)?;
        Ok(unit.increase_level())
    }

    /// Lower a unit's level by one, destroying it at level 0.
    ///
    /// Returns the new level.
    pub fn downgrade_unit(&mut self, id: UnitId) -> Result<u32> {
        let level = self.active_unit_mut(id)?.decrease_level();
        if level == 0 {
            self.delete_unit(id)?;
        } else {
            self.add_update(GameUpdate::UnitDowngraded { unit: id, level });
        }
        Ok(level)
    }

    /// Hand a unit to a new owner, keeping level and tile.
    pub fn capture_unit(&mut self, id: UnitId, new_owner: PlayerId) -> Result<()> {
        self.player(new_owner)
            .ok_or(GameError::UnknownPlayer(new_owner))?;
        let unit = self.active_unit_mut(id)?;
        let previous_owner = unit.owner();
        if previous_owner == new_owner {
            return Ok(());
        }
        unit.set_owner(new_owner);

        self.player_mut(previous_owner)?.remove_unit(id);
        self.player_mut(new_owner)?.add_unit(id);

        tracing::debug!(unit = ?id, from = ?previous_owner, to = ?new_owner, "unit captured");
        self.add_update(GameUpdate::UnitCaptured {
            unit: id,
            previous_owner,
            owner: new_owner,
        });
        Ok(())
    }

    /// Remove a unit from the world.
    ///
    /// The unit record is kept (inactive, level 0) so that executions holding
    /// its id observe the destruction.
    pub fn delete_unit(&mut self, id: UnitId) -> Result<()> {
        let unit = self.units.get_mut(&id).ok_or(GameError::UnknownUnit(id))?;
        let (owner, kind, tile) = (unit.owner(), unit.kind(), unit.tile());
        let was_listed = unit.is_active() || self.structures.get(&tile) == Some(&id);
        unit.deactivate();
        if !was_listed {
            return Ok(());
        }

        if self.structures.get(&tile) == Some(&id) {
            self.structures.remove(&tile);
        }
        if let Some(player) = self.players.get_mut(&owner) {
            player.remove_unit(id);
        }

        tracing::debug!(unit = ?id, ?kind, ?tile, "unit destroyed");
        self.add_update(GameUpdate::UnitDestroyed { unit: id, kind, tile });
        Ok(())
    }

    fn active_unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        match self.units.get_mut(&id) {
            Some(unit) if unit.is_active() => Ok(unit),
            _ => Err(GameError::UnknownUnit(id)),
        }
    }

    // ------------------------------------------------------------------
    // Updates and hashing
    // ------------------------------------------------------------------

    /// Emit an update for the presentation layer.
    pub fn add_update(&mut self, update: GameUpdate) {
        self.updates.push(update);
    }

    pub(crate) fn take_updates(&mut self) -> Vec<GameUpdate> {
        std::mem::take(&mut self.updates)
    }

    /// Compute a hash of the game state for determinism verification.
    ///
    /// Covers tick, tile ownership, players and units in sorted order.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        // Hash ownership tile by tile
        for index in 0..self.map.tile_count() {
            let tile = TileRef(u32::try_from(index).unwrap_or(u32::MAX));
            self.map.owner(tile).hash(&mut hasher);
        }

        self.players.len().hash(&mut hasher);
        for (id, player) in &self.players {
            id.hash(&mut hasher);
            player.troops().hash(&mut hasher);
            player.tile_count().hash(&mut hasher);
            player.allies().hash(&mut hasher);
        }

        self.units.len().hash(&mut hasher);
        for (id, unit) in &self.units {
            id.hash(&mut hasher);
            unit.kind().hash(&mut hasher);
            unit.level().hash(&mut hasher);
            unit.owner().hash(&mut hasher);
            unit.tile().hash(&mut hasher);
            unit.is_active().hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Check that tile owners, player tile sets, player unit lists and the
    /// structure index agree.
    pub fn check_consistency(&self) -> Result<()> {
        for index in 0..self.map.tile_count() {
            let tile = TileRef(u32::try_from(index).unwrap_or(u32::MAX));
            for (id, player) in &self.players {
                if player.owns(tile) != (self.map.owner(tile) == Some(*id)) {
                    return Err(GameError::InvalidState(format!(
                        "tile {tile:?} ownership disagrees for player {id:?}"
                    )));
                }
            }
        }

        for (tile, id) in &self.structures {
            let unit = self.units.get(id).ok_or(GameError::UnknownUnit(*id))?;
            if !unit.is_active() || unit.tile() != *tile {
                return Err(GameError::InvalidState(format!(
                    "structure index entry {tile:?} points at {id:?}"
                )));
            }
        }

        for (id, unit) in &self.units {
            let listed = self
                .players
                .get(&unit.owner())
                .is_some_and(|owner| owner.units().contains(id));
            if listed != unit.is_active() {
                return Err(GameError::InvalidState(format!(
                    "unit {id:?} active={} but listed={listed}",
                    unit.is_active()
                )));
            }
        }
        Ok(())
    }

    /// Serialize the game state to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize game: {e}")))
    }

    /// Deserialize game state from bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize game: {e}")))
    }
}
