//! Player state: troops, territory, structures and alliances.
//!
//! Players are mutated through [`crate::game::Game`] so that tile ownership,
//! unit lists and the conquest journal stay consistent with each other.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::map::TileRef;
use crate::unit::UnitId;
use crate::Tick;

/// Unique identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u16);

/// A tile gained by a player and the tick it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileGain {
    /// Tile that changed hands.
    pub tile: TileRef,
    /// Tick on which the conquest happened.
    pub tick: Tick,
}

/// Aggregate state for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    troops: u32,
    tiles: BTreeSet<TileRef>,
    units: BTreeSet<UnitId>,
    allies: BTreeSet<PlayerId>,
    /// Conquests not yet consumed by this player's execution.
    gained: Vec<TileGain>,
    /// Whether conquests are journaled at all.
    #[serde(default)]
    journal_gains: bool,
}

impl Player {
    /// Create a player with no territory.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, troops: u32) -> Self {
        Self {
            id,
            name: name.into(),
            troops,
            tiles: BTreeSet::new(),
            units: BTreeSet::new(),
            allies: BTreeSet::new(),
            gained: Vec::new(),
            journal_gains: false,
        }
    }

    /// Player identifier.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current troop count.
    #[must_use]
    pub const fn troops(&self) -> u32 {
        self.troops
    }

    /// Owned tiles in ascending reference order.
    #[must_use]
    pub fn tiles(&self) -> &BTreeSet<TileRef> {
        &self.tiles
    }

    /// Number of owned tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Check if the player owns a tile.
    #[must_use]
    pub fn owns(&self, tile: TileRef) -> bool {
        self.tiles.contains(&tile)
    }

    /// Active units owned by this player, by ascending id.
    #[must_use]
    pub fn units(&self) -> &BTreeSet<UnitId> {
        &self.units
    }

    /// Players allied with this one.
    #[must_use]
    pub fn allies(&self) -> &BTreeSet<PlayerId> {
        &self.allies
    }

    /// Check if another player is friendly (allied) to this one.
    #[must_use]
    pub fn is_friendly(&self, other: PlayerId) -> bool {
        self.allies.contains(&other)
    }

    /// A player is alive while it holds territory.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.tiles.is_empty()
    }

    /// Add troops, saturating at `u32::MAX`.
    pub(crate) fn add_troops(&mut self, amount: u32) {
        self.troops = self.troops.saturating_add(amount);
    }

    /// Remove up to `amount` troops.
    ///
    /// Returns the actual amount removed, which is less than requested when
    /// the player has fewer troops.
    pub(crate) fn remove_troops(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.troops);
        self.troops -= removed;
        removed
    }

    pub(crate) fn gain_tile(&mut self, tile: TileRef, tick: Tick) {
        self.tiles.insert(tile);
        if self.journal_gains {
            self.gained.push(TileGain { tile, tick });
        }
    }

    pub(crate) fn lose_tile(&mut self, tile: TileRef) {
        self.tiles.remove(&tile);
    }

    /// Start or stop journaling conquests. Stopping discards pending entries.
    pub(crate) fn set_journal_gains(&mut self, enabled: bool) {
        self.journal_gains = enabled;
        if !enabled {
            self.gained.clear();
        }
    }

    pub(crate) fn take_gained_tiles(&mut self) -> Vec<TileGain> {
        std::mem::take(&mut self.gained)
    }

    pub(crate) fn add_unit(&mut self, unit: UnitId) {
        self.units.insert(unit);
    }

    pub(crate) fn remove_unit(&mut self, unit: UnitId) {
        self.units.remove(&unit);
    }

    pub(crate) fn add_ally(&mut self, other: PlayerId) {
        self.allies.insert(other);
    }

    pub(crate) fn remove_ally(&mut self, other: PlayerId) {
        self.allies.remove(&other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_troops_is_capped() {
        let mut player = Player::new(PlayerId(1), "red", 100);

        assert_eq!(player.remove_troops(30), 30);
        assert_eq!(player.troops(), 70);

        assert_eq!(player.remove_troops(500), 70);
        assert_eq!(player.troops(), 0);

        assert_eq!(player.remove_troops(10), 0);
    }

    #[test]
    fn test_add_troops_saturates() {
        let mut player = Player::new(PlayerId(1), "red", u32::MAX - 5);
        player.add_troops(100);
        assert_eq!(player.troops(), u32::MAX);
    }

    #[test]
    fn test_gain_journal_is_drained_once() {
        let mut player = Player::new(PlayerId(1), "red", 0);
        player.set_journal_gains(true);
        player.gain_tile(TileRef(4), 10);
        player.gain_tile(TileRef(5), 11);

        assert!(player.is_alive());
        let gains = player.take_gained_tiles();
        assert_eq!(gains.len(), 2);
        assert_eq!(gains[0], TileGain { tile: TileRef(4), tick: 10 });
        assert!(player.take_gained_tiles().is_empty());
    }

    #[test]
    fn test_gains_not_journaled_while_untracked() {
        let mut player = Player::new(PlayerId(1), "red", 0);
        player.gain_tile(TileRef(4), 10);
        assert!(player.owns(TileRef(4)));
        assert!(player.take_gained_tiles().is_empty());

        player.set_journal_gains(true);
        player.gain_tile(TileRef(5), 11);
        player.set_journal_gains(false);
        assert!(player.take_gained_tiles().is_empty());
    }

    #[test]
    fn test_lose_tile() {
        let mut player = Player::new(PlayerId(1), "red", 0);
        player.gain_tile(TileRef(4), 0);
        player.lose_tile(TileRef(4));

        assert!(!player.owns(TileRef(4)));
        assert!(!player.is_alive());
    }

    #[test]
    fn test_friendliness() {
        let mut player = Player::new(PlayerId(1), "red", 0);
        assert!(!player.is_friendly(PlayerId(2)));

        player.add_ally(PlayerId(2));
        assert!(player.is_friendly(PlayerId(2)));

        player.remove_ally(PlayerId(2));
        assert!(!player.is_friendly(PlayerId(2)));
    }
}
