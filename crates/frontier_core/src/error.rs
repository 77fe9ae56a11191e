//! Error types for the game simulation.

use thiserror::Error;

use crate::map::TileRef;
use crate::player::PlayerId;
use crate::unit::{UnitId, UnitKind};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Tile reference outside the map.
    #[error("Invalid tile: {0:?}")]
    InvalidTile(TileRef),

    /// Unknown player identifier.
    #[error("Unknown player: {0:?}")]
    UnknownPlayer(PlayerId),

    /// Unknown or already removed unit.
    #[error("Unknown unit: {0:?}")]
    UnknownUnit(UnitId),

    /// A structure cannot be placed on the requested tile.
    #[error("Cannot build {kind:?} on tile {tile:?}: {reason}")]
    CannotBuild {
        /// Structure kind requested.
        kind: UnitKind,
        /// Requested anchor tile.
        tile: TileRef,
        /// Why placement was rejected.
        reason: &'static str,
    },

    /// Configuration values are unusable.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Config file parsing error.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
