//! Visualization updates emitted during a tick.
//!
//! Updates are produced for the presentation layer and are never read back
//! by the simulation.

use serde::{Deserialize, Serialize};

use crate::map::TileRef;
use crate::player::PlayerId;
use crate::unit::{UnitId, UnitKind};

/// An update emitted for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameUpdate {
    /// A defense post drained troops from `target`.
    DefensePostTracer {
        /// Tile of the defense post.
        origin: TileRef,
        /// Enemy tile that was targeted.
        target: TileRef,
    },
    /// A structure was placed.
    UnitBuilt {
        /// New unit.
        unit: UnitId,
        /// Structure kind.
        kind: UnitKind,
        /// Owner at placement.
        owner: PlayerId,
        /// Anchor tile.
        tile: TileRef,
    },
    /// A structure lost a level but survived.
    UnitDowngraded {
        /// Affected unit.
        unit: UnitId,
        /// Level after the downgrade.
        level: u32,
    },
    /// A structure changed owner.
    UnitCaptured {
        /// Affected unit.
        unit: UnitId,
        /// Owner before the capture.
        previous_owner: PlayerId,
        /// Owner after the capture.
        owner: PlayerId,
    },
    /// A structure was removed from the world.
    UnitDestroyed {
        /// Removed unit.
        unit: UnitId,
        /// Structure kind.
        kind: UnitKind,
        /// Anchor tile.
        tile: TileRef,
    },
}
