//! Helpers shared by structure executions.

use crate::game::Game;
use crate::map::TileRef;
use crate::player::PlayerId;
use crate::unit::{UnitId, UnitKind};

/// Try to place a structure, logging a warning on failure.
pub(super) fn place(
    game: &mut Game,
    builder: PlayerId,
    kind: UnitKind,
    tile: TileRef,
) -> Option<UnitId> {
    let placed = game
        .can_build(builder, kind, tile)
        .and_then(|anchor| game.build_unit(builder, kind, anchor));

    match placed {
        Ok(unit) => Some(unit),
        Err(err) => {
            tracing::warn!(?kind, ?tile, owner = ?builder, error = %err, "cannot build {}", kind.display_name());
            None
        }
    }
}

/// Current owner of a structure, `None` once it has been destroyed.
pub(super) fn live_owner(game: &Game, unit: UnitId) -> Option<PlayerId> {
    game.unit(unit)
        .filter(|unit| unit.is_active())
        .map(|unit| unit.owner())
}
