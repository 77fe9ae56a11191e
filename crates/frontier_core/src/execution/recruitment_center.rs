//! Recruitment center: a passive structure.
//!
//! The growth bonus is read by [`crate::game::Game::troop_increase_rate`]
//! from the owner's active recruitment centers; this execution only places
//! the structure and retires once it is destroyed.

use crate::execution::structure::{live_owner, place};
use crate::execution::Execution;
use crate::game::Game;
use crate::map::TileRef;
use crate::player::PlayerId;
use crate::unit::{UnitId, UnitKind};
use crate::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CenterState {
    Unbuilt,
    Built(UnitId),
    Terminated,
}

/// Execution driving one recruitment center.
#[derive(Debug)]
pub struct RecruitmentCenterExecution {
    owner: PlayerId,
    tile: TileRef,
    state: CenterState,
}

impl RecruitmentCenterExecution {
    /// Request a recruitment center for `owner` on `tile`.
    #[must_use]
    pub fn new(owner: PlayerId, tile: TileRef) -> Self {
        Self {
            owner,
            tile,
            state: CenterState::Unbuilt,
        }
    }

    /// The structure's unit once built.
    #[must_use]
    pub fn unit(&self) -> Option<UnitId> {
        match self.state {
            CenterState::Built(unit) => Some(unit),
            CenterState::Unbuilt | CenterState::Terminated => None,
        }
    }

    /// Owner observed on the most recent tick.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }
}

impl Execution for RecruitmentCenterExecution {
    fn name(&self) -> &'static str {
        "RecruitmentCenterExecution"
    }

    fn init(&mut self, _game: &mut Game, _ticks: Tick) {}

    fn tick(&mut self, game: &mut Game, _ticks: Tick) {
        let center = match self.state {
            CenterState::Terminated => return,
            CenterState::Built(center) => center,
            CenterState::Unbuilt => {
                let Some(center) = place(game, self.owner, UnitKind::RecruitmentCenter, self.tile)
                else {
                    self.state = CenterState::Terminated;
                    return;
                };
                self.state = CenterState::Built(center);
                center
            }
        };

        match live_owner(game, center) {
            Some(owner) => self.owner = owner,
            None => self.state = CenterState::Terminated,
        }
    }

    fn is_active(&self) -> bool {
        self.state != CenterState::Terminated
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}
