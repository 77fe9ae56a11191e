//! Defense post: builds the structure, then periodically drains troops from a
//! nearby enemy.
//!
//! # Drain cycle
//!
//! Every `defense_post_attack_rate` ticks (measured from the previous
//! attempt, successful or not) the post:
//!
//! 1. collects enemy land tiles in a Manhattan diamond of
//!    `defense_post_targeting_range` around itself,
//! 2. picks one uniformly with its seeded generator,
//! 3. removes `min(troops, max(minimum, floor(troops * percent)))` troops
//!    from the tile's owner,
//! 4. emits a tracer update if anything was actually removed.

use crate::execution::structure::{live_owner, place};
use crate::execution::{Execution, ExecutionPhase};
use crate::game::Game;
use crate::map::TileRef;
use crate::player::PlayerId;
use crate::random::{structure_seed, DeterministicRng};
use crate::unit::{UnitId, UnitKind};
use crate::updates::GameUpdate;
use crate::Tick;

#[derive(Debug)]
enum PostState {
    /// Registered but not yet initialized; has no generator.
    Pending,
    Unbuilt { rng: DeterministicRng },
    Built { post: UnitId, rng: DeterministicRng },
    Terminated,
}

/// Execution driving one defense post.
#[derive(Debug)]
pub struct DefensePostExecution {
    /// Player that requested the post; the unit's owner takes over once built.
    owner: PlayerId,
    tile: TileRef,
    last_drain_attempt: Tick,
    state: PostState,
}

impl DefensePostExecution {
    /// Request a defense post for `owner` on `tile`.
    #[must_use]
    pub fn new(owner: PlayerId, tile: TileRef) -> Self {
        Self {
            owner,
            tile,
            last_drain_attempt: 0,
            state: PostState::Pending,
        }
    }

    /// The post's unit once built.
    #[must_use]
    pub fn unit(&self) -> Option<UnitId> {
        match self.state {
            PostState::Built { post, .. } => Some(post),
            PostState::Pending | PostState::Unbuilt { .. } | PostState::Terminated => None,
        }
    }

    /// Seed of the post's generator, once initialized.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        match &self.state {
            PostState::Unbuilt { rng } | PostState::Built { rng, .. } => Some(rng.seed()),
            PostState::Pending | PostState::Terminated => None,
        }
    }

    /// Owner observed on the most recent tick.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Tick of the most recent drain attempt.
    #[must_use]
    pub const fn last_drain_attempt(&self) -> Tick {
        self.last_drain_attempt
    }

    fn try_troop_drain(&mut self, game: &mut Game, post: UnitId) {
        let ticks = game.ticks();
        if ticks.saturating_sub(self.last_drain_attempt) < game.config().defense_post_attack_rate {
            return;
        }
        self.last_drain_attempt = ticks;

        let PostState::Built { rng, .. } = &mut self.state else {
            return;
        };

        let Some(target) = pick_enemy_tile(game, post, rng) else {
            return;
        };
        let Some(target_owner) = game.owner(target) else {
            return;
        };

        let amount = game
            .config()
            .defense_post_drain_amount(game.troops(target_owner));
        if amount == 0 {
            return;
        }

        let removed = game.remove_troops(target_owner, amount);
        if removed == 0 {
            return;
        }

        tracing::trace!(?post, ?target, ?target_owner, removed, "defense post drained troops");
        game.add_update(GameUpdate::DefensePostTracer {
            origin: self.tile,
            target,
        });
    }
}

/// Choose an enemy land tile within range of the post.
///
/// Candidates are collected in the map's fixed diamond order and indexed with
/// one draw from `rng`; no draw is made when there are no candidates.
fn pick_enemy_tile(game: &Game, post: UnitId, rng: &mut DeterministicRng) -> Option<TileRef> {
    let unit = game.unit(post)?;
    let owner = unit.owner();
    let range = game.config().defense_post_targeting_range;

    let candidates: Vec<TileRef> = game
        .map()
        .tiles_within_manhattan(unit.tile(), range)
        .into_iter()
        .filter(|&tile| game.map().is_land(tile))
        .filter(|&tile| match game.owner(tile) {
            Some(tile_owner) => tile_owner != owner && !game.is_friendly(owner, tile_owner),
            None => false,
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }
    let index = rng.next_index(candidates.len());
    candidates.get(index).copied()
}

impl Execution for DefensePostExecution {
    fn name(&self) -> &'static str {
        "DefensePostExecution"
    }

    fn init(&mut self, _game: &mut Game, ticks: Tick) {
        self.state = PostState::Unbuilt {
            rng: DeterministicRng::new(structure_seed(ticks, self.tile)),
        };
        self.last_drain_attempt = ticks;
    }

    fn tick(&mut self, game: &mut Game, _ticks: Tick) {
        let post = match std::mem::replace(&mut self.state, PostState::Terminated) {
            PostState::Terminated => return,
            PostState::Pending => {
                tracing::warn!(tile = ?self.tile, "defense post ticked before init, terminating");
                return;
            }
            PostState::Built { post, rng } => {
                self.state = PostState::Built { post, rng };
                post
            }
            PostState::Unbuilt { rng } => {
                let Some(post) = place(game, self.owner, UnitKind::DefensePost, self.tile) else {
                    return;
                };
                self.state = PostState::Built { post, rng };
                post
            }
        };

        let Some(owner) = live_owner(game, post) else {
            tracing::debug!(?post, tile = ?self.tile, "defense post gone, terminating");
            self.state = PostState::Terminated;
            return;
        };
        self.owner = owner;

        self.try_troop_drain(game, post);
    }

    fn is_active(&self) -> bool {
        !matches!(self.state, PostState::Terminated)
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }

    fn phase(&self) -> ExecutionPhase {
        ExecutionPhase::Structure
    }
}
