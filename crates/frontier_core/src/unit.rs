//! Structure instances placed on tiles.

use serde::{Deserialize, Serialize};

use crate::map::TileRef;
use crate::player::PlayerId;

/// Unique identifier for units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Structure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Settlement; changes hands intact when its tile is taken.
    City,
    /// Defensive structure that drains nearby enemy troops.
    DefensePost,
    /// Passive structure that boosts its owner's troop growth.
    RecruitmentCenter,
    /// Small settlement spawned on long-held safe tiles.
    Hamlet,
}

/// What happens to a structure when its tile is conquered by another player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureRule {
    /// Lose one level; destroyed at level 0, otherwise transferred.
    Downgrade,
    /// Transferred to the conqueror unchanged.
    Transfer,
}

impl UnitKind {
    /// All structure kinds.
    pub const ALL: [Self; 4] = [
        Self::City,
        Self::DefensePost,
        Self::RecruitmentCenter,
        Self::Hamlet,
    ];

    /// Capture rule applied during ownership adjudication.
    #[must_use]
    pub const fn capture_rule(self) -> CaptureRule {
        match self {
            Self::DefensePost => CaptureRule::Downgrade,
            Self::City | Self::RecruitmentCenter | Self::Hamlet => CaptureRule::Transfer,
        }
    }

    /// Display name for logs and reports.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::City => "City",
            Self::DefensePost => "Defense Post",
            Self::RecruitmentCenter => "Recruitment Center",
            Self::Hamlet => "Hamlet",
        }
    }
}

/// A placed structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    kind: UnitKind,
    level: u32,
    owner: PlayerId,
    tile: TileRef,
    active: bool,
}

impl Unit {
    pub(crate) const fn new(id: UnitId, kind: UnitKind, owner: PlayerId, tile: TileRef) -> Self {
        Self {
            id,
            kind,
            level: 1,
            owner,
            tile,
            active: true,
        }
    }

    /// Unit identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Structure kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Current level; 0 once destroyed.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Current owner.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Anchor tile.
    #[must_use]
    pub const fn tile(&self) -> TileRef {
        self.tile
    }

    /// Whether the unit still exists in the world.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active && self.level > 0
    }

    pub(crate) fn set_owner(&mut self, owner: PlayerId) {
        self.owner = owner;
    }

    pub(crate) fn increase_level(&mut self) -> u32 {
        self.level = self.level.saturating_add(1);
        self.level
    }

    pub(crate) fn decrease_level(&mut self) -> u32 {
        self.level = self.level.saturating_sub(1);
        self.level
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.level = 0;
    }
}
