//! Numeric tunables consumed by the tick core.
//!
//! All values can be loaded from RON; any field left out takes its default.
//!
//! # Example RON
//!
//! ```ron
//! GameConfig(
//!     defense_post_attack_rate: 100,
//!     defense_post_drain_percent: 0.05,
//!     defense_post_drain_minimum: 50,
//!     hamlet_hold_duration_ticks: 600,
//! )
//! ```
//!
//! **Note:** This module contains no IO - file loading is handled by
//! `frontier_headless`.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{decimal_serde, floor_mul, Fixed};
use crate::Tick;

/// Game-rule tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Ticks at the start of the game during which only spawn-phase
    /// executions run.
    #[serde(default = "default_spawn_phase_ticks")]
    pub spawn_phase_ticks: Tick,

    /// Minimum ticks between two drain attempts of one defense post.
    #[serde(default = "default_defense_post_attack_rate")]
    pub defense_post_attack_rate: Tick,

    /// Fraction of the target's troops removed per drain.
    #[serde(default = "default_drain_percent", with = "decimal_serde")]
    pub defense_post_drain_percent: Fixed,

    /// Lower bound on a single drain (still capped by the target's troops).
    #[serde(default = "default_drain_minimum")]
    pub defense_post_drain_minimum: u32,

    /// Manhattan radius a defense post searches for enemy tiles.
    #[serde(default = "default_targeting_range")]
    pub defense_post_targeting_range: u32,

    /// Ticks a tile must be held before a hamlet can appear on it.
    #[serde(default = "default_hamlet_hold_duration")]
    pub hamlet_hold_duration_ticks: Tick,

    /// Ticks between two hamlet scans of one player.
    #[serde(default = "default_hamlet_check_interval")]
    pub hamlet_check_interval_ticks: Tick,

    /// Tiles examined per hamlet scan.
    #[serde(default = "default_hamlet_checks_per_interval")]
    pub hamlet_checks_per_interval: u32,

    /// Flat troop growth per tick.
    #[serde(default = "default_troop_growth_base")]
    pub troop_growth_base: u32,

    /// Additional troop growth per owned tile.
    #[serde(default = "default_troop_growth_per_tile", with = "decimal_serde")]
    pub troop_growth_per_tile: Fixed,

    /// Growth bonus per active recruitment center level.
    #[serde(default = "default_recruitment_center_bonus", with = "decimal_serde")]
    pub recruitment_center_bonus: Fixed,

    /// Troop cap for a player with no territory.
    #[serde(default = "default_max_troops_base")]
    pub max_troops_base: u32,

    /// Troop cap added per owned tile.
    #[serde(default = "default_max_troops_per_tile")]
    pub max_troops_per_tile: u32,
}

const fn default_spawn_phase_ticks() -> Tick {
    100
}

const fn default_defense_post_attack_rate() -> Tick {
    100
}

fn default_drain_percent() -> Fixed {
    crate::math::percent(5)
}

const fn default_drain_minimum() -> u32 {
    50
}

const fn default_targeting_range() -> u32 {
    20
}

const fn default_hamlet_hold_duration() -> Tick {
    600
}

const fn default_hamlet_check_interval() -> Tick {
    50
}

const fn default_hamlet_checks_per_interval() -> u32 {
    20
}

const fn default_troop_growth_base() -> u32 {
    10
}

fn default_troop_growth_per_tile() -> Fixed {
    crate::math::percent(10)
}

fn default_recruitment_center_bonus() -> Fixed {
    crate::math::percent(25)
}

const fn default_max_troops_base() -> u32 {
    10_000
}

const fn default_max_troops_per_tile() -> u32 {
    100
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            spawn_phase_ticks: default_spawn_phase_ticks(),
            defense_post_attack_rate: default_defense_post_attack_rate(),
            defense_post_drain_percent: default_drain_percent(),
            defense_post_drain_minimum: default_drain_minimum(),
            defense_post_targeting_range: default_targeting_range(),
            hamlet_hold_duration_ticks: default_hamlet_hold_duration(),
            hamlet_check_interval_ticks: default_hamlet_check_interval(),
            hamlet_checks_per_interval: default_hamlet_checks_per_interval(),
            troop_growth_base: default_troop_growth_base(),
            troop_growth_per_tile: default_troop_growth_per_tile(),
            recruitment_center_bonus: default_recruitment_center_bonus(),
            max_troops_base: default_max_troops_base(),
            max_troops_per_tile: default_max_troops_per_tile(),
        }
    }
}

impl GameConfig {
    /// Parse a config from a RON string and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the tick core cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.hamlet_check_interval_ticks == 0 {
            return Err(GameError::InvalidConfig(
                "hamlet_check_interval_ticks must be positive".to_string(),
            ));
        }
        if self.defense_post_drain_percent < Fixed::ZERO {
            return Err(GameError::InvalidConfig(
                "defense_post_drain_percent must not be negative".to_string(),
            ));
        }
        if self.troop_growth_per_tile < Fixed::ZERO || self.recruitment_center_bonus < Fixed::ZERO
        {
            return Err(GameError::InvalidConfig(
                "growth fractions must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Troops drained from a target holding `target_troops`.
    ///
    /// `floor(troops * percent)`, raised to the configured minimum, then
    /// capped by the troops the target actually has.
    #[must_use]
    pub fn defense_post_drain_amount(&self, target_troops: u32) -> u32 {
        floor_mul(target_troops, self.defense_post_drain_percent)
            .max(self.defense_post_drain_minimum)
            .min(target_troops)
    }

    /// Per-tick troop growth for a player.
    ///
    /// Owning any active recruitment center level always adds at least one
    /// troop on top of the base rate.
    #[must_use]
    pub fn troop_increase_rate(&self, tile_count: usize, recruitment_levels: u32) -> u32 {
        let tiles = u32::try_from(tile_count).unwrap_or(u32::MAX);
        let rate = self
            .troop_growth_base
            .saturating_add(floor_mul(tiles, self.troop_growth_per_tile));
        if recruitment_levels == 0 {
            return rate;
        }

        let multiplier = self
            .recruitment_center_bonus
            .saturating_mul(Fixed::saturating_from_num(recruitment_levels));
        let bonus = floor_mul(rate, multiplier).max(1);
        rate.saturating_add(bonus)
    }

    /// Troop cap for a player holding `tile_count` tiles.
    #[must_use]
    pub fn max_troops(&self, tile_count: usize) -> u32 {
        let tiles = u32::try_from(tile_count).unwrap_or(u32::MAX);
        self.max_troops_base
            .saturating_add(tiles.saturating_mul(self.max_troops_per_tile))
    }
}
