//! Scenario loading and configuration.
//!
//! Scenarios define the initial game state for headless runs: map shape,
//! players and their starting territory, alliances, structures to place and
//! scripted conquests.

use std::path::Path;

use frontier_core::error::GameError;
use frontier_core::unit::UnitKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Scenario refers to something that does not exist.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    /// The game rejected a setup step.
    #[error("Game setup failed: {0}")]
    Game(#[from] GameError),
}

/// Inclusive tile rectangle `(x0, y0) ..= (x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Left column.
    pub x0: u32,
    /// Top row.
    pub y0: u32,
    /// Right column (inclusive).
    pub x1: u32,
    /// Bottom row (inclusive).
    pub y1: u32,
}

impl Area {
    /// Create a new area from corner coordinates.
    #[must_use]
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Single-tile area.
    #[must_use]
    pub const fn tile(x: u32, y: u32) -> Self {
        Self::new(x, y, x, y)
    }

    /// All `(x, y)` coordinates in row-major order.
    pub fn coords(self) -> impl Iterator<Item = (u32, u32)> {
        (self.y0..=self.y1).flat_map(move |y| (self.x0..=self.x1).map(move |x| (x, y)))
    }
}

/// Starting setup for one player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Player name, used to refer to the player elsewhere in the scenario.
    pub name: String,
    /// Starting troops.
    pub troops: u32,
    /// Starting territory.
    pub territory: Area,
}

/// A structure to place at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructurePlacement {
    /// Structure kind.
    pub kind: UnitKind,
    /// Name of the owning player.
    pub owner: String,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Level to upgrade to once the structure stands.
    #[serde(default = "default_level")]
    pub level: u32,
}

const fn default_level() -> u32 {
    1
}

impl StructurePlacement {
    /// Create a level-1 placement.
    #[must_use]
    pub fn new(kind: UnitKind, owner: impl Into<String>, x: u32, y: u32) -> Self {
        Self {
            kind,
            owner: owner.into(),
            x,
            y,
            level: 1,
        }
    }

    /// Set the target level.
    #[must_use]
    pub const fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}

/// Territory handed to a player before a given tick runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedConquest {
    /// Tick before which the conquest is applied.
    pub at_tick: u64,
    /// Name of the conquering player.
    pub player: String,
    /// Tiles taken.
    pub area: Area,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Map dimensions (width, height) in tiles.
    pub map_size: (u32, u32),
    /// Columns made entirely of water.
    #[serde(default)]
    pub water_columns: Vec<u32>,
    /// Players in id order.
    pub players: Vec<PlayerSetup>,
    /// Pairs of allied player names.
    #[serde(default)]
    pub alliances: Vec<(String, String)>,
    /// Structures placed at start.
    #[serde(default)]
    pub structures: Vec<StructurePlacement>,
    /// Conquests applied during the run.
    #[serde(default)]
    pub conquests: Vec<ScriptedConquest>,
    /// Ticks to run when the caller does not say.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
}

const fn default_ticks() -> u64 {
    1000
}

impl Default for Scenario {
    fn default() -> Self {
        Self::border_skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Index of the player called `name`.
    pub fn player_index(&self, name: &str) -> Result<usize, ScenarioError> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ScenarioError::Invalid(format!("unknown player '{name}'")))
    }

    /// Check names and coordinates.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let (width, height) = self.map_size;
        if width == 0 || height == 0 {
            return Err(ScenarioError::Invalid("map size must be positive".to_string()));
        }
        if self.players.is_empty() {
            return Err(ScenarioError::Invalid("scenario has no players".to_string()));
        }

        let on_map = |x: u32, y: u32| x < width && y < height;
        let area_on_map = |area: &Area| {
            area.x0 <= area.x1 && area.y0 <= area.y1 && on_map(area.x1, area.y1)
        };

        for (i, player) in self.players.iter().enumerate() {
            if self.players[..i].iter().any(|p| p.name == player.name) {
                return Err(ScenarioError::Invalid(format!(
                    "duplicate player '{}'",
                    player.name
                )));
            }
            if !area_on_map(&player.territory) {
                return Err(ScenarioError::Invalid(format!(
                    "territory of '{}' is off the map",
                    player.name
                )));
            }
        }
        for (a, b) in &self.alliances {
            self.player_index(a)?;
            self.player_index(b)?;
        }
        for structure in &self.structures {
            self.player_index(&structure.owner)?;
            if !on_map(structure.x, structure.y) {
                return Err(ScenarioError::Invalid(format!(
                    "{} at ({}, {}) is off the map",
                    structure.kind.display_name(),
                    structure.x,
                    structure.y
                )));
            }
            if structure.level == 0 {
                return Err(ScenarioError::Invalid(format!(
                    "{} at ({}, {}) has level 0",
                    structure.kind.display_name(),
                    structure.x,
                    structure.y
                )));
            }
        }
        for conquest in &self.conquests {
            self.player_index(&conquest.player)?;
            if !area_on_map(&conquest.area) {
                return Err(ScenarioError::Invalid(format!(
                    "conquest at tick {} is off the map",
                    conquest.at_tick
                )));
            }
        }
        Ok(())
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "border_skirmish" => Some(Self::border_skirmish()),
            _ => None,
        }
    }

    /// Two players facing each other across a river, each with a line of
    /// defense posts. Blue pushes into red's side halfway through.
    #[must_use]
    pub fn border_skirmish() -> Self {
        Self {
            name: "border_skirmish".to_string(),
            description: "Two players across a river with defense posts on both banks"
                .to_string(),
            map_size: (64, 48),
            water_columns: vec![31, 32],
            players: vec![
                PlayerSetup {
                    name: "red".to_string(),
                    troops: 5000,
                    territory: Area::new(0, 0, 30, 47),
                },
                PlayerSetup {
                    name: "blue".to_string(),
                    troops: 5000,
                    territory: Area::new(33, 0, 63, 47),
                },
            ],
            alliances: Vec::new(),
            structures: vec![
                StructurePlacement::new(UnitKind::DefensePost, "red", 28, 8),
                StructurePlacement::new(UnitKind::DefensePost, "red", 28, 24).with_level(2),
                StructurePlacement::new(UnitKind::DefensePost, "red", 28, 40),
                StructurePlacement::new(UnitKind::DefensePost, "blue", 35, 16),
                StructurePlacement::new(UnitKind::DefensePost, "blue", 35, 32),
                StructurePlacement::new(UnitKind::RecruitmentCenter, "red", 8, 24),
                StructurePlacement::new(UnitKind::RecruitmentCenter, "blue", 56, 24),
                StructurePlacement::new(UnitKind::City, "red", 4, 4),
                StructurePlacement::new(UnitKind::City, "blue", 60, 44),
            ],
            conquests: vec![ScriptedConquest {
                at_tick: 400,
                player: "blue".to_string(),
                area: Area::new(26, 20, 30, 28),
            }],
            ticks: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_skirmish_is_valid() {
        let scenario = Scenario::border_skirmish();
        scenario.validate().unwrap();
        assert_eq!(scenario.player_index("blue").unwrap(), 1);
    }

    #[test]
    fn test_builtin_lookup() {
        assert!(Scenario::builtin("border_skirmish").is_some());
        assert!(Scenario::builtin("nope").is_none());
    }

    #[test]
    fn test_parse_minimal_ron() {
        let ron = r#"(
            name: "tiny",
            map_size: (8, 8),
            players: [
                (name: "a", troops: 100, territory: (x0: 0, y0: 0, x1: 3, y1: 7)),
            ],
            structures: [
                (kind: DefensePost, owner: "a", x: 2, y: 2),
            ],
        )"#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.ticks, 1000);
        assert_eq!(scenario.structures[0].level, 1);
        assert!(scenario.conquests.is_empty());
    }

    #[test]
    fn test_unknown_owner_rejected() {
        let mut scenario = Scenario::border_skirmish();
        scenario
            .structures
            .push(StructurePlacement::new(UnitKind::City, "green", 1, 1));
        assert!(matches!(scenario.validate(), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_off_map_territory_rejected() {
        let mut scenario = Scenario::border_skirmish();
        scenario.players[0].territory = Area::new(0, 0, 64, 10);
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let mut scenario = Scenario::border_skirmish();
        scenario.players[1].name = "red".to_string();
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_area_coords_row_major() {
        let coords: Vec<_> = Area::new(1, 1, 2, 2).coords().collect();
        assert_eq!(coords, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
        assert_eq!(Area::tile(3, 4).coords().count(), 1);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("/nonexistent/scenario.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
