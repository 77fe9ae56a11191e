//! Tile map: terrain, coordinates and ownership.
//!
//! Tiles are addressed by [`TileRef`], a row-major index into the grid.
//! Ownership is stored alongside terrain so that a single lookup answers
//! "who holds this cell"; only [`crate::game::Game`] writes it.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::player::PlayerId;

/// Reference to a map cell (`y * width + x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileRef(pub u32);

/// Terrain classification of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// Land - can be owned and built on.
    #[default]
    Land,
    /// Water - never owned.
    Water,
}

/// Grid of tiles with terrain and ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMap {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Terrain stored in row-major order.
    terrain: Vec<Terrain>,
    /// Owner per tile, row-major.
    owners: Vec<Option<PlayerId>>,
}

impl GameMap {
    /// Create a map with every tile set to land.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "GameMap width must be positive");
        assert!(height > 0, "GameMap height must be positive");

        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            terrain: vec![Terrain::Land; cell_count],
            owners: vec![None; cell_count],
        }
    }

    /// Parse a map from text rows: `~` is water, anything else is land.
    ///
    /// All rows must have the same non-zero length.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let height = u32::try_from(rows.len())
            .map_err(|_| GameError::InvalidState("map has too many rows".to_string()))?;
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        let width = u32::try_from(width)
            .map_err(|_| GameError::InvalidState("map rows are too long".to_string()))?;
        if width == 0 || height == 0 {
            return Err(GameError::InvalidState("map must not be empty".to_string()));
        }

        let mut map = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width as usize {
                return Err(GameError::InvalidState(format!(
                    "map row {y} has {} tiles, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, c) in row.chars().enumerate() {
                if c == '~' {
                    let index = y * width as usize + x;
                    map.terrain[index] = Terrain::Water;
                }
            }
        }
        Ok(map)
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.terrain.len()
    }

    /// Check if signed coordinates fall inside the grid.
    #[must_use]
    pub fn is_valid_coord(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Check if a tile reference points inside the grid.
    #[must_use]
    pub fn is_valid_ref(&self, tile: TileRef) -> bool {
        (tile.0 as usize) < self.terrain.len()
    }

    /// Tile reference for in-bounds coordinates.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the coordinates are out of bounds.
    #[must_use]
    pub fn ref_at(&self, x: u32, y: u32) -> TileRef {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) is off the map");
        TileRef(y * self.width + x)
    }

    /// Tile reference for signed coordinates, `None` if off the map.
    #[must_use]
    pub fn try_ref(&self, x: i64, y: i64) -> Option<TileRef> {
        if !self.is_valid_coord(x, y) {
            return None;
        }
        let index = y * i64::from(self.width) + x;
        u32::try_from(index).ok().map(TileRef)
    }

    /// X coordinate of a tile.
    #[must_use]
    pub const fn x(&self, tile: TileRef) -> u32 {
        tile.0 % self.width
    }

    /// Y coordinate of a tile.
    #[must_use]
    pub const fn y(&self, tile: TileRef) -> u32 {
        tile.0 / self.width
    }

    /// Terrain of a tile. Off-map tiles read as water.
    #[must_use]
    pub fn terrain(&self, tile: TileRef) -> Terrain {
        self.terrain
            .get(tile.0 as usize)
            .copied()
            .unwrap_or(Terrain::Water)
    }

    /// Check if a tile is land.
    #[must_use]
    pub fn is_land(&self, tile: TileRef) -> bool {
        self.terrain(tile) == Terrain::Land
    }

    /// Set the terrain of a tile. Returns `false` if off the map.
    pub fn set_terrain(&mut self, tile: TileRef, terrain: Terrain) -> bool {
        match self.terrain.get_mut(tile.0 as usize) {
            Some(cell) => {
                *cell = terrain;
                true
            }
            None => false,
        }
    }

    /// Current owner of a tile, `None` if unowned or off the map.
    #[must_use]
    pub fn owner(&self, tile: TileRef) -> Option<PlayerId> {
        self.owners.get(tile.0 as usize).copied().flatten()
    }

    /// Check if a tile has an owner.
    #[must_use]
    pub fn has_owner(&self, tile: TileRef) -> bool {
        self.owner(tile).is_some()
    }

    /// Overwrite the owner of a tile, returning the previous owner.
    pub(crate) fn set_owner(&mut self, tile: TileRef, owner: Option<PlayerId>) -> Option<PlayerId> {
        match self.owners.get_mut(tile.0 as usize) {
            Some(cell) => std::mem::replace(cell, owner),
            None => None,
        }
    }

    /// Orthogonal neighbors of a tile, in left, right, up, down order.
    #[must_use]
    pub fn neighbors(&self, tile: TileRef) -> Vec<TileRef> {
        let x = i64::from(self.x(tile));
        let y = i64::from(self.y(tile));
        [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
            .into_iter()
            .filter_map(|(nx, ny)| self.try_ref(nx, ny))
            .collect()
    }

    /// All on-map tiles within Manhattan distance `radius` of `center`.
    ///
    /// Iterates `dx` from `-radius` to `radius` in the outer loop and `dy` in
    /// the inner loop. Random target selection indexes into this list, so
    /// the order must stay fixed.
    #[must_use]
    pub fn tiles_within_manhattan(&self, center: TileRef, radius: u32) -> Vec<TileRef> {
        let cx = i64::from(self.x(center));
        let cy = i64::from(self.y(center));
        let r = i64::from(radius);

        let mut tiles = Vec::new();
        for dx in -r..=r {
            for dy in -r..=r {
                if dx.abs() + dy.abs() > r {
                    continue;
                }
                if let Some(tile) = self.try_ref(cx + dx, cy + dy) {
                    tiles.push(tile);
                }
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_round_trip() {
        let map = GameMap::new(10, 8);
        let tile = map.ref_at(3, 5);

        assert_eq!(tile, TileRef(53));
        assert_eq!(map.x(tile), 3);
        assert_eq!(map.y(tile), 5);
    }

    #[test]
    fn test_try_ref_bounds() {
        let map = GameMap::new(4, 4);

        assert_eq!(map.try_ref(0, 0), Some(TileRef(0)));
        assert_eq!(map.try_ref(3, 3), Some(TileRef(15)));
        assert_eq!(map.try_ref(-1, 0), None);
        assert_eq!(map.try_ref(4, 0), None);
        assert_eq!(map.try_ref(0, 4), None);
    }

    #[test]
    fn test_from_rows_parses_water() {
        let map = GameMap::from_rows(&["..~", ".~.", "..."]).unwrap();

        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 3);
        assert!(map.is_land(map.ref_at(0, 0)));
        assert!(!map.is_land(map.ref_at(2, 0)));
        assert!(!map.is_land(map.ref_at(1, 1)));
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        assert!(GameMap::from_rows(&["...", ".."]).is_err());
        assert!(GameMap::from_rows::<&str>(&[]).is_err());
    }

    #[test]
    fn test_neighbors_at_corner_and_center() {
        let map = GameMap::new(5, 5);

        assert_eq!(map.neighbors(map.ref_at(0, 0)).len(), 2);
        assert_eq!(map.neighbors(map.ref_at(4, 2)).len(), 3);

        let center = map.neighbors(map.ref_at(2, 2));
        assert_eq!(
            center,
            vec![
                map.ref_at(1, 2),
                map.ref_at(3, 2),
                map.ref_at(2, 1),
                map.ref_at(2, 3)
            ]
        );
    }

    #[test]
    fn test_manhattan_diamond_size() {
        let map = GameMap::new(50, 50);
        let center = map.ref_at(25, 25);

        // A diamond of radius r holds 2r(r+1) + 1 tiles.
        assert_eq!(map.tiles_within_manhattan(center, 0).len(), 1);
        assert_eq!(map.tiles_within_manhattan(center, 1).len(), 5);
        assert_eq!(map.tiles_within_manhattan(center, 3).len(), 25);
    }

    #[test]
    fn test_manhattan_diamond_clipped_at_edge() {
        let map = GameMap::new(10, 10);
        let tiles = map.tiles_within_manhattan(map.ref_at(0, 0), 2);

        // Only the quadrant inside the map: (0,0) (0,1) (0,2) (1,0) (1,1) (2,0)
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[0], map.ref_at(0, 0));
    }

    #[test]
    fn test_ownership() {
        let mut map = GameMap::new(3, 3);
        let tile = map.ref_at(1, 1);

        assert!(!map.has_owner(tile));
        assert_eq!(map.set_owner(tile, Some(PlayerId(1))), None);
        assert_eq!(map.owner(tile), Some(PlayerId(1)));
        assert_eq!(map.set_owner(tile, None), Some(PlayerId(1)));
        assert!(!map.has_owner(tile));
    }

    #[test]
    fn test_off_map_reads() {
        let map = GameMap::new(2, 2);

        assert!(!map.is_valid_ref(TileRef(4)));
        assert!(!map.is_land(TileRef(4)));
        assert_eq!(map.owner(TileRef(4)), None);
    }
}
