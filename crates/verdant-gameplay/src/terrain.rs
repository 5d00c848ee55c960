//! Terrain queries used to decide where crops may be planted.

use verdant_common::TileCoord;

/// Tile id of tilled soil.
pub const FARMABLE_TILE: u16 = 1;

/// Tile id of untilled ground.
pub const GRASS_TILE: u16 = 0;

/// Read-only view of the world's terrain.
pub trait TerrainQuery {
    /// Whether a crop may be planted at `coord`.
    fn is_farmable(&self, coord: TileCoord) -> bool;
}

/// Dense rectangular tile map anchored at `(0, 0)`.
#[derive(Debug, Clone)]
pub struct TileMap {
    cols: u32,
    rows: u32,
    tiles: Vec<u16>,
    farmable_tile: u16,
}

impl TileMap {
    /// Creates a map filled with `fill`.
    #[must_use]
    pub fn new(cols: u32, rows: u32, fill: u16) -> Self {
        Self {
            cols,
            rows,
            tiles: vec![fill; cols as usize * rows as usize],
            farmable_tile: FARMABLE_TILE,
        }
    }

    /// Creates a map where every tile is farmable.
    #[must_use]
    pub fn all_farmable(cols: u32, rows: u32) -> Self {
        Self::new(cols, rows, FARMABLE_TILE)
    }

    /// Overrides which tile id counts as farmable.
    #[must_use]
    pub fn with_farmable_tile(mut self, tile: u16) -> Self {
        self.farmable_tile = tile;
        self
    }

    /// Width in tiles.
    #[must_use]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Height in tiles.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile id at `coord`, or `None` outside the map.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<u16> {
        coord
            .to_index(self.cols, self.rows)
            .map(|index| self.tiles[index])
    }

    /// Sets the tile id at `coord`. Returns false outside the map.
    pub fn set_tile(&mut self, coord: TileCoord, tile: u16) -> bool {
        match coord.to_index(self.cols, self.rows) {
            Some(index) => {
                self.tiles[index] = tile;
                true
            }
            None => false,
        }
    }

    /// Tills every tile in the inclusive rectangle `from..=to`.
    pub fn till_rect(&mut self, from: TileCoord, to: TileCoord) {
        for row in from.row.min(to.row)..=from.row.max(to.row) {
            for col in from.col.min(to.col)..=from.col.max(to.col) {
                self.set_tile(TileCoord::new(col, row), self.farmable_tile);
            }
        }
    }
}

impl TerrainQuery for TileMap {
    fn is_farmable(&self, coord: TileCoord) -> bool {
        self.tile(coord) == Some(self.farmable_tile)
    }
}
