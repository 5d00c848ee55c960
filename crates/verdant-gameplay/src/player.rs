//! Player state carried alongside the farm in save files.

use serde::{Deserialize, Serialize};
use verdant_common::TileCoord;

/// Default maximum health.
pub const DEFAULT_MAX_HEALTH: f32 = 100.0;

/// Player position (in tile units) and vitals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerState {
    /// Horizontal position in tiles.
    pub world_x: f32,
    /// Vertical position in tiles.
    pub world_y: f32,
    /// Current health.
    pub current_health: f32,
    /// Maximum health.
    pub max_health: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            world_x: 0.0,
            world_y: 0.0,
            current_health: DEFAULT_MAX_HEALTH,
            max_health: DEFAULT_MAX_HEALTH,
        }
    }
}

impl PlayerState {
    /// Player standing at `(x, y)` with full health.
    #[must_use]
    pub fn at(world_x: f32, world_y: f32) -> Self {
        Self {
            world_x,
            world_y,
            ..Self::default()
        }
    }

    /// Tile the player is standing on.
    #[must_use]
    pub fn tile(&self) -> TileCoord {
        TileCoord::new(self.world_x.floor() as i32, self.world_y.floor() as i32)
    }

    /// Move to the centre of `coord`.
    pub fn move_to(&mut self, coord: TileCoord) {
        self.world_x = coord.col as f32 + 0.5;
        self.world_y = coord.row as f32 + 0.5;
    }

    /// Brings out-of-range vitals back into `0..=max_health`.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if !self.max_health.is_finite() || self.max_health <= 0.0 {
            self.max_health = DEFAULT_MAX_HEALTH;
        }
        if !self.current_health.is_finite() {
            self.current_health = self.max_health;
        }
        self.current_health = self.current_health.clamp(0.0, self.max_health);
        if !self.world_x.is_finite() {
            self.world_x = 0.0;
        }
        if !self.world_y.is_finite() {
            self.world_y = 0.0;
        }
        self
    }
}
