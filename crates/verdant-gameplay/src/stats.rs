//! Running farm statistics, saved with the game.

use serde::{Deserialize, Serialize};

use crate::season::Season;

/// Counters shown on the stats screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStats {
    /// Seeds planted.
    pub crops_planted: u64,
    /// Harvest actions that yielded something.
    pub crops_harvested: u64,
    /// Watering actions that changed a plant.
    pub plants_watered: u64,
    /// Total units harvested.
    pub total_yield: u64,
    /// Season when the stats were last updated.
    pub current_season: Season,
}

impl GameStats {
    /// Record a successful planting.
    pub fn record_planted(&mut self) {
        self.crops_planted += 1;
    }

    /// Record a watering that changed a plant.
    pub fn record_watered(&mut self) {
        self.plants_watered += 1;
    }

    /// Record a harvest of `amount` units.
    pub fn record_harvest(&mut self, amount: u32) {
        self.crops_harvested += 1;
        self.total_yield += u64::from(amount);
    }
}
