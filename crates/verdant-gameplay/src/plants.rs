//! Plant instances: the per-cell growing state of one crop.
//!
//! A plant tracks its own growth progress, water, health and harvest count.
//! Species parameters are passed in on every call rather than stored, so a
//! plant stays a small plain value that the plot grid owns outright.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use verdant_common::{SpeciesId, Timestamp};

use crate::error::{FarmError, FarmResult};
use crate::season::Season;
use crate::species::{Species, TERMINAL_STAGE};

/// Highest water level.
pub const MAX_WATER_LEVEL: u8 = 3;

/// Water added by one watering action.
pub const WATER_INCREMENT: u8 = 1;

/// Water levels above this grow at full rate; at or below it, half rate.
pub const WATERED_THRESHOLD: u8 = 1;

/// Health restored by one watering action.
pub const WATER_HEALTH_BONUS: f32 = 5.0;

/// Maximum (and starting) health.
pub const MAX_HEALTH: f32 = 100.0;

/// Growth-rate and yield multiplier in an optimal season.
pub const SEASON_BONUS: f32 = 1.2;

/// Growth-rate multiplier when water is at or below the threshold.
pub const DRY_GROWTH_PENALTY: f32 = 0.5;

/// Growth rate before modifiers.
pub const BASE_GROWTH_RATE: f32 = 1.0;

/// Result of harvesting a single plant.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantHarvest {
    /// Species harvested.
    pub species_id: SpeciesId,
    /// Yield before rounding.
    pub raw_yield: f32,
    /// Units credited to the inventory.
    pub amount: u32,
    /// Whether the plant was used up (cell becomes empty).
    pub consumed: bool,
    /// Harvest count after this harvest.
    pub harvest_count: u32,
}

/// State of a planted crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantInstance {
    pub(crate) species_id: SpeciesId,
    pub(crate) growth_stage: u8,
    pub(crate) water_level: u8,
    pub(crate) health: f32,
    /// Effective growth accumulated since planting, in milliseconds.
    pub(crate) growth_progress_ms: u64,
    pub(crate) planted_at: Timestamp,
    pub(crate) last_watered_at: Timestamp,
    pub(crate) harvest_count: u32,
    pub(crate) planted_season: Season,
}

impl PlantInstance {
    /// Create a freshly planted seed: stage 0, dry, full health.
    #[must_use]
    pub fn new(species_id: SpeciesId, now: Timestamp, season: Season) -> Self {
        Self {
            species_id,
            growth_stage: 0,
            water_level: 0,
            health: MAX_HEALTH,
            growth_progress_ms: 0,
            planted_at: now,
            last_watered_at: now,
            harvest_count: 0,
            planted_season: season,
        }
    }

    /// Species of this plant.
    #[must_use]
    pub fn species_id(&self) -> &SpeciesId {
        &self.species_id
    }

    /// Current growth stage (0 to terminal).
    #[must_use]
    pub fn growth_stage(&self) -> u8 {
        self.growth_stage
    }

    /// Current water level (0 to [`MAX_WATER_LEVEL`]).
    #[must_use]
    pub fn water_level(&self) -> u8 {
        self.water_level
    }

    /// Current health (0 to 100).
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Effective growth accumulated since planting.
    #[must_use]
    pub fn growth_progress(&self) -> Duration {
        Duration::from_millis(self.growth_progress_ms)
    }

    /// When the plant was put in the ground.
    #[must_use]
    pub fn planted_at(&self) -> Timestamp {
        self.planted_at
    }

    /// When water was last added.
    #[must_use]
    pub fn last_watered_at(&self) -> Timestamp {
        self.last_watered_at
    }

    /// Completed regrow harvests.
    #[must_use]
    pub fn harvest_count(&self) -> u32 {
        self.harvest_count
    }

    /// Season at planting time.
    #[must_use]
    pub fn planted_season(&self) -> Season {
        self.planted_season
    }

    /// Whether the plant has reached the harvestable stage.
    #[must_use]
    pub fn is_ready_to_harvest(&self) -> bool {
        self.growth_stage == TERMINAL_STAGE
    }

    /// Whether health has run out. Withered plants stop growing.
    #[must_use]
    pub fn is_withered(&self) -> bool {
        self.health <= 0.0
    }

    /// Water fraction in `[0, 1]`.
    #[must_use]
    pub fn water_ratio(&self) -> f32 {
        f32::from(self.water_level) / f32::from(MAX_WATER_LEVEL)
    }

    /// Add water and a little health.
    ///
    /// Returns false (and changes nothing) if the plant is already at the
    /// water cap. That includes the watering time: topping up a full plant
    /// does not restart the decay window, so it still evaporates one window
    /// after the watering that filled it.
    pub fn water(&mut self, now: Timestamp) -> bool {
        if self.water_level >= MAX_WATER_LEVEL {
            return false;
        }
        self.water_level = (self.water_level + WATER_INCREMENT).min(MAX_WATER_LEVEL);
        self.health = (self.health + WATER_HEALTH_BONUS).min(MAX_HEALTH);
        self.last_watered_at = now;
        true
    }

    /// Drop all water. Returns true if there was any.
    pub fn evaporate(&mut self) -> bool {
        let had_water = self.water_level > 0;
        self.water_level = 0;
        had_water
    }

    /// Reduce health. Returns true if this call made the plant wither.
    pub fn drain_health(&mut self, amount: f32) -> bool {
        if self.is_withered() || amount <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.is_withered()
    }

    /// Effective growth rate under current water and season.
    #[must_use]
    pub fn growth_rate(&self, species: &Species, season: Season) -> f32 {
        let water_factor = if self.water_level > WATERED_THRESHOLD {
            1.0
        } else {
            DRY_GROWTH_PENALTY
        };
        let season_factor = if species.is_optimal(season) {
            SEASON_BONUS
        } else {
            1.0
        };
        BASE_GROWTH_RATE * water_factor * season_factor
    }

    /// Accumulate growth for `elapsed` wall-clock time.
    ///
    /// The stage advances by at most one per call even if the accumulated
    /// progress covers several stage durations; surplus progress is dropped.
    /// Returns true if the stage advanced.
    pub fn advance_growth(&mut self, species: &Species, elapsed: Duration, season: Season) -> bool {
        if self.is_withered() || self.is_ready_to_harvest() {
            return false;
        }

        let rate = f64::from(self.growth_rate(species, season));
        let gained = (elapsed.as_millis() as f64 * rate) as u64;
        self.growth_progress_ms = self.growth_progress_ms.saturating_add(gained);

        let stage_ms = stage_millis(species);
        let target = (self.growth_progress_ms / stage_ms).min(u64::from(TERMINAL_STAGE)) as u8;
        if target <= self.growth_stage {
            return false;
        }

        let next = self.growth_stage + 1;
        if target > next {
            self.growth_progress_ms = stage_ms * u64::from(next);
        }
        self.growth_stage = next;
        true
    }

    /// Harvest the plant.
    ///
    /// Yield is `base * season bonus * water ratio * health/100 * special
    /// bonus`, rounded to the nearest unit with a minimum of one. A
    /// multi-harvest plant with cycles left drops back to the stage before
    /// terminal instead of being consumed.
    pub fn harvest(&mut self, species: &Species, season: Season) -> FarmResult<PlantHarvest> {
        if !self.is_ready_to_harvest() {
            return Err(FarmError::NotReady {
                stage: self.growth_stage,
            });
        }

        let season_factor = if species.is_optimal(season) {
            SEASON_BONUS
        } else {
            1.0
        };
        let raw_yield = species.base_yield
            * season_factor
            * self.water_ratio()
            * (self.health / MAX_HEALTH)
            * species.special_bonus;
        let amount = (raw_yield.round() as u32).max(1);

        let regrows = species.multi_harvest && self.harvest_count < species.max_harvest_cycles;
        if regrows {
            self.harvest_count += 1;
            self.growth_stage = TERMINAL_STAGE - 1;
            self.growth_progress_ms = stage_millis(species) * u64::from(TERMINAL_STAGE - 1);
        }

        Ok(PlantHarvest {
            species_id: self.species_id.clone(),
            raw_yield,
            amount,
            consumed: !regrows,
            harvest_count: self.harvest_count,
        })
    }
}

fn stage_millis(species: &Species) -> u64 {
    (species.stage_duration.as_millis() as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::{CropCategory, SpeciesCatalog};

    fn wheat() -> Species {
        SpeciesCatalog::with_defaults()
            .lookup("wheat")
            .expect("wheat")
            .clone()
    }

    fn watered(mut plant: PlantInstance, times: u8) -> PlantInstance {
        for _ in 0..times {
            plant.water(Timestamp::EPOCH);
        }
        plant
    }

    fn new_plant(id: &str) -> PlantInstance {
        PlantInstance::new(SpeciesId::new(id), Timestamp::EPOCH, Season::Spring)
    }

    #[test]
    fn test_new_plant() {
        let plant = new_plant("wheat");
        assert_eq!(plant.growth_stage(), 0);
        assert_eq!(plant.water_level(), 0);
        assert!((plant.health() - MAX_HEALTH).abs() < f32::EPSILON);
        assert!(!plant.is_ready_to_harvest());
    }

    #[test]
    fn test_water_caps_and_reports_change() {
        let mut plant = new_plant("wheat");
        plant.health = 50.0;

        assert!(plant.water(Timestamp::from_millis(10)));
        assert_eq!(plant.water_level(), 1);
        assert!((plant.health() - 55.0).abs() < f32::EPSILON);
        assert_eq!(plant.last_watered_at(), Timestamp::from_millis(10));

        assert!(plant.water(Timestamp::from_millis(20)));
        assert!(plant.water(Timestamp::from_millis(30)));
        assert_eq!(plant.water_level(), MAX_WATER_LEVEL);

        // At the cap nothing changes, not even the watering time.
        assert!(!plant.water(Timestamp::from_millis(40)));
        assert_eq!(plant.water_level(), MAX_WATER_LEVEL);
        assert_eq!(plant.last_watered_at(), Timestamp::from_millis(30));
    }

    #[test]
    fn test_health_bonus_is_capped() {
        let mut plant = new_plant("wheat");
        plant.water(Timestamp::EPOCH);
        assert!((plant.health() - MAX_HEALTH).abs() < f32::EPSILON);
    }

    #[test]
    fn test_growth_rate_modifiers() {
        let wheat = wheat();
        let plant = watered(new_plant("wheat"), 3);
        assert!((plant.growth_rate(&wheat, Season::Spring) - 1.2).abs() < 1e-6);
        assert!((plant.growth_rate(&wheat, Season::Winter) - 1.0).abs() < 1e-6);

        let damp = watered(new_plant("wheat"), 1);
        assert!((damp.growth_rate(&wheat, Season::Spring) - 0.6).abs() < 1e-6);
        assert!((damp.growth_rate(&wheat, Season::Fall) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_advance_growth_one_stage() {
        let wheat = wheat();
        let mut plant = watered(new_plant("wheat"), 3);

        // 10s stages at rate 1.0 in winter.
        assert!(!plant.advance_growth(&wheat, Duration::from_secs(9), Season::Winter));
        assert_eq!(plant.growth_stage(), 0);

        assert!(plant.advance_growth(&wheat, Duration::from_secs(1), Season::Winter));
        assert_eq!(plant.growth_stage(), 1);
    }

    #[test]
    fn test_advance_growth_never_skips_stages() {
        let wheat = wheat();
        let mut plant = watered(new_plant("wheat"), 3);

        assert!(plant.advance_growth(&wheat, Duration::from_secs(1000), Season::Winter));
        assert_eq!(plant.growth_stage(), 1);
        assert_eq!(plant.growth_progress(), Duration::from_secs(10));

        assert!(plant.advance_growth(&wheat, Duration::from_secs(1000), Season::Winter));
        assert_eq!(plant.growth_stage(), 2);
    }

    #[test]
    fn test_withered_plant_does_not_grow() {
        let wheat = wheat();
        let mut plant = watered(new_plant("wheat"), 3);
        assert!(plant.drain_health(500.0));
        assert!(plant.is_withered());
        assert!(!plant.drain_health(1.0));

        assert!(!plant.advance_growth(&wheat, Duration::from_secs(100), Season::Spring));
        assert_eq!(plant.growth_stage(), 0);
    }

    #[test]
    fn test_ready_plant_stops_at_terminal() {
        let wheat = wheat();
        let mut plant = watered(new_plant("wheat"), 3);
        for _ in 0..10 {
            plant.advance_growth(&wheat, Duration::from_secs(20), Season::Spring);
        }
        assert_eq!(plant.growth_stage(), TERMINAL_STAGE);
        assert!(plant.is_ready_to_harvest());
    }

    #[test]
    fn test_harvest_not_ready() {
        let wheat = wheat();
        let mut plant = new_plant("wheat");
        assert_eq!(
            plant.harvest(&wheat, Season::Spring),
            Err(FarmError::NotReady { stage: 0 })
        );
    }

    #[test]
    fn test_wheat_yield_formula() {
        let wheat = wheat();
        let mut plant = watered(new_plant("wheat"), 3);
        plant.growth_stage = TERMINAL_STAGE;
        plant.health = 80.0;

        let result = plant.harvest(&wheat, Season::Spring).expect("ready");
        let expected = 45.0 * 1.2 * 1.0 * 0.8 * 1.1;
        assert!((result.raw_yield - expected).abs() < 1e-3);
        assert_eq!(result.amount, 48); // 47.52 rounds to 48
        assert!(result.consumed);
    }

    #[test]
    fn test_yield_scales_with_water_and_season() {
        let wheat = wheat();
        let mut plant = watered(new_plant("wheat"), 2);
        plant.growth_stage = TERMINAL_STAGE;

        let result = plant.harvest(&wheat, Season::Winter).expect("ready");
        let expected = 45.0 * (2.0 / 3.0) * 1.1;
        assert!((result.raw_yield - expected).abs() < 1e-3);
    }

    #[test]
    fn test_dry_harvest_still_yields_one() {
        let wheat = wheat();
        let mut plant = new_plant("wheat");
        plant.growth_stage = TERMINAL_STAGE;

        let result = plant.harvest(&wheat, Season::Spring).expect("ready");
        assert!(result.raw_yield.abs() < f32::EPSILON);
        assert_eq!(result.amount, 1);
    }

    #[test]
    fn test_multi_harvest_regrows_from_second_to_last_stage() {
        let berry = Species::builder("berry", "Berry", CropCategory::Fruit)
            .base_yield(10.0)
            .multi_harvest()
            .build();
        let mut plant = watered(new_plant("berry"), 3);

        for cycle in 1..=berry.max_harvest_cycles {
            plant.growth_stage = TERMINAL_STAGE;
            let result = plant.harvest(&berry, Season::Spring).expect("ready");
            assert!(!result.consumed);
            assert_eq!(result.harvest_count, cycle);
            assert_eq!(plant.growth_stage(), TERMINAL_STAGE - 1);
            assert_eq!(plant.growth_progress(), berry.stage_duration * 3);
        }

        plant.growth_stage = TERMINAL_STAGE;
        let last = plant.harvest(&berry, Season::Spring).expect("ready");
        assert!(last.consumed);
        assert_eq!(last.harvest_count, berry.max_harvest_cycles);
    }

    #[test]
    fn test_regrown_plant_needs_one_stage_to_be_ready_again() {
        let berry = Species::builder("berry", "Berry", CropCategory::Fruit)
            .multi_harvest()
            .build();
        let mut plant = watered(new_plant("berry"), 3);
        plant.growth_stage = TERMINAL_STAGE;
        plant.harvest(&berry, Season::Summer).expect("ready");

        assert!(plant.advance_growth(&berry, berry.stage_duration, Season::Summer));
        assert!(plant.is_ready_to_harvest());
    }

    #[test]
    fn test_evaporate() {
        let mut plant = watered(new_plant("wheat"), 2);
        assert!(plant.evaporate());
        assert_eq!(plant.water_level(), 0);
        assert!(!plant.evaporate());
    }
}
