//! Species catalog.
//!
//! Static per-species parameters: growth timing, yield, optimal seasons and
//! multi-harvest behaviour. The catalog is built once at startup and is
//! read-only afterwards.
//!
//! Every species has exactly [`GROWTH_STAGES`] stages. Stage
//! [`TERMINAL_STAGE`] is harvestable; sprite sheets rely on this.

use std::collections::BTreeMap;
use std::time::Duration;

use verdant_common::SpeciesId;

use crate::error::{FarmError, FarmResult};
use crate::season::Season;

/// Number of growth stages shared by all species.
pub const GROWTH_STAGES: u8 = 5;

/// Harvestable stage index.
pub const TERMINAL_STAGE: u8 = GROWTH_STAGES - 1;

/// Harvest cycles granted to multi-harvest species.
pub const MULTI_HARVEST_CYCLES: u32 = 3;

/// Default time spent in each stage.
pub const DEFAULT_STAGE_DURATION: Duration = Duration::from_secs(10);

/// Broad crop family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropCategory {
    /// Grain crops.
    Cereal,
    /// Beans, peas and pulses.
    Legume,
    /// Roots, leaves and other vegetables.
    Vegetable,
    /// Fruits and berries.
    Fruit,
}

impl CropCategory {
    /// Display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Cereal => "Cereal",
            Self::Legume => "Legume",
            Self::Vegetable => "Vegetable",
            Self::Fruit => "Fruit",
        }
    }
}

/// Category-specific attributes. Only the fields meaningful for the species'
/// category are set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTraits {
    /// Protein content, percent of dry weight (cereals, legumes).
    pub protein_content: Option<f32>,
    /// Nitrogen fixed into the soil, 0.0 to 1.0 (legumes).
    pub nitrogen_fixation: Option<f32>,
    /// Dominant nutrient (vegetables).
    pub nutrient_profile: Option<&'static str>,
    /// Sugar content, percent (fruits).
    pub sugar_content: Option<f32>,
}

/// Definition of a crop species.
#[derive(Debug, Clone)]
pub struct Species {
    /// Unique identifier.
    pub id: SpeciesId,
    /// Display name.
    pub name: String,
    /// Crop family.
    pub category: CropCategory,
    /// Category-specific attributes.
    pub traits: CategoryTraits,
    /// Yield before modifiers.
    pub base_yield: f32,
    /// Time spent in each growth stage at rate 1.0.
    pub stage_duration: Duration,
    /// Seasons granting the growth and yield bonus.
    pub optimal_seasons: Vec<Season>,
    /// Whether the plant regrows after harvest.
    pub multi_harvest: bool,
    /// Regrow harvests allowed before the plant is consumed.
    pub max_harvest_cycles: u32,
    /// Species-specific yield multiplier.
    pub special_bonus: f32,
}

impl Species {
    /// Create a new species builder.
    #[must_use]
    pub fn builder(id: &str, name: &str, category: CropCategory) -> SpeciesBuilder {
        SpeciesBuilder::new(id, name, category)
    }

    /// Whether `season` is one of the optimal seasons.
    #[must_use]
    pub fn is_optimal(&self, season: Season) -> bool {
        self.optimal_seasons.contains(&season)
    }

    /// Time from seed to harvestable at rate 1.0.
    #[must_use]
    pub fn total_growth_time(&self) -> Duration {
        self.stage_duration * u32::from(TERMINAL_STAGE)
    }
}

/// Builder for species definitions.
#[derive(Debug)]
pub struct SpeciesBuilder {
    species: Species,
}

impl SpeciesBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(id: &str, name: &str, category: CropCategory) -> Self {
        Self {
            species: Species {
                id: SpeciesId::new(id),
                name: name.to_string(),
                category,
                traits: CategoryTraits::default(),
                base_yield: 10.0,
                stage_duration: DEFAULT_STAGE_DURATION,
                optimal_seasons: Vec::new(),
                multi_harvest: false,
                max_harvest_cycles: 0,
                special_bonus: 1.0,
            },
        }
    }

    /// Set base yield.
    #[must_use]
    pub fn base_yield(mut self, amount: f32) -> Self {
        self.species.base_yield = amount;
        self
    }

    /// Set per-stage duration in seconds.
    #[must_use]
    pub fn stage_secs(mut self, secs: u64) -> Self {
        self.species.stage_duration = Duration::from_secs(secs);
        self
    }

    /// Set per-stage duration.
    #[must_use]
    pub fn stage_duration(mut self, duration: Duration) -> Self {
        self.species.stage_duration = duration;
        self
    }

    /// Set optimal seasons.
    #[must_use]
    pub fn seasons(mut self, seasons: &[Season]) -> Self {
        self.species.optimal_seasons = seasons.to_vec();
        self
    }

    /// Mark as multi-harvest with the standard cycle count.
    #[must_use]
    pub fn multi_harvest(mut self) -> Self {
        self.species.multi_harvest = true;
        self.species.max_harvest_cycles = MULTI_HARVEST_CYCLES;
        self
    }

    /// Set species-specific yield multiplier.
    #[must_use]
    pub fn special_bonus(mut self, bonus: f32) -> Self {
        self.species.special_bonus = bonus;
        self
    }

    /// Set protein content.
    #[must_use]
    pub fn protein(mut self, percent: f32) -> Self {
        self.species.traits.protein_content = Some(percent);
        self
    }

    /// Set nitrogen fixation.
    #[must_use]
    pub fn nitrogen(mut self, fixation: f32) -> Self {
        self.species.traits.nitrogen_fixation = Some(fixation);
        self
    }

    /// Set dominant nutrient.
    #[must_use]
    pub fn nutrient(mut self, nutrient: &'static str) -> Self {
        self.species.traits.nutrient_profile = Some(nutrient);
        self
    }

    /// Set sugar content.
    #[must_use]
    pub fn sugar(mut self, percent: f32) -> Self {
        self.species.traits.sugar_content = Some(percent);
        self
    }

    /// Build the species definition.
    #[must_use]
    pub fn build(self) -> Species {
        self.species
    }
}

/// Read-only lookup table of species.
#[derive(Debug, Default)]
pub struct SpeciesCatalog {
    species: BTreeMap<SpeciesId, Species>,
}

impl SpeciesCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the standard species table.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for species in default_species() {
            catalog.register(species);
        }
        catalog
    }

    /// Register a species definition, replacing any with the same id.
    pub fn register(&mut self, species: Species) {
        self.species.insert(species.id.clone(), species);
    }

    /// Look up a species by id.
    pub fn lookup(&self, id: &str) -> FarmResult<&Species> {
        self.species
            .get(id)
            .ok_or_else(|| FarmError::UnknownSpecies(SpeciesId::new(id)))
    }

    /// Whether the catalog knows `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.species.contains_key(id)
    }

    /// Number of species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Iterate over all species in id order.
    pub fn all(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    /// Species of one category.
    pub fn by_category(&self, category: CropCategory) -> impl Iterator<Item = &Species> {
        self.species.values().filter(move |s| s.category == category)
    }

    /// Species whose optimal seasons include `season`.
    pub fn in_season(&self, season: Season) -> impl Iterator<Item = &Species> {
        self.species.values().filter(move |s| s.is_optimal(season))
    }
}

/// The standard species table.
fn default_species() -> Vec<Species> {
    use CropCategory::{Cereal, Fruit, Legume, Vegetable};
    use Season::{Fall, Spring, Summer, Winter};

    vec![
        // Cereals
        Species::builder("wheat", "Wheat", Cereal)
            .base_yield(45.0)
            .stage_secs(10)
            .seasons(&[Spring, Summer])
            .special_bonus(1.1)
            .protein(12.6)
            .build(),
        Species::builder("rice", "Rice", Cereal)
            .base_yield(50.0)
            .stage_secs(12)
            .seasons(&[Summer])
            .protein(7.1)
            .build(),
        Species::builder("corn", "Corn", Cereal)
            .base_yield(55.0)
            .stage_secs(12)
            .seasons(&[Summer])
            .special_bonus(1.05)
            .protein(9.4)
            .build(),
        Species::builder("barley", "Barley", Cereal)
            .base_yield(40.0)
            .stage_secs(9)
            .seasons(&[Spring, Fall])
            .protein(12.5)
            .build(),
        Species::builder("oats", "Oats", Cereal)
            .base_yield(38.0)
            .stage_secs(9)
            .seasons(&[Spring, Fall])
            .protein(16.9)
            .build(),
        Species::builder("sorghum", "Sorghum", Cereal)
            .base_yield(42.0)
            .stage_secs(11)
            .seasons(&[Summer, Fall])
            .protein(11.3)
            .build(),
        // Legumes
        Species::builder("soybean", "Soybean", Legume)
            .base_yield(30.0)
            .stage_secs(11)
            .seasons(&[Summer])
            .special_bonus(1.15)
            .protein(36.5)
            .nitrogen(0.8)
            .build(),
        Species::builder("peanut", "Peanut", Legume)
            .base_yield(28.0)
            .stage_secs(12)
            .seasons(&[Summer])
            .special_bonus(1.1)
            .protein(25.8)
            .nitrogen(0.6)
            .build(),
        Species::builder("chickpea", "Chickpea", Legume)
            .base_yield(26.0)
            .stage_secs(10)
            .seasons(&[Spring])
            .special_bonus(1.1)
            .protein(19.3)
            .nitrogen(0.5)
            .build(),
        Species::builder("lentil", "Lentil", Legume)
            .base_yield(24.0)
            .stage_secs(9)
            .seasons(&[Spring, Fall])
            .special_bonus(1.1)
            .protein(25.0)
            .nitrogen(0.55)
            .build(),
        Species::builder("green_bean", "Green Bean", Legume)
            .base_yield(22.0)
            .stage_secs(8)
            .seasons(&[Spring, Summer])
            .multi_harvest()
            .special_bonus(1.05)
            .protein(1.8)
            .nitrogen(0.4)
            .build(),
        // Vegetables
        Species::builder("potato", "Potato", Vegetable)
            .base_yield(60.0)
            .stage_secs(11)
            .seasons(&[Spring, Fall])
            .nutrient("starch")
            .build(),
        Species::builder("carrot", "Carrot", Vegetable)
            .base_yield(35.0)
            .stage_secs(8)
            .seasons(&[Spring, Fall])
            .nutrient("vitamin A")
            .build(),
        Species::builder("tomato", "Tomato", Vegetable)
            .base_yield(32.0)
            .stage_secs(10)
            .seasons(&[Summer])
            .multi_harvest()
            .nutrient("vitamin C")
            .build(),
        Species::builder("cabbage", "Cabbage", Vegetable)
            .base_yield(40.0)
            .stage_secs(10)
            .seasons(&[Fall, Winter])
            .nutrient("vitamin K")
            .build(),
        Species::builder("onion", "Onion", Vegetable)
            .base_yield(34.0)
            .stage_secs(9)
            .seasons(&[Spring])
            .nutrient("quercetin")
            .build(),
        // Fruits
        Species::builder("strawberry", "Strawberry", Fruit)
            .base_yield(20.0)
            .stage_secs(8)
            .seasons(&[Spring])
            .multi_harvest()
            .special_bonus(1.2)
            .sugar(4.9)
            .build(),
        Species::builder("blueberry", "Blueberry", Fruit)
            .base_yield(18.0)
            .stage_secs(10)
            .seasons(&[Summer])
            .multi_harvest()
            .special_bonus(1.2)
            .sugar(10.0)
            .build(),
        Species::builder("grape", "Grape", Fruit)
            .base_yield(25.0)
            .stage_secs(13)
            .seasons(&[Summer, Fall])
            .multi_harvest()
            .special_bonus(1.15)
            .sugar(16.0)
            .build(),
        Species::builder("watermelon", "Watermelon", Fruit)
            .base_yield(48.0)
            .stage_secs(14)
            .seasons(&[Summer])
            .special_bonus(1.1)
            .sugar(6.2)
            .build(),
        Species::builder("pumpkin", "Pumpkin", Fruit)
            .base_yield(52.0)
            .stage_secs(13)
            .seasons(&[Fall])
            .sugar(2.8)
            .build(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_size() {
        let catalog = SpeciesCatalog::with_defaults();
        assert_eq!(catalog.len(), 21);
    }

    #[test]
    fn test_lookup_wheat() {
        let catalog = SpeciesCatalog::with_defaults();
        let wheat = catalog.lookup("wheat").expect("wheat is in the catalog");

        assert!((wheat.base_yield - 45.0).abs() < f32::EPSILON);
        assert!((wheat.special_bonus - 1.1).abs() < f32::EPSILON);
        assert!(wheat.is_optimal(Season::Spring));
        assert!(wheat.is_optimal(Season::Summer));
        assert!(!wheat.is_optimal(Season::Winter));
        assert!(!wheat.multi_harvest);
        assert_eq!(wheat.total_growth_time(), Duration::from_secs(40));
    }

    #[test]
    fn test_lookup_unknown_is_not_substituted() {
        let catalog = SpeciesCatalog::with_defaults();
        assert_eq!(
            catalog.lookup("mandrake").err(),
            Some(FarmError::UnknownSpecies(SpeciesId::new("mandrake")))
        );
    }

    #[test]
    fn test_multi_harvest_species_have_three_cycles() {
        let catalog = SpeciesCatalog::with_defaults();
        for species in catalog.all() {
            if species.multi_harvest {
                assert_eq!(species.max_harvest_cycles, MULTI_HARVEST_CYCLES, "{}", species.id);
            } else {
                assert_eq!(species.max_harvest_cycles, 0, "{}", species.id);
            }
        }
        assert!(catalog.lookup("tomato").expect("tomato").multi_harvest);
    }

    #[test]
    fn test_every_species_has_a_season_and_positive_timing() {
        let catalog = SpeciesCatalog::with_defaults();
        for species in catalog.all() {
            assert!(!species.optimal_seasons.is_empty(), "{}", species.id);
            assert!(species.stage_duration > Duration::ZERO, "{}", species.id);
            assert!(species.base_yield > 0.0, "{}", species.id);
        }
    }

    #[test]
    fn test_category_traits() {
        let catalog = SpeciesCatalog::with_defaults();

        let soybean = catalog.lookup("soybean").expect("soybean");
        assert_eq!(soybean.category, CropCategory::Legume);
        assert!(soybean.traits.nitrogen_fixation.is_some());
        assert!(soybean.traits.sugar_content.is_none());

        assert_eq!(catalog.by_category(CropCategory::Cereal).count(), 6);
        assert_eq!(catalog.by_category(CropCategory::Legume).count(), 5);
        assert_eq!(catalog.by_category(CropCategory::Vegetable).count(), 5);
        assert_eq!(catalog.by_category(CropCategory::Fruit).count(), 5);
    }

    #[test]
    fn test_in_season() {
        let catalog = SpeciesCatalog::with_defaults();
        let winter: Vec<_> = catalog.in_season(Season::Winter).map(|s| s.id.as_str()).collect();
        assert_eq!(winter, vec!["cabbage"]);
    }

    #[test]
    fn test_builder_defaults() {
        let species = Species::builder("test", "Test", CropCategory::Fruit).build();
        assert_eq!(species.stage_duration, DEFAULT_STAGE_DURATION);
        assert!(!species.multi_harvest);
        assert!((species.special_bonus - 1.0).abs() < f32::EPSILON);
    }
}
