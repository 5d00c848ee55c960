//! Farm session: the orchestrator the game loop talks to.
//!
//! A session owns the plot grid together with everything the grid needs from
//! the outside (terrain, species catalog, season clock, inventory) and applies
//! the contracts between them:
//! - one seed is taken per successful planting, none on failure
//! - one yield credit per successful harvest
//! - every outcome is published on the event bus

use std::time::Duration;
use tracing::{debug, info, warn};

use verdant_common::{SpeciesId, TileCoord, Timestamp};

use crate::error::{FarmError, FarmResult};
use crate::events::{EventBus, FarmEvent};
use crate::inventory::{Inventory, SeedInventory};
use crate::lifecycle::{LifecycleConfig, LifecycleEngine, TickReport};
use crate::plants::PlantHarvest;
use crate::player::PlayerState;
use crate::plot::{CropRenderInfo, PlotGrid};
use crate::save::{self, SaveResult, SaveSnapshot, SnapshotSource};
use crate::season::{Season, SeasonClock, SeasonProvider};
use crate::species::SpeciesCatalog;
use crate::stats::GameStats;
use crate::terrain::TileMap;

/// Species whose seeds a new farm starts with.
pub const STARTER_SPECIES: [&str; 4] = ["wheat", "potato", "carrot", "tomato"];

/// Settings for building a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Save name used for snapshots.
    pub save_name: String,
    /// Farm width in tiles.
    pub farm_cols: u32,
    /// Farm height in tiles.
    pub farm_rows: u32,
    /// Seeds of each starter species in a new game.
    pub starting_seeds: u32,
    /// Length of one season of play time.
    pub season_length: Duration,
    /// Growth and decay tunables.
    pub lifecycle: LifecycleConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            save_name: "farm".to_string(),
            farm_cols: 12,
            farm_rows: 8,
            starting_seeds: 10,
            season_length: Duration::from_secs(600),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

/// A running farm.
#[derive(Debug)]
pub struct FarmSession {
    settings: SessionSettings,
    catalog: SpeciesCatalog,
    terrain: TileMap,
    grid: PlotGrid,
    engine: LifecycleEngine,
    seasons: SeasonClock,
    inventory: Inventory,
    player: PlayerState,
    stats: GameStats,
    events: EventBus,
}

impl FarmSession {
    /// Start a new game: fully tilled farm, starter seeds, spring.
    #[must_use]
    pub fn new_game(settings: SessionSettings, now: Timestamp) -> Self {
        let catalog = SpeciesCatalog::with_defaults();
        let starters: Vec<SpeciesId> = STARTER_SPECIES
            .iter()
            .filter(|id| catalog.contains(id))
            .map(|id| SpeciesId::new(*id))
            .collect();
        let inventory = Inventory::with_starter_seeds(&starters, settings.starting_seeds);
        let terrain = TileMap::all_farmable(settings.farm_cols, settings.farm_rows);

        info!(
            "New farm '{}' ({}x{})",
            settings.save_name, settings.farm_cols, settings.farm_rows
        );
        Self::with_parts(settings, catalog, terrain, inventory, now)
    }

    /// Build a session from explicit parts.
    #[must_use]
    pub fn with_parts(
        settings: SessionSettings,
        catalog: SpeciesCatalog,
        terrain: TileMap,
        inventory: Inventory,
        now: Timestamp,
    ) -> Self {
        let grid = PlotGrid::bounded(settings.farm_cols, settings.farm_rows, now);
        let seasons = SeasonClock::new(Season::Spring, settings.season_length);
        let player = PlayerState::at(
            settings.farm_cols as f32 / 2.0,
            settings.farm_rows as f32 / 2.0,
        );
        Self {
            engine: LifecycleEngine::new(settings.lifecycle),
            settings,
            catalog,
            terrain,
            grid,
            seasons,
            inventory,
            player,
            stats: GameStats::default(),
            events: EventBus::default(),
        }
    }

    /// Rebuild a session from a snapshot, or start a new game if the snapshot
    /// is missing or cannot be read.
    #[must_use]
    pub fn restore_or_new(
        snapshot: Option<&SaveSnapshot>,
        settings: SessionSettings,
        now: Timestamp,
    ) -> Self {
        let mut session = Self::new_game(settings, now);
        if let Some(snapshot) = snapshot {
            if let Err(e) = session.restore(snapshot, now) {
                warn!("Could not restore '{}': {}; starting fresh", snapshot.save_name, e);
            }
        }
        session
    }

    /// Settings this session was built with.
    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Save name.
    #[must_use]
    pub fn save_name(&self) -> &str {
        &self.settings.save_name
    }

    /// Species catalog.
    #[must_use]
    pub fn catalog(&self) -> &SpeciesCatalog {
        &self.catalog
    }

    /// Plot grid.
    #[must_use]
    pub fn grid(&self) -> &PlotGrid {
        &self.grid
    }

    /// Terrain.
    #[must_use]
    pub fn terrain(&self) -> &TileMap {
        &self.terrain
    }

    /// Mutable terrain, for tilling and landscaping.
    pub fn terrain_mut(&mut self) -> &mut TileMap {
        &mut self.terrain
    }

    /// Inventory.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Mutable inventory.
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// Player state.
    #[must_use]
    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Mutable player state.
    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    /// Statistics.
    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Current season.
    #[must_use]
    pub fn season(&self) -> Season {
        self.seasons.current_season()
    }

    /// Season clock.
    #[must_use]
    pub fn season_clock(&self) -> &SeasonClock {
        &self.seasons
    }

    /// Total play time.
    #[must_use]
    pub fn play_time(&self) -> Duration {
        self.seasons.elapsed()
    }

    /// Event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Drain pending events (once per frame, by the UI).
    pub fn drain_events(&self) -> Vec<FarmEvent> {
        self.events.drain()
    }

    /// Render projection of one cell.
    #[must_use]
    pub fn crop_render_info(&self, coord: TileCoord) -> Option<CropRenderInfo> {
        self.grid.crop_render_info(coord)
    }

    /// Plant one seed of `species_id` at `coord`.
    pub fn plant(&mut self, coord: TileCoord, species_id: &str, now: Timestamp) -> FarmResult<()> {
        let result = self.try_plant(coord, species_id, now);
        self.report(coord, result)
    }

    fn try_plant(&mut self, coord: TileCoord, species_id: &str, now: Timestamp) -> FarmResult<()> {
        let species = self.catalog.lookup(species_id)?;
        self.grid.check_plantable(coord, &self.terrain)?;
        if !self.inventory.has_seed(&species.id) {
            return Err(FarmError::InsufficientSeed(species.id.clone()));
        }

        self.grid
            .plant(coord, species, &self.terrain, now, self.seasons.current_season())?;
        self.inventory
            .remove_seed(&species.id)
            .map_err(|_| FarmError::InsufficientSeed(species.id.clone()))?;

        self.stats.record_planted();
        self.events.publish(FarmEvent::Planted {
            coord,
            species_id: species.id.clone(),
        });
        Ok(())
    }

    /// Water the plant at `coord`. Returns whether anything changed.
    pub fn water(&mut self, coord: TileCoord, now: Timestamp) -> bool {
        if !self.grid.water(coord, now) {
            return false;
        }
        self.stats.record_watered();
        let water_level = self
            .grid
            .plant_at(coord)
            .map_or(0, |plant| plant.water_level());
        self.events.publish(FarmEvent::Watered { coord, water_level });
        true
    }

    /// Harvest the plant at `coord` and credit the yield.
    pub fn harvest(&mut self, coord: TileCoord) -> FarmResult<PlantHarvest> {
        let result = self.try_harvest(coord);
        self.report(coord, result)
    }

    fn try_harvest(&mut self, coord: TileCoord) -> FarmResult<PlantHarvest> {
        if let Some(plant) = self.grid.plant_at(coord) {
            if plant.is_ready_to_harvest() && !self.inventory.can_store_crop(plant.species_id()) {
                return Err(FarmError::StorageFull(plant.species_id().clone()));
            }
        }

        let season = self.seasons.current_season();
        let harvest = self.grid.harvest(coord, &self.catalog, season)?;
        self.inventory
            .add_crop(&harvest.species_id, harvest.amount)
            .map_err(|_| FarmError::StorageFull(harvest.species_id.clone()))?;

        self.stats.record_harvest(harvest.amount);
        self.events.publish(FarmEvent::Harvested {
            coord,
            species_id: harvest.species_id.clone(),
            amount: harvest.amount,
            consumed: harvest.consumed,
        });
        Ok(harvest)
    }

    /// Remove whatever is planted at `coord`. No seed is refunded.
    pub fn clear(&mut self, coord: TileCoord) -> bool {
        let cleared = self.grid.clear(coord).is_some();
        if cleared {
            self.events.publish(FarmEvent::Cleared { coord });
        }
        cleared
    }

    /// Advance play time, the season and every crop to `now`.
    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        let elapsed = now.saturating_since(self.grid.last_tick_time());
        if let Some(season) = self.seasons.advance(elapsed) {
            info!("Season changed to {}", season.display_name());
            self.events.publish(FarmEvent::SeasonChanged { season });
        }
        self.stats.current_season = self.seasons.current_season();

        let report = self
            .engine
            .tick(&mut self.grid, &self.catalog, &self.seasons, now);
        self.events.publish_all(report.events.iter().cloned());
        report
    }

    /// Capture a snapshot. Call between ticks.
    #[must_use]
    pub fn snapshot(&self, now: Timestamp) -> SaveSnapshot {
        save::serialize(
            &SnapshotSource {
                save_name: &self.settings.save_name,
                grid: &self.grid,
                player: &self.player,
                inventory: &self.inventory,
                stats: &self.stats,
                play_time: self.play_time(),
            },
            now,
        )
    }

    /// Replace farm state with the contents of `snapshot`.
    ///
    /// Returns the per-cell warnings. On error the session is unchanged.
    pub fn restore(&mut self, snapshot: &SaveSnapshot, now: Timestamp) -> SaveResult<Vec<String>> {
        let decoded = save::deserialize(snapshot, &self.catalog, now)?;

        let mut grid = decoded.grid;
        grid.set_bounds(Some((self.settings.farm_cols, self.settings.farm_rows)));
        self.grid = grid;
        self.inventory = decoded.inventory;
        self.player = decoded.player;
        self.stats = decoded.stats;
        self.seasons =
            SeasonClock::new(Season::Spring, self.settings.season_length).with_elapsed(decoded.play_time);
        self.stats.current_season = self.seasons.current_season();
        if !decoded.save_name.is_empty() {
            self.settings.save_name = decoded.save_name;
        }

        info!(
            "Restored '{}': {} plots, {} warnings",
            self.settings.save_name,
            self.grid.planted_count(),
            decoded.warnings.len()
        );
        Ok(decoded.warnings)
    }

    fn report<T>(&self, coord: TileCoord, result: FarmResult<T>) -> FarmResult<T> {
        if let Err(e) = &result {
            debug!("Action at {} failed: {}", coord, e);
            self.events.publish(FarmEvent::ActionFailed {
                coord,
                reason: e.to_string(),
            });
        }
        result
    }
}
