//! Plot grid: the sparse map from tile coordinate to cell state.
//!
//! The grid enforces only spatial rules (bounds, terrain, occupancy). Seed
//! stock and yield crediting belong to the caller; see
//! [`crate::session::FarmSession`].

use ahash::AHashMap;
use tracing::debug;

use verdant_common::{SpeciesId, TileCoord, Timestamp};

use crate::error::{FarmError, FarmResult};
use crate::plants::{PlantHarvest, PlantInstance, MAX_WATER_LEVEL};
use crate::season::Season;
use crate::species::{Species, SpeciesCatalog};
use crate::terrain::TerrainQuery;

/// State of a single plot cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlotCell {
    /// Nothing planted.
    #[default]
    Empty,
    /// A crop is growing.
    Planted(PlantInstance),
    /// The crop reached its terminal stage and awaits harvest.
    ReadyToHarvest(PlantInstance),
}

static EMPTY_CELL: PlotCell = PlotCell::Empty;

impl PlotCell {
    /// The plant in this cell, if any.
    #[must_use]
    pub fn plant(&self) -> Option<&PlantInstance> {
        match self {
            Self::Empty => None,
            Self::Planted(plant) | Self::ReadyToHarvest(plant) => Some(plant),
        }
    }

    /// Mutable access to the plant in this cell, if any.
    pub fn plant_mut(&mut self) -> Option<&mut PlantInstance> {
        match self {
            Self::Empty => None,
            Self::Planted(plant) | Self::ReadyToHarvest(plant) => Some(plant),
        }
    }

    /// Whether nothing is planted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether the cell awaits harvest.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::ReadyToHarvest(_))
    }

    /// Wraps a plant in the variant matching its stage.
    #[must_use]
    pub fn from_plant(plant: PlantInstance) -> Self {
        if plant.is_ready_to_harvest() {
            Self::ReadyToHarvest(plant)
        } else {
            Self::Planted(plant)
        }
    }

    /// Re-derives the variant from the plant's stage. Returns true if the
    /// cell just became ready.
    pub(crate) fn sync_readiness(&mut self) -> bool {
        let was_ready = self.is_ready();
        let cell = std::mem::take(self);
        *self = match cell {
            Self::Empty => Self::Empty,
            Self::Planted(plant) | Self::ReadyToHarvest(plant) => Self::from_plant(plant),
        };
        !was_ready && self.is_ready()
    }
}

/// Read-only projection of a cell for the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropRenderInfo {
    /// Species planted.
    pub species_id: SpeciesId,
    /// Growth stage (selects the sprite).
    pub stage: u8,
    /// Whether the cell awaits harvest.
    pub is_ready: bool,
    /// Water level (selects the soil tint).
    pub water_level: u8,
}

/// Sparse grid of plot cells.
#[derive(Debug, Clone, Default)]
pub struct PlotGrid {
    /// Non-empty cells only.
    cells: AHashMap<TileCoord, PlotCell>,
    /// Optional `(cols, rows)` limit anchored at the origin.
    bounds: Option<(u32, u32)>,
    /// Time of the last lifecycle tick.
    last_tick_time: Timestamp,
}

impl PlotGrid {
    /// Create an unbounded, empty grid.
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self {
            cells: AHashMap::new(),
            bounds: None,
            last_tick_time: now,
        }
    }

    /// Create an empty grid limited to `cols` x `rows`.
    #[must_use]
    pub fn bounded(cols: u32, rows: u32, now: Timestamp) -> Self {
        Self {
            bounds: Some((cols, rows)),
            ..Self::new(now)
        }
    }

    /// Limit the grid to `cols` x `rows`. Existing cells outside the new
    /// bounds are kept.
    pub fn set_bounds(&mut self, bounds: Option<(u32, u32)>) {
        self.bounds = bounds;
    }

    /// The `(cols, rows)` limit, if bounded.
    #[must_use]
    pub fn bounds(&self) -> Option<(u32, u32)> {
        self.bounds
    }

    /// Time of the last lifecycle tick.
    #[must_use]
    pub fn last_tick_time(&self) -> Timestamp {
        self.last_tick_time
    }

    pub(crate) fn set_last_tick_time(&mut self, now: Timestamp) {
        self.last_tick_time = now;
    }

    /// Whether `coord` lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        match self.bounds {
            Some((cols, rows)) => coord.to_index(cols, rows).is_some(),
            None => true,
        }
    }

    /// The cell at `coord`.
    #[must_use]
    pub fn cell(&self, coord: TileCoord) -> &PlotCell {
        self.cells.get(&coord).unwrap_or(&EMPTY_CELL)
    }

    /// The plant at `coord`, if any.
    #[must_use]
    pub fn plant_at(&self, coord: TileCoord) -> Option<&PlantInstance> {
        self.cells.get(&coord).and_then(PlotCell::plant)
    }

    /// Whether a seed could go in at `coord`, without planting it.
    ///
    /// Fails with `OutOfBounds`, then `NotFarmable`, then `CellOccupied`, in
    /// that order.
    pub fn check_plantable<T: TerrainQuery + ?Sized>(
        &self,
        coord: TileCoord,
        terrain: &T,
    ) -> FarmResult<()> {
        if !self.in_bounds(coord) {
            return Err(FarmError::OutOfBounds(coord));
        }
        if !terrain.is_farmable(coord) {
            return Err(FarmError::NotFarmable(coord));
        }
        if self.cells.contains_key(&coord) {
            return Err(FarmError::CellOccupied(coord));
        }
        Ok(())
    }

    /// Put a new seed in the ground. See [`Self::check_plantable`] for the
    /// failure cases.
    pub fn plant<T: TerrainQuery + ?Sized>(
        &mut self,
        coord: TileCoord,
        species: &Species,
        terrain: &T,
        now: Timestamp,
        season: Season,
    ) -> FarmResult<()> {
        self.check_plantable(coord, terrain)?;

        let plant = PlantInstance::new(species.id.clone(), now, season);
        self.cells.insert(coord, PlotCell::Planted(plant));
        debug!("Planted {} at {}", species.id, coord);
        Ok(())
    }

    /// Water the plant at `coord`.
    ///
    /// Returns whether anything changed; empty cells and plants already at the
    /// water cap return false.
    pub fn water(&mut self, coord: TileCoord, now: Timestamp) -> bool {
        self.cells
            .get_mut(&coord)
            .and_then(PlotCell::plant_mut)
            .is_some_and(|plant| plant.water(now))
    }

    /// Harvest the plant at `coord`.
    pub fn harvest(
        &mut self,
        coord: TileCoord,
        catalog: &SpeciesCatalog,
        season: Season,
    ) -> FarmResult<PlantHarvest> {
        let cell = self.cells.get_mut(&coord).ok_or(FarmError::Empty(coord))?;
        let plant = match &mut *cell {
            PlotCell::Empty => return Err(FarmError::Empty(coord)),
            PlotCell::Planted(plant) => {
                return Err(FarmError::NotReady {
                    stage: plant.growth_stage(),
                })
            }
            PlotCell::ReadyToHarvest(plant) => plant,
        };

        let species = catalog.lookup(plant.species_id().as_str())?;
        let result = plant.harvest(species, season)?;

        if result.consumed {
            self.cells.remove(&coord);
        } else {
            cell.sync_readiness();
        }

        debug!(
            "Harvested {} x{} at {} (consumed: {})",
            result.species_id, result.amount, coord, result.consumed
        );
        Ok(result)
    }

    /// Remove whatever is planted at `coord`.
    pub fn clear(&mut self, coord: TileCoord) -> Option<PlantInstance> {
        match self.cells.remove(&coord)? {
            PlotCell::Empty => None,
            PlotCell::Planted(plant) | PlotCell::ReadyToHarvest(plant) => Some(plant),
        }
    }

    /// Render projection of the cell at `coord`; `None` for empty cells.
    #[must_use]
    pub fn crop_render_info(&self, coord: TileCoord) -> Option<CropRenderInfo> {
        let cell = self.cells.get(&coord)?;
        let plant = cell.plant()?;
        Some(CropRenderInfo {
            species_id: plant.species_id().clone(),
            stage: plant.growth_stage(),
            is_ready: cell.is_ready(),
            water_level: plant.water_level(),
        })
    }

    /// Number of planted cells (growing or ready).
    #[must_use]
    pub fn planted_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether nothing is planted anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over non-empty cells.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &PlotCell)> {
        self.cells.iter().map(|(&coord, cell)| (coord, cell))
    }

    /// Coordinates of all non-empty cells, sorted.
    #[must_use]
    pub fn coords(&self) -> Vec<TileCoord> {
        let mut coords: Vec<_> = self.cells.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    pub(crate) fn cell_mut(&mut self, coord: TileCoord) -> Option<&mut PlotCell> {
        self.cells.get_mut(&coord)
    }

    /// Coordinates of cells awaiting harvest, sorted.
    #[must_use]
    pub fn ready_cells(&self) -> Vec<TileCoord> {
        let mut ready: Vec<_> = self
            .iter()
            .filter(|(_, cell)| cell.is_ready())
            .map(|(coord, _)| coord)
            .collect();
        ready.sort_unstable();
        ready
    }

    /// Coordinates of living plants below the water cap, sorted.
    #[must_use]
    pub fn needs_water(&self) -> Vec<TileCoord> {
        let mut thirsty: Vec<_> = self
            .iter()
            .filter(|(_, cell)| {
                cell.plant()
                    .is_some_and(|p| !p.is_withered() && p.water_level() < MAX_WATER_LEVEL)
            })
            .map(|(coord, _)| coord)
            .collect();
        thirsty.sort_unstable();
        thirsty
    }

    /// Place a restored plant, replacing whatever was there. Used when loading
    /// snapshots, which bypass terrain and bounds checks.
    pub(crate) fn insert_restored(&mut self, coord: TileCoord, plant: PlantInstance) {
        self.cells.insert(coord, PlotCell::from_plant(plant));
    }
}
