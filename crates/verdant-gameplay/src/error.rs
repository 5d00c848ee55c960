//! Errors returned by farm actions.
//!
//! Every variant is a recoverable, expected outcome of a player action. The
//! caller decides what feedback to show; nothing here is fatal.

use thiserror::Error;
use verdant_common::{SpeciesId, TileCoord};

/// Farm action error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FarmError {
    /// Species id is not in the catalog
    #[error("Unknown species: {0}")]
    UnknownSpecies(SpeciesId),

    /// Terrain at the coordinate cannot be farmed
    #[error("Tile {0} is not farmable")]
    NotFarmable(TileCoord),

    /// A plant already occupies the coordinate
    #[error("Tile {0} is already planted")]
    CellOccupied(TileCoord),

    /// Coordinate lies outside a bounded grid
    #[error("Tile {0} is outside the farm")]
    OutOfBounds(TileCoord),

    /// Plant has not reached the harvestable stage
    #[error("Plant is not ready to harvest (stage {stage})")]
    NotReady {
        /// Current growth stage
        stage: u8,
    },

    /// Nothing is planted at the coordinate
    #[error("Tile {0} has nothing planted")]
    Empty(TileCoord),

    /// Caller's inventory has no seed for the species
    #[error("No {0} seeds left")]
    InsufficientSeed(SpeciesId),

    /// Caller's inventory has no room for the harvest
    #[error("No room in inventory for {0}")]
    StorageFull(SpeciesId),
}

/// Result type for farm actions.
pub type FarmResult<T> = Result<T, FarmError>;
