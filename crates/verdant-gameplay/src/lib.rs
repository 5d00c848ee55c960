//! # Verdant Gameplay
//!
//! Farming systems for Verdant.
//!
//! This crate provides the crop simulation and everything it touches:
//! - Species catalog (21 crops in four categories)
//! - Plant instances with growth, water, health and harvest cycles
//! - Terrain queries and the plot grid
//! - Lifecycle engine driven by wall-clock time
//! - Seasons and the season clock
//! - Inventory, player state and statistics
//! - Event bus for HUD and sound notifications
//! - Farm session orchestrator
//! - Snapshot codec for save files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod events;
pub mod inventory;
pub mod lifecycle;
pub mod plants;
pub mod player;
pub mod plot;
pub mod save;
pub mod season;
pub mod session;
pub mod species;
pub mod stats;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::inventory::*;
    pub use crate::lifecycle::*;
    pub use crate::plants::*;
    pub use crate::player::*;
    pub use crate::plot::*;
    pub use crate::save::{
        format_save_date, DecodedSave, InventoryData, PlayerData, PlotEntry, PlotSnapshot,
        SaveError, SaveResult, SaveSnapshot, SnapshotSource, SAVE_DATE_FORMAT,
    };
    pub use crate::season::*;
    pub use crate::session::*;
    pub use crate::species::*;
    pub use crate::stats::*;
    pub use crate::terrain::*;
}

pub use prelude::*;
