//! # Verdant Common
//!
//! Common types shared by the Verdant farming simulation crates.
//!
//! This crate provides foundational types used across all subsystems:
//! - Tile coordinates and their `"(col, row)"` save-file key form
//! - ID types (SpeciesId, ItemId)
//! - Wall-clock timestamps
//! - Version information for save formats
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod time;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::time::*;
    pub use crate::version::*;
}

pub use prelude::*;
