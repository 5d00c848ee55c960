//! ID types for species and inventory items.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Suffix appended to a species id to name its seed item.
pub const SEED_SUFFIX: &str = "_seeds";

/// Identifier of a crop species, e.g. `"wheat"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(String);

impl SpeciesId {
    /// Creates a species ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Item consumed when planting this species.
    #[must_use]
    pub fn seed_item(&self) -> ItemId {
        ItemId(format!("{}{SEED_SUFFIX}", self.0))
    }

    /// Item credited when harvesting this species.
    #[must_use]
    pub fn crop_item(&self) -> ItemId {
        ItemId(self.0.clone())
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpeciesId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for SpeciesId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of an inventory item, e.g. `"wheat_seeds"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates an item ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
