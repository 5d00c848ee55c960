//! Player inventory and the seed/crop contract the farm relies on.

use ahash::AHashMap;
use std::collections::BTreeMap;
use thiserror::Error;

use verdant_common::{ItemId, SpeciesId};

/// Default number of distinct item stacks.
pub const DEFAULT_CAPACITY: u32 = 64;

/// Inventory error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Not enough items
    #[error("Not enough {item}: need {needed}, have {have}")]
    NotEnough {
        /// Item requested
        item: ItemId,
        /// Amount needed
        needed: u32,
        /// Amount available
        have: u32,
    },
    /// Inventory full
    #[error("Inventory full: capacity {capacity}")]
    Full {
        /// Inventory capacity
        capacity: u32,
    },
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// What the farm needs from whoever holds the player's seeds and crops.
pub trait SeedInventory {
    /// Whether at least one seed of `species` is available.
    fn has_seed(&self, species: &SpeciesId) -> bool;

    /// Take one seed of `species`.
    fn remove_seed(&mut self, species: &SpeciesId) -> InventoryResult<()>;

    /// Whether `add_crop` for `species` would succeed.
    fn can_store_crop(&self, species: &SpeciesId) -> bool;

    /// Credit harvested units of `species`.
    fn add_crop(&mut self, species: &SpeciesId, amount: u32) -> InventoryResult<()>;
}

/// An inventory container keyed by item id.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    items: AHashMap<ItemId, u32>,
    capacity: u32,
    selected_index: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Inventory {
    /// Creates a new inventory with the given capacity.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            items: AHashMap::new(),
            capacity,
            selected_index: 0,
        }
    }

    /// Creates an inventory holding `count` seeds of each listed species.
    #[must_use]
    pub fn with_starter_seeds<'a>(species: impl IntoIterator<Item = &'a SpeciesId>, count: u32) -> Self {
        let mut inventory = Self::default();
        if count > 0 {
            for id in species {
                inventory.items.insert(id.seed_item(), count);
            }
        }
        inventory
    }

    /// Returns the number of unique item types.
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.items.len() as u32
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Index of the selected hotbar slot.
    #[must_use]
    pub const fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// Select a hotbar slot.
    pub fn select(&mut self, index: usize) {
        self.selected_index = index;
    }

    /// Returns the count of a specific item.
    #[must_use]
    pub fn count(&self, item: &ItemId) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Checks if the inventory contains at least the given amount.
    #[must_use]
    pub fn has(&self, item: &ItemId, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Whether `item` can be added without exceeding capacity.
    #[must_use]
    pub fn can_add(&self, item: &ItemId) -> bool {
        self.items.contains_key(item) || self.slot_count() < self.capacity
    }

    /// Adds items to the inventory.
    pub fn add(&mut self, item: ItemId, amount: u32) -> InventoryResult<()> {
        if amount == 0 {
            return Ok(());
        }
        if !self.can_add(&item) {
            return Err(InventoryError::Full {
                capacity: self.capacity,
            });
        }
        let stack = self.items.entry(item).or_insert(0);
        *stack = stack.saturating_add(amount);
        Ok(())
    }

    /// Removes items from the inventory.
    pub fn remove(&mut self, item: &ItemId, amount: u32) -> InventoryResult<()> {
        let current = self.count(item);
        if current < amount {
            return Err(InventoryError::NotEnough {
                item: item.clone(),
                needed: amount,
                have: current,
            });
        }
        if current == amount {
            self.items.remove(item);
        } else {
            self.items.insert(item.clone(), current - amount);
        }
        Ok(())
    }

    /// Returns an iterator over all items.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, u32)> + '_ {
        self.items.iter().map(|(id, &count)| (id, count))
    }

    /// Items sorted by id, for stable output.
    #[must_use]
    pub fn sorted_items(&self) -> BTreeMap<ItemId, u32> {
        self.items.iter().map(|(id, &count)| (id.clone(), count)).collect()
    }

    /// Rebuilds an inventory from saved items. Zero-count stacks are dropped
    /// and capacity grows to fit everything saved.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = (ItemId, u32)>, selected_index: usize) -> Self {
        let items: AHashMap<ItemId, u32> = items.into_iter().filter(|(_, n)| *n > 0).collect();
        let capacity = DEFAULT_CAPACITY.max(items.len() as u32);
        Self {
            items,
            capacity,
            selected_index,
        }
    }
}

impl SeedInventory for Inventory {
    fn has_seed(&self, species: &SpeciesId) -> bool {
        self.has(&species.seed_item(), 1)
    }

    fn remove_seed(&mut self, species: &SpeciesId) -> InventoryResult<()> {
        self.remove(&species.seed_item(), 1)
    }

    fn can_store_crop(&self, species: &SpeciesId) -> bool {
        self.can_add(&species.crop_item())
    }

    fn add_crop(&mut self, species: &SpeciesId, amount: u32) -> InventoryResult<()> {
        self.add(species.crop_item(), amount)
    }
}
