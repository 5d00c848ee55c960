//! Event bus for farm notifications.
//!
//! Actions and lifecycle ticks publish [`FarmEvent`]s so that the HUD, sound
//! and save systems can react without the farm knowing about them.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use verdant_common::{SpeciesId, TileCoord};

use crate::season::Season;

/// Events published by the farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FarmEvent {
    /// Seed put in the ground
    Planted {
        /// Cell planted
        coord: TileCoord,
        /// Species planted
        species_id: SpeciesId,
    },
    /// Water added to a plant
    Watered {
        /// Cell watered
        coord: TileCoord,
        /// Water level after watering
        water_level: u8,
    },
    /// Plant moved to its next growth stage
    StageAdvanced {
        /// Cell
        coord: TileCoord,
        /// New stage
        stage: u8,
    },
    /// Plant reached the harvestable stage
    BecameReady {
        /// Cell
        coord: TileCoord,
    },
    /// Crop harvested
    Harvested {
        /// Cell harvested
        coord: TileCoord,
        /// Species harvested
        species_id: SpeciesId,
        /// Units credited
        amount: u32,
        /// Whether the cell is now empty
        consumed: bool,
    },
    /// Water evaporated after the decay window
    Evaporated {
        /// Cell
        coord: TileCoord,
    },
    /// Plant health ran out
    Withered {
        /// Cell
        coord: TileCoord,
    },
    /// Cell cleared by the player
    Cleared {
        /// Cell
        coord: TileCoord,
    },
    /// Season rolled over
    SeasonChanged {
        /// New season
        season: Season,
    },
    /// A player action was rejected
    ActionFailed {
        /// Target cell
        coord: TileCoord,
        /// Human-readable reason
        reason: String,
    },
}

/// Event bus for broadcasting farm events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<FarmEvent>,
    receiver: Receiver<FarmEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event. Dropped if the bus is full.
    pub fn publish(&self, event: FarmEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Publishes every event from an iterator.
    pub fn publish_all(&self, events: impl IntoIterator<Item = FarmEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<FarmEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events from elsewhere.
    #[must_use]
    pub fn sender(&self) -> Sender<FarmEvent> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        let coord = TileCoord::new(1, 2);
        bus.publish(FarmEvent::Evaporated { coord });
        bus.publish(FarmEvent::Withered { coord });
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(
            events,
            vec![FarmEvent::Evaporated { coord }, FarmEvent::Withered { coord }]
        );
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_events() {
        let bus = EventBus::new(1);
        let coord = TileCoord::new(0, 0);
        bus.publish(FarmEvent::Cleared { coord });
        bus.publish(FarmEvent::Cleared { coord });
        assert_eq!(bus.drain().len(), 1);
    }

    #[test]
    fn test_sender_handle_feeds_bus() {
        let bus = EventBus::default();
        let sender = bus.sender();
        sender
            .send(FarmEvent::SeasonChanged {
                season: Season::Summer,
            })
            .expect("bus open");
        assert_eq!(bus.pending_count(), 1);
        assert_eq!(bus.capacity(), 256);
    }
}
