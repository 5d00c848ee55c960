//! Farm snapshot codec.
//!
//! Converts the plot grid, player, inventory and stats to and from a
//! [`SaveSnapshot`], the camelCase JSON document written to disk. Decoding is
//! lenient per cell: a malformed coordinate key, a wrongly typed field, an
//! unknown species or an out-of-range value costs that one cell (or gets
//! clamped), never the whole load. Only an incompatible format version fails outright.
//!
//! Snapshots record the wall-clock time they were taken. On load every plant
//! timestamp is shifted forward by the time spent on disk, so nothing grows or
//! dries out while the game is closed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use verdant_common::{ItemId, SchemaVersion, TileCoord, Timestamp, GAME_VERSION};

use crate::inventory::Inventory;
use crate::plants::{PlantInstance, MAX_HEALTH, MAX_WATER_LEVEL};
use crate::player::PlayerState;
use crate::plot::PlotGrid;
use crate::season::Season;
use crate::species::{SpeciesCatalog, TERMINAL_STAGE};
use crate::stats::GameStats;

/// Format of `saveDate` and `lastSaved`.
pub const SAVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that can occur during save/load operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot written by an incompatible format.
    #[error("Incompatible save format: expected {expected}, found {found}")]
    VersionMismatch {
        /// Format this build writes.
        expected: SchemaVersion,
        /// Format found in the snapshot.
        found: SchemaVersion,
    },

    /// Save file not found.
    #[error("Save not found: {0}")]
    NotFound(String),

    /// Save name has no usable characters.
    #[error("Invalid save name: {0:?}")]
    InvalidName(String),
}

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// Saved state of one plot cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotSnapshot {
    /// Species planted; absent means the cell is empty.
    #[serde(default)]
    pub crop_id: Option<String>,
    /// Growth stage, 0 to 4.
    #[serde(default)]
    pub growth_stage: i64,
    /// Water level, 0 to 3.
    #[serde(default)]
    pub water_level: i64,
    /// Planting time.
    #[serde(default)]
    pub planted_at_epoch_millis: u64,
    /// Whether the crop awaited harvest.
    #[serde(default)]
    pub is_ready_to_harvest: bool,
    /// Completed regrow harvests.
    #[serde(default)]
    pub harvest_count: u32,
    /// Plant health.
    #[serde(default = "default_health")]
    pub health: f32,
    /// Effective growth accumulated since planting.
    #[serde(default)]
    pub growth_progress_millis: Option<u64>,
    /// Last time water was added.
    #[serde(default)]
    pub last_watered_at_epoch_millis: Option<u64>,
    /// Season at planting.
    #[serde(default)]
    pub planted_season: Season,
}

fn default_health() -> f32 {
    MAX_HEALTH
}

impl PlotSnapshot {
    /// Snapshot of a living plant.
    #[must_use]
    pub fn from_plant(plant: &PlantInstance) -> Self {
        Self {
            crop_id: Some(plant.species_id().to_string()),
            growth_stage: i64::from(plant.growth_stage()),
            water_level: i64::from(plant.water_level()),
            planted_at_epoch_millis: plant.planted_at().as_millis(),
            is_ready_to_harvest: plant.is_ready_to_harvest(),
            harvest_count: plant.harvest_count(),
            health: plant.health(),
            growth_progress_millis: Some(plant.growth_progress_ms),
            last_watered_at_epoch_millis: Some(plant.last_watered_at().as_millis()),
            planted_season: plant.planted_season(),
        }
    }
}

/// One `farmPlots` value as read from disk.
///
/// Each entry is decoded on its own so that a wrongly typed field costs only
/// that cell. Malformed entries keep their raw JSON and are written back
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotEntry {
    /// Well-formed cell.
    Plot(PlotSnapshot),
    /// Entry that does not match the cell layout.
    Malformed {
        /// Raw JSON value.
        raw: serde_json::Value,
        /// Decoder error.
        reason: String,
    },
}

impl PlotEntry {
    /// The decoded cell, if the entry was well-formed.
    #[must_use]
    pub fn as_plot(&self) -> Option<&PlotSnapshot> {
        match self {
            Self::Plot(plot) => Some(plot),
            Self::Malformed { .. } => None,
        }
    }
}

impl From<PlotSnapshot> for PlotEntry {
    fn from(plot: PlotSnapshot) -> Self {
        Self::Plot(plot)
    }
}

impl Serialize for PlotEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Plot(plot) => plot.serialize(serializer),
            Self::Malformed { raw, .. } => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PlotEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match PlotSnapshot::deserialize(&raw) {
            Ok(plot) => Self::Plot(plot),
            Err(e) => Self::Malformed {
                raw,
                reason: e.to_string(),
            },
        })
    }
}

/// Saved inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryData {
    /// Item id to count.
    pub items: BTreeMap<String, u32>,
    /// Selected hotbar slot.
    pub selected_index: usize,
}

impl From<&Inventory> for InventoryData {
    fn from(inventory: &Inventory) -> Self {
        Self {
            items: inventory
                .sorted_items()
                .into_iter()
                .map(|(id, count)| (id.to_string(), count))
                .collect(),
            selected_index: inventory.selected_index(),
        }
    }
}

impl From<&InventoryData> for Inventory {
    fn from(data: &InventoryData) -> Self {
        Inventory::from_items(
            data.items
                .iter()
                .map(|(id, &count)| (ItemId::new(id.as_str()), count)),
            data.selected_index,
        )
    }
}

/// Saved player state, in whole units.
///
/// Positions are floored to the tile the player stands on; health values are
/// rounded. Fractional values in older saves are accepted and converted the
/// same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerData {
    /// Horizontal tile.
    #[serde(deserialize_with = "floor_to_i32")]
    pub world_x: i32,
    /// Vertical tile.
    #[serde(deserialize_with = "floor_to_i32")]
    pub world_y: i32,
    /// Current health.
    #[serde(deserialize_with = "round_to_i32")]
    pub current_health: i32,
    /// Maximum health.
    #[serde(deserialize_with = "round_to_i32")]
    pub max_health: i32,
}

impl Default for PlayerData {
    fn default() -> Self {
        Self::from(&PlayerState::default())
    }
}

impl From<&PlayerState> for PlayerData {
    fn from(player: &PlayerState) -> Self {
        Self {
            world_x: to_i32(f64::from(player.world_x).floor()),
            world_y: to_i32(f64::from(player.world_y).floor()),
            current_health: to_i32(f64::from(player.current_health).round()),
            max_health: to_i32(f64::from(player.max_health).round()),
        }
    }
}

impl From<&PlayerData> for PlayerState {
    fn from(data: &PlayerData) -> Self {
        PlayerState {
            world_x: data.world_x as f32,
            world_y: data.world_y as f32,
            current_health: data.current_health as f32,
            max_health: data.max_health as f32,
        }
        .sanitized()
    }
}

fn to_i32(value: f64) -> i32 {
    if value.is_finite() {
        value.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    } else {
        0
    }
}

fn floor_to_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    Ok(to_i32(f64::deserialize(deserializer)?.floor()))
}

fn round_to_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    Ok(to_i32(f64::deserialize(deserializer)?.round()))
}

/// Complete save file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    /// Player-chosen save name.
    pub save_name: String,
    /// Human-readable save time (UTC).
    #[serde(default)]
    pub save_date: String,
    /// Game build that wrote the save.
    #[serde(default)]
    pub game_version: String,
    /// Snapshot layout version.
    #[serde(default)]
    pub format_version: SchemaVersion,
    /// Save time; zero in saves that predate it.
    #[serde(default)]
    pub saved_at_epoch_millis: u64,
    /// Player position and vitals.
    #[serde(default)]
    pub player_data: PlayerData,
    /// Planted cells keyed `"(col, row)"`.
    #[serde(default)]
    pub farm_plots: BTreeMap<String, PlotEntry>,
    /// Inventory contents.
    #[serde(default)]
    pub inventory_data: InventoryData,
    /// Farm statistics.
    #[serde(default)]
    pub game_stats: GameStats,
    /// Total play time in milliseconds.
    #[serde(default)]
    pub total_play_time: u64,
    /// Same instant as `save_date`.
    #[serde(default)]
    pub last_saved: String,
}

impl SaveSnapshot {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> SaveResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON text.
    pub fn from_json(text: &str) -> SaveResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Save time as a timestamp.
    #[must_use]
    pub fn saved_at(&self) -> Timestamp {
        Timestamp::from_millis(self.saved_at_epoch_millis)
    }

    /// Number of non-empty plot entries.
    #[must_use]
    pub fn planted_count(&self) -> usize {
        self.farm_plots
            .values()
            .filter_map(PlotEntry::as_plot)
            .filter(|plot| plot.crop_id.is_some())
            .count()
    }
}

/// Borrowed view of everything that goes into a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotSource<'a> {
    /// Save name.
    pub save_name: &'a str,
    /// Plot grid.
    pub grid: &'a PlotGrid,
    /// Player state.
    pub player: &'a PlayerState,
    /// Inventory.
    pub inventory: &'a Inventory,
    /// Statistics.
    pub stats: &'a GameStats,
    /// Play time so far.
    pub play_time: Duration,
}

/// State rebuilt from a snapshot.
#[derive(Debug, Clone)]
pub struct DecodedSave {
    /// Save name.
    pub save_name: String,
    /// Rebuilt grid, unbounded, with its tick clock at load time.
    pub grid: PlotGrid,
    /// Player state.
    pub player: PlayerState,
    /// Inventory.
    pub inventory: Inventory,
    /// Statistics.
    pub stats: GameStats,
    /// Play time so far.
    pub play_time: Duration,
    /// One entry per skipped or repaired plot cell.
    pub warnings: Vec<String>,
}

/// Formats epoch milliseconds as a UTC save date.
#[must_use]
pub fn format_save_date(at: Timestamp) -> String {
    i64::try_from(at.as_millis())
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|date| date.format(SAVE_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Build a snapshot. Empty cells are omitted.
#[must_use]
pub fn serialize(source: &SnapshotSource<'_>, now: Timestamp) -> SaveSnapshot {
    let farm_plots: BTreeMap<_, _> = source
        .grid
        .iter()
        .filter_map(|(coord, cell)| {
            cell.plant()
                .map(|plant| (coord.to_key(), PlotSnapshot::from_plant(plant).into()))
        })
        .collect();

    let save_date = format_save_date(now);

    debug!(
        "Serialized {} plots for save '{}'",
        farm_plots.len(),
        source.save_name
    );

    SaveSnapshot {
        save_name: source.save_name.to_string(),
        last_saved: save_date.clone(),
        save_date,
        game_version: GAME_VERSION.to_string(),
        format_version: SchemaVersion::SAVE_FORMAT,
        saved_at_epoch_millis: now.as_millis(),
        player_data: PlayerData::from(source.player),
        farm_plots,
        inventory_data: InventoryData::from(source.inventory),
        game_stats: *source.stats,
        total_play_time: source.play_time.as_millis() as u64,
    }
}

/// Rebuild farm state from a snapshot at time `now`.
///
/// Fails only when the snapshot's major format version differs from this
/// build's; every per-cell problem is logged and recorded in
/// [`DecodedSave::warnings`].
pub fn deserialize(
    snapshot: &SaveSnapshot,
    catalog: &SpeciesCatalog,
    now: Timestamp,
) -> SaveResult<DecodedSave> {
    if !SchemaVersion::SAVE_FORMAT.can_read(&snapshot.format_version) {
        return Err(SaveError::VersionMismatch {
            expected: SchemaVersion::SAVE_FORMAT,
            found: snapshot.format_version,
        });
    }

    let rebase = rebase_offset(snapshot.saved_at_epoch_millis, now);

    let mut grid = PlotGrid::new(now);
    let mut warnings = Vec::new();

    for (key, entry) in &snapshot.farm_plots {
        let coord = match TileCoord::from_key(key) {
            Ok(coord) => coord,
            Err(e) => {
                warn!("Skipping plot entry {:?}: {}", key, e);
                warnings.push(format!("skipped plot {key:?}: {e}"));
                continue;
            }
        };
        let plot = match entry {
            PlotEntry::Plot(plot) => plot,
            PlotEntry::Malformed { reason, .. } => {
                warn!("Skipping malformed plot {}: {}", coord, reason);
                warnings.push(format!("skipped plot {coord}: {reason}"));
                continue;
            }
        };

        match decode_plot(coord, plot, catalog, rebase, now, &mut warnings) {
            Some(plant) => grid.insert_restored(coord, plant),
            None => continue,
        }
    }

    debug!(
        "Decoded save '{}': {} plots, {} warnings",
        snapshot.save_name,
        grid.planted_count(),
        warnings.len()
    );

    Ok(DecodedSave {
        save_name: snapshot.save_name.clone(),
        grid,
        player: PlayerState::from(&snapshot.player_data),
        inventory: Inventory::from(&snapshot.inventory_data),
        stats: snapshot.game_stats,
        play_time: Duration::from_millis(snapshot.total_play_time),
        warnings,
    })
}

fn rebase_offset(saved_at: u64, now: Timestamp) -> i64 {
    if saved_at == 0 {
        return 0;
    }
    let now = i128::from(now.as_millis());
    let offset = now - i128::from(saved_at);
    i64::try_from(offset).unwrap_or(if offset > 0 { i64::MAX } else { i64::MIN })
}

fn decode_plot(
    coord: TileCoord,
    plot: &PlotSnapshot,
    catalog: &SpeciesCatalog,
    rebase: i64,
    now: Timestamp,
    warnings: &mut Vec<String>,
) -> Option<PlantInstance> {
    let crop_id = plot.crop_id.as_deref()?;
    let species = match catalog.lookup(crop_id) {
        Ok(species) => species,
        Err(e) => {
            warn!("Clearing plot {}: {}", coord, e);
            warnings.push(format!("cleared plot {coord}: {e}"));
            return None;
        }
    };

    let mut note = |what: String| {
        warn!("Plot {}: {}", coord, what);
        warnings.push(format!("plot {coord}: {what}"));
    };

    let mut stage = clamp_level(plot.growth_stage, TERMINAL_STAGE, "growth stage", &mut note);
    if plot.is_ready_to_harvest {
        stage = TERMINAL_STAGE;
    }
    let water_level = clamp_level(plot.water_level, MAX_WATER_LEVEL, "water level", &mut note);

    let mut harvest_count = plot.harvest_count;
    let max_cycles = if species.multi_harvest {
        species.max_harvest_cycles
    } else {
        0
    };
    if harvest_count > max_cycles {
        note(format!("harvest count {harvest_count} clamped to {max_cycles}"));
        harvest_count = max_cycles;
    }

    let health = if plot.health.is_finite() {
        plot.health.clamp(0.0, MAX_HEALTH)
    } else {
        note(format!("health {} reset", plot.health));
        MAX_HEALTH
    };

    let stage_ms = (species.stage_duration.as_millis() as u64).max(1);
    let stage_start = stage_ms.saturating_mul(u64::from(stage));
    let stage_end = if stage < TERMINAL_STAGE {
        stage_start.saturating_add(stage_ms - 1)
    } else {
        u64::MAX
    };
    let growth_progress_ms = plot
        .growth_progress_millis
        .unwrap_or(stage_start)
        .clamp(stage_start, stage_end);

    let planted_at = Timestamp::from_millis(plot.planted_at_epoch_millis).shifted(rebase);
    let last_watered_at = plot
        .last_watered_at_epoch_millis
        .map_or(now, |ms| Timestamp::from_millis(ms).shifted(rebase));

    Some(PlantInstance {
        species_id: species.id.clone(),
        growth_stage: stage,
        water_level,
        health,
        growth_progress_ms,
        planted_at,
        last_watered_at,
        harvest_count,
        planted_season: plot.planted_season,
    })
}

fn clamp_level(value: i64, max: u8, what: &str, note: &mut impl FnMut(String)) -> u8 {
    let clamped = value.clamp(0, i64::from(max));
    if clamped != value {
        note(format!("{what} {value} clamped to {clamped}"));
    }
    clamped as u8
}
