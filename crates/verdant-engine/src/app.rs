//! Application lifecycle management.
//!
//! Headless loop that drives a farm session: lifecycle ticks at a fixed
//! interval, a caretaker that works the fields, periodic auto-save and a final
//! save on exit.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use verdant_common::{SpeciesId, TileCoord, Timestamp};
use verdant_gameplay::{FarmEvent, FarmSession, MAX_WATER_LEVEL, STARTER_SPECIES};

use crate::autosave::{AutoSaveConfig, AutoSaveManager, AutoSaveTrigger};
use crate::config::EngineConfig;
use crate::save_manager::SaveManager;
use crate::timing::{LoopTiming, TickTimer};

/// What the caretaker did in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaretakerReport {
    /// Seeds planted.
    pub planted: u32,
    /// Waterings.
    pub watered: u32,
    /// Harvests.
    pub harvested: u32,
    /// Withered plants cleared.
    pub cleared: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chore {
    Harvest,
    Clear,
    Water,
    Sow,
    Nothing,
}

/// Automatic farmer: one action per cell per pass.
///
/// Ready crops are harvested, withered ones cleared, thirsty ones watered and
/// empty cells sown with the next starter species that still has seeds.
#[derive(Debug, Default)]
pub struct Caretaker {
    next_species: usize,
}

impl Caretaker {
    /// Work every cell of the farm once.
    pub fn tend(&mut self, session: &mut FarmSession, now: Timestamp) -> CaretakerReport {
        let mut report = CaretakerReport::default();
        let cols = session.settings().farm_cols;
        let cells = cols as usize * session.settings().farm_rows as usize;

        for index in 0..cells {
            let coord = TileCoord::from_index(index, cols);
            match Self::decide(session, coord) {
                Chore::Harvest => {
                    if session.harvest(coord).is_ok() {
                        report.harvested += 1;
                    }
                },
                Chore::Clear => {
                    if session.clear(coord) {
                        report.cleared += 1;
                    }
                },
                Chore::Water => {
                    if session.water(coord, now) {
                        report.watered += 1;
                    }
                },
                Chore::Sow => {
                    if let Some(species) = self.pick_species(session) {
                        if session.plant(coord, species.as_str(), now).is_ok() {
                            report.planted += 1;
                        }
                    }
                },
                Chore::Nothing => {},
            }
        }

        report
    }

    fn decide(session: &FarmSession, coord: TileCoord) -> Chore {
        let cell = session.grid().cell(coord);
        if cell.is_ready() {
            return Chore::Harvest;
        }
        match cell.plant() {
            Some(plant) if plant.is_withered() => Chore::Clear,
            Some(plant) if plant.water_level() < MAX_WATER_LEVEL => Chore::Water,
            Some(_) => Chore::Nothing,
            None => Chore::Sow,
        }
    }

    fn pick_species(&mut self, session: &FarmSession) -> Option<SpeciesId> {
        for offset in 0..STARTER_SPECIES.len() {
            let index = (self.next_species + offset) % STARTER_SPECIES.len();
            let species = SpeciesId::new(STARTER_SPECIES[index]);
            if session.inventory().has(&species.seed_item(), 1) {
                self.next_species = index + 1;
                return Some(species);
            }
        }
        None
    }
}

/// Headless farm application.
struct FarmApp {
    /// Engine configuration
    config: EngineConfig,
    /// The running farm
    session: FarmSession,
    /// File layer shared with the auto-save writer
    saves: Arc<SaveManager>,
    /// Periodic background saves
    autosave: AutoSaveManager,
    /// Lifecycle tick schedule
    ticks: TickTimer,
    /// Automatic farmer
    caretaker: Caretaker,
    /// Lifecycle ticks run so far
    tick_count: u64,
}

impl FarmApp {
    fn new(config: EngineConfig, now: Timestamp) -> Result<Self> {
        let saves = Arc::new(SaveManager::new(config.resolve_save_dir()));
        saves
            .ensure_save_dir()
            .with_context(|| format!("cannot create save directory {:?}", saves.save_dir()))?;

        let session = saves.load_or_default(config.session_settings(), now);
        info!(
            "Farm '{}': {} planted, season {}",
            session.save_name(),
            session.grid().planted_count(),
            session.season().display_name()
        );

        let autosave_config = AutoSaveConfig::default()
            .with_enabled(config.autosave_enabled)
            .with_interval(config.autosave_interval());

        Ok(Self {
            ticks: TickTimer::new(config.tick_interval()),
            autosave: AutoSaveManager::new(autosave_config, Arc::clone(&saves)),
            config,
            session,
            saves,
            caretaker: Caretaker::default(),
            tick_count: 0,
        })
    }

    /// One loop iteration.
    fn update(&mut self, dt: Duration, now: Timestamp) {
        if self.ticks.advance(dt) {
            let report = self.session.tick(now);
            let work = self.caretaker.tend(&mut self.session, now);
            self.tick_count += 1;
            debug!(
                "Tick {}: {} stage advances, {} ready, {:?}",
                self.tick_count,
                report.stages_advanced(),
                report.became_ready(),
                work
            );
            self.log_events();
        }

        self.autosave.update(dt);
        if self.autosave.is_due() {
            self.autosave
                .submit(self.session.snapshot(now), AutoSaveTrigger::Interval);
        }
    }

    fn log_events(&self) {
        for event in self.session.drain_events() {
            match event {
                FarmEvent::Harvested {
                    coord,
                    species_id,
                    amount,
                    ..
                } => info!("Harvested {} {} at {}", amount, species_id, coord),
                FarmEvent::SeasonChanged { season } => {
                    info!("Season changed to {}", season.display_name());
                },
                FarmEvent::Withered { coord } => warn!("Plant at {} withered", coord),
                FarmEvent::ActionFailed { coord, reason } => {
                    debug!("Action at {} failed: {}", coord, reason);
                },
                other => debug!("{:?}", other),
            }
        }
    }

    /// Wait for background writes, then save synchronously.
    fn shutdown(&mut self, now: Timestamp) -> Result<()> {
        self.autosave.flush();
        let path = self
            .saves
            .save(&self.session.snapshot(now))
            .context("final save failed")?;

        let stats = self.session.stats();
        info!(
            "Saved {} after {} ticks: {} planted, {} harvested, {} total yield",
            path.display(),
            self.tick_count,
            stats.crops_planted,
            stats.crops_harvested,
            stats.total_yield
        );
        Ok(())
    }
}

/// Run the headless loop until the configured duration has elapsed.
pub fn run(config: EngineConfig) -> Result<()> {
    let run_duration = config.run_duration();
    let mut timing = LoopTiming::new(config.target_ups);
    let mut app = FarmApp::new(config, Timestamp::now())?;

    info!(
        "Running for {:?} at {} updates/s, tick every {:?}",
        run_duration,
        timing.target_ups(),
        app.ticks.interval()
    );

    let started = Instant::now();
    timing.reset();
    while started.elapsed() < run_duration {
        let dt = timing.delta_time();
        app.update(dt, Timestamp::now());
        timing.sleep_remainder();
    }

    debug!(
        "Loop for '{}' finished at {:.1} updates/s",
        app.config.save_name,
        timing.current_ups()
    );
    app.shutdown(Timestamp::now())
}
