//! Auto-save system.
//!
//! This module provides:
//! - AutoSaveConfig: enable flag and interval
//! - AutoSaveManager: interval timer with pause reasons and a background writer
//!
//! Snapshots are taken by the caller between ticks and handed to a writer
//! thread, so the game loop never blocks on disk. Only one write is in flight
//! at a time; a trigger that arrives while one is running is skipped.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use verdant_gameplay::SaveSnapshot;

use crate::save_manager::SaveManager;

/// Default auto-save interval.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(300);

/// Minimum auto-save interval.
pub const MIN_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(10);

/// Records kept in the history.
const MAX_HISTORY: usize = 20;

/// What caused a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoSaveTrigger {
    /// Timer-based auto-save.
    Interval,
    /// Requested by game logic.
    Manual,
    /// Final save before exit.
    Shutdown,
}

impl AutoSaveTrigger {
    /// Display name for the trigger.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Interval => "Auto-save",
            Self::Manual => "Manual",
            Self::Shutdown => "Shutdown",
        }
    }
}

/// Conditions that pause the interval timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoSavePauseReason {
    /// In a menu or dialog.
    Menu,
    /// Loading a save.
    Loading,
    /// Player explicitly paused.
    PlayerPaused,
    /// System pause (minimize, etc).
    SystemPaused,
}

/// Auto-save settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveConfig {
    /// Whether interval saves happen at all.
    pub enabled: bool,
    /// Time between interval saves.
    pub interval: Duration,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

impl AutoSaveConfig {
    /// Config with auto-save disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Sets the interval, no shorter than [`MIN_AUTOSAVE_INTERVAL`].
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_AUTOSAVE_INTERVAL);
        self
    }

    /// Enables or disables auto-save.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Outcome of one background save.
#[derive(Debug, Clone)]
pub struct AutoSaveRecord {
    /// What caused the save.
    pub trigger: AutoSaveTrigger,
    /// Save name written.
    pub save_name: String,
    /// When the write finished.
    pub completed_at: Instant,
    /// Time spent writing.
    pub duration: Duration,
    /// Whether the write succeeded.
    pub success: bool,
    /// Error message if it failed.
    pub error: Option<String>,
}

/// Status of the auto-save system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSaveStatus {
    /// Waiting for the next trigger.
    Idle,
    /// Interval timer is paused.
    Paused,
    /// A write is in flight.
    Saving,
    /// Disabled by config.
    Disabled,
}

/// Periodic background saver.
#[derive(Debug)]
pub struct AutoSaveManager {
    config: AutoSaveConfig,
    save_manager: Arc<SaveManager>,
    time_since_save: Duration,
    pause_reasons: Vec<AutoSavePauseReason>,
    history: VecDeque<AutoSaveRecord>,
    in_flight: Arc<AtomicBool>,
    completed_tx: Sender<AutoSaveRecord>,
    completed_rx: Receiver<AutoSaveRecord>,
    worker: Option<JoinHandle<()>>,
    skipped: u64,
}

impl AutoSaveManager {
    /// Creates a manager writing through `save_manager`.
    #[must_use]
    pub fn new(config: AutoSaveConfig, save_manager: Arc<SaveManager>) -> Self {
        let (completed_tx, completed_rx) = bounded(MAX_HISTORY);
        Self {
            config,
            save_manager,
            time_since_save: Duration::ZERO,
            pause_reasons: Vec::new(),
            history: VecDeque::with_capacity(MAX_HISTORY),
            in_flight: Arc::new(AtomicBool::new(false)),
            completed_tx,
            completed_rx,
            worker: None,
            skipped: 0,
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &AutoSaveConfig {
        &self.config
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> AutoSaveStatus {
        if self.is_saving() {
            AutoSaveStatus::Saving
        } else if !self.config.enabled {
            AutoSaveStatus::Disabled
        } else if self.is_paused() {
            AutoSaveStatus::Paused
        } else {
            AutoSaveStatus::Idle
        }
    }

    /// Whether a write is running.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether the interval timer is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        !self.pause_reasons.is_empty()
    }

    /// Recent save records, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<AutoSaveRecord> {
        &self.history
    }

    /// Triggers dropped because a write was already in flight.
    #[must_use]
    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }

    /// Time until the next interval save.
    #[must_use]
    pub fn time_until_next_save(&self) -> Duration {
        self.config.interval.saturating_sub(self.time_since_save)
    }

    /// Pauses the interval timer for `reason`.
    pub fn pause(&mut self, reason: AutoSavePauseReason) {
        if !self.pause_reasons.contains(&reason) {
            self.pause_reasons.push(reason);
            debug!("Auto-save paused: {:?}", reason);
        }
    }

    /// Removes a pause reason.
    pub fn resume(&mut self, reason: AutoSavePauseReason) {
        self.pause_reasons.retain(|r| *r != reason);
        debug!("Auto-save pause removed: {:?}", reason);
    }

    /// Advances the interval timer and collects finished writes.
    pub fn update(&mut self, dt: Duration) {
        self.reap_finished_worker();
        self.collect_completed();
        if self.config.enabled && !self.is_paused() {
            self.time_since_save = self.time_since_save.saturating_add(dt);
        }
    }

    /// Whether an interval save is due.
    #[must_use]
    pub fn is_due(&self) -> bool {
        self.config.enabled && !self.is_paused() && self.time_since_save >= self.config.interval
    }

    /// Hands `snapshot` to the writer thread. Returns false if a write is
    /// already in flight, in which case the snapshot is dropped.
    pub fn submit(&mut self, snapshot: SaveSnapshot, trigger: AutoSaveTrigger) -> bool {
        self.reap_finished_worker();
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.skipped += 1;
            debug!("{} skipped: a save is already in flight", trigger.display_name());
            return false;
        }

        self.join_worker();
        self.time_since_save = Duration::ZERO;

        let save_manager = Arc::clone(&self.save_manager);
        let in_flight = Arc::clone(&self.in_flight);
        let completed_tx = self.completed_tx.clone();

        self.worker = Some(thread::spawn(move || {
            let started = Instant::now();
            let result = save_manager.save(&snapshot);
            let record = AutoSaveRecord {
                trigger,
                save_name: snapshot.save_name,
                completed_at: Instant::now(),
                duration: started.elapsed(),
                success: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            };
            if completed_tx.try_send(record).is_err() {
                warn!("Auto-save record dropped: completion queue full");
            }
            in_flight.store(false, Ordering::Release);
        }));

        debug!("{} started", trigger.display_name());
        true
    }

    /// Waits for any in-flight write and collects its record.
    pub fn flush(&mut self) {
        self.join_worker();
        self.collect_completed();
    }

    /// Joins the writer if it has exited, clearing the in-flight flag when it
    /// died before it could.
    fn reap_finished_worker(&mut self) {
        if self.worker.as_ref().is_some_and(JoinHandle::is_finished) {
            self.join_worker();
        }
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Auto-save writer thread panicked");
                self.in_flight.store(false, Ordering::Release);
            }
        }
    }

    fn collect_completed(&mut self) {
        for record in self.completed_rx.try_iter() {
            if record.success {
                info!(
                    "{} complete: '{}' in {:?}",
                    record.trigger.display_name(),
                    record.save_name,
                    record.duration
                );
            } else {
                warn!(
                    "{} failed for '{}': {}",
                    record.trigger.display_name(),
                    record.save_name,
                    record.error.as_deref().unwrap_or("unknown error")
                );
            }
            if self.history.len() >= MAX_HISTORY {
                self.history.pop_front();
            }
            self.history.push_back(record);
        }
    }
}

impl Drop for AutoSaveManager {
    fn drop(&mut self) {
        self.join_worker();
    }
}
