//! Save file management.
//!
//! This module provides:
//! - SaveManager: the file layer under the snapshot codec
//! - Save name sanitizing and the `.farm.json` naming scheme
//! - Atomic save operations (temp file + rename)
//! - Listing, backup and delete
//!
//! The manager is shared between the game loop and the auto-save thread, so
//! every method takes `&self` and writes are serialized by an internal lock.

use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use verdant_common::Timestamp;
use verdant_gameplay::{FarmSession, SaveError, SaveResult, SaveSnapshot, SessionSettings};

/// Extension of save files.
pub const SAVE_EXTENSION: &str = ".farm.json";

/// Extension of in-progress writes.
const TEMP_EXTENSION: &str = ".farm.json.tmp";

/// Summary of one save file, for a load menu.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveMetadata {
    /// Sanitized save name (file stem).
    pub name: String,
    /// Human-readable save time.
    pub save_date: String,
    /// Save time.
    pub saved_at: Timestamp,
    /// Total play time.
    pub play_time: Duration,
    /// Planted cells.
    pub planted: usize,
    /// Game build that wrote it.
    pub game_version: String,
}

/// Reads and writes farm snapshots in one directory.
#[derive(Debug)]
pub struct SaveManager {
    save_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl SaveManager {
    /// Creates a manager for `save_dir`. The directory is created on first
    /// write.
    #[must_use]
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The save directory.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Ensures the save directory exists.
    pub fn ensure_save_dir(&self) -> SaveResult<()> {
        if !self.save_dir.exists() {
            fs::create_dir_all(&self.save_dir)?;
            info!("Created save directory: {:?}", self.save_dir);
        }
        Ok(())
    }

    /// Reduces a save name to `[A-Za-z0-9_-]`.
    pub fn sanitize_name(name: &str) -> SaveResult<String> {
        let clean: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if clean.is_empty() {
            return Err(SaveError::InvalidName(name.to_string()));
        }
        Ok(clean)
    }

    /// Path of the save file for `name`.
    pub fn path_for(&self, name: &str) -> SaveResult<PathBuf> {
        let clean = Self::sanitize_name(name)?;
        Ok(self.save_dir.join(format!("{clean}{SAVE_EXTENSION}")))
    }

    fn temp_path(&self, clean: &str) -> PathBuf {
        self.save_dir.join(format!("{clean}{TEMP_EXTENSION}"))
    }

    /// Writes a snapshot under its own save name. Returns the file written.
    pub fn save(&self, snapshot: &SaveSnapshot) -> SaveResult<PathBuf> {
        let result = self.write_snapshot(snapshot);
        match &result {
            Ok(path) => info!("Saved '{}' to {}", snapshot.save_name, path.display()),
            Err(e) => error!("Failed to save '{}': {}", snapshot.save_name, e),
        }
        result
    }

    fn write_snapshot(&self, snapshot: &SaveSnapshot) -> SaveResult<PathBuf> {
        let clean = Self::sanitize_name(&snapshot.save_name)?;
        let _guard = self.write_lock.lock();
        self.ensure_save_dir()?;

        let temp_path = self.temp_path(&clean);
        let final_path = self.save_dir.join(format!("{clean}{SAVE_EXTENSION}"));

        let written = File::create(&temp_path)
            .map_err(SaveError::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, snapshot)?;
                writer.flush()?;
                Ok(())
            })
            .and_then(|()| fs::rename(&temp_path, &final_path).map_err(SaveError::from));

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        debug!("Atomic write complete: {}", final_path.display());
        Ok(final_path)
    }

    /// Reads the snapshot saved as `name`.
    pub fn load(&self, name: &str) -> SaveResult<SaveSnapshot> {
        let path = self.path_for(name)?;
        let snapshot = Self::read_file(&path).map_err(|e| match e {
            SaveError::Io(io) if io.kind() == ErrorKind::NotFound => {
                SaveError::NotFound(name.to_string())
            },
            other => other,
        })?;
        info!("Loaded '{}' from {}", name, path.display());
        Ok(snapshot)
    }

    fn read_file(path: &Path) -> SaveResult<SaveSnapshot> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Loads `settings.save_name` into a session, or starts a new game if
    /// there is no save or it cannot be read.
    pub fn load_or_default(&self, settings: SessionSettings, now: Timestamp) -> FarmSession {
        let snapshot = match self.load(&settings.save_name) {
            Ok(snapshot) => Some(snapshot),
            Err(SaveError::NotFound(name)) => {
                info!("No save named '{}', starting a new farm", name);
                None
            },
            Err(e) => {
                warn!("Could not load '{}': {}; starting a new farm", settings.save_name, e);
                None
            },
        };
        FarmSession::restore_or_new(snapshot.as_ref(), settings, now)
    }

    /// Whether a save named `name` exists.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.exists())
    }

    /// Deletes the save named `name`.
    pub fn delete(&self, name: &str) -> SaveResult<()> {
        let path = self.path_for(name)?;
        let _guard = self.write_lock.lock();
        if !path.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }
        fs::remove_file(&path)?;
        info!("Deleted save '{}'", name);
        Ok(())
    }

    /// Copies the save named `name` to a timestamped backup. Returns the
    /// backup's save name.
    pub fn backup(&self, name: &str) -> SaveResult<String> {
        let source = self.path_for(name)?;
        if !source.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }

        let clean = Self::sanitize_name(name)?;
        let stamp = Timestamp::now().as_millis() / 1000;
        let backup_name = format!("{clean}_backup_{stamp}");
        let target = self.path_for(&backup_name)?;

        let _guard = self.write_lock.lock();
        fs::copy(&source, &target)?;
        info!("Created backup: {} -> {}", name, backup_name);
        Ok(backup_name)
    }

    /// Lists saves, newest first. Unreadable files are skipped.
    pub fn list_saves(&self) -> SaveResult<Vec<SaveMetadata>> {
        if !self.save_dir.exists() {
            return Ok(Vec::new());
        }

        let mut saves = Vec::new();
        for entry in fs::read_dir(&self.save_dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stem) = file_name.strip_suffix(SAVE_EXTENSION) else {
                continue;
            };

            match Self::read_file(&path) {
                Ok(snapshot) => saves.push(SaveMetadata {
                    name: stem.to_string(),
                    saved_at: snapshot.saved_at(),
                    play_time: Duration::from_millis(snapshot.total_play_time),
                    planted: snapshot.planted_count(),
                    save_date: snapshot.save_date,
                    game_version: snapshot.game_version,
                }),
                Err(e) => warn!("Skipping unreadable save {}: {}", path.display(), e),
            }
        }

        saves.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.name.cmp(&b.name)));
        Ok(saves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use verdant_common::TileCoord;

    fn at(secs: u64) -> Timestamp {
        Timestamp::from_millis(secs * 1000)
    }

    fn setup() -> (TempDir, SaveManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = SaveManager::new(temp_dir.path().join("saves"));
        (temp_dir, manager)
    }

    fn snapshot(name: &str, now: Timestamp) -> SaveSnapshot {
        let settings = SessionSettings {
            save_name: name.to_string(),
            ..SessionSettings::default()
        };
        let mut session = FarmSession::new_game(settings, now);
        session
            .plant(TileCoord::new(1, 1), "wheat", now)
            .expect("plant");
        session.snapshot(now)
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(SaveManager::sanitize_name("My Farm #2!").expect("valid"), "MyFarm2");
        assert_eq!(SaveManager::sanitize_name("../../etc").expect("valid"), "etc");
        assert_eq!(SaveManager::sanitize_name("spring_run-1").expect("valid"), "spring_run-1");
        assert!(matches!(
            SaveManager::sanitize_name("?!/"),
            Err(SaveError::InvalidName(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let (_dir, manager) = setup();
        let original = snapshot("farm", at(100));

        let path = manager.save(&original).expect("save");
        assert!(path.ends_with("farm.farm.json"));
        assert!(manager.exists("farm"));
        assert!(!manager.save_dir().join("farm.farm.json.tmp").exists());

        let loaded = manager.load("farm").expect("load");
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_save_overwrites() {
        let (_dir, manager) = setup();
        manager.save(&snapshot("farm", at(1))).expect("first save");
        manager.save(&snapshot("farm", at(2))).expect("second save");

        assert_eq!(manager.load("farm").expect("load").saved_at(), at(2));
        assert_eq!(manager.list_saves().expect("list").len(), 1);
    }

    #[test]
    fn test_load_missing() {
        let (_dir, manager) = setup();
        assert!(matches!(manager.load("nope"), Err(SaveError::NotFound(_))));
    }

    #[test]
    fn test_load_corrupt_file() {
        let (_dir, manager) = setup();
        manager.ensure_save_dir().expect("dir");
        fs::write(manager.path_for("broken").expect("path"), "{ nope").expect("write");

        assert!(matches!(
            manager.load("broken"),
            Err(SaveError::Serialization(_))
        ));
    }

    #[test]
    fn test_load_or_default() {
        let (_dir, manager) = setup();
        let settings = SessionSettings::default();

        let fresh = manager.load_or_default(settings.clone(), at(0));
        assert!(fresh.grid().is_empty());

        manager.save(&snapshot("farm", at(5))).expect("save");
        let loaded = manager.load_or_default(settings.clone(), at(10));
        assert_eq!(loaded.grid().planted_count(), 1);

        fs::write(manager.path_for("farm").expect("path"), "garbage").expect("write");
        let fallback = manager.load_or_default(settings, at(10));
        assert!(fallback.grid().is_empty());
    }

    #[test]
    fn test_list_saves_newest_first() {
        let (_dir, manager) = setup();
        manager.save(&snapshot("old", at(10))).expect("save");
        manager.save(&snapshot("new", at(20))).expect("save");
        fs::write(manager.save_dir().join("junk.farm.json"), "not json").expect("write");
        fs::write(manager.save_dir().join("notes.txt"), "hello").expect("write");

        let saves = manager.list_saves().expect("list");
        let names: Vec<_> = saves.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["new", "old"]);
        assert_eq!(saves[0].planted, 1);
    }

    #[test]
    fn test_list_saves_without_dir() {
        let (_dir, manager) = setup();
        assert!(manager.list_saves().expect("list").is_empty());
    }

    #[test]
    fn test_delete() {
        let (_dir, manager) = setup();
        manager.save(&snapshot("farm", at(1))).expect("save");

        manager.delete("farm").expect("delete");
        assert!(!manager.exists("farm"));
        assert!(matches!(manager.delete("farm"), Err(SaveError::NotFound(_))));
    }

    #[test]
    fn test_backup() {
        let (_dir, manager) = setup();
        manager.save(&snapshot("farm", at(1))).expect("save");

        let backup = manager.backup("farm").expect("backup");
        assert!(backup.starts_with("farm_backup_"));
        assert!(manager.exists(&backup));
        assert_eq!(
            manager.load(&backup).expect("load backup").farm_plots,
            manager.load("farm").expect("load").farm_plots
        );
    }
}
