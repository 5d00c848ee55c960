//! Engine configuration.
//!
//! Provides tick rate, farm layout, growth tuning and save settings.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use verdant_gameplay::{LifecycleConfig, SessionSettings};

/// Configuration file name.
const CONFIG_FILE: &str = "verdant.toml";

/// Application directory under the platform config/data dirs.
pub const APP_DIR: &str = "verdant";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Loop ===
    /// Loop iterations per second
    pub target_ups: u32,
    /// Milliseconds between lifecycle ticks
    pub tick_interval_ms: u64,
    /// Headless run length in seconds (0 = one full season)
    pub run_duration_secs: u64,

    // === Growth ===
    /// Multiplier on elapsed time fed to crop growth
    pub growth_time_scale: f64,
    /// Seconds after watering before water evaporates
    pub water_decay_secs: u64,
    /// Health lost per second by a dry plant
    pub dry_health_drain_per_sec: f32,
    /// Seconds of play time per season
    pub season_length_secs: u64,

    // === Farm ===
    /// Farm width in tiles
    pub farm_cols: u32,
    /// Farm height in tiles
    pub farm_rows: u32,
    /// Seeds of each starter crop in a new game
    pub starting_seeds: u32,

    // === Saving ===
    /// Save file name (sanitized before use)
    pub save_name: String,
    /// Save directory override (None = platform data dir)
    pub save_dir: Option<PathBuf>,
    /// Enable periodic auto-save
    pub autosave_enabled: bool,
    /// Auto-save interval in seconds
    pub autosave_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Loop
            target_ups: 60,
            tick_interval_ms: 1000,
            run_duration_secs: 0,

            // Growth
            growth_time_scale: 1.0,
            water_decay_secs: 15,
            dry_health_drain_per_sec: 0.1,
            season_length_secs: 600,

            // Farm
            farm_cols: 12,
            farm_rows: 8,
            starting_seeds: 10,

            // Saving
            save_name: "farm".to_string(),
            save_dir: None,
            autosave_enabled: true,
            autosave_interval_secs: 300, // 5 minutes
        }
    }
}

impl EngineConfig {
    /// Load configuration from `path`, or the default location if `None`.
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(Self::config_path()),
        }
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Default configuration file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join(APP_DIR).join(CONFIG_FILE),
            None => PathBuf::from(CONFIG_FILE),
        }
    }

    /// Directory save files go to.
    #[must_use]
    pub fn resolve_save_dir(&self) -> PathBuf {
        if let Some(dir) = &self.save_dir {
            return dir.clone();
        }
        match dirs::data_dir() {
            Some(dir) => dir.join(APP_DIR).join("saves"),
            None => PathBuf::from("saves"),
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Loop
        self.target_ups = self.target_ups.clamp(1, 240);
        self.tick_interval_ms = self.tick_interval_ms.clamp(10, 60_000);

        // Growth
        if !self.growth_time_scale.is_finite() {
            self.growth_time_scale = 1.0;
        }
        self.growth_time_scale = self.growth_time_scale.clamp(0.1, 100.0);
        self.water_decay_secs = self.water_decay_secs.clamp(1, 3600);
        if !self.dry_health_drain_per_sec.is_finite() {
            self.dry_health_drain_per_sec = 0.1;
        }
        self.dry_health_drain_per_sec = self.dry_health_drain_per_sec.clamp(0.0, 100.0);
        self.season_length_secs = self.season_length_secs.clamp(10, 86_400);

        // Farm
        self.farm_cols = self.farm_cols.clamp(1, 256);
        self.farm_rows = self.farm_rows.clamp(1, 256);
        self.starting_seeds = self.starting_seeds.min(999);

        // Saving
        if self.save_name.trim().is_empty() {
            self.save_name = "farm".to_string();
        }
        self.autosave_interval_secs = self.autosave_interval_secs.clamp(10, 3600);
    }

    /// Time between lifecycle ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Time between auto-saves.
    #[must_use]
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    /// How long the headless loop runs.
    #[must_use]
    pub fn run_duration(&self) -> Duration {
        if self.run_duration_secs == 0 {
            Duration::from_secs(self.season_length_secs)
        } else {
            Duration::from_secs(self.run_duration_secs)
        }
    }

    /// Growth and decay tunables for the lifecycle engine.
    #[must_use]
    pub fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            growth_time_scale: self.growth_time_scale,
            water_decay_window: Duration::from_secs(self.water_decay_secs),
            dry_health_drain_per_sec: self.dry_health_drain_per_sec,
        }
    }

    /// Settings for a farm session.
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            save_name: self.save_name.clone(),
            farm_cols: self.farm_cols,
            farm_rows: self.farm_rows,
            starting_seeds: self.starting_seeds,
            season_length: Duration::from_secs(self.season_length_secs),
            lifecycle: self.lifecycle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.water_decay_secs, 15);
        assert_eq!(config.autosave_interval(), Duration::from_secs(300));
        assert_eq!((config.farm_cols, config.farm_rows), (12, 8));
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig {
            target_ups: 0,
            growth_time_scale: f64::NAN,
            dry_health_drain_per_sec: -3.0,
            farm_cols: 0,
            save_name: "  ".to_string(),
            autosave_interval_secs: 1,
            ..EngineConfig::default()
        };

        config.validate();

        assert_eq!(config.target_ups, 1);
        assert!((config.growth_time_scale - 1.0).abs() < f64::EPSILON);
        assert!(config.dry_health_drain_per_sec.abs() < f32::EPSILON);
        assert_eq!(config.farm_cols, 1);
        assert_eq!(config.save_name, "farm");
        assert_eq!(config.autosave_interval_secs, 10);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("verdant.toml");

        let config = EngineConfig {
            farm_cols: 20,
            autosave_enabled: false,
            save_dir: Some(temp_dir.path().join("saves")),
            ..EngineConfig::default()
        };
        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("verdant.toml");
        fs::write(&config_path, "water_decay_secs = 30\n").expect("write");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.water_decay_secs, 30);
        assert_eq!(loaded.season_length_secs, 600);
    }

    #[test]
    fn test_config_invalid_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("verdant.toml");
        fs::write(&config_path, "farm_cols = \"wide\"\n").expect("write");

        assert_eq!(EngineConfig::load_from(&config_path), EngineConfig::default());
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/verdant.toml");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_save_dir_override() {
        let config = EngineConfig {
            save_dir: Some(PathBuf::from("/tmp/farm-saves")),
            ..EngineConfig::default()
        };
        assert_eq!(config.resolve_save_dir(), PathBuf::from("/tmp/farm-saves"));
    }

    #[test]
    fn test_session_settings_carry_tuning() {
        let config = EngineConfig {
            water_decay_secs: 20,
            season_length_secs: 120,
            ..EngineConfig::default()
        };
        let settings = config.session_settings();
        assert_eq!(settings.lifecycle.water_decay_window, Duration::from_secs(20));
        assert_eq!(settings.season_length, Duration::from_secs(120));
        assert_eq!(config.run_duration(), Duration::from_secs(120));
    }
}
