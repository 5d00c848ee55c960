//! Version types for save-format compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VersionParseError;

/// Game version written into every save file.
pub const GAME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema version using semantic versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaVersion {
    /// Major version (breaking changes)
    pub major: u16,
    /// Minor version (backwards-compatible additions)
    pub minor: u16,
    /// Patch version (bug fixes)
    pub patch: u16,
}

impl SchemaVersion {
    /// Creates a new schema version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Current farm snapshot format.
    ///
    /// 1.1 added harvest count, health, growth progress, watering time and
    /// planting season to plot entries.
    pub const SAVE_FORMAT: Self = Self::new(1, 1, 0);

    /// Checks if this version is compatible with another version.
    /// Compatible means same major version and this minor >= other minor.
    #[must_use]
    pub const fn is_compatible_with(&self, other: &Self) -> bool {
        self.major == other.major && self.minor >= other.minor
    }

    /// Checks if this version can read data from another version.
    #[must_use]
    pub const fn can_read(&self, data_version: &Self) -> bool {
        self.major == data_version.major
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError(s.to_string());
        let mut parts = s.trim().split('.').map(str::parse::<u16>);

        let major = parts.next().ok_or_else(err)?.map_err(|_| err())?;
        let minor = parts.next().transpose().map_err(|_| err())?.unwrap_or(0);
        let patch = parts.next().transpose().map_err(|_| err())?.unwrap_or(0);

        if parts.next().is_some() {
            return Err(err());
        }

        Ok(Self::new(major, minor, patch))
    }
}

// Serialized as "major.minor.patch" so save files stay readable.
impl Serialize for SchemaVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        assert_eq!("1.1.0".parse::<SchemaVersion>().ok(), Some(SchemaVersion::new(1, 1, 0)));
        assert_eq!("2".parse::<SchemaVersion>().ok(), Some(SchemaVersion::new(2, 0, 0)));
        assert!("1.x".parse::<SchemaVersion>().is_err());
        assert!("1.2.3.4".parse::<SchemaVersion>().is_err());
        assert!("".parse::<SchemaVersion>().is_err());
    }

    #[test]
    fn test_version_serde_as_string() {
        let json = serde_json::to_string(&SchemaVersion::SAVE_FORMAT).expect("serialize");
        assert_eq!(json, "\"1.1.0\"");

        let parsed: SchemaVersion = serde_json::from_str("\"1.0.3\"").expect("deserialize");
        assert_eq!(parsed, SchemaVersion::new(1, 0, 3));
    }

    #[test]
    fn test_can_read_older_minor() {
        let reader = SchemaVersion::SAVE_FORMAT;
        assert!(reader.can_read(&SchemaVersion::new(1, 0, 0)));
        assert!(reader.is_compatible_with(&SchemaVersion::new(1, 0, 0)));
        assert!(!reader.can_read(&SchemaVersion::new(2, 0, 0)));
    }
}
