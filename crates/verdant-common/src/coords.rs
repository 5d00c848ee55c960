//! Tile coordinates and their textual key form.
//!
//! Plots are addressed by an integer `(col, row)` pair. Save files key plots by
//! the textual form `"(col, row)"`, so the `Display` and `FromStr`
//! implementations here are a format contract and must stay in sync.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoordParseError, CoordResult};

/// Position of a single tile on the farm grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column (x)
    pub col: i32,
    /// Row (y)
    pub row: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Returns the textual key used in save files, e.g. `"(3, 7)"`.
    #[must_use]
    pub fn to_key(self) -> String {
        self.to_string()
    }

    /// Parses a save-file key of the form `"(col, row)"`.
    pub fn from_key(key: &str) -> CoordResult<Self> {
        key.parse()
    }

    /// Converts to a linear index inside a `cols` x `rows` rectangle anchored at
    /// the origin, or `None` if the coordinate lies outside it.
    #[must_use]
    pub fn to_index(self, cols: u32, rows: u32) -> Option<usize> {
        if self.col < 0 || self.row < 0 {
            return None;
        }
        let (col, row) = (self.col as u32, self.row as u32);
        if col >= cols || row >= rows {
            return None;
        }
        Some(row as usize * cols as usize + col as usize)
    }

    /// Creates from a linear index inside a rectangle `cols` wide.
    #[must_use]
    pub const fn from_index(index: usize, cols: u32) -> Self {
        let cols = cols as usize;
        Self {
            col: (index % cols) as i32,
            row: (index / cols) as i32,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

impl FromStr for TileCoord {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CoordParseError::Malformed(s.to_string());

        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(malformed)?;

        let mut parts = inner.split(',');
        let (Some(col), Some(row), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };

        let parse = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| CoordParseError::InvalidNumber(part.trim().to_string()))
        };

        Ok(Self::new(parse(col)?, parse(row)?))
    }
}
