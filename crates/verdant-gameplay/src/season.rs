//! Seasons and the read-only season provider used by crop growth.
//!
//! The farm never owns season state. Growth and yield consult a
//! [`SeasonProvider`] at the moment they are evaluated.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Season of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Season {
    /// Spring.
    #[default]
    Spring,
    /// Summer.
    Summer,
    /// Fall/Autumn.
    Fall,
    /// Winter.
    Winter,
}

impl Season {
    /// All seasons in calendar order.
    pub const ALL: [Self; 4] = [Self::Spring, Self::Summer, Self::Fall, Self::Winter];

    /// Get season from a zero-based season index (wraps every four).
    #[must_use]
    pub fn from_index(index: u64) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    /// Get next season.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Spring => Self::Summer,
            Self::Summer => Self::Fall,
            Self::Fall => Self::Winter,
            Self::Winter => Self::Spring,
        }
    }

    /// Display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
            Self::Winter => "Winter",
        }
    }

    fn index(self) -> u64 {
        match self {
            Self::Spring => 0,
            Self::Summer => 1,
            Self::Fall => 2,
            Self::Winter => 3,
        }
    }
}

/// Read-only source of the current season.
pub trait SeasonProvider {
    /// Returns the season in effect right now.
    fn current_season(&self) -> Season;
}

impl SeasonProvider for Season {
    fn current_season(&self) -> Season {
        *self
    }
}

/// Derives the season from total play time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonClock {
    /// Season at play time zero.
    start: Season,
    /// Length of one season.
    season_length: Duration,
    /// Play time accumulated so far.
    elapsed: Duration,
}

impl SeasonClock {
    /// Creates a clock starting at `start` with the given season length.
    #[must_use]
    pub fn new(start: Season, season_length: Duration) -> Self {
        Self {
            start,
            season_length: season_length.max(Duration::from_secs(1)),
            elapsed: Duration::ZERO,
        }
    }

    /// Sets accumulated play time, e.g. when restoring a save.
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Advances the clock. Returns the new season if it changed.
    pub fn advance(&mut self, dt: Duration) -> Option<Season> {
        let before = self.current_season();
        self.elapsed += dt;
        let after = self.current_season();
        (before != after).then_some(after)
    }

    /// Total play time accumulated.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time remaining until the next season starts.
    #[must_use]
    pub fn until_next(&self) -> Duration {
        let length = self.season_length.as_millis();
        let into = self.elapsed.as_millis() % length;
        Duration::from_millis((length - into) as u64)
    }

    fn seasons_passed(&self) -> u64 {
        (self.elapsed.as_millis() / self.season_length.as_millis()) as u64
    }
}

impl SeasonProvider for SeasonClock {
    fn current_season(&self) -> Season {
        Season::from_index(self.start.index() + self.seasons_passed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_cycle() {
        assert_eq!(Season::Spring.next(), Season::Summer);
        assert_eq!(Season::Winter.next(), Season::Spring);
        assert_eq!(Season::from_index(5), Season::Summer);
    }

    #[test]
    fn test_fixed_season_provider() {
        assert_eq!(Season::Fall.current_season(), Season::Fall);
    }

    #[test]
    fn test_season_clock_advance() {
        let mut clock = SeasonClock::new(Season::Summer, Duration::from_secs(60));
        assert_eq!(clock.current_season(), Season::Summer);

        assert_eq!(clock.advance(Duration::from_secs(30)), None);
        assert_eq!(clock.until_next(), Duration::from_secs(30));

        assert_eq!(clock.advance(Duration::from_secs(30)), Some(Season::Fall));
        assert_eq!(clock.advance(Duration::from_secs(120)), Some(Season::Spring));
    }

    #[test]
    fn test_season_clock_restore() {
        let clock = SeasonClock::new(Season::Spring, Duration::from_secs(10))
            .with_elapsed(Duration::from_secs(35));
        assert_eq!(clock.current_season(), Season::Winter);
    }
}
