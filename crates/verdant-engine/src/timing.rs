//! Loop timing.
//!
//! Provides clamped delta time, rate limiting for the main loop and a
//! fixed-interval timer for lifecycle ticks.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Longest delta handed to the simulation in one iteration.
const MAX_DELTA: Duration = Duration::from_millis(250);

/// Samples kept for the rate average.
const MAX_SAMPLES: usize = 120;

/// Main loop pacing.
#[derive(Debug)]
pub struct LoopTiming {
    target_ups: u32,
    budget: Duration,
    last_iteration: Instant,
    samples: VecDeque<Duration>,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self::new(60)
    }
}

impl LoopTiming {
    /// Create a pacer for `target_ups` iterations per second.
    #[must_use]
    pub fn new(target_ups: u32) -> Self {
        let target_ups = target_ups.max(1);
        Self {
            target_ups,
            budget: Duration::from_secs_f64(1.0 / f64::from(target_ups)),
            last_iteration: Instant::now(),
            samples: VecDeque::with_capacity(MAX_SAMPLES),
        }
    }

    /// Target iterations per second.
    #[must_use]
    pub fn target_ups(&self) -> u32 {
        self.target_ups
    }

    /// Time since the previous call, clamped to 250ms.
    pub fn delta_time(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last_iteration).min(MAX_DELTA);
        self.last_iteration = now;

        self.samples.push_back(dt);
        if self.samples.len() > MAX_SAMPLES {
            self.samples.pop_front();
        }
        dt
    }

    /// Sleep for whatever is left of this iteration's budget.
    pub fn sleep_remainder(&self) {
        let elapsed = self.last_iteration.elapsed();
        if elapsed < self.budget {
            std::thread::sleep(self.budget - elapsed);
        }
    }

    /// Average iterations per second over recent samples.
    #[must_use]
    pub fn current_ups(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().sum();
        let average = total.as_secs_f32() / self.samples.len() as f32;
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }

    /// Forget history (after a pause or a load).
    pub fn reset(&mut self) {
        self.last_iteration = Instant::now();
        self.samples.clear();
    }
}

/// Fires once per elapsed interval.
#[derive(Debug, Clone)]
pub struct TickTimer {
    interval: Duration,
    accumulator: Duration,
}

impl TickTimer {
    /// Timer with the given interval (at least 1ms).
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            accumulator: Duration::ZERO,
        }
    }

    /// The tick interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Add `dt` and report whether at least one interval has passed.
    ///
    /// Lifecycle ticks read the wall clock, so missed intervals are folded
    /// into a single tick instead of being replayed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.accumulator += dt;
        if self.accumulator < self.interval {
            return false;
        }
        let nanos = self.accumulator.as_nanos() % self.interval.as_nanos();
        self.accumulator = Duration::from_nanos(u64::try_from(nanos).unwrap_or(0));
        true
    }
}
