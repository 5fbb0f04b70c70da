// src/clock.rs

//! Time sources for wait commands, debounced triggers and the loop watchdog.
//!
//! Everything time-dependent goes through [`Clock`] so tests can step time
//! deterministically with [`ManualClock`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source. `now()` is measured from an arbitrary epoch.
pub trait Clock: fmt::Debug {
    fn now(&self) -> Duration;
}

/// Shared handle to a clock.
pub type SharedClock = Rc<dyn Clock>;

/// Wall-clock backed implementation using [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn shared() -> SharedClock {
        Rc::new(Self::new())
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Clock that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.now.get())
            .finish()
    }
}

/// Restartable stopwatch over a [`Clock`].
pub struct Timer {
    clock: SharedClock,
    started_at: Option<Duration>,
}

impl Timer {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            started_at: None,
        }
    }

    pub fn restart(&mut self) {
        self.started_at = Some(self.clock.now());
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    /// Elapsed time since the last restart, zero if stopped.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(start) => self.clock.now().saturating_sub(start),
            None => Duration::ZERO,
        }
    }

    pub fn has_elapsed(&self, period: Duration) -> bool {
        self.started_at.is_some() && self.elapsed() >= period
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}
