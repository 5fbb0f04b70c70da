// src/trigger/debounce.rs

use std::time::Duration;

use crate::clock::{SharedClock, Timer};
use crate::types::DebounceType;

/// Holds back changes of a boolean signal until the new value has been
/// stable for the debounce period.
#[derive(Debug)]
pub struct Debouncer {
    period: Duration,
    kind: DebounceType,
    baseline: bool,
    timer: Timer,
}

impl Debouncer {
    pub fn new(period: Duration, kind: DebounceType, clock: SharedClock) -> Self {
        let mut timer = Timer::new(clock);
        timer.restart();
        Self {
            period,
            kind,
            // Rising waits on a false baseline, Falling on a true one.
            baseline: kind == DebounceType::Falling,
            timer,
        }
    }

    /// Feed the raw input and get the debounced value.
    pub fn calculate(&mut self, input: bool) -> bool {
        if input == self.baseline {
            self.timer.restart();
        }

        if self.timer.has_elapsed(self.period) {
            if self.kind == DebounceType::Both {
                self.baseline = input;
                self.timer.restart();
            }
            input
        } else {
            self.baseline
        }
    }
}
