// src/engine/core.rs

//! Pure, synchronous routine driver.
//!
//! [`RoutineRunner`] owns a built [`Routine`] and advances it one tick at a
//! time: it publishes the tick index to scripted signals, applies the
//! scripted robot-disabled state, ticks the scheduler and, for simulated
//! time, steps the clock by one period. It has no Tokio types and does no
//! IO, so it can be unit tested directly.

use std::rc::Rc;

use tracing::{debug, error, info};

use crate::clock::{ManualClock, MonotonicClock, SharedClock};
use crate::config::model::ConfigSection;
use crate::engine::build::Routine;
use crate::engine::trace::TraceLog;
use crate::scheduler::{LifecycleEvent, Scheduler, SchedulerSnapshot};

/// Where the scheduler's time comes from.
#[derive(Debug, Clone)]
pub enum TimeSource {
    /// Time advances by exactly one period per tick.
    Simulated(Rc<ManualClock>),
    /// Wall-clock time.
    Wall(SharedClock),
}

impl TimeSource {
    pub fn simulated() -> Self {
        TimeSource::Simulated(ManualClock::new())
    }

    pub fn wall() -> Self {
        TimeSource::Wall(MonotonicClock::shared())
    }

    pub fn clock(&self) -> SharedClock {
        match self {
            TimeSource::Simulated(clock) => clock.clone(),
            TimeSource::Wall(clock) => clock.clone(),
        }
    }
}

/// What happened during one [`RoutineRunner::step`].
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub disabled: bool,
    pub snapshot: SchedulerSnapshot,
}

pub struct RoutineRunner {
    routine: Routine,
    config: ConfigSection,
    time: TimeSource,
    trace: TraceLog,
    next_tick: u64,
}

impl std::fmt::Debug for RoutineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutineRunner")
            .field("routine", &self.routine)
            .field("next_tick", &self.next_tick)
            .finish_non_exhaustive()
    }
}

impl RoutineRunner {
    /// Wrap `routine`, attach a trace of start/stop events and schedule the
    /// routine's start commands.
    pub fn new(routine: Routine, config: ConfigSection, time: TimeSource) -> Self {
        let mut runner = Self {
            routine,
            config,
            time,
            trace: TraceLog::new(),
            next_tick: 0,
        };

        let names = runner.routine.names();
        let tick = runner.routine.tick.clone();
        runner.trace.attach(
            &mut runner.routine.scheduler,
            &[
                LifecycleEvent::Initialize,
                LifecycleEvent::Interrupt,
                LifecycleEvent::Finish,
            ],
            names,
            tick,
        );

        runner.apply_disabled(0);
        for &command in runner.routine.start.iter() {
            match runner.routine.scheduler.schedule(command) {
                Ok(outcome) => debug!(%command, ?outcome, "start command requested"),
                Err(err) => error!(%command, error = %err, "failed to schedule start command"),
            }
        }
        runner
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.routine.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.routine.scheduler
    }

    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    /// Index of the tick the next `step` will run.
    pub fn next_tick(&self) -> u64 {
        self.next_tick
    }

    fn apply_disabled(&mut self, tick: u64) -> bool {
        let disabled = self.config.is_disabled_at(tick);
        self.routine.scheduler.set_disabled(disabled);
        disabled
    }

    /// Run one scheduler tick.
    pub fn step(&mut self) -> TickReport {
        let tick = self.next_tick;
        self.routine.tick.set(tick);
        let disabled = self.apply_disabled(tick);

        self.routine.scheduler.tick();

        if let TimeSource::Simulated(clock) = &self.time {
            clock.advance(self.config.period());
        }
        self.next_tick += 1;

        TickReport {
            tick,
            disabled,
            snapshot: self.routine.scheduler.snapshot(),
        }
    }

    /// Interrupt everything still running, e.g. at the end of a run.
    pub fn shutdown(&mut self) {
        let remaining = self.routine.scheduler.active().len();
        if remaining > 0 {
            info!(remaining, "interrupting commands still running at shutdown");
        }
        self.routine.scheduler.cancel_all();
    }
}
