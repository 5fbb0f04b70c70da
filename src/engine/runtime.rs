// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::errors::Result;

use super::core::RoutineRunner;
use super::{RunSummary, RuntimeEvent, RuntimeOptions};

/// Async shell around [`RoutineRunner`].
///
/// Paces ticks (or runs them back-to-back), prints the lifecycle trace to
/// stdout and stops early on [`RuntimeEvent::ShutdownRequested`]. All
/// scheduling semantics live in the runner.
pub struct Runtime {
    core: RoutineRunner,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    options: RuntimeOptions,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        core: RoutineRunner,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            core,
            event_rx,
            options,
        }
    }

    /// Main loop. Returns once `options.ticks` ticks have run or a shutdown
    /// was requested; everything still scheduled is then interrupted.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!(ticks = self.options.ticks, realtime = self.options.realtime, "robocmd runtime started");

        let mut interval = time::interval(self.options.period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut summary = RunSummary::default();
        let mut stopped_early = false;

        while summary.ticks < self.options.ticks {
            let stop = if self.options.realtime {
                tokio::select! {
                    _ = interval.tick() => false,
                    event = self.event_rx.recv() => should_stop(event),
                }
            } else {
                match self.event_rx.try_recv() {
                    Ok(event) => should_stop(Some(event)),
                    Err(_) => false,
                }
            };
            if stop {
                stopped_early = true;
                break;
            }

            let report = self.core.step();
            debug!(snapshot = %report.snapshot, disabled = report.disabled, "tick complete");
            summary.ticks += 1;
            summary.max_active = summary.max_active.max(report.snapshot.active.len());
            self.flush_trace(&mut summary);
        }

        self.core.shutdown();
        self.flush_trace(&mut summary);
        summary.stopped_early = stopped_early;

        info!(
            ticks = summary.ticks,
            events = summary.events,
            stopped_early,
            "runtime exiting"
        );
        Ok(summary)
    }

    fn flush_trace(&mut self, summary: &mut RunSummary) {
        for entry in self.core.trace().drain() {
            if self.options.print_trace {
                println!("{entry}");
            }
            summary.events += 1;
        }
    }
}

/// Returns `true` if the loop should stop.
fn should_stop(event: Option<RuntimeEvent>) -> bool {
    match event {
        Some(RuntimeEvent::ShutdownRequested) => {
            info!("shutdown requested; stopping runtime");
            true
        }
        None => {
            info!("runtime event channel closed; exiting");
            true
        }
    }
}
