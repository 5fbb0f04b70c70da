// src/engine/mod.rs

//! Running routine files.
//!
//! - [`build`] turns a validated routine into a populated scheduler.
//! - [`core`] advances it tick by tick with no IO.
//! - [`trace`] records lifecycle events.
//! - [`runtime`] is the async shell: pacing, Ctrl-C and trace output.

use std::time::Duration;

pub mod build;
pub mod core;
pub mod runtime;
pub mod trace;

pub use build::{Routine, build_routine};
pub use core::{RoutineRunner, TickReport, TimeSource};
pub use runtime::Runtime;
pub use trace::{TraceEntry, TraceLog};

/// Options for the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Number of ticks to run.
    pub ticks: u64,
    /// Pace ticks at `period` instead of running them back-to-back.
    pub realtime: bool,
    pub period: Duration,
    /// Print lifecycle events to stdout.
    pub print_trace: bool,
}

/// Events flowing into the runtime from outside the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Totals reported when the runtime exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    /// Lifecycle events recorded (initialize, interrupt, finish).
    pub events: usize,
    /// Largest number of simultaneously scheduled commands.
    pub max_active: usize,
    pub stopped_early: bool,
}
