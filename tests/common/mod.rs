#![allow(dead_code)]

pub use robocmd_test_utils::builders;
pub use robocmd_test_utils::probe::{Call, Journal, Probe, ProbeCommand, register_probe};
pub use robocmd_test_utils::{init_tracing, manual_scheduler, with_timeout};

use robocmd::scheduler::Scheduler;

/// Tick `scheduler` `n` times.
pub fn tick_n(scheduler: &mut Scheduler, n: usize) {
    for _ in 0..n {
        scheduler.tick();
    }
}
