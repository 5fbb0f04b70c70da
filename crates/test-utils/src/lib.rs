pub mod builders;
pub mod probe;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

use robocmd::clock::ManualClock;
use robocmd::scheduler::Scheduler;
use std::rc::Rc;

static INIT: Once = Once::new();

/// Route scheduler logs into the per-test capture buffer.
///
/// `RUST_LOG` selects the filter; `robocmd=debug` by default so a failing
/// test shows every schedule and cancel decision.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("robocmd=debug"));
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// A scheduler on a manual clock, plus the clock to step it.
pub fn manual_scheduler() -> (Scheduler, Rc<ManualClock>) {
    let clock = ManualClock::new();
    (Scheduler::with_clock(clock.clone()), clock)
}

/// Fail the test if `fut` has not resolved within five seconds.
pub async fn with_timeout<T>(fut: impl std::future::Future<Output = T>) -> T {
    match tokio::time::timeout(std::time::Duration::from_secs(5), fut).await {
        Ok(value) => value,
        Err(_) => panic!("runtime did not stop within five seconds"),
    }
}
