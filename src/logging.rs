// src/logging.rs

//! Diagnostic logging on STDERR via `tracing-subscriber`.
//!
//! STDOUT is reserved for the lifecycle trace and `print` commands, so the
//! default filter keeps the per-tick scheduler chatter at `warn`. The filter
//! is chosen in this order:
//!
//! 1. `--log-level`, applied to every target;
//! 2. `ROBOCMD_LOG`, any `EnvFilter` directive string
//!    (e.g. `debug` or `info,robocmd::trigger=trace`);
//! 3. [`DEFAULT_DIRECTIVES`].

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "ROBOCMD_LOG";

/// Filter used when neither the CLI nor the environment picks one.
pub const DEFAULT_DIRECTIVES: &str = "info,robocmd::scheduler=warn";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let (filter, rejected) = select_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::uptime())
        .try_init()
        .map_err(|e| anyhow!("could not install log subscriber: {e}"))?;

    if let Some(bad) = rejected {
        tracing::warn!(directives = %bad, "ignoring invalid {LOG_ENV}");
    }
    Ok(())
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Pick the filter. The second value is an environment string that failed to
/// parse, reported once the subscriber is up.
fn select_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(level.directive()), None);
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVES), Some(directives.to_string())),
        },
        None => (EnvFilter::new(DEFAULT_DIRECTIVES), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_environment() {
        let (filter, rejected) = select_filter(Some(LogLevel::Debug), Some("error"));
        assert_eq!(filter.to_string(), "debug");
        assert!(rejected.is_none());
    }

    #[test]
    fn environment_directives_are_used() {
        let (filter, rejected) = select_filter(None, Some(" robocmd::trigger=trace "));
        assert_eq!(filter.to_string(), "robocmd::trigger=trace");
        assert!(rejected.is_none());
    }

    #[test]
    fn bad_environment_falls_back_to_default() {
        let (_, rejected) = select_filter(None, Some("robocmd=loudest"));
        assert_eq!(rejected.as_deref(), Some("robocmd=loudest"));

        let (_, rejected) = select_filter(None, Some("   "));
        assert!(rejected.is_none());
    }
}
