// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `robocmd`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "robocmd",
    version,
    about = "Run a scripted robot command routine through the cooperative scheduler.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the routine file (TOML).
    ///
    /// Default: `Routine.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Routine.toml")]
    pub config: String,

    /// Number of ticks to run. Overrides `[config].ticks`.
    #[arg(long, value_name = "N")]
    pub ticks: Option<u64>,

    /// Pace ticks at the configured period instead of running them
    /// back-to-back.
    #[arg(long)]
    pub realtime: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ROBOCMD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the routine, but don't run the scheduler.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::parse_from(["robocmd"]);
        assert_eq!(args.config, "Routine.toml");
        assert!(args.ticks.is_none());
        assert!(!args.realtime);
        assert!(!args.dry_run);
    }

    #[test]
    fn flags() {
        let args = CliArgs::parse_from([
            "robocmd",
            "--config",
            "auto.toml",
            "--ticks",
            "50",
            "--realtime",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.config, "auto.toml");
        assert_eq!(args.ticks, Some(50));
        assert!(args.realtime);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
