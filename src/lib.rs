// src/lib.rs

//! Cooperative, tick-driven command scheduler for robot control code.
//!
//! Commands are polled state machines that claim exclusive use of
//! resources (robot subsystems). The [`Scheduler`](scheduler::Scheduler)
//! arbitrates those claims, runs every scheduled command once per tick,
//! polls [`Trigger`](trigger::Trigger) bindings and falls back to
//! per-resource default commands. Groups in [`group`] compose commands into
//! sequences, parallel sets, races and deadlines.
//!
//! The `robocmd` binary runs scripted routines described in TOML files
//! (see [`config`]) through the same scheduler.

pub mod cli;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod errors;
pub mod group;
pub mod logging;
pub mod scheduler;
pub mod trigger;
pub mod types;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::RoutineFile;
use crate::engine::{
    RoutineRunner, Runtime, RuntimeEvent, RuntimeOptions, TimeSource, build_routine,
};

pub use crate::command::{Command, CommandId, ResourceId};
pub use crate::scheduler::{ScheduleOutcome, Scheduler};
pub use crate::trigger::{EventLoop, Trigger};

/// Load the routine named by `args`, build its scheduler and drive it for
/// the requested number of ticks. Ctrl-C stops the loop early and interrupts
/// whatever is still running.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let time = if args.realtime {
        TimeSource::wall()
    } else {
        TimeSource::simulated()
    };
    let routine = build_routine(&cfg, time.clock())?;
    let core = RoutineRunner::new(routine, cfg.config.clone(), time);

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(8);

    // Ctrl-C ends the run after the current tick.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Ctrl-C handler unavailable");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let options = RuntimeOptions {
        ticks: args.ticks.unwrap_or(cfg.config.ticks),
        realtime: args.realtime,
        period: cfg.config.period(),
        print_trace: true,
    };

    let runtime = Runtime::new(core, rt_rx, options);
    let summary = runtime.run().await?;
    drop(rt_tx);

    info!(
        ticks = summary.ticks,
        events = summary.events,
        max_active = summary.max_active,
        "routine complete"
    );
    Ok(())
}

/// Print resources, commands, groups, signals and bindings without running
/// anything.
fn print_dry_run(cfg: &RoutineFile) {
    println!("robocmd dry-run");
    println!("  config.period_ms = {}", cfg.config.period_ms);
    println!("  config.ticks = {}", cfg.config.ticks);
    if !cfg.config.start.is_empty() {
        println!("  config.start = {:?}", cfg.config.start);
    }
    if !cfg.config.disabled.is_empty() {
        println!("  config.disabled = {:?}", cfg.config.disabled);
    }
    println!();

    println!("resources ({}):", cfg.resource.len());
    for (name, resource) in cfg.resource.iter() {
        match resource.default.as_deref() {
            Some(default) => println!("  - {name} (default: {default})"),
            None => println!("  - {name}"),
        }
    }

    println!("commands ({}):", cfg.command.len());
    for (name, cmd) in cfg.command.iter() {
        println!("  - {name}: {:?}", cmd.kind);
        if !cmd.requires.is_empty() {
            println!("      requires: {:?}", cmd.requires);
        }
        if let Some(interrupt) = cmd.interrupt {
            println!("      interrupt: {interrupt:?}");
        }
        if let Some(runs) = cmd.runs_when_disabled {
            println!("      runs_when_disabled: {runs}");
        }
    }

    println!("groups ({}, in build order):", cfg.group.len());
    for name in cfg.group_order.iter() {
        let Some(group) = cfg.group.get(name) else {
            continue;
        };
        println!("  - {name}: {:?}", group.kind);
        if let Some(ref deadline) = group.deadline {
            println!("      deadline: {deadline}");
        }
        println!("      members: {:?}", group.members);
        if let Some(ms) = group.timeout_ms {
            println!("      timeout_ms: {ms}");
        }
        if group.repeat {
            println!("      repeat: true");
        }
    }

    println!("signals ({}):", cfg.signal.len());
    for (name, signal) in cfg.signal.iter() {
        println!("  - {name}: high {:?}", signal.high);
        if let Some(ms) = signal.debounce_ms {
            println!("      debounce: {ms}ms {:?}", signal.debounce);
        }
    }

    println!("bindings ({}):", cfg.binding.len());
    for binding in cfg.binding.iter() {
        let negate = if binding.negate { "!" } else { "" };
        println!(
            "  - {negate}{} {:?} -> {} (initial: {:?})",
            binding.signal, binding.when, binding.command, binding.initial
        );
    }

    debug!("dry-run: routine validated, scheduler not started");
}
