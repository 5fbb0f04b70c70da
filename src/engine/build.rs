// src/engine/build.rs

//! Turning a validated [`RoutineFile`] into a populated [`Scheduler`].

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::{SharedClock, Timer};
use crate::command::{
    CommandId, FunctionalCommand, InstantCommand, PrintCommand, ResourceId, RunCommand,
    WaitCommand, WaitUntilCommand,
};
use crate::config::model::{CommandConfig, CommandKind, GroupConfig, GroupKind, RoutineFile};
use crate::errors::{Result, RobocmdError};
use crate::scheduler::Scheduler;
use crate::trigger::Trigger;
use crate::types::InterruptionBehavior;

/// A scheduler populated from a routine file, plus the name tables needed
/// to drive and report on it.
pub struct Routine {
    pub scheduler: Scheduler,
    pub commands: BTreeMap<String, CommandId>,
    pub resources: BTreeMap<String, ResourceId>,
    pub signals: BTreeMap<String, Trigger>,
    /// Commands scheduled before the first tick.
    pub start: Vec<CommandId>,
    /// Tick index read by scripted signals.
    pub tick: Rc<Cell<u64>>,
}

impl Routine {
    pub fn id(&self, name: &str) -> Option<CommandId> {
        self.commands.get(name).copied()
    }

    pub fn resource(&self, name: &str) -> Option<ResourceId> {
        self.resources.get(name).copied()
    }

    /// Routine names keyed by the id they were built into.
    pub fn names(&self) -> BTreeMap<CommandId, String> {
        self.commands
            .iter()
            .map(|(name, &id)| (id, name.clone()))
            .collect()
    }
}

impl std::fmt::Debug for Routine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Routine")
            .field("scheduler", &self.scheduler)
            .field("commands", &self.commands)
            .field("resources", &self.resources)
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}

/// Build a scheduler from `cfg` using `clock` for waits and debouncing.
pub fn build_routine(cfg: &RoutineFile, clock: SharedClock) -> Result<Routine> {
    let mut scheduler = Scheduler::with_clock(clock.clone());
    scheduler.set_period(cfg.config.period());
    let tick = Rc::new(Cell::new(0u64));

    let resources: BTreeMap<String, ResourceId> = cfg
        .resource
        .keys()
        .map(|name| (name.clone(), scheduler.add_resource(name.clone())))
        .collect();

    let signals: BTreeMap<String, Trigger> = cfg
        .signal
        .iter()
        .map(|(name, signal)| {
            let script = signal.clone();
            let now = tick.clone();
            let mut trigger = Trigger::new(move || script.is_high_at(now.get()));
            if let Some(ms) = signal.debounce_ms {
                trigger = trigger.debounce_with_clock(
                    Duration::from_millis(ms),
                    signal.debounce,
                    clock.clone(),
                );
            }
            (name.clone(), trigger)
        })
        .collect();

    let mut commands = BTreeMap::new();
    for (name, cmd) in cfg.command.iter() {
        let id = build_command(&mut scheduler, name, cmd, &resources, &signals)?;
        let id = apply_overrides(&mut scheduler, id, cmd.interrupt, cmd.runs_when_disabled)?;
        commands.insert(name.clone(), id);
    }

    for name in cfg.group_order.iter() {
        let group = cfg
            .group
            .get(name)
            .ok_or_else(|| RobocmdError::ConfigError(format!("unknown group '{name}'")))?;
        let id = build_group(&mut scheduler, name, group, &commands)?;
        commands.insert(name.clone(), id);
    }

    for (resource, rcfg) in cfg.resource.iter() {
        if let (Some(default), Some(&rid)) = (rcfg.default.as_deref(), resources.get(resource)) {
            scheduler.set_default_command(rid, lookup(&commands, default)?)?;
        }
    }

    for binding in cfg.binding.iter() {
        let trigger = signals.get(&binding.signal).ok_or_else(|| {
            RobocmdError::ConfigError(format!("unknown signal '{}'", binding.signal))
        })?;
        let trigger = if binding.negate {
            trigger.negate()
        } else {
            trigger.clone()
        };
        let target = lookup(&commands, &binding.command)?;
        trigger.bind(&mut scheduler, binding.when.into(), target, binding.initial);
    }

    let start = cfg
        .config
        .start
        .iter()
        .map(|name| lookup(&commands, name))
        .collect::<Result<Vec<_>>>()?;

    info!(
        resources = resources.len(),
        commands = commands.len(),
        bindings = scheduler.binding_count(),
        "routine built"
    );

    Ok(Routine {
        scheduler,
        commands,
        resources,
        signals,
        start,
        tick,
    })
}

fn lookup(commands: &BTreeMap<String, CommandId>, name: &str) -> Result<CommandId> {
    commands
        .get(name)
        .copied()
        .ok_or_else(|| RobocmdError::ConfigError(format!("unknown command '{name}'")))
}

fn build_command(
    scheduler: &mut Scheduler,
    name: &str,
    cmd: &CommandConfig,
    resources: &BTreeMap<String, ResourceId>,
    signals: &BTreeMap<String, Trigger>,
) -> Result<CommandId> {
    let clock = scheduler.clock();
    let requires: Vec<ResourceId> = cmd
        .requires
        .iter()
        .map(|r| {
            resources
                .get(r)
                .copied()
                .ok_or_else(|| RobocmdError::ConfigError(format!("unknown resource '{r}'")))
        })
        .collect::<Result<_>>()?;

    let id = match cmd.kind {
        CommandKind::Instant => scheduler.register(InstantCommand::new(|| {}, requires).named(name)),
        CommandKind::Run => scheduler.register(RunCommand::new(|| {}, requires).named(name)),
        CommandKind::Print => {
            let message = cmd.message.clone().unwrap_or_default();
            if requires.is_empty() {
                scheduler.register(PrintCommand::new(message))
            } else {
                scheduler.register(
                    InstantCommand::new(move || println!("{message}"), requires).named(name),
                )
            }
        }
        CommandKind::Wait => {
            let duration = Duration::from_millis(cmd.ms.unwrap_or_default());
            if requires.is_empty() {
                scheduler.register(WaitCommand::new(duration, clock).named(name))
            } else {
                let timer = Rc::new(RefCell::new(Timer::new(clock)));
                let (start, end, done) = (timer.clone(), timer.clone(), timer);
                scheduler.register(
                    FunctionalCommand::new(
                        move || start.borrow_mut().restart(),
                        || {},
                        move |_| end.borrow_mut().stop(),
                        move || done.borrow().has_elapsed(duration),
                        requires,
                    )
                    .named(name),
                )
            }
        }
        CommandKind::WaitUntil => {
            let signal = cmd.signal.as_deref().unwrap_or_default();
            let trigger = signals
                .get(signal)
                .cloned()
                .ok_or_else(|| RobocmdError::ConfigError(format!("unknown signal '{signal}'")))?;
            if requires.is_empty() {
                scheduler.register(WaitUntilCommand::new(move || trigger.get()).named(name))
            } else {
                scheduler.register(
                    FunctionalCommand::new(|| {}, || {}, |_| {}, move || trigger.get(), requires)
                        .named(name),
                )
            }
        }
        CommandKind::Ticks => {
            let limit = cmd.ticks.unwrap_or_default();
            let count = Rc::new(Cell::new(0u64));
            let (reset, bump, check) = (count.clone(), count.clone(), count);
            scheduler.register(
                FunctionalCommand::new(
                    move || reset.set(0),
                    move || bump.set(bump.get() + 1),
                    |_| {},
                    move || check.get() >= limit,
                    requires,
                )
                .named(name),
            )
        }
    };

    debug!(command = %name, %id, kind = ?cmd.kind, "routine command built");
    Ok(id)
}

fn build_group(
    scheduler: &mut Scheduler,
    name: &str,
    group: &GroupConfig,
    commands: &BTreeMap<String, CommandId>,
) -> Result<CommandId> {
    let members = group
        .members
        .iter()
        .map(|m| lookup(commands, m))
        .collect::<Result<Vec<_>>>()?;

    let mut id = match group.kind {
        GroupKind::Sequence => scheduler.sequence(&members)?,
        GroupKind::Parallel => scheduler.parallel(&members)?,
        GroupKind::Race => scheduler.race(&members)?,
        GroupKind::Deadline => {
            let deadline_name = group.deadline.as_deref().ok_or_else(|| {
                RobocmdError::ConfigError(format!("deadline group '{name}' is missing `deadline`"))
            })?;
            scheduler.deadline(lookup(commands, deadline_name)?, &members)?
        }
    };

    if group.repeat {
        id = scheduler.repeatedly(id)?;
    }
    if let Some(ms) = group.timeout_ms {
        id = scheduler.with_timeout(id, Duration::from_millis(ms))?;
    }
    let id = apply_overrides(scheduler, id, group.interrupt, group.runs_when_disabled)?;

    debug!(group = %name, %id, kind = ?group.kind, "routine group built");
    Ok(id)
}

fn apply_overrides(
    scheduler: &mut Scheduler,
    id: CommandId,
    interrupt: Option<InterruptionBehavior>,
    runs_when_disabled: Option<bool>,
) -> Result<CommandId> {
    if interrupt.is_none() && runs_when_disabled.is_none() {
        return Ok(id);
    }
    let mut wrapped = scheduler.wrap(id)?;
    if let Some(behavior) = interrupt {
        wrapped = wrapped.with_interrupt_behavior(behavior);
    }
    if let Some(runs) = runs_when_disabled {
        wrapped = wrapped.ignoring_disable(runs);
    }
    Ok(scheduler.register(wrapped))
}
