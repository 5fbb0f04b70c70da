// src/scheduler/mod.rs

//! The command scheduler: resource arbitration and the per-tick dispatch
//! loop.
//!
//! - [`registry`] holds the arena of registered commands.
//! - [`events`] holds lifecycle-event subscriptions.
//! - [`compose`] builds groups and decorated commands from registered ids.
//! - [`snapshot`] provides a read-only view for telemetry and tests.
//!
//! `schedule` and `cancel` are the only writers of the ownership map. While
//! a tick's execute loop is running they buffer their request instead of
//! applying it; the buffers are applied right after the loop.

pub mod compose;
pub mod events;
pub(crate) mod registry;
pub mod snapshot;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clock::{MonotonicClock, SharedClock};
use crate::command::{Command, CommandId, CommandInfo, ResourceId};
use crate::errors::{Result, RobocmdError};
use crate::trigger::EventLoop;
use crate::trigger::binding::Binding;
use crate::types::InterruptionBehavior;

pub use events::{CommandHook, LifecycleEvent};
pub use snapshot::SchedulerSnapshot;

use events::EventHooks;
use registry::Registry;

/// Default control-loop period used by the overrun watchdog.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(20);

/// Result of a `schedule` request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The command was initialized and now owns its resources.
    Scheduled,
    /// The command was already running; nothing changed.
    AlreadyScheduled,
    /// The scheduler is suspended, or the robot is disabled and the command
    /// does not run when disabled.
    Disabled,
    /// A required resource is held by a `CancelIncoming` command.
    Blocked,
    /// The request was buffered and will be applied after the current
    /// execute loop (or once the command's own lifecycle call returns).
    Deferred,
}

struct ResourceSlot {
    name: String,
    /// Unregistered resources keep their id and any current owner, but lose
    /// their default command and periodic hook.
    registered: bool,
    default_command: Option<CommandId>,
    periodic: Option<Box<dyn FnMut()>>,
}

/// Per-phase timings of the last tick, reported on loop overrun.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickTimings {
    pub periodic: Duration,
    pub bindings: Duration,
    pub commands: Duration,
    pub housekeeping: Duration,
}

impl TickTimings {
    pub fn total(&self) -> Duration {
        self.periodic + self.bindings + self.commands + self.housekeeping
    }
}

/// Registry and dispatcher for commands, resources and trigger bindings.
pub struct Scheduler {
    registry: Registry,
    resources: Vec<ResourceSlot>,
    /// Scheduled commands, in scheduling order.
    active: Vec<CommandId>,
    owners: BTreeMap<ResourceId, CommandId>,
    pending_schedule: Vec<CommandId>,
    pending_cancel: Vec<CommandId>,
    in_tick: bool,
    /// Number of lifecycle calls currently on the stack.
    dispatch_depth: usize,
    /// Robot disabled state: commands that don't run when disabled are
    /// refused and interrupted.
    disabled: bool,
    /// Scheduler globally off: ticks and schedule requests do nothing.
    suspended: bool,
    pub(crate) events: EventHooks,
    /// Binding sets; index 0 is the default loop.
    loops: Vec<Vec<Binding>>,
    active_loop: EventLoop,
    /// Loop whose bindings are taken out for polling.
    polling: Option<EventLoop>,
    cleared_while_polling: bool,
    clock: SharedClock,
    period: Duration,
    tick_count: u64,
    last_timings: TickTimings,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("commands", &self.registry.len())
            .field("resources", &self.resources.len())
            .field("active", &self.active)
            .field("owners", &self.owners)
            .field("in_tick", &self.in_tick)
            .field("disabled", &self.disabled)
            .field("suspended", &self.suspended)
            .field("bindings", &self.binding_count())
            .field("active_loop", &self.active_loop)
            .field("tick_count", &self.tick_count)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Scheduler backed by the wall clock.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::shared())
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            registry: Registry::default(),
            resources: Vec::new(),
            active: Vec::new(),
            owners: BTreeMap::new(),
            pending_schedule: Vec::new(),
            pending_cancel: Vec::new(),
            in_tick: false,
            dispatch_depth: 0,
            disabled: false,
            suspended: false,
            events: EventHooks::default(),
            loops: vec![Vec::new()],
            active_loop: EventLoop::DEFAULT,
            polling: None,
            cleared_while_polling: false,
            clock,
            period: DEFAULT_PERIOD,
            tick_count: 0,
            last_timings: TickTimings::default(),
        }
    }

    pub fn clock(&self) -> SharedClock {
        self.clock.clone()
    }

    /// Expected control-loop period; ticks longer than this log an overrun.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn last_timings(&self) -> TickTimings {
        self.last_timings
    }

    // ----- registration -------------------------------------------------

    pub fn add_resource(&mut self, name: impl Into<String>) -> ResourceId {
        let id = ResourceId(self.resources.len());
        let name = name.into();
        debug!(resource = %id, %name, "registered resource");
        self.resources.push(ResourceSlot {
            name,
            registered: true,
            default_command: None,
            periodic: None,
        });
        id
    }

    pub fn resource_name(&self, resource: ResourceId) -> Option<&str> {
        self.resources.get(resource.0).map(|r| r.name.as_str())
    }

    /// Registered resources, in registration order.
    pub fn resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.registered)
            .map(|(i, _)| ResourceId(i))
    }

    pub fn is_registered(&self, resource: ResourceId) -> bool {
        self.resources.get(resource.0).is_some_and(|slot| slot.registered)
    }

    /// Stop managing `resource`: its default command and periodic hook are
    /// dropped. A command currently owning it keeps running.
    pub fn unregister_resource(&mut self, resource: ResourceId) -> Result<()> {
        let slot = self.registered_slot(resource)?;
        slot.registered = false;
        slot.default_command = None;
        slot.periodic = None;
        info!(%resource, "resource unregistered");
        Ok(())
    }

    /// Manage a previously unregistered resource again, with no default
    /// command or periodic hook.
    pub fn reregister_resource(&mut self, resource: ResourceId) -> Result<()> {
        let slot = self
            .resources
            .get_mut(resource.0)
            .ok_or(RobocmdError::UnknownResource(resource))?;
        slot.registered = true;
        Ok(())
    }

    fn registered_slot(&mut self, resource: ResourceId) -> Result<&mut ResourceSlot> {
        self.resources
            .get_mut(resource.0)
            .filter(|slot| slot.registered)
            .ok_or(RobocmdError::UnknownResource(resource))
    }

    /// Hook run at the start of every tick, before triggers are polled.
    pub fn set_periodic(
        &mut self,
        resource: ResourceId,
        periodic: impl FnMut() + 'static,
    ) -> Result<()> {
        self.registered_slot(resource)?.periodic = Some(Box::new(periodic));
        Ok(())
    }

    pub fn register(&mut self, command: impl Command + 'static) -> CommandId {
        self.register_boxed(Box::new(command))
    }

    pub fn register_boxed(&mut self, command: Box<dyn Command>) -> CommandId {
        let id = self.registry.register(command);
        if let Some(info) = self.registry.info(id) {
            debug!(
                command = %id,
                name = %info.name,
                requirements = ?info.requirements,
                "registered command"
            );
        }
        id
    }

    /// Registered commands, composed ones included.
    pub fn command_count(&self) -> usize {
        self.registry.len()
    }

    pub fn info(&self, command: CommandId) -> Option<&CommandInfo> {
        self.registry.info(command)
    }

    pub fn name_of(&self, command: CommandId) -> Option<&str> {
        self.registry.info(command).map(|i| i.name.as_str())
    }

    // ----- default commands ---------------------------------------------

    /// Register `command` as the fallback for `resource`, scheduled at the
    /// end of every tick in which the resource has no owner.
    pub fn set_default_command(&mut self, resource: ResourceId, command: CommandId) -> Result<()> {
        if !self.is_registered(resource) {
            return Err(RobocmdError::UnknownResource(resource));
        }
        let info = self
            .registry
            .info(command)
            .ok_or(RobocmdError::UnknownCommand(command))?;
        if self.registry.is_composed(command) {
            return Err(RobocmdError::ComposedDefaultCommand(command));
        }
        if !info.has_requirement(resource) {
            return Err(RobocmdError::DefaultCommandMissingRequirement { resource, command });
        }
        if info.interruption_behavior == InterruptionBehavior::CancelIncoming {
            warn!(
                %resource,
                %command,
                "registering a non-interruptible default command; it will block other commands requiring this resource"
            );
        }

        self.resources[resource.0].default_command = Some(command);
        info!(%resource, %command, "default command registered");
        Ok(())
    }

    pub fn remove_default_command(&mut self, resource: ResourceId) {
        if let Some(slot) = self.resources.get_mut(resource.0) {
            slot.default_command = None;
        }
    }

    pub fn default_command(&self, resource: ResourceId) -> Option<CommandId> {
        self.resources.get(resource.0)?.default_command
    }

    // ----- state queries ------------------------------------------------

    pub fn is_scheduled(&self, command: CommandId) -> bool {
        self.active.contains(&command)
    }

    pub fn is_pending_schedule(&self, command: CommandId) -> bool {
        self.pending_schedule.contains(&command)
    }

    pub fn is_composed(&self, command: CommandId) -> bool {
        self.registry.is_composed(command)
    }

    pub fn composed_commands(&self) -> Vec<CommandId> {
        self.registry.composed_ids().collect()
    }

    /// Scheduled commands in scheduling order.
    pub fn active(&self) -> &[CommandId] {
        &self.active
    }

    pub fn owners(&self) -> &BTreeMap<ResourceId, CommandId> {
        &self.owners
    }

    /// The command currently owning `resource`, if any.
    pub fn requiring(&self, resource: ResourceId) -> Option<CommandId> {
        self.owners.get(&resource).copied()
    }

    pub fn in_tick(&self) -> bool {
        self.in_tick
    }

    // ----- modes --------------------------------------------------------

    /// Set the robot's disabled state. While disabled, commands that do not
    /// run when disabled are refused and interrupted on the next tick.
    pub fn set_disabled(&mut self, disabled: bool) {
        if self.disabled != disabled {
            info!(disabled, "robot disabled state changed");
        }
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Turn the scheduler off: ticks and schedule requests become no-ops.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    // ----- callbacks ----------------------------------------------------

    pub fn on_initialize(&mut self, hook: impl FnMut(&mut Scheduler, CommandId) + 'static) {
        self.events.add(LifecycleEvent::Initialize, Box::new(hook));
    }

    pub fn on_execute(&mut self, hook: impl FnMut(&mut Scheduler, CommandId) + 'static) {
        self.events.add(LifecycleEvent::Execute, Box::new(hook));
    }

    pub fn on_interrupt(&mut self, hook: impl FnMut(&mut Scheduler, CommandId) + 'static) {
        self.events.add(LifecycleEvent::Interrupt, Box::new(hook));
    }

    pub fn on_finish(&mut self, hook: impl FnMut(&mut Scheduler, CommandId) + 'static) {
        self.events.add(LifecycleEvent::Finish, Box::new(hook));
    }

    // ----- trigger bindings ---------------------------------------------

    /// The loop that plain [`Trigger::new`](crate::trigger::Trigger::new)
    /// triggers bind to.
    pub fn default_event_loop(&self) -> EventLoop {
        EventLoop::DEFAULT
    }

    /// A new, empty binding set. It is only polled while active.
    pub fn new_event_loop(&mut self) -> EventLoop {
        self.loops.push(Vec::new());
        EventLoop(self.loops.len() - 1)
    }

    /// The binding set polled by `tick`.
    pub fn active_event_loop(&self) -> EventLoop {
        self.active_loop
    }

    /// Poll `event_loop` from the next tick on, e.g. to swap bindings per
    /// robot mode. The other loops keep their bindings and edge state.
    pub fn set_active_event_loop(&mut self, event_loop: EventLoop) -> Result<()> {
        if event_loop.0 >= self.loops.len() {
            return Err(RobocmdError::UnknownEventLoop(event_loop));
        }
        if self.active_loop != event_loop {
            info!(from = %self.active_loop, to = %event_loop, "active event loop changed");
        }
        self.active_loop = event_loop;
        Ok(())
    }

    pub(crate) fn add_binding(&mut self, event_loop: EventLoop, binding: Binding) {
        match self.loops.get_mut(event_loop.0) {
            Some(bindings) => bindings.push(binding),
            None => error!(%event_loop, "binding dropped: unknown event loop"),
        }
    }

    /// Bindings across every event loop.
    pub fn binding_count(&self) -> usize {
        self.loops.iter().map(Vec::len).sum()
    }

    pub fn event_loop_len(&self, event_loop: EventLoop) -> usize {
        self.loops.get(event_loop.0).map_or(0, Vec::len)
    }

    /// Drop the bindings of one event loop.
    pub fn clear_event_loop(&mut self, event_loop: EventLoop) {
        if let Some(bindings) = self.loops.get_mut(event_loop.0) {
            bindings.clear();
        }
        if self.polling == Some(event_loop) {
            self.cleared_while_polling = true;
        }
    }

    /// Drop every trigger binding in every event loop.
    pub fn clear_bindings(&mut self) {
        for bindings in self.loops.iter_mut() {
            bindings.clear();
        }
        if self.polling.is_some() {
            self.cleared_while_polling = true;
        }
    }

    fn poll_bindings(&mut self) {
        let event_loop = self.active_loop;
        let Some(slot) = self.loops.get_mut(event_loop.0) else {
            return;
        };
        let mut bindings = std::mem::take(slot);
        self.polling = Some(event_loop);
        self.cleared_while_polling = false;

        for binding in bindings.iter_mut() {
            binding.poll(self);
            if self.cleared_while_polling {
                break;
            }
        }
        self.polling = None;

        if self.cleared_while_polling {
            debug!(%event_loop, "event loop cleared while polling");
            return;
        }
        // Keep bindings added while polling, after the existing ones.
        if let Some(slot) = self.loops.get_mut(event_loop.0) {
            let added = std::mem::replace(slot, bindings);
            slot.extend(added);
        }
    }

    // ----- arbitration --------------------------------------------------

    /// Request that `command` start running.
    ///
    /// Conflicts are resolved all-or-nothing: if any current owner of a
    /// required resource is `CancelIncoming`, nothing changes; otherwise
    /// every conflicting owner is interrupted first. When an owner is in the
    /// middle of its own lifecycle call the whole request is `Deferred` and
    /// arbitrated once that call returns.
    pub fn schedule(&mut self, command: CommandId) -> Result<ScheduleOutcome> {
        let outcome = self.schedule_inner(command);
        self.flush_if_idle();
        outcome
    }

    fn schedule_inner(&mut self, command: CommandId) -> Result<ScheduleOutcome> {
        if !self.registry.contains(command) {
            return Err(RobocmdError::UnknownCommand(command));
        }
        if self.registry.is_composed(command) {
            return Err(RobocmdError::ComposedCommandScheduled(command));
        }

        if self.in_tick {
            debug!(%command, "schedule requested during tick; deferring");
            self.defer_schedule(command);
            return Ok(ScheduleOutcome::Deferred);
        }

        if self.is_scheduled(command) {
            return Ok(ScheduleOutcome::AlreadyScheduled);
        }

        let Some(info) = self.registry.info(command) else {
            return Err(RobocmdError::UnknownCommand(command));
        };

        if self.suspended || (self.disabled && !info.runs_when_disabled) {
            debug!(%command, "schedule ignored while disabled");
            return Ok(ScheduleOutcome::Disabled);
        }

        if self.registry.is_checked_out(command) {
            // Its own `end` is still on the stack; apply once it returns.
            self.defer_schedule(command);
            return Ok(ScheduleOutcome::Deferred);
        }

        let requirements = info.requirements.clone();
        let conflicting = self.conflicting_owners(&requirements);

        if let Some(&blocker) = conflicting.iter().find(|&&owner| {
            self.registry
                .info(owner)
                .is_some_and(|i| i.interruption_behavior == InterruptionBehavior::CancelIncoming)
        }) {
            info!(%command, %blocker, "schedule blocked by non-interruptible owner");
            return Ok(ScheduleOutcome::Blocked);
        }

        if let Some(&busy) = conflicting
            .iter()
            .find(|&&owner| self.registry.is_checked_out(owner))
        {
            // The owner is inside one of its own lifecycle calls; arbitrate
            // once it returns, without touching any owner now.
            debug!(%command, owner = %busy, "conflicting owner is busy; deferring");
            self.defer_schedule(command);
            return Ok(ScheduleOutcome::Deferred);
        }

        for owner in conflicting {
            debug!(%command, interrupted = %owner, "interrupting owner of required resource");
            self.cancel_inner(owner);
        }

        // An owner's `end` may itself have claimed one of our resources.
        if !self.conflicting_owners(&requirements).is_empty() {
            warn!(%command, "required resource re-claimed while interrupting owners; retrying");
            self.defer_schedule(command);
            return Ok(ScheduleOutcome::Deferred);
        }

        self.init_command(command, &requirements);
        Ok(ScheduleOutcome::Scheduled)
    }

    fn defer_schedule(&mut self, command: CommandId) {
        if !self.pending_schedule.contains(&command) {
            self.pending_schedule.push(command);
        }
    }

    /// Schedule several commands, stopping at the first illegal use.
    pub fn schedule_all(&mut self, commands: &[CommandId]) -> Result<Vec<ScheduleOutcome>> {
        commands.iter().map(|&c| self.schedule(c)).collect()
    }

    /// Interrupt `command` if it is running. Returns `true` if it was
    /// cancelled by this call.
    pub fn cancel(&mut self, command: CommandId) -> bool {
        let cancelled = self.cancel_inner(command);
        self.flush_if_idle();
        cancelled
    }

    fn cancel_inner(&mut self, command: CommandId) -> bool {
        if self.in_tick {
            if !self.pending_cancel.contains(&command) {
                debug!(%command, "cancel requested during tick; deferring");
                self.pending_cancel.push(command);
            }
            return false;
        }

        if !self.is_scheduled(command) {
            return false;
        }

        if self.registry.is_checked_out(command) {
            if !self.pending_cancel.contains(&command) {
                self.pending_cancel.push(command);
            }
            return false;
        }

        self.release(command);
        self.with_command(command, |cmd, scheduler| cmd.end(true, scheduler));
        info!(%command, "command interrupted");
        events::fire(self, LifecycleEvent::Interrupt, command);
        true
    }

    /// Cancel every scheduled command, visiting a snapshot of the active set.
    pub fn cancel_all(&mut self) {
        let snapshot = self.active.clone();
        for command in snapshot {
            self.cancel_inner(command);
        }
        self.flush_if_idle();
    }

    fn conflicting_owners(
        &self,
        requirements: &BTreeSet<ResourceId>,
    ) -> Vec<CommandId> {
        let mut owners = Vec::new();
        for resource in requirements {
            if let Some(&owner) = self.owners.get(resource) {
                if !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
        }
        owners
    }

    fn init_command(&mut self, command: CommandId, requirements: &BTreeSet<ResourceId>) {
        // Claim before initializing so nested requests see the new owner.
        self.active.push(command);
        for &resource in requirements {
            self.owners.insert(resource, command);
        }
        self.with_command(command, |cmd, scheduler| cmd.initialize(scheduler));
        info!(
            %command,
            name = self.name_of(command).unwrap_or("?"),
            "command scheduled"
        );
        events::fire(self, LifecycleEvent::Initialize, command);
    }

    /// Remove from the active set and free every resource it owns.
    fn release(&mut self, command: CommandId) {
        self.active.retain(|&c| c != command);
        self.owners.retain(|_, owner| *owner != command);
    }

    /// Run a lifecycle call on a registered command with the scheduler
    /// available to it. Returns `None` if the command is not available.
    fn with_command<R>(
        &mut self,
        command: CommandId,
        f: impl FnOnce(&mut dyn Command, &mut Scheduler) -> R,
    ) -> Option<R> {
        let mut boxed = self.registry.checkout(command)?;
        self.dispatch_depth += 1;
        let result = f(boxed.as_mut(), self);
        self.dispatch_depth -= 1;
        self.registry.restore(command, boxed);
        Some(result)
    }

    /// Apply requests that were buffered because their target was busy,
    /// once no lifecycle call is on the stack and no tick is running.
    fn flush_if_idle(&mut self) {
        if self.dispatch_depth == 0 && !self.in_tick {
            self.apply_pending();
        }
    }

    fn apply_pending(&mut self) {
        while !self.pending_schedule.is_empty() || !self.pending_cancel.is_empty() {
            let to_schedule = std::mem::take(&mut self.pending_schedule);
            let to_cancel = std::mem::take(&mut self.pending_cancel);

            for command in to_schedule {
                if let Err(err) = self.schedule_inner(command) {
                    error!(%command, error = %err, "deferred schedule failed");
                }
            }
            for command in to_cancel {
                self.cancel_inner(command);
            }
        }
    }

    // ----- tick ---------------------------------------------------------

    /// Run one control-loop iteration.
    ///
    /// 1. resource periodic hooks
    /// 2. trigger bindings
    /// 3. execute every scheduled command (snapshot of the active set)
    /// 4. apply requests buffered during step 3
    /// 5. schedule default commands for unowned resources
    pub fn tick(&mut self) {
        if self.in_tick || self.dispatch_depth > 0 {
            warn!("tick called from inside the scheduler; ignoring");
            return;
        }
        if self.suspended {
            return;
        }

        let mut timings = TickTimings::default();
        let mut mark = self.clock.now();

        for slot in self.resources.iter_mut() {
            if let Some(periodic) = slot.periodic.as_mut() {
                periodic();
            }
        }
        timings.periodic = self.lap(&mut mark);

        self.poll_bindings();
        timings.bindings = self.lap(&mut mark);

        self.in_tick = true;
        let snapshot = self.active.clone();
        for command in snapshot {
            self.step_command(command);
        }
        self.in_tick = false;
        timings.commands = self.lap(&mut mark);

        self.apply_pending();
        self.schedule_defaults();
        timings.housekeeping = self.lap(&mut mark);

        self.tick_count += 1;
        self.last_timings = timings;
        if timings.total() > self.period {
            warn!(
                tick = self.tick_count,
                elapsed = ?timings.total(),
                period = ?self.period,
                ?timings,
                "command scheduler loop overrun"
            );
        }
    }

    fn lap(&self, mark: &mut Duration) -> Duration {
        let now = self.clock.now();
        let elapsed = now.saturating_sub(*mark);
        *mark = now;
        elapsed
    }

    fn step_command(&mut self, command: CommandId) {
        let runs_when_disabled = self
            .registry
            .info(command)
            .is_some_and(|i| i.runs_when_disabled);

        if self.disabled && !runs_when_disabled {
            self.release(command);
            self.with_command(command, |cmd, scheduler| cmd.end(true, scheduler));
            info!(%command, "command interrupted by disable");
            events::fire(self, LifecycleEvent::Interrupt, command);
            return;
        }

        self.with_command(command, |cmd, scheduler| cmd.execute(scheduler));
        events::fire(self, LifecycleEvent::Execute, command);

        let finished = self
            .with_command(command, |cmd, _| cmd.is_finished())
            .unwrap_or(false);
        if finished {
            self.with_command(command, |cmd, scheduler| cmd.end(false, scheduler));
            self.release(command);
            info!(%command, "command finished");
            events::fire(self, LifecycleEvent::Finish, command);
        }
    }

    fn schedule_defaults(&mut self) {
        let defaults: Vec<(ResourceId, CommandId)> = self
            .resources
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.default_command.map(|c| (ResourceId(i), c)))
            .filter(|(resource, _)| !self.owners.contains_key(resource))
            .collect();

        for (resource, command) in defaults {
            // An earlier default may have claimed this resource already.
            if self.owners.contains_key(&resource) {
                continue;
            }
            match self.schedule(command) {
                Ok(outcome) => debug!(%resource, %command, ?outcome, "default command armed"),
                Err(err) => error!(%resource, %command, error = %err, "failed to schedule default command"),
            }
        }
    }
}
