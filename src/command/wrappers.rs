// src/command/wrappers.rs

//! Commands that decorate, select between, or schedule other commands.
//!
//! Wrappers that *own* an inner command take a [`Member`], i.e. a command
//! that the scheduler has already marked composed. Use the helpers in
//! [`crate::scheduler::compose`] to build them from registered ids.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use tracing::{error, warn};

use crate::command::{Command, CommandId, CommandInfo, Member, ResourceId, aggregate_info};
use crate::scheduler::Scheduler;
use crate::types::InterruptionBehavior;

/// Restarts its inner command every time it finishes; never finishes itself.
pub struct RepeatCommand {
    inner: Member,
    ended: bool,
}

impl RepeatCommand {
    pub fn new(inner: Member) -> Self {
        Self { inner, ended: true }
    }
}

impl Command for RepeatCommand {
    fn name(&self) -> String {
        format!("Repeat({})", self.inner.name())
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.inner.requirements().clone()
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        self.ended = false;
        self.inner.initialize(scheduler);
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        if self.ended {
            self.ended = false;
            self.inner.initialize(scheduler);
        }
        self.inner.execute(scheduler);
        if self.inner.is_finished() {
            self.inner.end(false, scheduler);
            self.ended = true;
        }
    }

    fn end(&mut self, interrupted: bool, scheduler: &mut Scheduler) {
        // The inner command may already have ended naturally this tick.
        if !self.ended {
            self.inner.end(interrupted, scheduler);
            self.ended = true;
        }
    }

    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    OnTrue,
    OnFalse,
}

/// Runs one of two commands, chosen by a condition evaluated at initialize.
pub struct ConditionalCommand {
    on_true: Member,
    on_false: Member,
    condition: Box<dyn Fn() -> bool>,
    selected: Option<Branch>,
    info: CommandInfo,
}

impl ConditionalCommand {
    pub fn new(on_true: Member, on_false: Member, condition: impl Fn() -> bool + 'static) -> Self {
        let info = aggregate_info("ConditionalCommand", [on_true.info(), on_false.info()]);
        Self {
            on_true,
            on_false,
            condition: Box::new(condition),
            selected: None,
            info,
        }
    }

    fn selected_mut(&mut self) -> Option<&mut Member> {
        match self.selected? {
            Branch::OnTrue => Some(&mut self.on_true),
            Branch::OnFalse => Some(&mut self.on_false),
        }
    }
}

impl Command for ConditionalCommand {
    fn name(&self) -> String {
        format!(
            "Conditional({}, {})",
            self.on_true.name(),
            self.on_false.name()
        )
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.info.requirements.clone()
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        let branch = if (self.condition)() {
            Branch::OnTrue
        } else {
            Branch::OnFalse
        };
        self.selected = Some(branch);
        if let Some(member) = self.selected_mut() {
            member.initialize(scheduler);
        }
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        if let Some(member) = self.selected_mut() {
            member.execute(scheduler);
        }
    }

    fn is_finished(&self) -> bool {
        match self.selected {
            Some(Branch::OnTrue) => self.on_true.is_finished(),
            Some(Branch::OnFalse) => self.on_false.is_finished(),
            None => true,
        }
    }

    fn end(&mut self, interrupted: bool, scheduler: &mut Scheduler) {
        if let Some(member) = self.selected_mut() {
            member.end(interrupted, scheduler);
        }
        self.selected = None;
    }

    fn runs_when_disabled(&self) -> bool {
        self.info.runs_when_disabled
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.info.interruption_behavior
    }
}

/// Runs the command stored under the key returned by a selector at
/// initialize. An unknown key finishes immediately with a warning.
pub struct SelectCommand<K> {
    selector: Box<dyn Fn() -> K>,
    commands: BTreeMap<K, Member>,
    selected: Option<K>,
    info: CommandInfo,
}

impl<K: Ord + Clone + Debug + 'static> SelectCommand<K> {
    pub fn new(selector: impl Fn() -> K + 'static, commands: BTreeMap<K, Member>) -> Self {
        let info = aggregate_info("SelectCommand", commands.values().map(Member::info));
        Self {
            selector: Box::new(selector),
            commands,
            selected: None,
            info,
        }
    }
}

impl<K: Ord + Clone + Debug + 'static> Command for SelectCommand<K> {
    fn name(&self) -> String {
        "SelectCommand".to_string()
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.info.requirements.clone()
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        let key = (self.selector)();
        match self.commands.get_mut(&key) {
            Some(member) => {
                member.initialize(scheduler);
                self.selected = Some(key);
            }
            None => {
                warn!(?key, "select command: selector value does not correspond to any command");
                self.selected = None;
            }
        }
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        if let Some(member) = self.selected.as_ref().and_then(|k| self.commands.get_mut(k)) {
            member.execute(scheduler);
        }
    }

    fn is_finished(&self) -> bool {
        self.selected
            .as_ref()
            .and_then(|k| self.commands.get(k))
            .is_none_or(Member::is_finished)
    }

    fn end(&mut self, interrupted: bool, scheduler: &mut Scheduler) {
        if let Some(key) = self.selected.take() {
            if let Some(member) = self.commands.get_mut(&key) {
                member.end(interrupted, scheduler);
            }
        }
    }

    fn runs_when_disabled(&self) -> bool {
        self.info.runs_when_disabled
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.info.interruption_behavior
    }
}

/// Schedules another (independently registered) command on initialize and
/// finishes when that command stops running. Interrupting the proxy cancels
/// the proxied command.
///
/// The proxy itself requires nothing; the proxied command competes for its
/// resources on its own.
pub struct ProxyCommand {
    supplier: Box<dyn FnMut() -> CommandId>,
    current: Option<CommandId>,
    running: bool,
}

impl ProxyCommand {
    pub fn new(target: CommandId) -> Self {
        Self::with_supplier(move || target)
    }

    pub fn with_supplier(supplier: impl FnMut() -> CommandId + 'static) -> Self {
        Self {
            supplier: Box::new(supplier),
            current: None,
            running: false,
        }
    }
}

impl Command for ProxyCommand {
    fn name(&self) -> String {
        match self.current {
            Some(id) => format!("Proxy({id})"),
            None => "Proxy".to_string(),
        }
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        let target = (self.supplier)();
        self.current = Some(target);
        self.running = match scheduler.schedule(target) {
            Ok(_) => true,
            Err(err) => {
                error!(%target, error = %err, "proxy command failed to schedule target");
                false
            }
        };
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        // A target scheduled from inside a tick only becomes active once the
        // buffered requests are applied, so pending counts as running.
        self.running = self
            .current
            .is_some_and(|id| scheduler.is_scheduled(id) || scheduler.is_pending_schedule(id));
    }

    fn is_finished(&self) -> bool {
        !self.running
    }

    fn end(&mut self, interrupted: bool, scheduler: &mut Scheduler) {
        if let Some(target) = self.current.take() {
            if interrupted {
                scheduler.cancel(target);
            }
        }
        self.running = false;
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }
}

/// Schedules a set of commands on initialize and finishes immediately.
/// The scheduled commands are not tied to this command's lifetime.
pub struct ScheduleCommand {
    targets: Vec<CommandId>,
}

impl ScheduleCommand {
    pub fn new(targets: impl IntoIterator<Item = CommandId>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }
}

impl Command for ScheduleCommand {
    fn initialize(&mut self, scheduler: &mut Scheduler) {
        for &target in &self.targets {
            if let Err(err) = scheduler.schedule(target) {
                error!(%target, error = %err, "schedule command failed to schedule target");
            }
        }
    }

    fn is_finished(&self) -> bool {
        true
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }
}

/// Delegates to an inner command, optionally overriding its name, disabled
/// policy, interruption behaviour, or appending an end hook.
pub struct WrapperCommand {
    inner: Member,
    name: Option<String>,
    runs_when_disabled: Option<bool>,
    interruption_behavior: Option<InterruptionBehavior>,
    finally: Option<Box<dyn FnMut(bool)>>,
}

impl WrapperCommand {
    pub fn new(inner: Member) -> Self {
        Self {
            inner,
            name: None,
            runs_when_disabled: None,
            interruption_behavior: None,
            finally: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn ignoring_disable(mut self, runs_when_disabled: bool) -> Self {
        self.runs_when_disabled = Some(runs_when_disabled);
        self
    }

    pub fn with_interrupt_behavior(mut self, behavior: InterruptionBehavior) -> Self {
        self.interruption_behavior = Some(behavior);
        self
    }

    /// Runs `hook(interrupted)` after the inner command's `end`.
    pub fn finally_do(mut self, hook: impl FnMut(bool) + 'static) -> Self {
        self.finally = Some(Box::new(hook));
        self
    }

    /// Runs `handler` after the inner command's `end`, only when interrupted.
    pub fn handle_interrupt(self, mut handler: impl FnMut() + 'static) -> Self {
        self.finally_do(move |interrupted| {
            if interrupted {
                handler();
            }
        })
    }
}

impl Command for WrapperCommand {
    fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.inner.name().to_string())
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.inner.requirements().clone()
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        self.inner.initialize(scheduler);
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        self.inner.execute(scheduler);
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    fn end(&mut self, interrupted: bool, scheduler: &mut Scheduler) {
        self.inner.end(interrupted, scheduler);
        if let Some(hook) = self.finally.as_mut() {
            hook(interrupted);
        }
    }

    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
            .unwrap_or_else(|| self.inner.runs_when_disabled())
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.interruption_behavior
            .unwrap_or_else(|| self.inner.interruption_behavior())
    }
}
