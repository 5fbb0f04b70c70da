// src/command/mod.rs

//! The command lifecycle contract and the leaf/wrapper commands built on it.
//!
//! - [`basic`] holds closure-driven leaf commands (instant, run, wait, ...).
//! - [`wrappers`] holds commands that decorate or select other commands.
//!
//! A command is a polled state machine. The scheduler drives it through
//! `initialize` → (`execute` → `is_finished`)* → `end`, exactly one `end`
//! per scheduling episode. Lifecycle methods receive the scheduler so a
//! command may schedule or cancel other commands; while a tick is in
//! progress those requests are buffered and applied after the execute loop.

use std::collections::BTreeSet;
use std::fmt;

use crate::scheduler::Scheduler;
use crate::types::InterruptionBehavior;

pub mod basic;
pub mod wrappers;

pub use basic::{
    FunctionalCommand, InstantCommand, PrintCommand, RunCommand, StartEndCommand, WaitCommand,
    WaitUntilCommand,
};
pub use wrappers::{
    ConditionalCommand, ProxyCommand, RepeatCommand, ScheduleCommand, SelectCommand,
    WrapperCommand,
};

/// Handle to a command registered with a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(pub(crate) usize);

impl CommandId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

/// Handle to an exclusive-use resource (a robot subsystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res#{}", self.0)
    }
}

/// A unit of robot behaviour.
///
/// Metadata (`requirements`, `runs_when_disabled`, `interruption_behavior`)
/// is read once when the command is registered and must not change
/// afterwards.
pub trait Command {
    /// Human-readable name used in logs and traces.
    fn name(&self) -> String {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base).to_string()
    }

    /// Resources this command needs exclusive use of while scheduled.
    fn requirements(&self) -> BTreeSet<ResourceId> {
        BTreeSet::new()
    }

    /// Called once when the command is scheduled.
    fn initialize(&mut self, _scheduler: &mut Scheduler) {}

    /// Called once per tick while the command is scheduled.
    fn execute(&mut self, _scheduler: &mut Scheduler) {}

    /// Polled after every `execute`.
    fn is_finished(&self) -> bool {
        false
    }

    /// Called exactly once when the command stops, either because it
    /// finished (`interrupted == false`) or because it was cancelled.
    fn end(&mut self, _interrupted: bool, _scheduler: &mut Scheduler) {}

    fn runs_when_disabled(&self) -> bool {
        false
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        InterruptionBehavior::CancelSelf
    }
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name())
            .field("requirements", &self.requirements())
            .finish_non_exhaustive()
    }
}

/// Static metadata of a command, cached at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub requirements: BTreeSet<ResourceId>,
    pub runs_when_disabled: bool,
    pub interruption_behavior: InterruptionBehavior,
}

impl CommandInfo {
    pub fn of(command: &dyn Command) -> Self {
        Self {
            name: command.name(),
            requirements: command.requirements(),
            runs_when_disabled: command.runs_when_disabled(),
            interruption_behavior: command.interruption_behavior(),
        }
    }

    pub fn has_requirement(&self, resource: ResourceId) -> bool {
        self.requirements.contains(&resource)
    }
}

/// A command that has been moved out of the scheduler's registry into a
/// composition. It keeps its original id for logging.
pub struct Member {
    id: CommandId,
    info: CommandInfo,
    command: Box<dyn Command>,
}

impl Member {
    pub(crate) fn new(id: CommandId, info: CommandInfo, command: Box<dyn Command>) -> Self {
        Self { id, info, command }
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn info(&self) -> &CommandInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn requirements(&self) -> &BTreeSet<ResourceId> {
        &self.info.requirements
    }

    pub fn runs_when_disabled(&self) -> bool {
        self.info.runs_when_disabled
    }

    pub fn interruption_behavior(&self) -> InterruptionBehavior {
        self.info.interruption_behavior
    }

    pub fn initialize(&mut self, scheduler: &mut Scheduler) {
        self.command.initialize(scheduler);
    }

    pub fn execute(&mut self, scheduler: &mut Scheduler) {
        self.command.execute(scheduler);
    }

    pub fn is_finished(&self) -> bool {
        self.command.is_finished()
    }

    pub fn end(&mut self, interrupted: bool, scheduler: &mut Scheduler) {
        self.command.end(interrupted, scheduler);
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("id", &self.id)
            .field("name", &self.info.name)
            .finish_non_exhaustive()
    }
}

/// Aggregated metadata of a composition: union of requirements, AND of
/// `runs_when_disabled`, and `CancelSelf` if any member is `CancelSelf`.
pub fn aggregate_info<'a>(
    name: impl Into<String>,
    members: impl IntoIterator<Item = &'a CommandInfo>,
) -> CommandInfo {
    let mut info = CommandInfo {
        name: name.into(),
        requirements: BTreeSet::new(),
        runs_when_disabled: true,
        interruption_behavior: InterruptionBehavior::CancelIncoming,
    };

    for member in members {
        info.requirements.extend(member.requirements.iter().copied());
        info.runs_when_disabled &= member.runs_when_disabled;
        if member.interruption_behavior == InterruptionBehavior::CancelSelf {
            info.interruption_behavior = InterruptionBehavior::CancelSelf;
        }
    }

    info
}
