// src/scheduler/compose.rs

//! Building compositions from registered commands.
//!
//! Every helper here moves its inputs out of the registry (marking them
//! composed) and registers the resulting command, returning its id.
//! Validation happens before anything is moved, so a failed composition
//! leaves every input untouched and still schedulable.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Debug;
use std::time::Duration;

use tracing::debug;

use crate::command::{
    CommandId, ConditionalCommand, FunctionalCommand, InstantCommand, Member, ProxyCommand,
    RepeatCommand, ResourceId, RunCommand, ScheduleCommand, SelectCommand, WaitCommand,
    WaitUntilCommand, WrapperCommand,
};
use crate::errors::{Result, RobocmdError};
use crate::group::{
    ParallelCommandGroup, ParallelDeadlineGroup, ParallelRaceGroup, SequentialCommandGroup,
};
use crate::scheduler::Scheduler;
use crate::types::InterruptionBehavior;

/// Whether members of a composition may share resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// Only one member ever runs (conditional and select wrappers).
    Allowed,
    /// Every command group.
    Forbidden,
}

impl Scheduler {
    /// Check that every id can be composed, then move them all out of the
    /// registry. All-or-nothing.
    pub fn take_members(&mut self, ids: &[CommandId], overlap: Overlap) -> Result<Vec<Member>> {
        self.check_composable(ids, overlap)?;
        let members: Vec<Member> = ids
            .iter()
            .filter_map(|&id| self.registry.compose(id))
            .collect();
        debug!(members = ?ids, "commands composed");
        Ok(members)
    }

    /// The checks `take_members` runs, without moving anything.
    pub fn check_composable(&self, ids: &[CommandId], overlap: Overlap) -> Result<()> {
        let mut seen = HashSet::new();
        let mut claimed: BTreeMap<_, CommandId> = BTreeMap::new();

        for &id in ids {
            let info = self
                .registry
                .info(id)
                .ok_or(RobocmdError::UnknownCommand(id))?;
            if !seen.insert(id) {
                return Err(RobocmdError::DuplicateGroupMember(id));
            }
            if self.registry.is_composed(id) {
                return Err(RobocmdError::AlreadyComposed(id));
            }
            if self.is_scheduled(id) || self.is_pending_schedule(id) || self.registry.is_checked_out(id) {
                return Err(RobocmdError::ComposeWhileScheduled(id));
            }
            if overlap == Overlap::Forbidden {
                for &resource in &info.requirements {
                    if let Some(&first) = claimed.get(&resource) {
                        return Err(RobocmdError::ConflictingGroupRequirements {
                            first,
                            second: id,
                            resource,
                        });
                    }
                    claimed.insert(resource, id);
                }
            }
        }
        Ok(())
    }

    fn take_member(&mut self, id: CommandId) -> Result<Member> {
        let mut members = self.take_members(&[id], Overlap::Allowed)?;
        members.pop().ok_or(RobocmdError::UnknownCommand(id))
    }

    // ----- groups -------------------------------------------------------

    /// Run `ids` one after another.
    pub fn sequence(&mut self, ids: &[CommandId]) -> Result<CommandId> {
        let members = self.take_members(ids, Overlap::Forbidden)?;
        Ok(self.register(SequentialCommandGroup::new(members)))
    }

    /// Run `ids` together until all have finished.
    pub fn parallel(&mut self, ids: &[CommandId]) -> Result<CommandId> {
        let members = self.take_members(ids, Overlap::Forbidden)?;
        Ok(self.register(ParallelCommandGroup::new(members)))
    }

    /// Run `ids` together until any one finishes.
    pub fn race(&mut self, ids: &[CommandId]) -> Result<CommandId> {
        let members = self.take_members(ids, Overlap::Forbidden)?;
        Ok(self.register(ParallelRaceGroup::new(members)))
    }

    /// Run `deadline` and `others` together until `deadline` finishes.
    /// `deadline` may also appear in `others`; it is only added once.
    pub fn deadline(&mut self, deadline: CommandId, others: &[CommandId]) -> Result<CommandId> {
        let mut ids = vec![deadline];
        ids.extend(others.iter().copied().filter(|&id| id != deadline));

        let mut members = self.take_members(&ids, Overlap::Forbidden)?;
        let rest = members.split_off(1);
        let deadline = members
            .pop()
            .ok_or(RobocmdError::UnknownCommand(deadline))?;
        Ok(self.register(ParallelDeadlineGroup::new(deadline, rest)))
    }

    // ----- decorators ---------------------------------------------------

    /// `command` followed by `next`.
    pub fn and_then(&mut self, command: CommandId, next: &[CommandId]) -> Result<CommandId> {
        let mut ids = vec![command];
        ids.extend_from_slice(next);
        self.sequence(&ids)
    }

    /// `before` followed by `command`.
    pub fn before_starting(&mut self, command: CommandId, before: CommandId) -> Result<CommandId> {
        self.sequence(&[before, command])
    }

    pub fn along_with(&mut self, command: CommandId, others: &[CommandId]) -> Result<CommandId> {
        let mut ids = vec![command];
        ids.extend_from_slice(others);
        self.parallel(&ids)
    }

    pub fn race_with(&mut self, command: CommandId, others: &[CommandId]) -> Result<CommandId> {
        let mut ids = vec![command];
        ids.extend_from_slice(others);
        self.race(&ids)
    }

    /// `command` as the deadline of a group with `others`.
    pub fn deadline_with(&mut self, command: CommandId, others: &[CommandId]) -> Result<CommandId> {
        self.deadline(command, others)
    }

    /// Interrupt `command` once `timeout` has elapsed.
    pub fn with_timeout(&mut self, command: CommandId, timeout: Duration) -> Result<CommandId> {
        self.check_composable(&[command], Overlap::Forbidden)?;
        let wait = self.register(WaitCommand::new(timeout, self.clock()));
        self.race_with_helper(command, wait)
    }

    /// Interrupt `command` once `condition` becomes true.
    pub fn until(
        &mut self,
        command: CommandId,
        condition: impl Fn() -> bool + 'static,
    ) -> Result<CommandId> {
        self.check_composable(&[command], Overlap::Forbidden)?;
        let wait = self.register(WaitUntilCommand::new(condition));
        self.race_with_helper(command, wait)
    }

    /// Interrupt `command` as soon as `condition` stops holding.
    pub fn only_while(
        &mut self,
        command: CommandId,
        condition: impl Fn() -> bool + 'static,
    ) -> Result<CommandId> {
        self.until(command, move || !condition())
    }

    fn race_with_helper(&mut self, command: CommandId, helper: CommandId) -> Result<CommandId> {
        // The helper requires nothing, so only `command` can fail validation.
        self.race(&[command, helper])
    }

    /// Restart `command` each time it finishes; never finishes itself.
    pub fn repeatedly(&mut self, command: CommandId) -> Result<CommandId> {
        let member = self.take_member(command)?;
        Ok(self.register(RepeatCommand::new(member)))
    }

    /// Run `on_true` or `on_false` depending on `condition` at initialize.
    pub fn either(
        &mut self,
        on_true: CommandId,
        on_false: CommandId,
        condition: impl Fn() -> bool + 'static,
    ) -> Result<CommandId> {
        let mut members = self.take_members(&[on_true, on_false], Overlap::Allowed)?;
        let (Some(on_false_member), Some(on_true_member)) = (members.pop(), members.pop()) else {
            return Err(RobocmdError::UnknownCommand(on_true));
        };
        Ok(self.register(ConditionalCommand::new(
            on_true_member,
            on_false_member,
            condition,
        )))
    }

    /// Skip `command` (finish immediately) if `condition` holds at initialize.
    pub fn unless(
        &mut self,
        command: CommandId,
        condition: impl Fn() -> bool + 'static,
    ) -> Result<CommandId> {
        self.check_composable(&[command], Overlap::Allowed)?;
        let noop = self.register(InstantCommand::noop());
        self.either(noop, command, condition)
    }

    /// Run `command` only if `condition` holds at initialize.
    pub fn only_if(
        &mut self,
        command: CommandId,
        condition: impl Fn() -> bool + 'static,
    ) -> Result<CommandId> {
        self.unless(command, move || !condition())
    }

    /// Run the command registered under the key returned by `selector`.
    pub fn select<K: Ord + Clone + Debug + 'static>(
        &mut self,
        selector: impl Fn() -> K + 'static,
        commands: BTreeMap<K, CommandId>,
    ) -> Result<CommandId> {
        let ids: Vec<CommandId> = commands.values().copied().collect();
        let members = self.take_members(&ids, Overlap::Allowed)?;
        let keyed = commands.into_keys().zip(members).collect();
        Ok(self.register(SelectCommand::new(selector, keyed)))
    }

    /// A command that schedules `command` separately and waits for it. The
    /// target is not composed and keeps competing for its own resources.
    pub fn as_proxy(&mut self, command: CommandId) -> Result<CommandId> {
        if !self.registry.contains(command) {
            return Err(RobocmdError::UnknownCommand(command));
        }
        Ok(self.register(ProxyCommand::new(command)))
    }

    /// Take `command` into a [`WrapperCommand`] for further customisation.
    /// The caller registers the result.
    pub fn wrap(&mut self, command: CommandId) -> Result<WrapperCommand> {
        Ok(WrapperCommand::new(self.take_member(command)?))
    }

    pub fn ignoring_disable(&mut self, command: CommandId, runs: bool) -> Result<CommandId> {
        let wrapped = self.wrap(command)?.ignoring_disable(runs);
        Ok(self.register(wrapped))
    }

    pub fn with_interrupt_behavior(
        &mut self,
        command: CommandId,
        behavior: InterruptionBehavior,
    ) -> Result<CommandId> {
        let wrapped = self.wrap(command)?.with_interrupt_behavior(behavior);
        Ok(self.register(wrapped))
    }

    pub fn finally_do(
        &mut self,
        command: CommandId,
        hook: impl FnMut(bool) + 'static,
    ) -> Result<CommandId> {
        let wrapped = self.wrap(command)?.finally_do(hook);
        Ok(self.register(wrapped))
    }

    pub fn handle_interrupt(
        &mut self,
        command: CommandId,
        handler: impl FnMut() + 'static,
    ) -> Result<CommandId> {
        let wrapped = self.wrap(command)?.handle_interrupt(handler);
        Ok(self.register(wrapped))
    }

    // ----- factories ----------------------------------------------------

    /// A command that does nothing and finishes immediately.
    pub fn none(&mut self) -> CommandId {
        self.register(InstantCommand::noop().named("None"))
    }

    /// A command that holds `requirements` and does nothing until
    /// interrupted.
    pub fn idle(&mut self, requirements: impl IntoIterator<Item = ResourceId>) -> CommandId {
        self.register(RunCommand::new(|| {}, requirements).named("Idle"))
    }

    /// Runs `run` every tick until interrupted, then `end` once.
    pub fn run_end(
        &mut self,
        run: impl FnMut() + 'static,
        mut end: impl FnMut() + 'static,
        requirements: impl IntoIterator<Item = ResourceId>,
    ) -> CommandId {
        let command = FunctionalCommand::new(|| {}, run, move |_| end(), || false, requirements)
            .named("RunEnd");
        self.register(command)
    }

    /// Runs `start` once, then `run` every tick until interrupted.
    pub fn start_run(
        &mut self,
        start: impl FnMut() + 'static,
        run: impl FnMut() + 'static,
        requirements: impl IntoIterator<Item = ResourceId>,
    ) -> CommandId {
        let command = FunctionalCommand::new(start, run, |_| {}, || false, requirements)
            .named("StartRun");
        self.register(command)
    }

    /// Schedules `ids` in order and finishes at once. The targets are not
    /// composed, so they keep their own requirements out of any group this
    /// command joins.
    pub fn fork(&mut self, ids: &[CommandId]) -> Result<CommandId> {
        if let Some(&unknown) = ids.iter().find(|&&id| !self.registry.contains(id)) {
            return Err(RobocmdError::UnknownCommand(unknown));
        }
        Ok(self.register(ScheduleCommand::new(ids.iter().copied())))
    }

    /// `ids` in sequence, restarted each time the last one finishes.
    pub fn repeating_sequence(&mut self, ids: &[CommandId]) -> Result<CommandId> {
        let sequence = self.sequence(ids)?;
        self.repeatedly(sequence)
    }

    /// Union of the requirements of `ids`, for callers building their own
    /// compositions.
    pub fn requirements_of(&self, ids: &[CommandId]) -> BTreeSet<ResourceId> {
        ids.iter()
            .filter_map(|&id| self.registry.info(id))
            .flat_map(|info| info.requirements.iter().copied())
            .collect()
    }
}
