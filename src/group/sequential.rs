// src/group/sequential.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::command::{Command, CommandInfo, Member, ResourceId, aggregate_info};
use crate::scheduler::Scheduler;
use crate::types::InterruptionBehavior;

/// Runs members in order; each starts once the previous one finishes.
#[derive(Debug)]
pub struct SequentialCommandGroup {
    members: Vec<Member>,
    /// Index of the running member, `None` when the group is not running.
    /// Equal to `members.len()` once every member has finished.
    current: Option<usize>,
    info: CommandInfo,
}

impl SequentialCommandGroup {
    pub fn new(members: Vec<Member>) -> Self {
        let info = aggregate_info("SequentialCommandGroup", members.iter().map(Member::info));
        Self {
            members,
            current: None,
            info,
        }
    }

    /// Index of the member currently running, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.current.filter(|&i| i < self.members.len())
    }
}

impl Command for SequentialCommandGroup {
    fn name(&self) -> String {
        let names: Vec<&str> = self.members.iter().map(Member::name).collect();
        format!("Sequence[{}]", names.join(", "))
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.info.requirements.clone()
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        self.current = Some(0);
        if let Some(first) = self.members.first_mut() {
            first.initialize(scheduler);
        }
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        let Some(index) = self.current_index() else {
            return;
        };

        let member = &mut self.members[index];
        member.execute(scheduler);
        if !member.is_finished() {
            return;
        }

        member.end(false, scheduler);
        debug!(member = %member.id(), index, "sequence member finished");

        let next = index + 1;
        self.current = Some(next);
        if let Some(next_member) = self.members.get_mut(next) {
            next_member.initialize(scheduler);
        }
    }

    fn is_finished(&self) -> bool {
        self.current.is_some_and(|i| i >= self.members.len())
    }

    fn end(&mut self, interrupted: bool, scheduler: &mut Scheduler) {
        // Earlier members already ended naturally; later ones never started.
        if interrupted {
            if let Some(index) = self.current_index() {
                self.members[index].end(true, scheduler);
            }
        }
        self.current = None;
    }

    fn runs_when_disabled(&self) -> bool {
        self.info.runs_when_disabled
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.info.interruption_behavior
    }
}
