// src/group/deadline.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::command::{Command, CommandInfo, Member, ResourceId, aggregate_info};
use crate::scheduler::Scheduler;
use crate::types::InterruptionBehavior;

/// Runs all members together; finishes exactly when the deadline member
/// finishes. Other members that finish earlier are ended individually;
/// those still running when the group ends are interrupted.
///
/// The deadline is always `members[0]`.
#[derive(Debug)]
pub struct ParallelDeadlineGroup {
    members: Vec<Member>,
    running: Vec<bool>,
    finished: bool,
    info: CommandInfo,
}

impl ParallelDeadlineGroup {
    /// `others` must not contain the deadline; the scheduler helper
    /// deduplicates it before calling this.
    pub fn new(deadline: Member, others: Vec<Member>) -> Self {
        let mut members = Vec::with_capacity(others.len() + 1);
        members.push(deadline);
        members.extend(others);

        let info = aggregate_info("ParallelDeadlineGroup", members.iter().map(Member::info));
        let running = vec![false; members.len()];
        Self {
            members,
            running,
            finished: false,
            info,
        }
    }

    pub fn deadline(&self) -> &Member {
        &self.members[0]
    }
}

impl Command for ParallelDeadlineGroup {
    fn name(&self) -> String {
        let names: Vec<&str> = self.members[1..].iter().map(Member::name).collect();
        format!("Deadline({})[{}]", self.members[0].name(), names.join(", "))
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.info.requirements.clone()
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        for (member, running) in self.members.iter_mut().zip(self.running.iter_mut()) {
            member.initialize(scheduler);
            *running = true;
        }
        self.finished = false;
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        for (index, (member, running)) in self
            .members
            .iter_mut()
            .zip(self.running.iter_mut())
            .enumerate()
        {
            if !*running {
                continue;
            }
            member.execute(scheduler);
            if member.is_finished() {
                member.end(false, scheduler);
                *running = false;
                if index == 0 {
                    debug!(member = %member.id(), "deadline reached");
                    self.finished = true;
                }
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn end(&mut self, _interrupted: bool, scheduler: &mut Scheduler) {
        for (member, running) in self.members.iter_mut().zip(self.running.iter_mut()) {
            if *running {
                member.end(true, scheduler);
                *running = false;
            }
        }
        self.finished = false;
    }

    fn runs_when_disabled(&self) -> bool {
        self.info.runs_when_disabled
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.info.interruption_behavior
    }
}
