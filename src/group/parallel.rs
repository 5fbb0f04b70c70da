// src/group/parallel.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::command::{Command, CommandInfo, Member, ResourceId, aggregate_info};
use crate::scheduler::Scheduler;
use crate::types::InterruptionBehavior;

/// Runs all members together; finishes when every member has finished.
#[derive(Debug)]
pub struct ParallelCommandGroup {
    members: Vec<Member>,
    running: Vec<bool>,
    info: CommandInfo,
}

impl ParallelCommandGroup {
    pub fn new(members: Vec<Member>) -> Self {
        let info = aggregate_info("ParallelCommandGroup", members.iter().map(Member::info));
        let running = vec![false; members.len()];
        Self {
            members,
            running,
            info,
        }
    }
}

impl Command for ParallelCommandGroup {
    fn name(&self) -> String {
        let names: Vec<&str> = self.members.iter().map(Member::name).collect();
        format!("Parallel[{}]", names.join(", "))
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.info.requirements.clone()
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        for (member, running) in self.members.iter_mut().zip(self.running.iter_mut()) {
            member.initialize(scheduler);
            *running = true;
        }
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        for (member, running) in self.members.iter_mut().zip(self.running.iter_mut()) {
            if !*running {
                continue;
            }
            member.execute(scheduler);
            if member.is_finished() {
                member.end(false, scheduler);
                *running = false;
                debug!(member = %member.id(), "parallel member finished");
            }
        }
    }

    fn is_finished(&self) -> bool {
        !self.running.iter().any(|&r| r)
    }

    fn end(&mut self, interrupted: bool, scheduler: &mut Scheduler) {
        if !interrupted {
            return;
        }
        for (member, running) in self.members.iter_mut().zip(self.running.iter_mut()) {
            if *running {
                member.end(true, scheduler);
                *running = false;
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
