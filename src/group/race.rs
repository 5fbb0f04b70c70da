// src/group/race.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::command::{Command, CommandInfo, Member, ResourceId, aggregate_info};
use crate::scheduler::Scheduler;
use crate::types::InterruptionBehavior;

/// Per-member state within one run of the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Idle,
    Running,
    /// Reported finished; `end(false)` is owed when the group ends.
    Finished,
}

/// Runs all members together; finishes as soon as any member finishes.
///
/// When the group ends, members that finished are ended with `false` and
/// every other member is ended with `true`. No member is ended twice.
#[derive(Debug)]
pub struct ParallelRaceGroup {
    members: Vec<Member>,
    lanes: Vec<Lane>,
    finished: bool,
    info: CommandInfo,
}

impl ParallelRaceGroup {
    pub fn new(members: Vec<Member>) -> Self {
        let info = aggregate_info("ParallelRaceGroup", members.iter().map(Member::info));
        let lanes = vec![Lane::Idle; members.len()];
        Self {
            members,
            lanes,
            finished: false,
            info,
        }
    }
}

impl Command for ParallelRaceGroup {
    fn name(&self) -> String {
        let names: Vec<&str> = self.members.iter().map(Member::name).collect();
        format!("Race[{}]", names.join(", "))
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.info.requirements.clone()
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        self.finished = false;
        for (member, lane) in self.members.iter_mut().zip(self.lanes.iter_mut()) {
            member.initialize(scheduler);
            *lane = Lane::Running;
        }
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        for (member, lane) in self.members.iter_mut().zip(self.lanes.iter_mut()) {
            if *lane != Lane::Running {
                continue;
            }
            member.execute(scheduler);
            if member.is_finished() {
                *lane = Lane::Finished;
                self.finished = true;
                debug!(member = %member.id(), "race member finished first");
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn end(&mut self, _interrupted: bool, scheduler: &mut Scheduler) {
        for (member, lane) in self.members.iter_mut().zip(self.lanes.iter_mut()) {
            match *lane {
                Lane::Finished => member.end(false, scheduler),
                Lane::Running => member.end(true, scheduler),
                Lane::Idle => {}
            }
            *lane = Lane::Idle;
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
