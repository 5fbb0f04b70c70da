// src/scheduler/snapshot.rs

//! Read-only view of scheduler state for telemetry consumers and tests.

use std::fmt;

use crate::command::{CommandId, ResourceId};
use crate::scheduler::Scheduler;

/// One scheduled command as seen by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEntry {
    pub id: CommandId,
    pub name: String,
    pub owns: Vec<ResourceId>,
}

/// Point-in-time copy of what is running and who owns what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub tick: u64,
    pub active: Vec<ActiveEntry>,
    /// `(resource, resource name, owner)` for every owned resource.
    pub owners: Vec<(ResourceId, String, CommandId)>,
}

impl SchedulerSnapshot {
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn owner_of(&self, resource: ResourceId) -> Option<CommandId> {
        self.owners
            .iter()
            .find(|(r, _, _)| *r == resource)
            .map(|(_, _, c)| *c)
    }
}

impl fmt::Display for SchedulerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick {}:", self.tick)?;
        if self.active.is_empty() {
            return write!(f, " idle");
        }
        for entry in &self.active {
            write!(f, " {}({})", entry.name, entry.id)?;
        }
        Ok(())
    }
}

impl Scheduler {
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let active = self
            .active()
            .iter()
            .map(|&id| ActiveEntry {
                id,
                name: self.name_of(id).unwrap_or("?").to_string(),
                owns: self
                    .owners()
                    .iter()
                    .filter(|(_, owner)| **owner == id)
                    .map(|(r, _)| *r)
                    .collect(),
            })
            .collect();

        let owners = self
            .owners()
            .iter()
            .map(|(&r, &c)| (r, self.resource_name(r).unwrap_or("?").to_string(), c))
            .collect();

        SchedulerSnapshot {
            tick: self.tick_count(),
            active,
            owners,
        }
    }
}
