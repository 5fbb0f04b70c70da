// src/scheduler/registry.rs

//! Arena of registered commands.
//!
//! Each slot caches the command's static metadata so arbitration never has
//! to touch the command object itself. The boxed command is absent while
//! one of its lifecycle methods is on the call stack ("checked out") and
//! permanently once it has been moved into a composition.

use crate::command::{Command, CommandId, CommandInfo, Member};

struct Slot {
    info: CommandInfo,
    command: Option<Box<dyn Command>>,
    composed: bool,
}

#[derive(Default)]
pub(crate) struct Registry {
    slots: Vec<Slot>,
}

impl Registry {
    pub fn register(&mut self, command: Box<dyn Command>) -> CommandId {
        let id = CommandId(self.slots.len());
        self.slots.push(Slot {
            info: CommandInfo::of(command.as_ref()),
            command: Some(command),
            composed: false,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, id: CommandId) -> bool {
        id.0 < self.slots.len()
    }

    pub fn info(&self, id: CommandId) -> Option<&CommandInfo> {
        self.slots.get(id.0).map(|s| &s.info)
    }

    pub fn is_composed(&self, id: CommandId) -> bool {
        self.slots.get(id.0).is_some_and(|s| s.composed)
    }

    /// A registered, uncomposed command whose box is currently checked out.
    pub fn is_checked_out(&self, id: CommandId) -> bool {
        self.slots
            .get(id.0)
            .is_some_and(|s| !s.composed && s.command.is_none())
    }

    pub fn checkout(&mut self, id: CommandId) -> Option<Box<dyn Command>> {
        self.slots.get_mut(id.0).and_then(|s| s.command.take())
    }

    pub fn restore(&mut self, id: CommandId, command: Box<dyn Command>) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.command = Some(command);
        }
    }

    /// Move a command out of the registry for good and mark it composed.
    ///
    /// Callers validate first; this returns `None` only if the slot is
    /// already empty.
    pub fn compose(&mut self, id: CommandId) -> Option<Member> {
        let slot = self.slots.get_mut(id.0)?;
        let command = slot.command.take()?;
        slot.composed = true;
        Some(Member::new(id, slot.info.clone(), command))
    }

    pub fn composed_ids(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.composed)
            .map(|(i, _)| CommandId(i))
    }
}
