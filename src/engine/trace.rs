// src/engine/trace.rs

//! Recording lifecycle events for display and assertions.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::command::CommandId;
use crate::scheduler::{LifecycleEvent, Scheduler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub tick: u64,
    pub event: LifecycleEvent,
    pub command: CommandId,
    pub name: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[tick {:>4}] {:<10} {} ({})",
            self.tick, self.event, self.name, self.command
        )
    }
}

/// Shared, append-only log of lifecycle events.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    entries: Rc<RefCell<Vec<TraceEntry>>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `events` on `scheduler`. `names` overrides the
    /// command's own name in entries; `tick` stamps each entry.
    pub fn attach(
        &self,
        scheduler: &mut Scheduler,
        events: &[LifecycleEvent],
        names: BTreeMap<CommandId, String>,
        tick: Rc<Cell<u64>>,
    ) {
        let names = Rc::new(names);
        for &event in events {
            let entries = self.entries.clone();
            let names = names.clone();
            let tick = tick.clone();
            let hook = move |scheduler: &mut Scheduler, command: CommandId| {
                let name = names
                    .get(&command)
                    .cloned()
                    .or_else(|| scheduler.name_of(command).map(str::to_string))
                    .unwrap_or_else(|| command.to_string());
                entries.borrow_mut().push(TraceEntry {
                    tick: tick.get(),
                    event,
                    command,
                    name,
                });
            };
            match event {
                LifecycleEvent::Initialize => scheduler.on_initialize(hook),
                LifecycleEvent::Execute => scheduler.on_execute(hook),
                LifecycleEvent::Interrupt => scheduler.on_interrupt(hook),
                LifecycleEvent::Finish => scheduler.on_finish(hook),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.borrow().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<TraceEntry> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}
