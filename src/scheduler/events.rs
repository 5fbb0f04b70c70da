// src/scheduler/events.rs

//! Lifecycle-event subscriptions.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::command::CommandId;
use crate::scheduler::Scheduler;

/// Lifecycle transitions observable through scheduler callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Initialize,
    Execute,
    Interrupt,
    Finish,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleEvent::Initialize => "initialize",
            LifecycleEvent::Execute => "execute",
            LifecycleEvent::Interrupt => "interrupt",
            LifecycleEvent::Finish => "finish",
        };
        f.write_str(s)
    }
}

/// Callback invoked with the scheduler and the affected command.
///
/// Scheduling from a callback follows the usual reentrancy rule: buffered
/// while a tick is running, immediate otherwise. Events raised while a
/// callback is running are delivered after it returns, in order.
pub type CommandHook = Box<dyn FnMut(&mut Scheduler, CommandId)>;

type SharedHook = Rc<RefCell<CommandHook>>;

#[derive(Default)]
pub(crate) struct EventHooks {
    initialize: Vec<SharedHook>,
    execute: Vec<SharedHook>,
    interrupt: Vec<SharedHook>,
    finish: Vec<SharedHook>,
    /// Set while hooks are being delivered.
    delivering: bool,
    queued: VecDeque<(LifecycleEvent, CommandId)>,
}

impl EventHooks {
    pub fn add(&mut self, event: LifecycleEvent, hook: CommandHook) {
        self.list_mut(event).push(Rc::new(RefCell::new(hook)));
    }

    /// Snapshot of the hooks for `event`, so firing can run with `&mut
    /// Scheduler` while new hooks are registered.
    pub fn snapshot(&self, event: LifecycleEvent) -> Vec<SharedHook> {
        match event {
            LifecycleEvent::Initialize => self.initialize.clone(),
            LifecycleEvent::Execute => self.execute.clone(),
            LifecycleEvent::Interrupt => self.interrupt.clone(),
            LifecycleEvent::Finish => self.finish.clone(),
        }
    }

    fn list_mut(&mut self, event: LifecycleEvent) -> &mut Vec<SharedHook> {
        match event {
            LifecycleEvent::Initialize => &mut self.initialize,
            LifecycleEvent::Execute => &mut self.execute,
            LifecycleEvent::Interrupt => &mut self.interrupt,
            LifecycleEvent::Finish => &mut self.finish,
        }
    }
}

pub(crate) fn fire(scheduler: &mut Scheduler, event: LifecycleEvent, id: CommandId) {
    scheduler.events.queued.push_back((event, id));
    if scheduler.events.delivering {
        trace!(%event, command = %id, "lifecycle event queued behind running callback");
        return;
    }

    scheduler.events.delivering = true;
    while let Some((event, id)) = scheduler.events.queued.pop_front() {
        for hook in scheduler.events.snapshot(event) {
            // Delivery is never nested, so no hook is borrowed here.
            if let Ok(mut hook) = hook.try_borrow_mut() {
                (*hook)(scheduler, id);
            }
        }
    }
    scheduler.events.delivering = false;
}
