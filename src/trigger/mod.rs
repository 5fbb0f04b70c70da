// src/trigger/mod.rs

//! Boolean conditions that schedule and cancel commands on their edges.
//!
//! A [`Trigger`] is just a shareable predicate. Binding it to a command
//! registers a [`Binding`](binding::Binding) with the scheduler, which
//! polls every binding once per tick before the execute loop. Each binding
//! keeps its own last-seen value, so several bindings on one trigger never
//! interfere with each other.
//!
//! Bindings live in an [`EventLoop`]. Only the scheduler's active loop is
//! polled, so switching loops swaps whole binding sets at once.

pub mod binding;
pub mod debounce;

use std::cell::RefCell;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::rc::Rc;
use std::time::Duration;

use crate::clock::{MonotonicClock, SharedClock};
use crate::command::CommandId;
use crate::scheduler::Scheduler;
use crate::types::{DebounceType, InitialState};

pub use binding::BindingKind;
pub use debounce::Debouncer;

use binding::{Binding, Condition};

/// Handle to a set of bindings owned by a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventLoop(pub(crate) usize);

impl EventLoop {
    pub(crate) const DEFAULT: EventLoop = EventLoop(0);
}

impl fmt::Display for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loop#{}", self.0)
    }
}

#[derive(Clone)]
pub struct Trigger {
    condition: Condition,
    event_loop: EventLoop,
}

impl Trigger {
    /// A trigger whose bindings go to the scheduler's default loop.
    pub fn new(condition: impl Fn() -> bool + 'static) -> Self {
        Self::on_loop(EventLoop::DEFAULT, condition)
    }

    /// A trigger whose bindings go to `event_loop`.
    pub fn on_loop(event_loop: EventLoop, condition: impl Fn() -> bool + 'static) -> Self {
        Self {
            condition: Rc::new(condition),
            event_loop,
        }
    }

    pub fn event_loop(&self) -> EventLoop {
        self.event_loop
    }

    /// Current value of the condition.
    pub fn get(&self) -> bool {
        (self.condition)()
    }

    pub fn and(&self, other: &Trigger) -> Trigger {
        let (a, b) = (self.condition.clone(), other.condition.clone());
        Trigger::on_loop(self.event_loop, move || a() && b())
    }

    pub fn or(&self, other: &Trigger) -> Trigger {
        let (a, b) = (self.condition.clone(), other.condition.clone());
        Trigger::on_loop(self.event_loop, move || a() || b())
    }

    pub fn negate(&self) -> Trigger {
        let a = self.condition.clone();
        Trigger::on_loop(self.event_loop, move || !a())
    }

    /// Debounce against the wall clock.
    pub fn debounce(&self, period: Duration, kind: DebounceType) -> Trigger {
        self.debounce_with_clock(period, kind, MonotonicClock::shared())
    }

    pub fn debounce_with_clock(
        &self,
        period: Duration,
        kind: DebounceType,
        clock: SharedClock,
    ) -> Trigger {
        let raw = self.condition.clone();
        let debouncer = RefCell::new(Debouncer::new(period, kind, clock));
        Trigger::on_loop(self.event_loop, move || debouncer.borrow_mut().calculate(raw()))
    }

    /// Register a binding of `kind` from this trigger to `command`.
    pub fn bind(
        &self,
        scheduler: &mut Scheduler,
        kind: BindingKind,
        command: CommandId,
        initial: InitialState,
    ) -> &Self {
        let binding = Binding::new(self.condition.clone(), kind, command, initial);
        tracing::debug!(
            ?kind,
            %command,
            ?initial,
            event_loop = %self.event_loop,
            "trigger binding registered"
        );
        scheduler.add_binding(self.event_loop, binding);
        self
    }

    pub fn on_true(&self, scheduler: &mut Scheduler, command: CommandId) -> &Self {
        self.bind(scheduler, BindingKind::OnTrue, command, InitialState::default())
    }

    pub fn on_false(&self, scheduler: &mut Scheduler, command: CommandId) -> &Self {
        self.bind(scheduler, BindingKind::OnFalse, command, InitialState::default())
    }

    pub fn on_change(&self, scheduler: &mut Scheduler, command: CommandId) -> &Self {
        self.bind(scheduler, BindingKind::OnChange, command, InitialState::default())
    }

    pub fn while_true(&self, scheduler: &mut Scheduler, command: CommandId) -> &Self {
        self.bind(scheduler, BindingKind::WhileTrue, command, InitialState::default())
    }

    pub fn while_false(&self, scheduler: &mut Scheduler, command: CommandId) -> &Self {
        self.bind(scheduler, BindingKind::WhileFalse, command, InitialState::default())
    }

    pub fn toggle_on_true(&self, scheduler: &mut Scheduler, command: CommandId) -> &Self {
        self.bind(scheduler, BindingKind::ToggleOnTrue, command, InitialState::default())
    }

    pub fn toggle_on_false(&self, scheduler: &mut Scheduler, command: CommandId) -> &Self {
        self.bind(scheduler, BindingKind::ToggleOnFalse, command, InitialState::default())
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("event_loop", &self.event_loop)
            .finish_non_exhaustive()
    }
}

impl BitAnd for Trigger {
    type Output = Trigger;

    fn bitand(self, rhs: Trigger) -> Trigger {
        self.and(&rhs)
    }
}

impl BitOr for Trigger {
    type Output = Trigger;

    fn bitor(self, rhs: Trigger) -> Trigger {
        self.or(&rhs)
    }
}

impl Not for Trigger {
    type Output = Trigger;

    fn not(self) -> Trigger {
        self.negate()
    }
}
