// src/trigger/binding.rs

//! Edge-detecting links between a condition and a command.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, error};

use crate::command::CommandId;
use crate::scheduler::Scheduler;
use crate::types::InitialState;

/// What a binding does with its command on each edge of the condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Schedule on a rising edge.
    OnTrue,
    /// Schedule on a falling edge.
    OnFalse,
    /// Schedule on any edge.
    OnChange,
    /// Schedule on a rising edge, cancel on a falling edge.
    WhileTrue,
    /// Schedule on a falling edge, cancel on a rising edge.
    WhileFalse,
    /// On a rising edge, cancel if scheduled, otherwise schedule.
    ToggleOnTrue,
    /// On a falling edge, cancel if scheduled, otherwise schedule.
    ToggleOnFalse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Schedule,
    Cancel,
    Toggle,
}

impl BindingKind {
    fn action(self, rising: bool) -> Option<Action> {
        use BindingKind::*;
        match (self, rising) {
            (OnTrue, true) | (OnFalse, false) | (OnChange, _) => Some(Action::Schedule),
            (WhileTrue, true) | (WhileFalse, false) => Some(Action::Schedule),
            (WhileTrue, false) | (WhileFalse, true) => Some(Action::Cancel),
            (ToggleOnTrue, true) | (ToggleOnFalse, false) => Some(Action::Toggle),
            _ => None,
        }
    }
}

pub(crate) type Condition = Rc<dyn Fn() -> bool>;

/// A registered binding, polled once per tick before commands execute.
pub struct Binding {
    condition: Condition,
    last: bool,
    kind: BindingKind,
    target: CommandId,
}

impl Binding {
    pub(crate) fn new(
        condition: Condition,
        kind: BindingKind,
        target: CommandId,
        initial: InitialState,
    ) -> Self {
        let last = match initial {
            InitialState::False => false,
            InitialState::True => true,
            InitialState::Condition => condition(),
            InitialState::NegCondition => !condition(),
        };
        Self {
            condition,
            last,
            kind,
            target,
        }
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn target(&self) -> CommandId {
        self.target
    }

    pub(crate) fn poll(&mut self, scheduler: &mut Scheduler) {
        let current = (self.condition)();
        if current == self.last {
            return;
        }
        self.last = current;

        let Some(action) = self.kind.action(current) else {
            return;
        };
        let target = self.target;
        debug!(kind = ?self.kind, rising = current, %target, ?action, "trigger edge");

        match action {
            Action::Schedule => self.schedule(scheduler),
            Action::Cancel => {
                scheduler.cancel(target);
            }
            Action::Toggle => {
                if scheduler.is_scheduled(target) {
                    scheduler.cancel(target);
                } else {
                    self.schedule(scheduler);
                }
            }
        }
    }

    fn schedule(&self, scheduler: &mut Scheduler) {
        if let Err(err) = scheduler.schedule(self.target) {
            error!(target = %self.target, kind = ?self.kind, error = %err, "trigger binding failed to schedule command");
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_actions() {
        assert_eq!(BindingKind::OnTrue.action(true), Some(Action::Schedule));
        assert_eq!(BindingKind::OnTrue.action(false), None);
        assert_eq!(BindingKind::OnFalse.action(false), Some(Action::Schedule));
        assert_eq!(BindingKind::OnChange.action(false), Some(Action::Schedule));
        assert_eq!(BindingKind::WhileTrue.action(false), Some(Action::Cancel));
        assert_eq!(BindingKind::WhileFalse.action(true), Some(Action::Cancel));
        assert_eq!(BindingKind::ToggleOnTrue.action(true), Some(Action::Toggle));
        assert_eq!(BindingKind::ToggleOnFalse.action(true), None);
    }

    #[test]
    fn initial_state_seeds_last_value() {
        let high: Condition = Rc::new(|| true);
        let id = CommandId(0);
        assert!(!Binding::new(high.clone(), BindingKind::OnTrue, id, InitialState::False).last);
        assert!(Binding::new(high.clone(), BindingKind::OnTrue, id, InitialState::True).last);
        assert!(Binding::new(high.clone(), BindingKind::OnTrue, id, InitialState::Condition).last);
        assert!(!Binding::new(high, BindingKind::OnTrue, id, InitialState::NegCondition).last);
    }
}
