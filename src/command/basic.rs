// src/command/basic.rs

//! Closure-driven leaf commands.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::info;

use crate::clock::{SharedClock, Timer};
use crate::command::{Command, ResourceId};
use crate::scheduler::Scheduler;

type Action = Box<dyn FnMut()>;
type EndAction = Box<dyn FnMut(bool)>;
type Condition = Box<dyn Fn() -> bool>;

/// A command whose four lifecycle steps are supplied as closures.
pub struct FunctionalCommand {
    name: String,
    on_init: Action,
    on_execute: Action,
    on_end: EndAction,
    is_finished: Condition,
    requirements: BTreeSet<ResourceId>,
}

impl FunctionalCommand {
    pub fn new(
        on_init: impl FnMut() + 'static,
        on_execute: impl FnMut() + 'static,
        on_end: impl FnMut(bool) + 'static,
        is_finished: impl Fn() -> bool + 'static,
        requirements: impl IntoIterator<Item = ResourceId>,
    ) -> Self {
        Self {
            name: "FunctionalCommand".to_string(),
            on_init: Box::new(on_init),
            on_execute: Box::new(on_execute),
            on_end: Box::new(on_end),
            is_finished: Box::new(is_finished),
            requirements: requirements.into_iter().collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Command for FunctionalCommand {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.requirements.clone()
    }

    fn initialize(&mut self, _scheduler: &mut Scheduler) {
        (self.on_init)();
    }

    fn execute(&mut self, _scheduler: &mut Scheduler) {
        (self.on_execute)();
    }

    fn is_finished(&self) -> bool {
        (self.is_finished)()
    }

    fn end(&mut self, interrupted: bool, _scheduler: &mut Scheduler) {
        (self.on_end)(interrupted);
    }
}

/// Runs an action once on initialize and finishes immediately.
pub struct InstantCommand {
    name: String,
    action: Action,
    requirements: BTreeSet<ResourceId>,
}

impl InstantCommand {
    pub fn new(
        action: impl FnMut() + 'static,
        requirements: impl IntoIterator<Item = ResourceId>,
    ) -> Self {
        Self {
            name: "InstantCommand".to_string(),
            action: Box::new(action),
            requirements: requirements.into_iter().collect(),
        }
    }

    /// An instant command that does nothing.
    pub fn noop() -> Self {
        Self::new(|| {}, []).named("Noop")
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Command for InstantCommand {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.requirements.clone()
    }

    fn initialize(&mut self, _scheduler: &mut Scheduler) {
        (self.action)();
    }

    fn is_finished(&self) -> bool {
        true
    }
}

/// Runs an action every tick and never finishes on its own.
pub struct RunCommand {
    name: String,
    action: Action,
    requirements: BTreeSet<ResourceId>,
}

impl RunCommand {
    pub fn new(
        action: impl FnMut() + 'static,
        requirements: impl IntoIterator<Item = ResourceId>,
    ) -> Self {
        Self {
            name: "RunCommand".to_string(),
            action: Box::new(action),
            requirements: requirements.into_iter().collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Command for RunCommand {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.requirements.clone()
    }

    fn execute(&mut self, _scheduler: &mut Scheduler) {
        (self.action)();
    }
}

/// Runs one action on start and another on end; never finishes on its own.
pub struct StartEndCommand {
    name: String,
    on_start: Action,
    on_end: Action,
    requirements: BTreeSet<ResourceId>,
}

impl StartEndCommand {
    pub fn new(
        on_start: impl FnMut() + 'static,
        on_end: impl FnMut() + 'static,
        requirements: impl IntoIterator<Item = ResourceId>,
    ) -> Self {
        Self {
            name: "StartEndCommand".to_string(),
            on_start: Box::new(on_start),
            on_end: Box::new(on_end),
            requirements: requirements.into_iter().collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Command for StartEndCommand {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.requirements.clone()
    }

    fn initialize(&mut self, _scheduler: &mut Scheduler) {
        (self.on_start)();
    }

    fn end(&mut self, _interrupted: bool, _scheduler: &mut Scheduler) {
        (self.on_end)();
    }
}

/// Does nothing and finishes once `duration` has elapsed.
pub struct WaitCommand {
    name: String,
    duration: Duration,
    timer: Timer,
}

impl WaitCommand {
    pub fn new(duration: Duration, clock: SharedClock) -> Self {
        Self {
            name: format!("WaitCommand: {duration:?}"),
            duration,
            timer: Timer::new(clock),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Command for WaitCommand {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn initialize(&mut self, _scheduler: &mut Scheduler) {
        self.timer.restart();
    }

    fn is_finished(&self) -> bool {
        self.timer.has_elapsed(self.duration)
    }

    fn end(&mut self, _interrupted: bool, _scheduler: &mut Scheduler) {
        self.timer.stop();
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }
}

/// Does nothing and finishes once the condition becomes true.
pub struct WaitUntilCommand {
    name: String,
    condition: Condition,
}

impl WaitUntilCommand {
    pub fn new(condition: impl Fn() -> bool + 'static) -> Self {
        Self {
            name: "WaitUntilCommand".to_string(),
            condition: Box::new(condition),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Command for WaitUntilCommand {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_finished(&self) -> bool {
        (self.condition)()
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }
}

/// Prints a message on initialize and finishes immediately.
pub struct PrintCommand {
    message: String,
}

impl PrintCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Command for PrintCommand {
    fn name(&self) -> String {
        format!("Print: {}", self.message)
    }

    fn initialize(&mut self, _scheduler: &mut Scheduler) {
        info!(message = %self.message, "print command");
        println!("{}", self.message);
    }

    fn is_finished(&self) -> bool {
        true
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }
}
