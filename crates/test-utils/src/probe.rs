#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use robocmd::command::{Command, ResourceId};
use robocmd::scheduler::Scheduler;
use robocmd::types::InterruptionBehavior;

/// One lifecycle call observed by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Initialize,
    Execute,
    End { interrupted: bool },
}

/// Ordered `"<name>:<call>"` lines shared by several probes, for asserting
/// cross-command ordering.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: String) {
        self.0.borrow_mut().push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    calls: RefCell<Vec<Call>>,
    finished: Cell<bool>,
    executes_since_init: Cell<u32>,
}

/// Handle for inspecting and steering a [`ProbeCommand`] after it has been
/// handed to the scheduler.
#[derive(Debug, Clone)]
pub struct Probe(Rc<ProbeState>);

impl Probe {
    pub fn calls(&self) -> Vec<Call> {
        self.0.calls.borrow().clone()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn initialized(&self) -> usize {
        self.count(|c| *c == Call::Initialize)
    }

    pub fn executed(&self) -> usize {
        self.count(|c| *c == Call::Execute)
    }

    /// `interrupted` flags of every `end` call, in order.
    pub fn ends(&self) -> Vec<bool> {
        self.0
            .calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::End { interrupted } => Some(*interrupted),
                _ => None,
            })
            .collect()
    }

    pub fn ended(&self) -> usize {
        self.ends().len()
    }

    /// Make `is_finished` report `finished` from now on.
    pub fn set_finished(&self, finished: bool) {
        self.0.finished.set(finished);
    }

    pub fn reset(&self) {
        self.0.calls.borrow_mut().clear();
    }
}

/// A command that records every lifecycle call.
///
/// It finishes when told to through its [`Probe`], or after a fixed
/// number of executes with [`finish_after`](Self::finish_after).
pub struct ProbeCommand {
    name: String,
    requirements: BTreeSet<ResourceId>,
    runs_when_disabled: bool,
    interruption_behavior: InterruptionBehavior,
    finish_after: Option<u32>,
    journal: Option<Journal>,
    state: Rc<ProbeState>,
}

impl ProbeCommand {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            requirements: BTreeSet::new(),
            runs_when_disabled: false,
            interruption_behavior: InterruptionBehavior::CancelSelf,
            finish_after: None,
            journal: None,
            state: Rc::new(ProbeState::default()),
        }
    }

    pub fn requires(mut self, resources: impl IntoIterator<Item = ResourceId>) -> Self {
        self.requirements.extend(resources);
        self
    }

    pub fn runs_when_disabled(mut self, runs: bool) -> Self {
        self.runs_when_disabled = runs;
        self
    }

    pub fn cancel_incoming(mut self) -> Self {
        self.interruption_behavior = InterruptionBehavior::CancelIncoming;
        self
    }

    /// Finish on the `n`th execute after each initialize.
    pub fn finish_after(mut self, n: u32) -> Self {
        self.finish_after = Some(n);
        self
    }

    pub fn journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    pub fn probe(&self) -> Probe {
        Probe(self.state.clone())
    }

    fn record(&self, call: Call) {
        self.state.calls.borrow_mut().push(call);
        if let Some(journal) = &self.journal {
            let label = match call {
                Call::Initialize => "init".to_string(),
                Call::Execute => "exec".to_string(),
                Call::End { interrupted } => format!("end({interrupted})"),
            };
            journal.push(format!("{}:{label}", self.name));
        }
    }
}

impl Command for ProbeCommand {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn requirements(&self) -> BTreeSet<ResourceId> {
        self.requirements.clone()
    }

    fn initialize(&mut self, _scheduler: &mut Scheduler) {
        self.state.executes_since_init.set(0);
        self.record(Call::Initialize);
    }

    fn execute(&mut self, _scheduler: &mut Scheduler) {
        let n = self.state.executes_since_init.get() + 1;
        self.state.executes_since_init.set(n);
        self.record(Call::Execute);
    }

    fn is_finished(&self) -> bool {
        self.state.finished.get()
            || self
                .finish_after
                .is_some_and(|n| self.state.executes_since_init.get() >= n)
    }

    fn end(&mut self, interrupted: bool, _scheduler: &mut Scheduler) {
        self.record(Call::End { interrupted });
    }

    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.interruption_behavior
    }
}

/// Register a probe and return its id together with its handle.
pub fn register_probe(
    scheduler: &mut Scheduler,
    command: ProbeCommand,
) -> (robocmd::command::CommandId, Probe) {
    let probe = command.probe();
    (scheduler.register(command), probe)
}
