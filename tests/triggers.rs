// tests/triggers.rs
mod common;
use crate::common::{ProbeCommand, init_tracing, manual_scheduler, register_probe};

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use robocmd::command::Command;
use robocmd::errors::RobocmdError;
use robocmd::scheduler::Scheduler;
use robocmd::trigger::{BindingKind, Trigger};
use robocmd::types::{DebounceType, InitialState};

/// A trigger over a flag the test flips by hand.
fn switch() -> (Trigger, Rc<Cell<bool>>) {
    let flag = Rc::new(Cell::new(false));
    let f = flag.clone();
    (Trigger::new(move || f.get()), flag)
}

#[test]
fn on_true_schedules_on_rising_edge_and_runs_same_tick() {
    init_tracing();
    let mut scheduler = Scheduler::new();
    let (trigger, flag) = switch();
    let (a, pa) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    trigger.on_true(&mut scheduler, a);

    scheduler.tick();
    assert!(!scheduler.is_scheduled(a));

    flag.set(true);
    scheduler.tick();
    assert!(scheduler.is_scheduled(a));
    assert_eq!(pa.initialized(), 1);
    assert_eq!(pa.executed(), 1);

    // Staying high is not another edge; falling does nothing for on_true.
    scheduler.tick();
    flag.set(false);
    scheduler.tick();
    assert_eq!(pa.initialized(), 1);
    assert!(scheduler.is_scheduled(a));
}

#[test]
fn on_false_and_on_change() {
    let mut scheduler = Scheduler::new();
    let (trigger, flag) = switch();
    let (f, pf) = register_probe(&mut scheduler, ProbeCommand::new("f").finish_after(1));
    let (c, pc) = register_probe(&mut scheduler, ProbeCommand::new("c").finish_after(1));
    trigger.on_false(&mut scheduler, f).on_change(&mut scheduler, c);
    assert_eq!(scheduler.binding_count(), 2);

    flag.set(true);
    scheduler.tick();
    assert_eq!(pf.initialized(), 0);
    assert_eq!(pc.initialized(), 1);

    flag.set(false);
    scheduler.tick();
    assert_eq!(pf.initialized(), 1);
    assert_eq!(pc.initialized(), 2);
}

#[test]
fn while_true_cancels_on_falling_edge() {
    let mut scheduler = Scheduler::new();
    let (trigger, flag) = switch();
    let (a, pa) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    trigger.while_true(&mut scheduler, a);

    flag.set(true);
    scheduler.tick();
    scheduler.tick();
    assert!(scheduler.is_scheduled(a));

    flag.set(false);
    scheduler.tick();
    assert!(!scheduler.is_scheduled(a));
    assert_eq!(pa.ends(), vec![true]);
    assert_eq!(pa.executed(), 2);
}

#[test]
fn while_false_runs_while_low() {
    let mut scheduler = Scheduler::new();
    let flag = Rc::new(Cell::new(true));
    let f = flag.clone();
    let trigger = Trigger::new(move || f.get());
    let (a, _) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    trigger.while_false(&mut scheduler, a);

    flag.set(false);
    scheduler.tick();
    assert!(scheduler.is_scheduled(a));

    flag.set(true);
    scheduler.tick();
    assert!(!scheduler.is_scheduled(a));
}

#[test]
fn toggles_flip_on_each_press() {
    let mut scheduler = Scheduler::new();
    let (trigger, flag) = switch();
    let (a, pa) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    trigger.toggle_on_true(&mut scheduler, a);

    let press = |scheduler: &mut Scheduler| {
        flag.set(true);
        scheduler.tick();
        flag.set(false);
        scheduler.tick();
    };

    press(&mut scheduler);
    assert!(scheduler.is_scheduled(a));
    press(&mut scheduler);
    assert!(!scheduler.is_scheduled(a));
    assert_eq!(pa.ends(), vec![true]);
    press(&mut scheduler);
    assert!(scheduler.is_scheduled(a));
}

#[test]
fn toggle_on_false_acts_on_release() {
    let mut scheduler = Scheduler::new();
    let (trigger, flag) = switch();
    let (a, _) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    trigger.toggle_on_false(&mut scheduler, a);

    flag.set(true);
    scheduler.tick();
    assert!(!scheduler.is_scheduled(a));
    flag.set(false);
    scheduler.tick();
    assert!(scheduler.is_scheduled(a));
}

#[test]
fn initial_state_decides_the_first_poll() {
    let mut scheduler = Scheduler::new();
    let high = Trigger::new(|| true);
    let (from_false, pf) = register_probe(&mut scheduler, ProbeCommand::new("from_false"));
    let (from_cond, pc) = register_probe(&mut scheduler, ProbeCommand::new("from_cond"));
    let (from_neg, pn) = register_probe(&mut scheduler, ProbeCommand::new("from_neg"));
    let (from_true, pt) = register_probe(&mut scheduler, ProbeCommand::new("from_true"));

    high.bind(&mut scheduler, BindingKind::OnTrue, from_false, InitialState::False)
        .bind(&mut scheduler, BindingKind::OnTrue, from_cond, InitialState::Condition)
        .bind(&mut scheduler, BindingKind::OnTrue, from_neg, InitialState::NegCondition)
        .bind(&mut scheduler, BindingKind::OnTrue, from_true, InitialState::True);

    scheduler.tick();
    assert_eq!(pf.initialized(), 1);
    assert_eq!(pc.initialized(), 0);
    assert_eq!(pn.initialized(), 1);
    assert_eq!(pt.initialized(), 0);
}

#[test]
fn bindings_on_one_trigger_track_edges_independently() {
    let mut scheduler = Scheduler::new();
    let (trigger, flag) = switch();
    let (a, pa) = register_probe(&mut scheduler, ProbeCommand::new("a").finish_after(1));
    trigger.on_true(&mut scheduler, a);

    flag.set(true);
    scheduler.tick();

    // Bound while already high: no edge for the new binding.
    let (b, pb) = register_probe(&mut scheduler, ProbeCommand::new("b"));
    trigger.on_true(&mut scheduler, b);
    scheduler.tick();
    assert_eq!(pa.initialized(), 1);
    assert!(pb.calls().is_empty());

    flag.set(false);
    scheduler.tick();
    flag.set(true);
    scheduler.tick();
    assert_eq!(pa.initialized(), 2);
    assert_eq!(pb.initialized(), 1);
}

#[test]
fn composition_operators() {
    let (a, fa) = switch();
    let (b, fb) = switch();
    let both = a.clone() & b.clone();
    let either = a.or(&b);
    let not_a = !a.clone();

    assert!(!both.get() && !either.get() && not_a.get());
    fa.set(true);
    assert!(!both.get());
    assert!(either.get());
    assert!(!not_a.get());
    fb.set(true);
    assert!(both.get());
    assert!(!(a | b).negate().get());
}

#[test]
fn debounced_trigger_waits_for_stable_input() {
    let (mut scheduler, clock) = manual_scheduler();
    let (raw, flag) = switch();
    let trigger = raw.debounce_with_clock(Duration::from_millis(100), DebounceType::Rising, clock.clone());
    let (a, pa) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    trigger.on_true(&mut scheduler, a);

    flag.set(true);
    scheduler.tick();
    clock.advance(Duration::from_millis(50));
    scheduler.tick();
    assert!(pa.calls().is_empty());

    // A glitch back to low restarts the wait.
    flag.set(false);
    scheduler.tick();
    flag.set(true);
    clock.advance(Duration::from_millis(60));
    scheduler.tick();
    assert!(pa.calls().is_empty());

    clock.advance(Duration::from_millis(100));
    scheduler.tick();
    assert_eq!(pa.initialized(), 1);
}

#[test]
fn failing_binding_target_is_logged_not_fatal() {
    let mut scheduler = Scheduler::new();
    let (trigger, flag) = switch();
    let (a, pa) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    let _group = scheduler.sequence(&[a]).unwrap();
    trigger.on_true(&mut scheduler, a);

    flag.set(true);
    scheduler.tick();
    assert!(pa.calls().is_empty());
    assert_eq!(scheduler.tick_count(), 1);
}

#[test]
fn clearing_bindings_stops_polling() {
    let mut scheduler = Scheduler::new();
    let polls = Rc::new(Cell::new(0));
    let p = polls.clone();
    let trigger = Trigger::new(move || {
        p.set(p.get() + 1);
        false
    });
    let (a, _) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    trigger.on_true(&mut scheduler, a);
    let after_bind = polls.get();

    scheduler.tick();
    assert_eq!(polls.get(), after_bind + 1);

    scheduler.clear_bindings();
    assert_eq!(scheduler.binding_count(), 0);
    scheduler.tick();
    assert_eq!(polls.get(), after_bind + 1);
}

#[test]
fn only_the_active_event_loop_is_polled() {
    let mut scheduler = Scheduler::new();
    let teleop = scheduler.new_event_loop();
    assert_eq!(scheduler.active_event_loop(), scheduler.default_event_loop());

    let flag = Rc::new(Cell::new(false));
    let (f1, f2) = (flag.clone(), flag.clone());
    let auto_button = Trigger::new(move || f1.get());
    let teleop_button = Trigger::on_loop(teleop, move || f2.get());
    let (a, _) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    let (b, _) = register_probe(&mut scheduler, ProbeCommand::new("b"));
    auto_button.on_true(&mut scheduler, a);
    teleop_button.on_true(&mut scheduler, b);
    assert_eq!(scheduler.event_loop_len(scheduler.default_event_loop()), 1);
    assert_eq!(scheduler.event_loop_len(teleop), 1);
    assert_eq!(scheduler.binding_count(), 2);

    flag.set(true);
    scheduler.tick();
    assert!(scheduler.is_scheduled(a));
    assert!(!scheduler.is_scheduled(b));

    // The teleop binding kept its state from bind time, so it sees the edge now.
    scheduler.set_active_event_loop(teleop).unwrap();
    scheduler.tick();
    assert!(scheduler.is_scheduled(b));

    scheduler.clear_event_loop(teleop);
    assert_eq!(scheduler.event_loop_len(teleop), 0);
    assert_eq!(scheduler.binding_count(), 1);
}

#[test]
fn derived_triggers_stay_on_their_loop() {
    let mut scheduler = Scheduler::new();
    let test_mode = scheduler.new_event_loop();
    let base = Trigger::on_loop(test_mode, || true);
    let other = Trigger::new(|| false);

    assert_eq!(base.and(&other).event_loop(), test_mode);
    assert_eq!((!base.clone()).event_loop(), test_mode);
    assert_eq!(
        base.debounce(Duration::from_millis(10), DebounceType::Both).event_loop(),
        test_mode
    );
    assert_eq!(other.or(&base).event_loop(), scheduler.default_event_loop());
}

#[test]
fn unknown_event_loop_is_rejected() {
    let mut other = Scheduler::new();
    let foreign = other.new_event_loop();

    let mut scheduler = Scheduler::new();
    let err = scheduler.set_active_event_loop(foreign).unwrap_err();
    assert!(matches!(err, RobocmdError::UnknownEventLoop(l) if l == foreign));
    assert_eq!(scheduler.active_event_loop(), scheduler.default_event_loop());
}

/// Clears every binding when initialized.
struct ClearBindings;

impl Command for ClearBindings {
    fn initialize(&mut self, scheduler: &mut Scheduler) {
        scheduler.clear_bindings();
    }
}

#[test]
fn clearing_bindings_from_a_binding_action_takes_effect() {
    let mut scheduler = Scheduler::new();
    let (trigger, flag) = switch();
    let clear = scheduler.register(ClearBindings);
    let (a, _) = register_probe(&mut scheduler, ProbeCommand::new("a"));
    trigger.on_true(&mut scheduler, clear);
    trigger.on_true(&mut scheduler, a);

    flag.set(true);
    scheduler.tick();
    assert_eq!(scheduler.binding_count(), 0);
    // Bindings after the one that cleared are not polled either.
    assert!(!scheduler.is_scheduled(a));

    flag.set(false);
    scheduler.tick();
    flag.set(true);
    scheduler.tick();
    assert!(!scheduler.is_scheduled(a));
}
