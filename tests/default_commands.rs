// tests/default_commands.rs
mod common;
use crate::common::{Journal, ProbeCommand, init_tracing, register_probe};

use robocmd::errors::RobocmdError;
use robocmd::scheduler::{ScheduleOutcome, Scheduler};

#[test]
fn default_command_arms_at_end_of_first_tick() {
    init_tracing();
    let mut scheduler = Scheduler::new();
    let drive = scheduler.add_resource("drive");
    let (idle, probe) = register_probe(&mut scheduler, ProbeCommand::new("idle").requires([drive]));
    scheduler.set_default_command(drive, idle).unwrap();
    assert_eq!(scheduler.default_command(drive), Some(idle));

    assert!(!scheduler.is_scheduled(idle));
    scheduler.tick();
    assert!(scheduler.is_scheduled(idle));
    assert_eq!(probe.initialized(), 1);
    assert_eq!(probe.executed(), 0);

    scheduler.tick();
    assert_eq!(probe.executed(), 1);
}

#[test]
fn default_command_rearms_after_resource_is_released() {
    let mut scheduler = Scheduler::new();
    let drive = scheduler.add_resource("drive");
    let journal = Journal::new();
    let (idle, pidle) = register_probe(
        &mut scheduler,
        ProbeCommand::new("idle").requires([drive]).journal(&journal),
    );
    let (turn, pturn) = register_probe(
        &mut scheduler,
        ProbeCommand::new("turn").requires([drive]).finish_after(2).journal(&journal),
    );
    scheduler.set_default_command(drive, idle).unwrap();
    scheduler.tick();

    scheduler.schedule(turn).unwrap();
    assert_eq!(pidle.ends(), vec![true]);

    scheduler.tick();
    assert!(scheduler.is_scheduled(turn));
    assert!(!scheduler.is_scheduled(idle));

    // `turn` finishes; `idle` is back before the tick returns.
    scheduler.tick();
    assert_eq!(pturn.ends(), vec![false]);
    assert!(scheduler.is_scheduled(idle));
    assert_eq!(pidle.initialized(), 2);

    assert_eq!(
        journal.lines(),
        [
            "idle:init",
            "idle:end(true)",
            "turn:init",
            "turn:exec",
            "turn:exec",
            "turn:end(false)",
            "idle:init",
        ]
    );
}

#[test]
fn default_command_must_require_its_resource() {
    let mut scheduler = Scheduler::new();
    let drive = scheduler.add_resource("drive");
    let arm = scheduler.add_resource("arm");
    let (lift, _) = register_probe(&mut scheduler, ProbeCommand::new("lift").requires([arm]));

    let err = scheduler.set_default_command(drive, lift).unwrap_err();
    assert!(matches!(
        err,
        RobocmdError::DefaultCommandMissingRequirement { resource, command }
            if resource == drive && command == lift
    ));
    assert_eq!(scheduler.default_command(drive), None);
}

#[test]
fn composed_command_cannot_be_a_default() {
    let mut scheduler = Scheduler::new();
    let drive = scheduler.add_resource("drive");
    let (a, _) = register_probe(&mut scheduler, ProbeCommand::new("a").requires([drive]));
    let _group = scheduler.sequence(&[a]).unwrap();

    let err = scheduler.set_default_command(drive, a).unwrap_err();
    assert!(matches!(err, RobocmdError::ComposedDefaultCommand(id) if id == a));
}

#[test]
fn removed_default_is_not_rearmed() {
    let mut scheduler = Scheduler::new();
    let drive = scheduler.add_resource("drive");
    let (idle, _) = register_probe(&mut scheduler, ProbeCommand::new("idle").requires([drive]));
    scheduler.set_default_command(drive, idle).unwrap();
    scheduler.remove_default_command(drive);

    scheduler.tick();
    assert!(!scheduler.is_scheduled(idle));
    assert_eq!(scheduler.default_command(drive), None);
}

#[test]
fn non_interruptible_default_blocks_other_commands() {
    let mut scheduler = Scheduler::new();
    let drive = scheduler.add_resource("drive");
    let (idle, _) = register_probe(
        &mut scheduler,
        ProbeCommand::new("idle").requires([drive]).cancel_incoming(),
    );
    let (turn, _) = register_probe(&mut scheduler, ProbeCommand::new("turn").requires([drive]));
    scheduler.set_default_command(drive, idle).unwrap();
    scheduler.tick();

    assert_eq!(scheduler.schedule(turn).unwrap(), ScheduleOutcome::Blocked);
    assert_eq!(scheduler.requiring(drive), Some(idle));
}

#[test]
fn default_spanning_two_resources_is_scheduled_once() {
    let mut scheduler = Scheduler::new();
    let left = scheduler.add_resource("left");
    let right = scheduler.add_resource("right");
    let (both, probe) = register_probe(
        &mut scheduler,
        ProbeCommand::new("both").requires([left, right]),
    );
    scheduler.set_default_command(left, both).unwrap();
    scheduler.set_default_command(right, both).unwrap();

    scheduler.tick();
    assert_eq!(probe.initialized(), 1);
    assert_eq!(scheduler.requiring(left), Some(both));
    assert_eq!(scheduler.requiring(right), Some(both));
}

#[test]
fn unregistered_resource_loses_default_and_periodic() {
    let mut scheduler = Scheduler::new();
    let r = scheduler.add_resource("r");
    let other = scheduler.add_resource("other");
    let (idle, pidle) = register_probe(&mut scheduler, ProbeCommand::new("idle").requires([r]));
    scheduler.set_default_command(r, idle).unwrap();
    let periodic_runs = std::rc::Rc::new(std::cell::Cell::new(0));
    let runs = periodic_runs.clone();
    scheduler.set_periodic(r, move || runs.set(runs.get() + 1)).unwrap();

    scheduler.tick();
    assert!(scheduler.is_scheduled(idle));
    assert_eq!(periodic_runs.get(), 1);

    scheduler.unregister_resource(r).unwrap();
    assert!(!scheduler.is_registered(r));
    assert_eq!(scheduler.resources().collect::<Vec<_>>(), [other]);
    assert_eq!(scheduler.default_command(r), None);
    // The running command is left alone.
    assert!(scheduler.is_scheduled(idle));

    scheduler.cancel(idle);
    scheduler.tick();
    assert_eq!(periodic_runs.get(), 1);
    assert!(!scheduler.is_scheduled(idle));
    assert_eq!(pidle.initialized(), 1);

    // Commands may still require it, but it takes no new default until
    // registered again.
    assert!(matches!(
        scheduler.set_default_command(r, idle),
        Err(RobocmdError::UnknownResource(_))
    ));
    assert!(scheduler.unregister_resource(r).is_err());
    scheduler.reregister_resource(r).unwrap();
    scheduler.set_default_command(r, idle).unwrap();
    scheduler.tick();
    assert!(scheduler.is_scheduled(idle));
}
