// tests/groups.rs
mod common;
use crate::common::{Call, Journal, ProbeCommand, init_tracing, register_probe, tick_n};

use robocmd::scheduler::Scheduler;
use robocmd::types::InterruptionBehavior;

#[test]
fn sequence_runs_members_one_after_another() {
    init_tracing();
    let mut scheduler = Scheduler::new();
    let journal = Journal::new();
    let (x, px) = register_probe(&mut scheduler, ProbeCommand::new("x").finish_after(1).journal(&journal));
    let (y, py) = register_probe(&mut scheduler, ProbeCommand::new("y").finish_after(2).journal(&journal));
    let (z, pz) = register_probe(&mut scheduler, ProbeCommand::new("z").finish_after(1).journal(&journal));
    let group = scheduler.sequence(&[x, y, z]).unwrap();

    scheduler.schedule(group).unwrap();
    assert_eq!(px.initialized(), 1);
    assert!(py.calls().is_empty());
    assert!(pz.calls().is_empty());

    scheduler.tick();
    assert_eq!(px.ends(), vec![false]);
    assert_eq!(py.initialized(), 1);
    assert!(pz.calls().is_empty());

    tick_n(&mut scheduler, 3);
    assert!(!scheduler.is_scheduled(group));
    assert_eq!(
        journal.lines(),
        [
            "x:init",
            "x:exec",
            "x:end(false)",
            "y:init",
            "y:exec",
            "y:exec",
            "y:end(false)",
            "z:init",
            "z:exec",
            "z:end(false)",
        ]
    );
}

#[test]
fn interrupted_sequence_ends_only_the_current_member() {
    let mut scheduler = Scheduler::new();
    let (x, px) = register_probe(&mut scheduler, ProbeCommand::new("x").finish_after(1));
    let (y, py) = register_probe(&mut scheduler, ProbeCommand::new("y"));
    let (z, pz) = register_probe(&mut scheduler, ProbeCommand::new("z"));
    let group = scheduler.sequence(&[x, y, z]).unwrap();

    scheduler.schedule(group).unwrap();
    tick_n(&mut scheduler, 2);
    scheduler.cancel(group);

    assert_eq!(px.ends(), vec![false]);
    assert_eq!(py.ends(), vec![true]);
    assert!(pz.calls().is_empty());
}

#[test]
fn sequence_owns_every_member_requirement_from_the_start() {
    let mut scheduler = Scheduler::new();
    let r1 = scheduler.add_resource("r1");
    let r2 = scheduler.add_resource("r2");
    let (x, _) = register_probe(&mut scheduler, ProbeCommand::new("x").requires([r1]).finish_after(1));
    let (y, _) = register_probe(&mut scheduler, ProbeCommand::new("y").requires([r2]).finish_after(1));

    let group = scheduler.sequence(&[x, y]).unwrap();
    scheduler.schedule(group).unwrap();
    assert_eq!(scheduler.requiring(r1), Some(group));
    assert_eq!(scheduler.requiring(r2), Some(group));

    // Still held after the first member is done.
    scheduler.tick();
    assert_eq!(scheduler.requiring(r1), Some(group));
}

#[test]
fn empty_sequence_finishes_on_first_tick() {
    let mut scheduler = Scheduler::new();
    let group = scheduler.sequence(&[]).unwrap();

    scheduler.schedule(group).unwrap();
    assert!(scheduler.is_scheduled(group));
    scheduler.tick();
    assert!(!scheduler.is_scheduled(group));
}

#[test]
fn parallel_finishes_when_every_member_has_finished() {
    let mut scheduler = Scheduler::new();
    let (x, px) = register_probe(&mut scheduler, ProbeCommand::new("x").finish_after(1));
    let (y, py) = register_probe(&mut scheduler, ProbeCommand::new("y").finish_after(3));
    let group = scheduler.parallel(&[x, y]).unwrap();

    scheduler.schedule(group).unwrap();
    assert_eq!(px.initialized(), 1);
    assert_eq!(py.initialized(), 1);

    tick_n(&mut scheduler, 2);
    assert!(scheduler.is_scheduled(group));
    assert_eq!(px.ends(), vec![false]);
    assert_eq!(px.executed(), 1);

    scheduler.tick();
    assert!(!scheduler.is_scheduled(group));
    assert_eq!(py.ends(), vec![false]);
    assert_eq!(px.ended(), 1);
}

#[test]
fn interrupted_parallel_ends_running_members_only() {
    let mut scheduler = Scheduler::new();
    let (x, px) = register_probe(&mut scheduler, ProbeCommand::new("x").finish_after(1));
    let (y, py) = register_probe(&mut scheduler, ProbeCommand::new("y"));
    let group = scheduler.parallel(&[x, y]).unwrap();

    scheduler.schedule(group).unwrap();
    scheduler.tick();
    scheduler.cancel(group);

    assert_eq!(px.ends(), vec![false]);
    assert_eq!(py.ends(), vec![true]);
}

#[test]
fn race_ends_winner_naturally_and_others_interrupted() {
    let mut scheduler = Scheduler::new();
    let (x, px) = register_probe(&mut scheduler, ProbeCommand::new("x").finish_after(2));
    let (y, py) = register_probe(&mut scheduler, ProbeCommand::new("y"));
    let group = scheduler.race(&[x, y]).unwrap();

    scheduler.schedule(group).unwrap();
    scheduler.tick();
    assert!(scheduler.is_scheduled(group));
    assert!(px.ends().is_empty());

    scheduler.tick();
    assert!(!scheduler.is_scheduled(group));
    assert_eq!(px.ends(), vec![false]);
    assert_eq!(py.ends(), vec![true]);
}

#[test]
fn race_interrupted_before_any_finish_interrupts_everyone() {
    let mut scheduler = Scheduler::new();
    let (x, px) = register_probe(&mut scheduler, ProbeCommand::new("x"));
    let (y, py) = register_probe(&mut scheduler, ProbeCommand::new("y"));
    let group = scheduler.race(&[x, y]).unwrap();

    scheduler.schedule(group).unwrap();
    scheduler.tick();
    scheduler.cancel(group);

    assert_eq!(px.ends(), vec![true]);
    assert_eq!(py.ends(), vec![true]);
}

#[test]
fn deadline_group_ends_with_its_deadline() {
    let mut scheduler = Scheduler::new();
    let (d, pd) = register_probe(&mut scheduler, ProbeCommand::new("d").finish_after(3));
    let (early, pe) = register_probe(&mut scheduler, ProbeCommand::new("early").finish_after(1));
    let (long, pl) = register_probe(&mut scheduler, ProbeCommand::new("long"));
    let group = scheduler.deadline(d, &[early, long]).unwrap();

    scheduler.schedule(group).unwrap();
    scheduler.tick();
    assert_eq!(pe.ends(), vec![false]);
    assert!(scheduler.is_scheduled(group));

    tick_n(&mut scheduler, 2);
    assert!(!scheduler.is_scheduled(group));
    assert_eq!(pd.ends(), vec![false]);
    assert_eq!(pl.ends(), vec![true]);
    assert_eq!(pe.ended(), 1);
}

#[test]
fn deadline_listed_among_members_is_added_once() {
    let mut scheduler = Scheduler::new();
    let (d, pd) = register_probe(&mut scheduler, ProbeCommand::new("d").finish_after(1));
    let (o, po) = register_probe(&mut scheduler, ProbeCommand::new("o"));
    let group = scheduler.deadline(d, &[o, d]).unwrap();

    scheduler.schedule(group).unwrap();
    scheduler.tick();
    assert_eq!(pd.calls(), vec![Call::Initialize, Call::Execute, Call::End { interrupted: false }]);
    assert_eq!(po.ends(), vec![true]);
}

#[test]
fn group_metadata_aggregates_members() {
    let mut scheduler = Scheduler::new();
    let r1 = scheduler.add_resource("r1");
    let r2 = scheduler.add_resource("r2");
    let (a, _) = register_probe(
        &mut scheduler,
        ProbeCommand::new("a").requires([r1]).runs_when_disabled(true).cancel_incoming(),
    );
    let (b, _) = register_probe(&mut scheduler, ProbeCommand::new("b").requires([r2]));
    let group = scheduler.parallel(&[a, b]).unwrap();

    let info = scheduler.info(group).unwrap();
    assert!(info.has_requirement(r1) && info.has_requirement(r2));
    assert!(!info.runs_when_disabled);
    assert_eq!(info.interruption_behavior, InterruptionBehavior::CancelSelf);

    let (c, _) = register_probe(&mut scheduler, ProbeCommand::new("c").cancel_incoming());
    let (d, _) = register_probe(&mut scheduler, ProbeCommand::new("d").cancel_incoming());
    let all_incoming = scheduler.race(&[c, d]).unwrap();
    assert_eq!(
        scheduler.info(all_incoming).unwrap().interruption_behavior,
        InterruptionBehavior::CancelIncoming
    );
}

#[test]
fn groups_can_run_again_after_finishing() {
    let mut scheduler = Scheduler::new();
    let (x, px) = register_probe(&mut scheduler, ProbeCommand::new("x").finish_after(1));
    let (y, py) = register_probe(&mut scheduler, ProbeCommand::new("y").finish_after(1));
    let group = scheduler.sequence(&[x, y]).unwrap();

    for _ in 0..2 {
        scheduler.schedule(group).unwrap();
        tick_n(&mut scheduler, 2);
        assert!(!scheduler.is_scheduled(group));
    }
    assert_eq!(px.ends(), vec![false, false]);
    assert_eq!(py.ends(), vec![false, false]);
}

#[test]
fn nested_groups_compose() {
    let mut scheduler = Scheduler::new();
    let journal = Journal::new();
    let (a, _) = register_probe(&mut scheduler, ProbeCommand::new("a").finish_after(1).journal(&journal));
    let (b, _) = register_probe(&mut scheduler, ProbeCommand::new("b").finish_after(2).journal(&journal));
    let (c, _) = register_probe(&mut scheduler, ProbeCommand::new("c").finish_after(1).journal(&journal));
    let both = scheduler.parallel(&[a, b]).unwrap();
    let all = scheduler.sequence(&[both, c]).unwrap();

    scheduler.schedule(all).unwrap();
    tick_n(&mut scheduler, 3);
    assert!(!scheduler.is_scheduled(all));

    let lines = journal.lines();
    let pos = |l: &str| lines.iter().position(|x| x == l).unwrap();
    assert!(pos("b:end(false)") < pos("c:init"));
    assert!(pos("a:end(false)") < pos("b:end(false)"));
}
