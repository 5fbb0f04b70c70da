// tests/config_loading.rs
mod common;
use crate::common::builders::{CommandConfigBuilder, GroupConfigBuilder, RoutineBuilder};

use std::io::Write;

use robocmd::config::{
    BindingWhen, CommandKind, GroupKind, RoutineFile, load_and_validate, parse_str,
    validate_routine,
};
use robocmd::errors::RobocmdError;
use robocmd::types::{DebounceType, InitialState, InterruptionBehavior};
use tempfile::NamedTempFile;

const ROUTINE: &str = r#"
[config]
period_ms = 10
ticks = 30
start = ["auto"]
disabled = [[0, 2]]

[resource.drivetrain]
default = "idle"

[resource.arm]

[command.idle]
kind = "run"
requires = ["drivetrain"]

[command.drive]
kind = "ticks"
ticks = 5
requires = ["drivetrain"]

[command.lift]
kind = "wait"
ms = 100
requires = ["arm"]
interrupt = "cancel_incoming"

[command.announce]
kind = "print"
message = "auto done"

[command.hold]
kind = "wait_until"
signal = "button"
runs_when_disabled = true

[group.score]
kind = "parallel"
members = ["drive", "lift"]

[group.auto]
kind = "sequence"
members = ["score", "announce"]
timeout_ms = 2000

[signal.button]
high = [[10, 15]]
debounce_ms = 40
debounce = "both"

[[binding]]
signal = "button"
when = "while_true"
command = "hold"
initial = "false"
negate = true
"#;

fn write_routine(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_a_full_routine_file() {
    let file = write_routine(ROUTINE);
    let routine = load_and_validate(file.path()).unwrap();

    assert_eq!(routine.config.period_ms, 10);
    assert_eq!(routine.config.ticks, 30);
    assert_eq!(routine.config.start, ["auto"]);
    assert!(routine.config.is_disabled_at(1));
    assert!(!routine.config.is_disabled_at(2));

    assert_eq!(routine.resource["drivetrain"].default.as_deref(), Some("idle"));
    assert_eq!(routine.resource["arm"].default, None);

    let lift = &routine.command["lift"];
    assert_eq!(lift.kind, CommandKind::Wait);
    assert_eq!(lift.ms, Some(100));
    assert_eq!(lift.interrupt, Some(InterruptionBehavior::CancelIncoming));
    assert_eq!(routine.command["hold"].runs_when_disabled, Some(true));

    assert_eq!(routine.group["auto"].kind, GroupKind::Sequence);
    assert_eq!(routine.group["auto"].timeout_ms, Some(2000));
    // Nested groups come first.
    assert_eq!(routine.group_order, ["score", "auto"]);

    let button = &routine.signal["button"];
    assert!(button.is_high_at(10) && !button.is_high_at(15));
    assert_eq!(button.debounce, DebounceType::Both);

    let binding = &routine.binding[0];
    assert_eq!(binding.when, BindingWhen::WhileTrue);
    assert_eq!(binding.initial, InitialState::False);
    assert!(binding.negate);
    assert!(routine.is_defined("score") && !routine.is_defined("button"));
}

#[test]
fn defaults_fill_in_missing_sections() {
    let raw = parse_str("[command.only]\nkind = \"instant\"\n").unwrap();
    let routine = RoutineFile::try_from(raw).unwrap();

    assert_eq!(routine.config.period_ms, 20);
    assert_eq!(routine.config.ticks, 50);
    assert!(routine.config.start.is_empty());
    assert!(routine.binding.is_empty());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, RobocmdError::IoError(_)));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_routine("[command.a\nkind = ");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, RobocmdError::TomlError(_)));
}

#[test]
fn unknown_kind_is_rejected_by_the_parser() {
    let err = parse_str("[command.a]\nkind = \"teleport\"\n").unwrap_err();
    assert!(matches!(err, RobocmdError::TomlError(_)));
}

fn config_error(builder: RoutineBuilder) -> String {
    match validate_routine(&builder.raw()) {
        Err(RobocmdError::ConfigError(msg)) => msg,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn empty_routine_is_rejected() {
    let msg = config_error(RoutineBuilder::new());
    assert!(msg.contains("at least one [command.<name>]"));
}

#[test]
fn zero_period_is_rejected() {
    let msg = config_error(
        RoutineBuilder::new()
            .period_ms(0)
            .command("a", CommandConfigBuilder::run().build()),
    );
    assert!(msg.contains("period_ms must be >= 1"));
}

#[test]
fn unknown_references_are_rejected() {
    let msg = config_error(
        RoutineBuilder::new().command("a", CommandConfigBuilder::run().requires("arm").build()),
    );
    assert!(msg.contains("requires unknown resource 'arm'"));

    let msg = config_error(
        RoutineBuilder::new()
            .command("a", CommandConfigBuilder::run().build())
            .group(
                "g",
                GroupConfigBuilder::new(GroupKind::Sequence).member("a").member("b").build(),
            ),
    );
    assert!(msg.contains("unknown member 'b'"));

    let msg = config_error(
        RoutineBuilder::new()
            .command("a", CommandConfigBuilder::run().build())
            .binding("button", BindingWhen::OnTrue, "a"),
    );
    assert!(msg.contains("unknown signal 'button'"));

    let msg = config_error(
        RoutineBuilder::new()
            .command("a", CommandConfigBuilder::run().build())
            .start("b"),
    );
    assert!(msg.contains("unknown command 'b'"));
}

#[test]
fn kind_specific_fields_are_required() {
    let msg = config_error(
        RoutineBuilder::new().command("w", CommandConfigBuilder::new(CommandKind::Wait).build()),
    );
    assert!(msg.contains("missing `ms`"));

    let msg = config_error(
        RoutineBuilder::new()
            .command("a", CommandConfigBuilder::run().build())
            .group("d", GroupConfigBuilder::new(GroupKind::Deadline).member("a").build()),
    );
    assert!(msg.contains("missing `deadline`"));
}

#[test]
fn a_command_can_only_be_composed_once() {
    let msg = config_error(
        RoutineBuilder::new()
            .command("a", CommandConfigBuilder::run().build())
            .group("g1", GroupConfigBuilder::new(GroupKind::Sequence).member("a").build())
            .group("g2", GroupConfigBuilder::new(GroupKind::Race).member("a").build()),
    );
    assert!(msg.contains("is a member of both 'g1' and 'g2'"));

    let msg = config_error(
        RoutineBuilder::new()
            .command("a", CommandConfigBuilder::run().build())
            .group("g", GroupConfigBuilder::new(GroupKind::Sequence).member("a").build())
            .start("a"),
    );
    assert!(msg.contains("cannot be scheduled on its own"));
}

#[test]
fn duplicate_members_and_self_containment_are_rejected() {
    let msg = config_error(
        RoutineBuilder::new()
            .command("a", CommandConfigBuilder::run().build())
            .group(
                "g",
                GroupConfigBuilder::new(GroupKind::Sequence).member("a").member("a").build(),
            ),
    );
    assert!(msg.contains("more than once"));

    let msg = config_error(
        RoutineBuilder::new()
            .command("a", CommandConfigBuilder::run().build())
            .group("g", GroupConfigBuilder::new(GroupKind::Sequence).member("g").build()),
    );
    assert!(msg.contains("cannot contain itself"));
}

#[test]
fn group_cycles_are_detected() {
    let raw = RoutineBuilder::new()
        .command("a", CommandConfigBuilder::run().build())
        .group("g1", GroupConfigBuilder::new(GroupKind::Sequence).member("g2").build())
        .group("g2", GroupConfigBuilder::new(GroupKind::Sequence).member("g1").build())
        .raw();

    let err = RoutineFile::try_from(raw).unwrap_err();
    assert!(matches!(err, RobocmdError::GroupCycle(_)));
}

#[test]
fn builder_produces_a_valid_routine() {
    let routine = RoutineBuilder::new()
        .resource_with_default("drive", "idle")
        .command("idle", CommandConfigBuilder::run().requires("drive").build())
        .command("step", CommandConfigBuilder::ticks(2).requires("drive").build())
        .group("twice", GroupConfigBuilder::new(GroupKind::Sequence).member("step").repeat().build())
        .signal("go", &[[3, 5]])
        .binding("go", BindingWhen::OnTrue, "twice")
        .build();

    assert_eq!(routine.group_order, ["twice"]);
    assert!(routine.group["twice"].repeat);
}
