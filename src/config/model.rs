// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::trigger::BindingKind;
use crate::types::{InitialState, InterruptionBehavior};

/// A routine file exactly as deserialized, before validation.
///
/// ```toml
/// [config]
/// period_ms = 20
/// ticks = 100
///
/// [resource.drivetrain]
/// default = "idle"
///
/// [command.idle]
/// kind = "run"
/// requires = ["drivetrain"]
///
/// [command.drive]
/// kind = "ticks"
/// ticks = 10
/// requires = ["drivetrain"]
///
/// [group.auto]
/// kind = "sequence"
/// members = ["drive", "drive_back"]
///
/// [signal.button]
/// high = [[10, 20]]
///
/// [[binding]]
/// signal = "button"
/// when = "on_true"
/// command = "auto"
/// ```
///
/// Commands and groups share one namespace; a group member may name
/// either.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRoutineFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// `[resource.<name>]`
    #[serde(default)]
    pub resource: BTreeMap<String, ResourceConfig>,

    /// `[command.<name>]`
    #[serde(default)]
    pub command: BTreeMap<String, CommandConfig>,

    /// `[group.<name>]`
    #[serde(default)]
    pub group: BTreeMap<String, GroupConfig>,

    /// `[signal.<name>]`
    #[serde(default)]
    pub signal: BTreeMap<String, SignalConfig>,

    /// `[[binding]]`
    #[serde(default)]
    pub binding: Vec<BindingConfig>,
}

/// A routine file that passed validation. Build one with
/// `RoutineFile::try_from(raw)` or [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone)]
pub struct RoutineFile {
    pub config: ConfigSection,
    pub resource: BTreeMap<String, ResourceConfig>,
    pub command: BTreeMap<String, CommandConfig>,
    pub group: BTreeMap<String, GroupConfig>,
    pub signal: BTreeMap<String, SignalConfig>,
    pub binding: Vec<BindingConfig>,
    /// Group names ordered so every group comes after the groups it contains.
    pub group_order: Vec<String>,
}

impl RoutineFile {
    pub(crate) fn new_unchecked(raw: RawRoutineFile, group_order: Vec<String>) -> Self {
        Self {
            config: raw.config,
            resource: raw.resource,
            command: raw.command,
            group: raw.group,
            signal: raw.signal,
            binding: raw.binding,
            group_order,
        }
    }

    /// Whether `name` is a command or a group.
    pub fn is_defined(&self, name: &str) -> bool {
        self.command.contains_key(name) || self.group.contains_key(name)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Control-loop period in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// Number of ticks to run unless overridden on the command line.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Commands scheduled before the first tick.
    #[serde(default)]
    pub start: Vec<String>,

    /// Tick ranges `[from, to)` during which the robot is disabled.
    #[serde(default)]
    pub disabled: Vec<[u64; 2]>,
}

fn default_period_ms() -> u64 {
    20
}

fn default_ticks() -> u64 {
    50
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            ticks: default_ticks(),
            start: Vec::new(),
            disabled: Vec::new(),
        }
    }
}

impl ConfigSection {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn is_disabled_at(&self, tick: u64) -> bool {
        in_ranges(&self.disabled, tick)
    }
}

/// `[resource.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceConfig {
    /// Command (or group) to run whenever nothing else owns the resource.
    #[serde(default)]
    pub default: Option<String>,
}

/// Leaf command kinds available in routine files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Finishes on the tick it starts.
    Instant,
    /// Runs until interrupted.
    Run,
    /// Finishes after `ms` milliseconds of scheduler clock time.
    Wait,
    /// Finishes once `signal` is high.
    WaitUntil,
    /// Prints `message` and finishes.
    Print,
    /// Finishes after executing `ticks` times.
    Ticks,
}

/// `[command.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    pub kind: CommandKind,

    /// Resource names this command needs exclusively.
    #[serde(default)]
    pub requires: Vec<String>,

    /// `"cancel_self"` (default) or `"cancel_incoming"`.
    #[serde(default)]
    pub interrupt: Option<InterruptionBehavior>,

    /// Override the kind's default disabled policy.
    #[serde(default)]
    pub runs_when_disabled: Option<bool>,

    /// `ticks` kind: number of executes before finishing.
    #[serde(default)]
    pub ticks: Option<u64>,

    /// `wait` kind: duration in milliseconds.
    #[serde(default)]
    pub ms: Option<u64>,

    /// `print` kind: the message.
    #[serde(default)]
    pub message: Option<String>,

    /// `wait_until` kind: the signal to wait for.
    #[serde(default)]
    pub signal: Option<String>,
}

/// Composition kinds available in routine files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Sequence,
    Parallel,
    Race,
    Deadline,
}

/// `[group.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub kind: GroupKind,

    /// Member commands or groups, in order.
    #[serde(default)]
    pub members: Vec<String>,

    /// `deadline` kind: the member whose completion ends the group.
    #[serde(default)]
    pub deadline: Option<String>,

    /// Interrupt the group after this many milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Restart the group every time it finishes.
    #[serde(default)]
    pub repeat: bool,

    #[serde(default)]
    pub interrupt: Option<InterruptionBehavior>,

    #[serde(default)]
    pub runs_when_disabled: Option<bool>,
}

impl GroupConfig {
    /// Every name this group composes, deadline first.
    pub fn all_members(&self) -> impl Iterator<Item = &String> {
        self.deadline
            .iter()
            .chain(self.members.iter().filter(|m| Some(*m) != self.deadline.as_ref()))
    }
}

/// `[signal.<name>]` section: a scripted boolean input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalConfig {
    /// Tick ranges `[from, to)` during which the signal is high.
    #[serde(default)]
    pub high: Vec<[u64; 2]>,

    /// Debounce period in milliseconds.
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Which edges `debounce_ms` delays.
    #[serde(default)]
    pub debounce: crate::types::DebounceType,
}

impl SignalConfig {
    pub fn is_high_at(&self, tick: u64) -> bool {
        in_ranges(&self.high, tick)
    }
}

/// Binding kind names as written in routine files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingWhen {
    OnTrue,
    OnFalse,
    OnChange,
    WhileTrue,
    WhileFalse,
    ToggleOnTrue,
    ToggleOnFalse,
}

impl From<BindingWhen> for BindingKind {
    fn from(when: BindingWhen) -> Self {
        match when {
            BindingWhen::OnTrue => BindingKind::OnTrue,
            BindingWhen::OnFalse => BindingKind::OnFalse,
            BindingWhen::OnChange => BindingKind::OnChange,
            BindingWhen::WhileTrue => BindingKind::WhileTrue,
            BindingWhen::WhileFalse => BindingKind::WhileFalse,
            BindingWhen::ToggleOnTrue => BindingKind::ToggleOnTrue,
            BindingWhen::ToggleOnFalse => BindingKind::ToggleOnFalse,
        }
    }
}

/// `[[binding]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingConfig {
    pub signal: String,
    pub when: BindingWhen,
    pub command: String,

    /// Seed for the binding's remembered value.
    #[serde(default)]
    pub initial: InitialState,

    /// Invert the signal before binding.
    #[serde(default)]
    pub negate: bool,
}

fn in_ranges(ranges: &[[u64; 2]], tick: u64) -> bool {
    ranges.iter().any(|[from, to]| (*from..*to).contains(&tick))
}
