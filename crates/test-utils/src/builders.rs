#![allow(dead_code)]

use robocmd::config::{
    BindingConfig, BindingWhen, CommandConfig, CommandKind, GroupConfig, GroupKind,
    RawRoutineFile, ResourceConfig, RoutineFile, SignalConfig,
};
use robocmd::types::{InitialState, InterruptionBehavior};

/// Builder for routine files to simplify test setup.
pub struct RoutineBuilder {
    routine: RawRoutineFile,
}

impl RoutineBuilder {
    pub fn new() -> Self {
        Self {
            routine: RawRoutineFile::default(),
        }
    }

    pub fn period_ms(mut self, ms: u64) -> Self {
        self.routine.config.period_ms = ms;
        self
    }

    pub fn ticks(mut self, ticks: u64) -> Self {
        self.routine.config.ticks = ticks;
        self
    }

    pub fn start(mut self, name: &str) -> Self {
        self.routine.config.start.push(name.to_string());
        self
    }

    pub fn disabled(mut self, from: u64, to: u64) -> Self {
        self.routine.config.disabled.push([from, to]);
        self
    }

    pub fn resource(mut self, name: &str) -> Self {
        self.routine
            .resource
            .insert(name.to_string(), ResourceConfig::default());
        self
    }

    pub fn resource_with_default(mut self, name: &str, default: &str) -> Self {
        self.routine.resource.insert(
            name.to_string(),
            ResourceConfig {
                default: Some(default.to_string()),
            },
        );
        self
    }

    pub fn command(mut self, name: &str, command: CommandConfig) -> Self {
        self.routine.command.insert(name.to_string(), command);
        self
    }

    pub fn group(mut self, name: &str, group: GroupConfig) -> Self {
        self.routine.group.insert(name.to_string(), group);
        self
    }

    pub fn signal(mut self, name: &str, high: &[[u64; 2]]) -> Self {
        self.routine.signal.insert(
            name.to_string(),
            SignalConfig {
                high: high.to_vec(),
                ..Default::default()
            },
        );
        self
    }

    pub fn binding(mut self, signal: &str, when: BindingWhen, command: &str) -> Self {
        self.routine.binding.push(BindingConfig {
            signal: signal.to_string(),
            when,
            command: command.to_string(),
            initial: InitialState::default(),
            negate: false,
        });
        self
    }

    pub fn raw(self) -> RawRoutineFile {
        self.routine
    }

    pub fn build(self) -> RoutineFile {
        RoutineFile::try_from(self.routine).expect("Failed to build valid routine from builder")
    }
}

impl Default for RoutineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `CommandConfig`.
pub struct CommandConfigBuilder {
    command: CommandConfig,
}

impl CommandConfigBuilder {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            command: CommandConfig {
                kind,
                requires: vec![],
                interrupt: None,
                runs_when_disabled: None,
                ticks: None,
                ms: None,
                message: None,
                signal: None,
            },
        }
    }

    /// A command that finishes after `n` executes.
    pub fn ticks(n: u64) -> Self {
        let mut b = Self::new(CommandKind::Ticks);
        b.command.ticks = Some(n);
        b
    }

    pub fn run() -> Self {
        Self::new(CommandKind::Run)
    }

    pub fn wait_ms(ms: u64) -> Self {
        let mut b = Self::new(CommandKind::Wait);
        b.command.ms = Some(ms);
        b
    }

    pub fn wait_until(signal: &str) -> Self {
        let mut b = Self::new(CommandKind::WaitUntil);
        b.command.signal = Some(signal.to_string());
        b
    }

    pub fn requires(mut self, resource: &str) -> Self {
        self.command.requires.push(resource.to_string());
        self
    }

    pub fn cancel_incoming(mut self) -> Self {
        self.command.interrupt = Some(InterruptionBehavior::CancelIncoming);
        self
    }

    pub fn runs_when_disabled(mut self, runs: bool) -> Self {
        self.command.runs_when_disabled = Some(runs);
        self
    }

    pub fn build(self) -> CommandConfig {
        self.command
    }
}

/// Builder for `GroupConfig`.
pub struct GroupConfigBuilder {
    group: GroupConfig,
}

impl GroupConfigBuilder {
    pub fn new(kind: GroupKind) -> Self {
        Self {
            group: GroupConfig {
                kind,
                members: vec![],
                deadline: None,
                timeout_ms: None,
                repeat: false,
                interrupt: None,
                runs_when_disabled: None,
            },
        }
    }

    pub fn member(mut self, name: &str) -> Self {
        self.group.members.push(name.to_string());
        self
    }

    pub fn deadline(mut self, name: &str) -> Self {
        self.group.deadline = Some(name.to_string());
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.group.timeout_ms = Some(ms);
        self
    }

    pub fn repeat(mut self) -> Self {
        self.group.repeat = true;
        self
    }

    pub fn build(self) -> GroupConfig {
        self.group
    }
}
