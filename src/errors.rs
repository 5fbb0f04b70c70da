// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! The first group of variants are *illegal-use* conditions: programming
//! mistakes surfaced synchronously at the call that caused them. Requests
//! that are merely ignored (already scheduled, disabled, blocked by a
//! non-interruptible owner) are not errors; see
//! [`ScheduleOutcome`](crate::scheduler::ScheduleOutcome).

use thiserror::Error;

use crate::command::{CommandId, ResourceId};
use crate::trigger::EventLoop;

#[derive(Error, Debug)]
pub enum RobocmdError {
    #[error("command {0} is part of a composition and cannot be scheduled independently")]
    ComposedCommandScheduled(CommandId),

    #[error("command {0} is already part of a composition and cannot be added to another")]
    AlreadyComposed(CommandId),

    #[error("default command {command} does not require its resource {resource}")]
    DefaultCommandMissingRequirement {
        resource: ResourceId,
        command: CommandId,
    },

    #[error("command {0} is part of a composition and cannot be a default command")]
    ComposedDefaultCommand(CommandId),

    #[error("command {0} is currently scheduled and cannot be composed")]
    ComposeWhileScheduled(CommandId),

    #[error("command {0} appears more than once in the same composition")]
    DuplicateGroupMember(CommandId),

    #[error("commands {first} and {second} in the same group share resource {resource}")]
    ConflictingGroupRequirements {
        first: CommandId,
        second: CommandId,
        resource: ResourceId,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(CommandId),

    #[error("unknown resource: {0}")]
    UnknownResource(ResourceId),

    #[error("unknown event loop: {0}")]
    UnknownEventLoop(EventLoop),

    #[error("invalid routine: {0}")]
    ConfigError(String),

    #[error("groups contain each other: {0}")]
    GroupCycle(String),

    #[error("cannot read routine file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("malformed routine file: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RobocmdError>;
