// src/config/mod.rs

//! Routine files: the TOML description of resources, commands, groups,
//! scripted signals and trigger bindings that the `robocmd` binary runs.
//!
//! - `model.rs`: the `serde` data model.
//! - `loader.rs`: reading from disk.
//! - `validate.rs`: reference checks and group ordering.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{
    BindingConfig, BindingWhen, CommandConfig, CommandKind, ConfigSection, GroupConfig,
    GroupKind, RawRoutineFile, ResourceConfig, RoutineFile, SignalConfig,
};
pub use validate::validate_routine;
