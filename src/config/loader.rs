// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawRoutineFile, RoutineFile};
use crate::errors::Result;

/// Load a routine file from `path` without semantic validation.
///
/// Use [`load_and_validate`] for anything that will be built into a
/// scheduler.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawRoutineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

pub fn parse_str(contents: &str) -> Result<RawRoutineFile> {
    let routine: RawRoutineFile = toml::from_str(contents)?;
    Ok(routine)
}

/// Load a routine file and validate it.
///
/// Checks for:
/// - unknown resource, signal and command references,
/// - commands composed into more than one group, or composed and also
///   scheduled directly (default, binding or start),
/// - cycles between groups,
/// - basic `[config]` sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RoutineFile> {
    let raw = load_from_path(&path)?;
    RoutineFile::try_from(raw)
}
