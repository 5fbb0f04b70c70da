// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{CommandKind, GroupKind, RawRoutineFile, RoutineFile};
use crate::errors::{Result, RobocmdError};

impl TryFrom<RawRoutineFile> for RoutineFile {
    type Error = RobocmdError;

    fn try_from(raw: RawRoutineFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_routine(&raw)?;
        let order = group_order(&raw)?;
        Ok(RoutineFile::new_unchecked(raw, order))
    }
}

/// Validate a raw routine without consuming it.
pub fn validate_routine(raw: &RawRoutineFile) -> Result<()> {
    validate_raw_routine(raw)?;
    group_order(raw)?;
    Ok(())
}

fn validate_raw_routine(raw: &RawRoutineFile) -> Result<()> {
    ensure_has_commands(raw)?;
    validate_global_config(raw)?;
    validate_names(raw)?;
    validate_commands(raw)?;
    validate_groups(raw)?;
    validate_membership(raw)?;
    validate_references(raw)?;
    Ok(())
}

fn config_error(msg: String) -> RobocmdError {
    RobocmdError::ConfigError(msg)
}

fn ensure_has_commands(raw: &RawRoutineFile) -> Result<()> {
    if raw.command.is_empty() {
        return Err(config_error(
            "routine must contain at least one [command.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(raw: &RawRoutineFile) -> Result<()> {
    if raw.config.period_ms == 0 {
        return Err(config_error(
            "[config].period_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    for [from, to] in &raw.config.disabled {
        if from >= to {
            return Err(config_error(format!(
                "[config].disabled range [{from}, {to}] is empty"
            )));
        }
    }
    Ok(())
}

fn validate_names(raw: &RawRoutineFile) -> Result<()> {
    for name in raw.group.keys() {
        if raw.command.contains_key(name) {
            return Err(config_error(format!(
                "'{name}' is defined both as a command and as a group"
            )));
        }
    }
    Ok(())
}

fn validate_commands(raw: &RawRoutineFile) -> Result<()> {
    for (name, cmd) in raw.command.iter() {
        for resource in cmd.requires.iter() {
            if !raw.resource.contains_key(resource) {
                return Err(config_error(format!(
                    "command '{name}' requires unknown resource '{resource}'"
                )));
            }
        }

        let missing = match cmd.kind {
            CommandKind::Ticks if cmd.ticks.is_none() => Some("ticks"),
            CommandKind::Wait if cmd.ms.is_none() => Some("ms"),
            CommandKind::Print if cmd.message.is_none() => Some("message"),
            CommandKind::WaitUntil if cmd.signal.is_none() => Some("signal"),
            _ => None,
        };
        if let Some(field) = missing {
            return Err(config_error(format!(
                "command '{name}' of kind {:?} is missing `{field}`",
                cmd.kind
            )));
        }

        if let Some(signal) = cmd.signal.as_ref() {
            if !raw.signal.contains_key(signal) {
                return Err(config_error(format!(
                    "command '{name}' waits on unknown signal '{signal}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_groups(raw: &RawRoutineFile) -> Result<()> {
    for (name, group) in raw.group.iter() {
        if group.kind == GroupKind::Deadline && group.deadline.is_none() {
            return Err(config_error(format!(
                "deadline group '{name}' is missing `deadline`"
            )));
        }
        if group.kind != GroupKind::Deadline && group.deadline.is_some() {
            return Err(config_error(format!(
                "group '{name}' sets `deadline` but is not a deadline group"
            )));
        }

        for member in group.all_members() {
            if member == name {
                return Err(config_error(format!(
                    "group '{name}' cannot contain itself"
                )));
            }
            if !raw.command.contains_key(member) && !raw.group.contains_key(member) {
                return Err(config_error(format!(
                    "group '{name}' has unknown member '{member}'"
                )));
            }
        }

        let mut seen = Vec::new();
        for member in group.members.iter() {
            if seen.contains(&member) {
                return Err(config_error(format!(
                    "group '{name}' lists member '{member}' more than once"
                )));
            }
            seen.push(member);
        }
    }
    Ok(())
}

/// Composition moves a command into its group, so each name can belong to
/// at most one group and can then no longer be scheduled on its own.
fn validate_membership(raw: &RawRoutineFile) -> Result<()> {
    let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
    for (name, group) in raw.group.iter() {
        for member in group.all_members() {
            if let Some(previous) = owner.insert(member.as_str(), name.as_str()) {
                return Err(config_error(format!(
                    "'{member}' is a member of both '{previous}' and '{name}'"
                )));
            }
        }
    }

    let composed = |target: &str, context: String| -> Result<()> {
        match owner.get(target) {
            Some(group) => Err(config_error(format!(
                "{context} '{target}' is a member of group '{group}' and cannot be scheduled on its own"
            ))),
            None => Ok(()),
        }
    };

    for (resource, cfg) in raw.resource.iter() {
        if let Some(default) = cfg.default.as_deref() {
            composed(default, format!("default command of '{resource}'"))?;
        }
    }
    for binding in raw.binding.iter() {
        composed(&binding.command, "binding target".to_string())?;
    }
    for start in raw.config.start.iter() {
        composed(start, "start command".to_string())?;
    }
    Ok(())
}

fn validate_references(raw: &RawRoutineFile) -> Result<()> {
    let defined = |name: &str| raw.command.contains_key(name) || raw.group.contains_key(name);

    for (resource, cfg) in raw.resource.iter() {
        if let Some(default) = cfg.default.as_deref() {
            if !defined(default) {
                return Err(config_error(format!(
                    "resource '{resource}' has unknown default command '{default}'"
                )));
            }
        }
    }

    for (i, binding) in raw.binding.iter().enumerate() {
        if !raw.signal.contains_key(&binding.signal) {
            return Err(config_error(format!(
                "binding #{i} uses unknown signal '{}'",
                binding.signal
            )));
        }
        if !defined(&binding.command) {
            return Err(config_error(format!(
                "binding #{i} targets unknown command '{}'",
                binding.command
            )));
        }
    }

    for start in raw.config.start.iter() {
        if !defined(start) {
            return Err(config_error(format!(
                "[config].start names unknown command '{start}'"
            )));
        }
    }
    Ok(())
}

/// Order groups so that nested groups are built before the groups that
/// contain them. Fails on a containment cycle.
fn group_order(raw: &RawRoutineFile) -> Result<Vec<String>> {
    // Edge direction: member group -> containing group.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in raw.group.keys() {
        graph.add_node(name.as_str());
    }

    for (name, group) in raw.group.iter() {
        for member in group.all_members() {
            if raw.group.contains_key(member) {
                graph.add_edge(member.as_str(), name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(RobocmdError::GroupCycle(format!(
            "cycle detected between groups involving '{}'",
            cycle.node_id()
        ))),
    }
}
