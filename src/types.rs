use std::str::FromStr;
use serde::Deserialize;

/// What happens when another command requiring one of this command's
/// resources is scheduled while this command is running.
///
/// - `CancelSelf`: this command is interrupted (`end(true)`) and the incoming
///   command takes over its resources (default behaviour).
/// - `CancelIncoming`: this command keeps running and the incoming request is
///   dropped without touching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionBehavior {
    CancelSelf,
    CancelIncoming,
}

impl Default for InterruptionBehavior {
    fn default() -> Self {
        InterruptionBehavior::CancelSelf
    }
}

impl FromStr for InterruptionBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "cancel_self" => Ok(InterruptionBehavior::CancelSelf),
            "cancel_incoming" => Ok(InterruptionBehavior::CancelIncoming),
            other => Err(format!(
                "invalid interruption behavior: {other} (expected \"cancel_self\" or \"cancel_incoming\")"
            )),
        }
    }
}

/// Seed for a trigger binding's remembered value before its first poll.
///
/// This decides whether a synthetic edge fires on the very first poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialState {
    /// Rising edge on the first poll iff the condition starts true.
    False,
    /// Falling edge on the first poll iff the condition starts false.
    True,
    /// Never produces an edge on the first poll.
    Condition,
    /// Always produces an edge on the first poll.
    NegCondition,
}

impl Default for InitialState {
    fn default() -> Self {
        InitialState::Condition
    }
}

impl FromStr for InitialState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "false" => Ok(InitialState::False),
            "true" => Ok(InitialState::True),
            "condition" => Ok(InitialState::Condition),
            "neg_condition" => Ok(InitialState::NegCondition),
            other => Err(format!(
                "invalid initial state: {other} (expected \"false\", \"true\", \"condition\" or \"neg_condition\")"
            )),
        }
    }
}

/// Which transitions a debounced trigger delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebounceType {
    /// Only `false -> true` must be stable for the debounce period.
    Rising,
    /// Only `true -> false` must be stable for the debounce period.
    Falling,
    /// Both transitions must be stable for the debounce period.
    Both,
}

impl Default for DebounceType {
    fn default() -> Self {
        DebounceType::Rising
    }
}

impl FromStr for DebounceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rising" => Ok(DebounceType::Rising),
            "falling" => Ok(DebounceType::Falling),
            "both" => Ok(DebounceType::Both),
            other => Err(format!(
                "invalid debounce type: {other} (expected \"rising\", \"falling\" or \"both\")"
            )),
        }
    }
}
