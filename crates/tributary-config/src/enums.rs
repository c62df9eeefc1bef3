use serde::{Deserialize, Serialize};

/// What happens to a trigger after it fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
  /// Re-arm immediately and ask for the next value.
  #[default]
  Repeat,
  /// Stay disarmed until the caller explicitly listens again.
  Once,
}

/// How a run reacts when a node's computation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  /// Abort the whole run on the first failure.
  #[default]
  FailFast,
  /// Quarantine the failed instance and everything downstream of it; let
  /// independent branches finish.
  Isolate,
}
