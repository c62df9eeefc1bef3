use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors returned to callers of the run API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
  #[error("unknown instance: {instance_id}")]
  UnknownInstance { instance_id: String },

  #[error("instance '{instance_id}' is not a trigger")]
  NotATrigger { instance_id: String },

  #[error("run has already finished")]
  RunFinished,
}

/// A firing that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeFailure {
  pub instance_id: String,
  pub message: String,
}

impl fmt::Display for NodeFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.instance_id, self.message)
  }
}

/// Why a run did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
  /// A node failed and the run was aborted.
  #[error("node '{instance_id}' failed: {message}")]
  NodeFailed { instance_id: String, message: String },

  /// One or more nodes failed; their downstream subgraphs were quarantined
  /// and the rest of the graph ran on.
  #[error("{} node(s) failed: {}", failures.len(), join(failures))]
  PartialFailure { failures: Vec<NodeFailure> },

  /// A firing task ended without reporting a result.
  #[error("firing task failed: {message}")]
  Task { message: String },
}

fn join(failures: &[NodeFailure]) -> String {
  failures
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}
