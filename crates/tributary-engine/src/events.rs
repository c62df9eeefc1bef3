//! Execution events and sinks for observing a run.
//!
//! Every event carries the `run_id` of the run that produced it. Events are
//! serialized with an `event` tag in snake_case, so a JSON-lines consumer sees
//! e.g. `{"event":"node_output","run_id":"..","instance_id":"p","port":"out","value":5}`.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  /// The run has been initialized and is about to schedule.
  RunStarted { run_id: String },

  /// An instance has begun a firing.
  NodeStart { run_id: String, instance_id: String },

  /// A firing produced a value on one of its output ports.
  NodeOutput {
    run_id: String,
    instance_id: String,
    port: String,
    value: serde_json::Value,
  },

  /// A firing finished without error.
  NodeDone { run_id: String, instance_id: String },

  /// A firing failed.
  NodeError {
    run_id: String,
    instance_id: String,
    error: String,
  },

  /// A trigger is armed and waiting for an external value.
  InputNeeded {
    run_id: String,
    instance_id: String,
    input: String,
    #[serde(rename = "type")]
    port_type: String,
  },

  /// A log-sink instance emitted a line.
  Log {
    run_id: String,
    instance_id: String,
    message: String,
  },

  /// Nothing is ready, nothing is firing, and no trigger is waiting.
  RunComplete { run_id: String },

  /// The run ended because of a node failure.
  RunError { run_id: String, error: String },

  /// The run ended because it was stopped.
  RunStopped { run_id: String },
}

impl ExecutionEvent {
  pub fn run_id(&self) -> &str {
    match self {
      ExecutionEvent::RunStarted { run_id }
      | ExecutionEvent::NodeStart { run_id, .. }
      | ExecutionEvent::NodeOutput { run_id, .. }
      | ExecutionEvent::NodeDone { run_id, .. }
      | ExecutionEvent::NodeError { run_id, .. }
      | ExecutionEvent::InputNeeded { run_id, .. }
      | ExecutionEvent::Log { run_id, .. }
      | ExecutionEvent::RunComplete { run_id }
      | ExecutionEvent::RunError { run_id, .. }
      | ExecutionEvent::RunStopped { run_id } => run_id,
    }
  }

  /// The instance the event is about, if any.
  pub fn instance_id(&self) -> Option<&str> {
    match self {
      ExecutionEvent::NodeStart { instance_id, .. }
      | ExecutionEvent::NodeOutput { instance_id, .. }
      | ExecutionEvent::NodeDone { instance_id, .. }
      | ExecutionEvent::NodeError { instance_id, .. }
      | ExecutionEvent::InputNeeded { instance_id, .. }
      | ExecutionEvent::Log { instance_id, .. } => Some(instance_id),
      _ => None,
    }
  }

  /// Whether this event concludes its run.
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      ExecutionEvent::RunComplete { .. }
        | ExecutionEvent::RunError { .. }
        | ExecutionEvent::RunStopped { .. }
    )
  }
}

/// Receives execution events.
///
/// The engine calls `emit` from the scheduler and from firing tasks, so
/// implementations must be cheap and must not block.
pub trait EventSink: Send + Sync {
  fn emit(&self, event: ExecutionEvent);
}

/// A sink that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
  fn emit(&self, _event: ExecutionEvent) {}
}

/// A sink that forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
  // Unbounded so a slow consumer never stalls a firing.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelSink {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a sink together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl EventSink for ChannelSink {
  fn emit(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
