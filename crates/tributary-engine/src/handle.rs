use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tributary_graph::{Graph, NodeIndex};

use crate::error::{EngineError, RunError};
use crate::scheduler::Command;

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
  pub run_id: String,
  /// Number of firings per instance id, for instances that fired at all.
  pub firings: BTreeMap<String, usize>,
  /// Values still queued when the run ended, keyed by `instance.input`.
  pub leftover: BTreeMap<String, usize>,
  /// True if the run ended because it was stopped rather than completing.
  pub stopped: bool,
}

impl RunSummary {
  pub fn firings_of(&self, instance_id: &str) -> usize {
    self.firings.get(instance_id).copied().unwrap_or(0)
  }
}

/// A clonable handle for steering a live run.
///
/// The run treats the drop of its last controller as a stop once it is
/// otherwise idle and waiting on triggers, since nothing could resolve them.
#[derive(Debug, Clone)]
pub struct RunController {
  run_id: String,
  graph: Arc<Graph>,
  commands: mpsc::UnboundedSender<Command>,
  cancel: CancellationToken,
}

impl RunController {
  pub(crate) fn new(
    run_id: String,
    graph: Arc<Graph>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
  ) -> Self {
    Self {
      run_id,
      graph,
      commands,
      cancel,
    }
  }

  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  /// Supply a value for a trigger instance.
  ///
  /// Values are queued per trigger and each is consumed by exactly one
  /// firing, in the order they were supplied.
  pub fn resolve_trigger(
    &self,
    instance_id: &str,
    value: impl Into<Value>,
  ) -> Result<(), EngineError> {
    let idx = self.trigger_index(instance_id)?;
    self.send(Command::Resolve {
      idx,
      value: value.into(),
    })
  }

  /// Re-arm a trigger so the run waits for it and announces `input_needed`.
  /// Has no effect on a trigger that is already armed.
  pub fn listen(&self, instance_id: &str) -> Result<(), EngineError> {
    let idx = self.trigger_index(instance_id)?;
    self.send(Command::Listen { idx })
  }

  /// Request a cooperative stop. In-flight firings finish; nothing new starts.
  pub fn stop(&self) {
    self.cancel.cancel();
  }

  /// Whether the run has concluded.
  pub fn is_finished(&self) -> bool {
    self.commands.is_closed()
  }

  fn trigger_index(&self, instance_id: &str) -> Result<NodeIndex, EngineError> {
    let idx = self
      .graph
      .index_of(instance_id)
      .ok_or_else(|| EngineError::UnknownInstance {
        instance_id: instance_id.to_string(),
      })?;
    if !self.graph.instance_at(idx).is_trigger() {
      return Err(EngineError::NotATrigger {
        instance_id: instance_id.to_string(),
      });
    }
    Ok(idx)
  }

  fn send(&self, command: Command) -> Result<(), EngineError> {
    self
      .commands
      .send(command)
      .map_err(|_| EngineError::RunFinished)
  }
}

/// A started run.
///
/// Use [`controller`](Self::controller) to hand out steering handles, then
/// [`wait`](Self::wait) for the outcome.
#[derive(Debug)]
pub struct RunHandle {
  controller: RunController,
  task: JoinHandle<Result<RunSummary, RunError>>,
}

impl RunHandle {
  pub(crate) fn new(
    controller: RunController,
    task: JoinHandle<Result<RunSummary, RunError>>,
  ) -> Self {
    Self { controller, task }
  }

  pub fn controller(&self) -> RunController {
    self.controller.clone()
  }

  pub fn run_id(&self) -> &str {
    self.controller.run_id()
  }

  pub fn resolve_trigger(
    &self,
    instance_id: &str,
    value: impl Into<Value>,
  ) -> Result<(), EngineError> {
    self.controller.resolve_trigger(instance_id, value)
  }

  pub fn listen(&self, instance_id: &str) -> Result<(), EngineError> {
    self.controller.listen(instance_id)
  }

  pub fn stop(&self) {
    self.controller.stop();
  }

  /// Wait for the run to conclude.
  ///
  /// This gives up the handle's own controller. If no other controller is
  /// alive and the run is left waiting on triggers, it concludes as stopped.
  pub async fn wait(self) -> Result<RunSummary, RunError> {
    let Self { controller, task } = self;
    drop(controller);

    task.await.map_err(|e| RunError::Task {
      message: e.to_string(),
    })?
  }
}
