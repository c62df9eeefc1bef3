use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use tributary_config::{FailurePolicy, TriggerMode};
use tributary_graph::ValidatedGraph;

use crate::context::RunContext;
use crate::error::RunError;
use crate::events::{EventSink, NoopSink};
use crate::handle::{RunController, RunHandle, RunSummary};
use crate::scheduler::Scheduler;

/// Run policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
  #[serde(default)]
  pub trigger_mode: TriggerMode,
  #[serde(default)]
  pub failure_policy: FailurePolicy,
}

/// The dataflow execution engine.
///
/// Generic over `S: EventSink` to allow different ways of observing runs.
/// Use `Engine::new()` to discard events, or `Engine::with_sink()` to
/// receive them.
pub struct Engine<S: EventSink = NoopSink> {
  config: EngineConfig,
  sink: Arc<S>,
}

impl Engine<NoopSink> {
  pub fn new(config: EngineConfig) -> Self {
    Self::with_sink(config, NoopSink)
  }
}

impl<S: EventSink + 'static> Engine<S> {
  pub fn with_sink(config: EngineConfig, sink: S) -> Self {
    Self {
      config,
      sink: Arc::new(sink),
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Start a run on the current Tokio runtime.
  pub fn start(&self, graph: ValidatedGraph) -> RunHandle {
    self.start_with_cancel(graph, CancellationToken::new())
  }

  /// Start a run that also stops when `cancel` is cancelled.
  #[instrument(name = "engine_start", skip_all, fields(graph = graph.name().unwrap_or_default()))]
  pub fn start_with_cancel(&self, graph: ValidatedGraph, cancel: CancellationToken) -> RunHandle {
    let run_id = uuid::Uuid::new_v4().to_string();
    let graph = graph.graph().clone();
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (wake_tx, wake_rx) = mpsc::unbounded_channel();

    let sink: Arc<dyn EventSink> = self.sink.clone();
    let ctx = Arc::new(RunContext::new(
      run_id.clone(),
      graph.clone(),
      self.config.failure_policy,
      sink,
      wake_tx,
    ));
    let scheduler = Scheduler::new(
      ctx,
      self.config.trigger_mode,
      commands_rx,
      wake_rx,
      cancel.clone(),
    );
    let task = tokio::spawn(scheduler.run());

    RunHandle::new(RunController::new(run_id, graph, commands_tx, cancel), task)
  }

  /// Start a run and wait for it. A run that waits on triggers concludes as
  /// stopped, since no controller is left to resolve them.
  pub async fn run(&self, graph: ValidatedGraph) -> Result<RunSummary, RunError> {
    self.start(graph).wait().await
  }
}
