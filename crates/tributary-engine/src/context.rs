use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;
use tributary_config::FailurePolicy;
use tributary_graph::{Graph, NodeIndex};

use crate::events::{EventSink, ExecutionEvent};
use crate::queue::QueueArena;

/// State shared between the scheduler and its firing tasks for one run.
pub(crate) struct RunContext {
  pub(crate) run_id: String,
  pub(crate) graph: Arc<Graph>,
  pub(crate) policy: FailurePolicy,
  pub(crate) queues: QueueArena,
  /// Per instance: output port -> (target, input position), in edge order.
  routes: Vec<HashMap<String, Vec<(NodeIndex, usize)>>>,
  sink: Arc<dyn EventSink>,
  halted: AtomicBool,
  wake: mpsc::UnboundedSender<()>,
}

impl RunContext {
  pub(crate) fn new(
    run_id: String,
    graph: Arc<Graph>,
    policy: FailurePolicy,
    sink: Arc<dyn EventSink>,
    wake: mpsc::UnboundedSender<()>,
  ) -> Self {
    let routes = graph
      .instances()
      .map(|(idx, instance)| {
        instance
          .schema()
          .outputs
          .iter()
          .map(|output| {
            let targets = graph
              .routes(idx, &output.name)
              .into_iter()
              .filter_map(|(target, port)| {
                graph
                  .instance_at(target)
                  .schema()
                  .input_position(port)
                  .map(|pos| (target, pos))
              })
              .collect();
            (output.name.clone(), targets)
          })
          .collect()
      })
      .collect();

    Self {
      run_id,
      queues: QueueArena::new(&graph),
      graph,
      policy,
      routes,
      sink,
      halted: AtomicBool::new(false),
      wake,
    }
  }

  pub(crate) fn emit(&self, event: ExecutionEvent) {
    self.sink.emit(event);
  }

  pub(crate) fn instance_id(&self, idx: NodeIndex) -> String {
    self.graph.instance_at(idx).id().to_string()
  }

  /// Stop all routing for the rest of the run. Returns whether the run was
  /// already halted.
  pub(crate) fn halt(&self) -> bool {
    self.halted.swap(true, Ordering::SeqCst)
  }

  pub(crate) fn is_halted(&self) -> bool {
    self.halted.load(Ordering::SeqCst)
  }

  /// Push a value into every queue fed by `port` and wake the scheduler.
  pub(crate) fn route(&self, idx: NodeIndex, port: &str, value: Value) {
    let Some(targets) = self.routes[idx.index()].get(port) else {
      return;
    };
    for &(target, pos) in targets {
      self.queues.push(target, pos, value.clone());
    }
    // Scheduler is gone once the run has concluded
    let _ = self.wake.send(());
  }
}
