//! The run loop.
//!
//! One scheduler task owns readiness, dequeuing, trigger state, and the set
//! of in-flight firings. It wakes whenever a firing routes an output, a
//! firing finishes, a caller command arrives, or a stop is requested, and on
//! each wake starts every instance that has become ready.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tributary_catalog::{Inputs, NodeError};
use tributary_config::{FailurePolicy, TriggerMode};
use tributary_graph::NodeIndex;

use crate::context::RunContext;
use crate::error::{NodeFailure, RunError};
use crate::events::ExecutionEvent;
use crate::firing::fire;
use crate::handle::RunSummary;
use crate::trigger::TriggerDesk;

/// Requests sent from run handles to the scheduler.
#[derive(Debug)]
pub(crate) enum Command {
  Resolve { idx: NodeIndex, value: Value },
  Listen { idx: NodeIndex },
}

type Joined = Result<(NodeIndex, Result<(), NodeError>), JoinError>;

pub(crate) struct Scheduler {
  ctx: Arc<RunContext>,
  trigger_mode: TriggerMode,
  triggers: TriggerDesk,
  commands: mpsc::UnboundedReceiver<Command>,
  wake: mpsc::UnboundedReceiver<()>,
  cancel: CancellationToken,
  in_flight: JoinSet<(NodeIndex, Result<(), NodeError>)>,
  firing: HashSet<NodeIndex>,
  quarantined: HashSet<NodeIndex>,
  firings: Vec<usize>,
  failures: Vec<NodeFailure>,
}

impl Scheduler {
  pub(crate) fn new(
    ctx: Arc<RunContext>,
    trigger_mode: TriggerMode,
    commands: mpsc::UnboundedReceiver<Command>,
    wake: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
  ) -> Self {
    Self {
      triggers: TriggerDesk::new(&ctx.graph),
      firings: vec![0; ctx.graph.len()],
      ctx,
      trigger_mode,
      commands,
      wake,
      cancel,
      in_flight: JoinSet::new(),
      firing: HashSet::new(),
      quarantined: HashSet::new(),
      failures: Vec::new(),
    }
  }

  pub(crate) async fn run(mut self) -> Result<RunSummary, RunError> {
    info!(
      run_id = %self.ctx.run_id,
      graph = self.ctx.graph.name().unwrap_or_default(),
      instances = self.ctx.graph.len(),
      "run_started"
    );
    self.ctx.emit(ExecutionEvent::RunStarted {
      run_id: self.ctx.run_id.clone(),
    });

    let triggers: Vec<_> = self.triggers.triggers().collect();
    for idx in triggers {
      self.arm(idx);
    }

    let mut stopping = false;
    let mut commands_open = true;

    loop {
      if !stopping && self.cancel.is_cancelled() {
        info!(run_id = %self.ctx.run_id, in_flight = self.in_flight.len(), "stop requested");
        stopping = true;
      }

      if !stopping && !self.ctx.is_halted() {
        self.schedule_ready();
      }

      if self.in_flight.is_empty() {
        if stopping {
          return self.conclude(true);
        }
        if !self.triggers.is_waiting() {
          return self.conclude(false);
        }
        if !commands_open {
          info!(run_id = %self.ctx.run_id, "all run handles dropped while waiting on triggers");
          return self.conclude(true);
        }
      }

      tokio::select! {
        Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
          self.on_joined(joined)?;
        }
        Some(()) = self.wake.recv() => {
          while self.wake.try_recv().is_ok() {}
        }
        command = self.commands.recv(), if commands_open && !stopping => match command {
          Some(command) => self.on_command(command),
          None => commands_open = false,
        },
        _ = self.cancel.cancelled(), if !stopping => {}
      }
    }
  }

  /// Start a firing for every instance that is ready and not already firing.
  fn schedule_ready(&mut self) {
    let ctx = self.ctx.clone();

    for (idx, instance) in ctx.graph.instances() {
      if self.firing.contains(&idx) || self.quarantined.contains(&idx) {
        continue;
      }

      let inputs = if instance.is_trigger() {
        let Some(input) = instance.schema().trigger_input() else {
          continue;
        };
        let Some(value) = self.triggers.take(idx) else {
          continue;
        };
        Inputs::from_iter([(input.name.clone(), value)])
      } else {
        match self.bind(idx) {
          Some(inputs) => inputs,
          None => continue,
        }
      };

      self.spawn(idx, inputs);
    }
  }

  /// Dequeue one value per input if the instance is ready.
  ///
  /// Ready means every input either has a queued value or is unconnected
  /// with a default, and at least one input has a queued value.
  fn bind(&self, idx: NodeIndex) -> Option<Inputs> {
    let queues = &self.ctx.queues;
    let schema = self.ctx.graph.instance_at(idx).schema();

    let mut any_queued = false;
    for (pos, input) in schema.inputs.iter().enumerate() {
      if queues.has_value(idx, pos) {
        any_queued = true;
      } else if queues.is_connected(idx, pos) || input.default.is_none() {
        return None;
      }
    }
    if !any_queued {
      return None;
    }

    Some(
      schema
        .inputs
        .iter()
        .enumerate()
        .filter_map(|(pos, input)| {
          queues
            .pop(idx, pos)
            .or_else(|| input.default.clone())
            .map(|value| (input.name.clone(), value))
        })
        .collect(),
    )
  }

  fn spawn(&mut self, idx: NodeIndex, inputs: Inputs) {
    self.firing.insert(idx);
    self.firings[idx.index()] += 1;

    let instance_id = self.ctx.instance_id(idx);
    debug!(run_id = %self.ctx.run_id, instance_id = %instance_id, "node_start");
    self.ctx.emit(ExecutionEvent::NodeStart {
      run_id: self.ctx.run_id.clone(),
      instance_id,
    });

    let ctx = self.ctx.clone();
    self
      .in_flight
      .spawn(async move { (idx, fire(ctx, idx, inputs).await) });
  }

  fn on_joined(&mut self, joined: Joined) -> Result<(), RunError> {
    let (idx, result) = match joined {
      Ok(joined) => joined,
      Err(e) => {
        return Err(self.fail(RunError::Task {
          message: e.to_string(),
        }));
      }
    };
    self.firing.remove(&idx);

    match result {
      Ok(()) => {
        if self.ctx.graph.instance_at(idx).is_trigger() {
          match self.trigger_mode {
            TriggerMode::Repeat => self.arm(idx),
            TriggerMode::Once => self.triggers.park(idx),
          }
        }
        Ok(())
      }
      Err(e) => {
        let failure = NodeFailure {
          instance_id: self.ctx.instance_id(idx),
          message: e.message().to_string(),
        };
        match self.ctx.policy {
          FailurePolicy::FailFast => Err(self.fail(RunError::NodeFailed {
            instance_id: failure.instance_id,
            message: failure.message,
          })),
          FailurePolicy::Isolate => {
            self.quarantine(idx, failure);
            Ok(())
          }
        }
      }
    }
  }

  fn on_command(&mut self, command: Command) {
    match command {
      Command::Resolve { idx, value } => {
        let instance_id = self.ctx.instance_id(idx);
        if self.triggers.resolve(idx, value) {
          debug!(run_id = %self.ctx.run_id, instance_id = %instance_id, "trigger_resolved");
        } else {
          warn!(
            run_id = %self.ctx.run_id,
            instance_id = %instance_id,
            "discarding resolution for quarantined trigger"
          );
        }
      }
      Command::Listen { idx } => self.arm(idx),
    }
  }

  /// Arm a trigger and announce it, unless a resolution is already waiting.
  fn arm(&mut self, idx: NodeIndex) {
    if !self.triggers.arm(idx) || self.triggers.has_pending(idx) {
      return;
    }

    let instance = self.ctx.graph.instance_at(idx);
    let Some(input) = instance.schema().trigger_input() else {
      return;
    };
    debug!(run_id = %self.ctx.run_id, instance_id = %instance.id(), "input_needed");
    self.ctx.emit(ExecutionEvent::InputNeeded {
      run_id: self.ctx.run_id.clone(),
      instance_id: instance.id().to_string(),
      input: input.name.clone(),
      port_type: input.port_type.to_string(),
    });
  }

  /// Confine a failure to the failed instance and everything downstream.
  fn quarantine(&mut self, idx: NodeIndex, failure: NodeFailure) {
    let closure = self.ctx.graph.downstream_closure(idx);
    warn!(
      run_id = %self.ctx.run_id,
      instance_id = %failure.instance_id,
      quarantined = closure.len(),
      "quarantining downstream of failed node"
    );

    for n in closure {
      self.ctx.queues.close(n);
      self.triggers.quarantine(n);
      self.quarantined.insert(n);
    }
    self.failures.push(failure);
  }

  /// Abort every in-flight firing and conclude the run with `error`.
  fn fail(&mut self, error: RunError) -> RunError {
    self.ctx.halt();
    self.in_flight.abort_all();

    error!(run_id = %self.ctx.run_id, error = %error, "run_error");
    self.ctx.emit(ExecutionEvent::RunError {
      run_id: self.ctx.run_id.clone(),
      error: error.to_string(),
    });
    error
  }

  fn conclude(&mut self, stopped: bool) -> Result<RunSummary, RunError> {
    if !self.failures.is_empty() {
      let failures = std::mem::take(&mut self.failures);
      return Err(self.fail(RunError::PartialFailure { failures }));
    }

    let summary = self.summary(stopped);
    if stopped {
      info!(run_id = %self.ctx.run_id, "run_stopped");
      self.ctx.emit(ExecutionEvent::RunStopped {
        run_id: self.ctx.run_id.clone(),
      });
    } else {
      info!(run_id = %self.ctx.run_id, leftover = summary.leftover.len(), "run_complete");
      self.ctx.emit(ExecutionEvent::RunComplete {
        run_id: self.ctx.run_id.clone(),
      });
    }
    Ok(summary)
  }

  fn summary(&self, stopped: bool) -> RunSummary {
    let graph = &self.ctx.graph;
    RunSummary {
      run_id: self.ctx.run_id.clone(),
      firings: graph
        .instances()
        .filter(|(idx, _)| self.firings[idx.index()] > 0)
        .map(|(idx, instance)| (instance.id().to_string(), self.firings[idx.index()]))
        .collect(),
      leftover: self.ctx.queues.leftovers(graph),
      stopped,
    }
  }
}
