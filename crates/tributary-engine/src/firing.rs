//! A single firing of an instance.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use tributary_catalog::{Inputs, NodeError};
use tributary_config::FailurePolicy;
use tributary_graph::NodeIndex;

use crate::context::RunContext;
use crate::events::ExecutionEvent;

/// Run the instance's computation with `inputs`, streaming each output into
/// the downstream queues as soon as it is produced.
///
/// `node_start` has already been emitted by the scheduler. This emits
/// `node_output` (and `log` for log sinks) per output, then `node_done` or
/// `node_error`. Under fail-fast, the first failing firing halts the run and
/// is the only one to report `node_error`.
#[instrument(
  name = "fire",
  skip_all,
  fields(
    run_id = %ctx.run_id,
    instance_id = %ctx.graph.instance_at(idx).id(),
  )
)]
pub(crate) async fn fire(
  ctx: Arc<RunContext>,
  idx: NodeIndex,
  inputs: Inputs,
) -> Result<(), NodeError> {
  let result = drive(&ctx, idx, inputs).await;

  match &result {
    Ok(()) if !ctx.is_halted() => {
      debug!("node_done");
      ctx.emit(ExecutionEvent::NodeDone {
        run_id: ctx.run_id.clone(),
        instance_id: ctx.instance_id(idx),
      });
    }
    Ok(()) => {}
    Err(e) => {
      let first = match ctx.policy {
        FailurePolicy::FailFast => !ctx.halt(),
        FailurePolicy::Isolate => true,
      };
      if first {
        warn!(error = %e, "node_error");
        ctx.emit(ExecutionEvent::NodeError {
          run_id: ctx.run_id.clone(),
          instance_id: ctx.instance_id(idx),
          error: e.to_string(),
        });
      }
    }
  }

  result
}

async fn drive(ctx: &RunContext, idx: NodeIndex, inputs: Inputs) -> Result<(), NodeError> {
  let instance = ctx.graph.instance_at(idx);
  let schema = instance.schema();
  let computation = instance.node_type().computation();

  let mut outputs =
    panic::catch_unwind(AssertUnwindSafe(|| computation.invoke(inputs))).map_err(panicked)?;

  while let Some(item) = AssertUnwindSafe(outputs.next())
    .catch_unwind()
    .await
    .map_err(panicked)?
  {
    let output = item?;
    if schema.get_output(&output.port).is_none() {
      return Err(NodeError::new(format!(
        "produced undeclared output port '{}'",
        output.port
      )));
    }
    if ctx.is_halted() {
      return Ok(());
    }

    debug!(port = %output.port, "node_output");
    ctx.emit(ExecutionEvent::NodeOutput {
      run_id: ctx.run_id.clone(),
      instance_id: instance.id().to_string(),
      port: output.port.clone(),
      value: output.value.clone(),
    });
    if schema.log_sink {
      ctx.emit(ExecutionEvent::Log {
        run_id: ctx.run_id.clone(),
        instance_id: instance.id().to_string(),
        message: log_line(&output.value),
      });
    }

    ctx.route(idx, &output.port, output.value);
  }

  Ok(())
}

fn log_line(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn panicked(payload: Box<dyn Any + Send>) -> NodeError {
  let message = payload
    .downcast_ref::<&str>()
    .map(|s| s.to_string())
    .or_else(|| payload.downcast_ref::<String>().cloned())
    .unwrap_or_else(|| "unknown panic".to_string());
  NodeError::new(format!("computation panicked: {}", message))
}
