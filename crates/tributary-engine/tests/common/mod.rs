//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tributary_catalog::{InputPort, NodeCatalog, NodeError, NodePortSchema, Output, computation_fn};
use tributary_config::GraphDef;
use tributary_engine::ExecutionEvent;
use tributary_graph::ValidatedGraph;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// A small catalog covering triggers, sinks, failures and log output.
pub fn catalog() -> NodeCatalog {
  let mut catalog = NodeCatalog::new();

  catalog
    .register(
      "input",
      NodePortSchema::trigger(InputPort::new("value", "int")).output("value", "int"),
      computation_fn(|inputs| async move {
        Ok(vec![Output::new("value", inputs.require("value")?.clone())])
      }),
    )
    .unwrap();
  catalog
    .register(
      "const",
      NodePortSchema::new()
        .input(InputPort::new("value", "int").with_initial(3))
        .output("value", "int"),
      computation_fn(|inputs| async move {
        Ok(vec![Output::new("value", inputs.int("value")?)])
      }),
    )
    .unwrap();
  catalog
    .register(
      "pass",
      NodePortSchema::new()
        .input(InputPort::new("value", "Any"))
        .output("value", "Any"),
      computation_fn(|inputs| async move {
        Ok(vec![Output::new("value", inputs.require("value")?.clone())])
      }),
    )
    .unwrap();
  catalog
    .register(
      "double",
      NodePortSchema::new()
        .input(InputPort::new("value", "int"))
        .output("result", "int"),
      computation_fn(|inputs| async move {
        Ok(vec![Output::new("result", inputs.int("value")? * 2)])
      }),
    )
    .unwrap();
  catalog
    .register(
      "add",
      NodePortSchema::new()
        .input(InputPort::new("a", "int"))
        .input(InputPort::new("b", "int").with_default(1))
        .output("result", "int"),
      computation_fn(|inputs| async move {
        Ok(vec![Output::new("result", inputs.int("a")? + inputs.int("b")?)])
      }),
    )
    .unwrap();
  catalog
    .register(
      "sink",
      NodePortSchema::new()
        .input(InputPort::new("value", "Any"))
        .output("value", "Any"),
      computation_fn(|inputs| async move {
        Ok(vec![Output::new("value", inputs.require("value")?.clone())])
      }),
    )
    .unwrap();
  catalog
    .register(
      "fail",
      NodePortSchema::new()
        .input(InputPort::new("value", "Any"))
        .output("value", "Any"),
      computation_fn(|_| async move { Err::<Vec<Output>, _>(NodeError::new("boom")) }),
    )
    .unwrap();
  catalog
    .register(
      "countdown",
      NodePortSchema::new()
        .input(InputPort::new("value", "int").with_initial(3))
        .output("next", "int")
        .output("done", "int"),
      computation_fn(|inputs| async move {
        let n = inputs.int("value")?;
        if n > 0 {
          Ok(vec![Output::new("next", n - 1)])
        } else {
          Ok(vec![Output::new("done", n)])
        }
      }),
    )
    .unwrap();
  catalog
    .register(
      "logger",
      NodePortSchema::new()
        .input(InputPort::new("value", "Any"))
        .output("line", "Any")
        .log_sink(),
      computation_fn(|inputs| async move {
        Ok(vec![Output::new("line", inputs.require("value")?.clone())])
      }),
    )
    .unwrap();

  catalog
}

pub fn validated(catalog: &NodeCatalog, def: &GraphDef) -> ValidatedGraph {
  tributary_graph::build(catalog, def)
    .unwrap()
    .into_validated()
    .unwrap()
}

pub async fn next_event(events: &mut mpsc::UnboundedReceiver<ExecutionEvent>) -> ExecutionEvent {
  tokio::time::timeout(TIMEOUT, events.recv())
    .await
    .expect("timed out waiting for an event")
    .expect("event channel closed")
}

/// Receive events into `seen` until one matches `pred`.
pub async fn wait_for(
  events: &mut mpsc::UnboundedReceiver<ExecutionEvent>,
  seen: &mut Vec<ExecutionEvent>,
  pred: impl Fn(&ExecutionEvent) -> bool,
) {
  loop {
    let event = next_event(events).await;
    let done = pred(&event);
    seen.push(event);
    if done {
      return;
    }
  }
}

/// Receive events into `seen` until the run concludes.
pub async fn drain(
  events: &mut mpsc::UnboundedReceiver<ExecutionEvent>,
  seen: &mut Vec<ExecutionEvent>,
) {
  wait_for(events, seen, ExecutionEvent::is_terminal).await;
}

pub fn is_output_of(event: &ExecutionEvent, id: &str) -> bool {
  matches!(event, ExecutionEvent::NodeOutput { instance_id, .. } if instance_id == id)
}

pub fn is_input_needed(event: &ExecutionEvent, id: &str) -> bool {
  matches!(event, ExecutionEvent::InputNeeded { instance_id, .. } if instance_id == id)
}

/// Values output by `id`, in emission order.
pub fn outputs_of(events: &[ExecutionEvent], id: &str) -> Vec<Value> {
  events
    .iter()
    .filter_map(|e| match e {
      ExecutionEvent::NodeOutput {
        instance_id, value, ..
      } if instance_id == id => Some(value.clone()),
      _ => None,
    })
    .collect()
}

pub fn position(events: &[ExecutionEvent], pred: impl Fn(&ExecutionEvent) -> bool) -> usize {
  events
    .iter()
    .position(pred)
    .unwrap_or_else(|| panic!("event not found in {:?}", events))
}

pub fn count(events: &[ExecutionEvent], pred: impl Fn(&ExecutionEvent) -> bool) -> usize {
  events.iter().filter(|e| pred(e)).count()
}

pub fn ints(values: &[i64]) -> Vec<Value> {
  values.iter().map(|v| json!(v)).collect()
}
