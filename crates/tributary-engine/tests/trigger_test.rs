//! Integration tests for the trigger protocol: input_needed, resolution,
//! re-arming and stopping.

mod common;

use std::time::Duration;

use common::*;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tributary_catalog::{InputPort, NodePortSchema, Output, computation_fn};
use tributary_config::GraphDef;
use tributary_engine::{
  ChannelSink, Engine, EngineConfig, EngineError, ExecutionEvent, TriggerMode,
};

fn engine(mode: TriggerMode) -> (Engine<ChannelSink>, UnboundedReceiver<ExecutionEvent>) {
  let (sink, events) = ChannelSink::channel();
  let config = EngineConfig {
    trigger_mode: mode,
    ..EngineConfig::default()
  };
  (Engine::with_sink(config, sink), events)
}

fn chat() -> GraphDef {
  GraphDef::default()
    .instance("in", "input")
    .instance("p", "pass")
    .instance("out", "sink")
    .edge("in", "value", "p", "value")
    .edge("p", "value", "out", "value")
}

#[tokio::test]
async fn test_resolve_trigger_round_trip() {
  let (engine, mut events) = engine(TriggerMode::Once);
  let handle = engine.start(validated(&catalog(), &chat()));

  let mut seen = Vec::new();
  wait_for(&mut events, &mut seen, |e| is_input_needed(e, "in")).await;
  assert!(matches!(
    seen.last(),
    Some(ExecutionEvent::InputNeeded { input, port_type, .. }) if input == "value" && port_type == "int"
  ));

  handle.resolve_trigger("in", 5).unwrap();
  wait_for(&mut events, &mut seen, |e| is_output_of(e, "out")).await;
  let summary = handle.wait().await.unwrap();
  drain(&mut events, &mut seen).await;

  let outputs: Vec<_> = seen
    .iter()
    .filter_map(|e| match e {
      ExecutionEvent::NodeOutput {
        instance_id, value, ..
      } if instance_id != "in" => Some((instance_id.as_str(), value.clone())),
      _ => None,
    })
    .collect();
  assert_eq!(outputs, vec![("p", json!(5)), ("out", json!(5))]);
  assert_eq!(count(&seen, |e| is_input_needed(e, "in")), 1);
  assert!(matches!(seen.last(), Some(ExecutionEvent::RunStopped { .. })));
  assert_eq!(summary.firings_of("in"), 1);
  assert!(summary.leftover.is_empty());
}

#[tokio::test]
async fn test_repeat_mode_rearms_after_each_firing() {
  let (engine, mut events) = engine(TriggerMode::Repeat);
  let handle = engine.start(validated(&catalog(), &chat()));

  let mut seen = Vec::new();
  wait_for(&mut events, &mut seen, |e| is_input_needed(e, "in")).await;
  handle.resolve_trigger("in", 1).unwrap();
  wait_for(&mut events, &mut seen, |e| is_input_needed(e, "in")).await;
  handle.resolve_trigger("in", 2).unwrap();
  wait_for(&mut events, &mut seen, |e| is_input_needed(e, "in")).await;

  handle.stop();
  drain(&mut events, &mut seen).await;
  let summary = handle.wait().await.unwrap();

  assert_eq!(outputs_of(&seen, "in"), ints(&[1, 2]));
  assert_eq!(count(&seen, |e| is_input_needed(e, "in")), 3);
  assert!(matches!(seen.last(), Some(ExecutionEvent::RunStopped { .. })));
  assert!(summary.stopped);
}

#[tokio::test]
async fn test_rapid_resolutions_are_each_consumed_in_order() {
  let (engine, mut events) = engine(TriggerMode::Repeat);
  let handle = engine.start(validated(&catalog(), &chat()));

  for value in [1, 2, 3] {
    handle.resolve_trigger("in", value).unwrap();
  }

  let mut seen = Vec::new();
  wait_for(&mut events, &mut seen, |e| {
    matches!(e, ExecutionEvent::NodeOutput { instance_id, value, .. } if instance_id == "out" && value == &json!(3))
  })
  .await;
  handle.stop();
  drain(&mut events, &mut seen).await;
  let summary = handle.wait().await.unwrap();

  assert_eq!(outputs_of(&seen, "out"), ints(&[1, 2, 3]));
  assert_eq!(summary.firings_of("in"), 3);
}

#[tokio::test]
async fn test_once_mode_waits_for_listen_before_announcing_again() {
  let (engine, mut events) = engine(TriggerMode::Once);
  let handle = engine.start(validated(&catalog(), &chat()));

  let mut seen = Vec::new();
  handle.resolve_trigger("in", 1).unwrap();
  wait_for(&mut events, &mut seen, |e| is_output_of(e, "out")).await;
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert!(!handle.controller().is_finished());
  assert_eq!(count(&seen, |e| is_input_needed(e, "in")), 1);

  handle.listen("in").unwrap();
  wait_for(&mut events, &mut seen, |e| is_input_needed(e, "in")).await;
  handle.resolve_trigger("in", 2).unwrap();
  wait_for(&mut events, &mut seen, |e| is_output_of(e, "out")).await;

  handle.stop();
  drain(&mut events, &mut seen).await;
  let summary = handle.wait().await.unwrap();

  assert_eq!(outputs_of(&seen, "out"), ints(&[1, 2]));
  assert_eq!(count(&seen, |e| is_input_needed(e, "in")), 2);
  assert!(summary.stopped);
}

#[tokio::test]
async fn test_once_mode_parked_trigger_ends_when_controllers_drop() {
  let (engine, mut events) = engine(TriggerMode::Once);
  let handle = engine.start(validated(&catalog(), &chat()));

  let mut seen = Vec::new();
  handle.resolve_trigger("in", 4).unwrap();
  wait_for(&mut events, &mut seen, |e| is_output_of(e, "out")).await;
  let summary = tokio::time::timeout(TIMEOUT, handle.wait())
    .await
    .expect("parked trigger outlived its controllers")
    .unwrap();

  assert!(summary.stopped);
  assert_eq!(summary.firings_of("out"), 1);
}

#[tokio::test]
async fn test_waiting_trigger_does_not_block_independent_branch() {
  let def = chat()
    .instance("c", "const")
    .instance("d", "double")
    .edge("c", "value", "d", "value");
  let (engine, mut events) = engine(TriggerMode::Repeat);
  let handle = engine.start(validated(&catalog(), &def));

  let mut seen = Vec::new();
  wait_for(&mut events, &mut seen, |e| is_output_of(e, "d")).await;
  assert_eq!(outputs_of(&seen, "d"), ints(&[6]));
  assert!(!handle.controller().is_finished());

  handle.stop();
  drain(&mut events, &mut seen).await;
  assert!(handle.wait().await.unwrap().stopped);
}

#[tokio::test]
async fn test_resolve_rejects_bad_targets() {
  let (engine, _events) = engine(TriggerMode::Once);
  let handle = engine.start(validated(&catalog(), &chat()));

  assert_eq!(
    handle.resolve_trigger("ghost", 1),
    Err(EngineError::UnknownInstance {
      instance_id: "ghost".into()
    })
  );
  assert_eq!(
    handle.listen("p"),
    Err(EngineError::NotATrigger {
      instance_id: "p".into()
    })
  );

  let controller = handle.controller();
  handle.resolve_trigger("in", 1).unwrap();
  handle.stop();
  handle.wait().await.unwrap();

  assert!(controller.is_finished());
  assert_eq!(
    controller.resolve_trigger("in", 2),
    Err(EngineError::RunFinished)
  );
}

#[tokio::test]
async fn test_dropping_every_controller_stops_an_idle_run() {
  let engine = Engine::new(EngineConfig::default());

  let summary = tokio::time::timeout(TIMEOUT, engine.run(validated(&catalog(), &chat())))
    .await
    .expect("run kept waiting with no controller left")
    .unwrap();

  assert!(summary.stopped);
  assert!(summary.firings.is_empty());
}

#[tokio::test]
async fn test_stop_lets_in_flight_firings_finish() {
  let mut catalog = catalog();
  catalog
    .register(
      "slow",
      NodePortSchema::new()
        .input(InputPort::new("value", "int"))
        .output("value", "int"),
      computation_fn(|inputs| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(vec![Output::new("value", inputs.int("value")?)])
      }),
    )
    .unwrap();
  let def = GraphDef::default()
    .instance("in", "input")
    .instance("s", "slow")
    .instance("out", "sink")
    .edge("in", "value", "s", "value")
    .edge("s", "value", "out", "value");
  let (engine, mut events) = engine(TriggerMode::Repeat);
  let handle = engine.start(validated(&catalog, &def));

  let mut seen = Vec::new();
  handle.resolve_trigger("in", 7).unwrap();
  wait_for(&mut events, &mut seen, |e| {
    matches!(e, ExecutionEvent::NodeStart { instance_id, .. } if instance_id == "s")
  })
  .await;
  handle.stop();
  drain(&mut events, &mut seen).await;
  let summary = handle.wait().await.unwrap();

  assert_eq!(outputs_of(&seen, "s"), ints(&[7]));
  assert!(outputs_of(&seen, "out").is_empty());
  assert_eq!(summary.leftover.get("out.value"), Some(&1));
  assert!(summary.stopped);
}
