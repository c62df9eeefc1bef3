use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::edge::EdgeDef;
use crate::entry::EntryBinding;
use crate::instance::InstanceDef;

/// A graph definition before it is resolved against a node catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  pub instances: Vec<InstanceDef>,
  #[serde(default)]
  pub edges: Vec<EdgeDef>,
  /// Values queued on specific inputs before anything fires.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub entries: Vec<EntryBinding>,
}

impl GraphDef {
  /// Parse a definition from a JSON string.
  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }

  pub fn instance(mut self, id: impl Into<String>, node_type: impl Into<String>) -> Self {
    self.instances.push(InstanceDef::new(id, node_type));
    self
  }

  pub fn edge(
    mut self,
    source: impl Into<String>,
    source_port: impl Into<String>,
    target: impl Into<String>,
    target_port: impl Into<String>,
  ) -> Self {
    self
      .edges
      .push(EdgeDef::new(source, source_port, target, target_port));
    self
  }

  pub fn bind(
    mut self,
    instance_id: impl Into<String>,
    input: impl Into<String>,
    value: impl Into<Value>,
  ) -> Self {
    self
      .entries
      .push(EntryBinding::new(instance_id, input, value));
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_editor_wire_format() {
    let def = GraphDef::from_json(
      r#"{
        "name": "even/odd",
        "instances": [
          { "id": "in-1", "type": "terminal_input" },
          { "id": "check-1", "type": "is_even" }
        ],
        "edges": [
          { "source": "in-1", "sourceHandle": "out", "target": "check-1", "targetHandle": "value" }
        ]
      }"#,
    )
    .unwrap();

    assert_eq!(def.name.as_deref(), Some("even/odd"));
    assert_eq!(def.instances[1], InstanceDef::new("check-1", "is_even"));
    assert_eq!(def.edges[0], EdgeDef::new("in-1", "out", "check-1", "value"));
  }

  #[test]
  fn test_parse_entries() {
    let def = GraphDef::from_json(
      r#"{
        "instances": [{ "id": "c", "type": "double" }],
        "entries": [{ "instance_id": "c", "input": "value", "value": 8 }]
      }"#,
    )
    .unwrap();

    assert_eq!(def, GraphDef::default().instance("c", "double").bind("c", "value", 8));
  }

  #[test]
  fn test_edges_default_to_empty() {
    let def = GraphDef::from_json(r#"{ "instances": [{ "id": "a", "type": "logger" }] }"#).unwrap();
    assert!(def.edges.is_empty());
    assert!(def.entries.is_empty());
    assert!(def.name.is_none());
  }

  #[test]
  fn test_builder_round_trips_through_json() {
    let def = GraphDef::default()
      .instance("a", "const_int")
      .instance("b", "double")
      .edge("a", "out", "b", "value");

    let json = serde_json::to_string(&def).unwrap();
    assert!(json.contains(r#""type":"const_int""#));
    assert_eq!(GraphDef::from_json(&json).unwrap(), def);
  }

  #[test]
  fn test_policy_enums_are_snake_case() {
    assert_eq!(
      serde_json::to_string(&crate::FailurePolicy::FailFast).unwrap(),
      r#""fail_fast""#
    );
    let mode: crate::TriggerMode = serde_json::from_str(r#""once""#).unwrap();
    assert_eq!(mode, crate::TriggerMode::Once);
  }
}
