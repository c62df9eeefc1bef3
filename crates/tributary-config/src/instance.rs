use serde::{Deserialize, Serialize};

/// A placed occurrence of a node type within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDef {
  pub id: String,
  #[serde(rename = "type")]
  pub node_type: String,
}

impl InstanceDef {
  pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      node_type: node_type.into(),
    }
  }
}
