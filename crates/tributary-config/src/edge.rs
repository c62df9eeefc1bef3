use serde::{Deserialize, Serialize};

/// A directed edge from one instance's output port to another instance's input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDef {
  pub source: String,
  #[serde(alias = "sourceHandle")]
  pub source_port: String,
  pub target: String,
  #[serde(alias = "targetHandle")]
  pub target_port: String,
}

impl EdgeDef {
  pub fn new(
    source: impl Into<String>,
    source_port: impl Into<String>,
    target: impl Into<String>,
    target_port: impl Into<String>,
  ) -> Self {
    Self {
      source: source.into(),
      source_port: source_port.into(),
      target: target.into(),
      target_port: target_port.into(),
    }
  }
}
