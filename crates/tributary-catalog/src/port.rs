//! Port declarations.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A port's type tag.
///
/// Tags are compared by exact string equality. The tag `Any` is a wildcard
/// that is compatible with every other tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortType(String);

impl PortType {
  pub const ANY: &'static str = "Any";

  pub fn new(tag: impl Into<String>) -> Self {
    Self(tag.into())
  }

  pub fn any() -> Self {
    Self(Self::ANY.to_string())
  }

  pub fn is_any(&self) -> bool {
    self.0 == Self::ANY
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Whether a value of this type may flow into a port of type `target`.
  pub fn compatible_with(&self, target: &PortType) -> bool {
    self.is_any() || target.is_any() || self == target
  }
}

impl fmt::Display for PortType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for PortType {
  fn from(tag: &str) -> Self {
    Self::new(tag)
  }
}

impl From<String> for PortType {
  fn from(tag: String) -> Self {
    Self(tag)
  }
}

/// A declared input port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputPort {
  pub name: String,
  #[serde(rename = "type")]
  pub port_type: PortType,
  /// Injected into the input's queue once, before anything fires.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub initial: Option<serde_json::Value>,
  /// Substituted at firing time when the input has no inbound edge.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<serde_json::Value>,
}

impl InputPort {
  pub fn new(name: impl Into<String>, port_type: impl Into<PortType>) -> Self {
    Self {
      name: name.into(),
      port_type: port_type.into(),
      initial: None,
      default: None,
    }
  }

  pub fn with_initial(mut self, value: impl Into<serde_json::Value>) -> Self {
    self.initial = Some(value.into());
    self
  }

  pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
    self.default = Some(value.into());
    self
  }
}

/// A declared output port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPort {
  pub name: String,
  #[serde(rename = "type")]
  pub port_type: PortType,
}

/// The port schema of a node type.
///
/// Inputs and outputs keep their declaration order. A trigger schema has
/// exactly one input, which receives externally supplied values instead of
/// queued data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodePortSchema {
  pub inputs: Vec<InputPort>,
  pub outputs: Vec<OutputPort>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub trigger: bool,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub log_sink: bool,
  /// Palette group shown in node listings, e.g. `Math`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
}

impl NodePortSchema {
  pub fn new() -> Self {
    Self::default()
  }

  /// Schema for an external entry point fed through `input`.
  pub fn trigger(input: InputPort) -> Self {
    Self {
      inputs: vec![input],
      trigger: true,
      ..Self::default()
    }
  }

  pub fn input(mut self, port: InputPort) -> Self {
    self.inputs.push(port);
    self
  }

  pub fn output(mut self, name: impl Into<String>, port_type: impl Into<PortType>) -> Self {
    self.outputs.push(OutputPort {
      name: name.into(),
      port_type: port_type.into(),
    });
    self
  }

  /// Mark the type as a log sink: every value it outputs is also reported as a log line.
  pub fn log_sink(mut self) -> Self {
    self.log_sink = true;
    self
  }

  pub fn category(mut self, category: impl Into<String>) -> Self {
    self.category = Some(category.into());
    self
  }

  pub fn get_input(&self, name: &str) -> Option<&InputPort> {
    self.inputs.iter().find(|p| p.name == name)
  }

  pub fn input_position(&self, name: &str) -> Option<usize> {
    self.inputs.iter().position(|p| p.name == name)
  }

  pub fn get_output(&self, name: &str) -> Option<&OutputPort> {
    self.outputs.iter().find(|p| p.name == name)
  }

  /// The port external values are delivered to, for trigger schemas.
  pub fn trigger_input(&self) -> Option<&InputPort> {
    if self.trigger {
      self.inputs.first()
    } else {
      None
    }
  }

  pub(crate) fn check(&self, type_name: &str) -> Result<(), CatalogError> {
    let invalid = |message: String| CatalogError::InvalidSchema {
      name: type_name.to_string(),
      message,
    };

    let mut seen = HashSet::new();
    for port in &self.inputs {
      if !seen.insert(port.name.as_str()) {
        return Err(invalid(format!("duplicate input port '{}'", port.name)));
      }
    }

    seen.clear();
    for port in &self.outputs {
      if !seen.insert(port.name.as_str()) {
        return Err(invalid(format!("duplicate output port '{}'", port.name)));
      }
    }

    if self.trigger && self.inputs.len() != 1 {
      return Err(invalid(format!(
        "trigger must declare exactly one input, found {}",
        self.inputs.len()
      )));
    }

    Ok(())
  }
}
