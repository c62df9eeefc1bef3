use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which side of an edge a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
  Input,
  Output,
}

impl fmt::Display for PortDirection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PortDirection::Input => f.write_str("input"),
      PortDirection::Output => f.write_str("output"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
  Error,
  Warning,
}

/// A single validation finding. `edge` and `entry` fields are indexes into
/// the definition's edge and entry binding lists.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
  #[error("edge {edge}: unknown instance '{instance_id}'")]
  UnknownInstance { edge: usize, instance_id: String },

  #[error("edge {edge}: instance '{instance_id}' has no {direction} port '{port}'")]
  UnknownPort {
    edge: usize,
    instance_id: String,
    port: String,
    direction: PortDirection,
  },

  #[error("edge {edge}: instance '{instance_id}' is a trigger and cannot be an edge target")]
  TriggerTarget { edge: usize, instance_id: String },

  #[error(
    "edge {edge}: type mismatch {source_instance}.{source_port} ({source_type}) -> {target_instance}.{target_port} ({target_type})"
  )]
  TypeMismatch {
    edge: usize,
    source_instance: String,
    source_port: String,
    source_type: String,
    target_instance: String,
    target_port: String,
    target_type: String,
  },

  #[error("cycle [{}] has no member that can fire without data from the cycle", instances.join(", "))]
  UnstartableCycle { instances: Vec<String> },

  #[error("entry {entry}: no instance '{instance_id}' with input '{input}'")]
  UnknownBinding {
    entry: usize,
    instance_id: String,
    input: String,
  },

  #[error("entry {entry}: instance '{instance_id}' is a trigger and takes values only through resolution")]
  BindingToTrigger { entry: usize, instance_id: String },

  #[error("instance '{instance_id}' input '{input}' has no edge, initial value, or default")]
  UnfedInput { instance_id: String, input: String },

  #[error("instance '{instance_id}' can never fire: no input is wired, seeded, or bound")]
  NeverReady { instance_id: String },
}

impl Diagnostic {
  pub fn severity(&self) -> Severity {
    match self {
      Diagnostic::UnfedInput { .. } | Diagnostic::NeverReady { .. } => Severity::Warning,
      _ => Severity::Error,
    }
  }

  pub fn is_error(&self) -> bool {
    self.severity() == Severity::Error
  }

  /// The instance the finding is about. For type mismatches this is the
  /// edge's target; for cycles, the first member.
  pub fn instance_id(&self) -> Option<&str> {
    match self {
      Diagnostic::UnknownInstance { instance_id, .. }
      | Diagnostic::UnknownPort { instance_id, .. }
      | Diagnostic::TriggerTarget { instance_id, .. }
      | Diagnostic::UnknownBinding { instance_id, .. }
      | Diagnostic::BindingToTrigger { instance_id, .. }
      | Diagnostic::UnfedInput { instance_id, .. }
      | Diagnostic::NeverReady { instance_id } => Some(instance_id),
      Diagnostic::TypeMismatch {
        target_instance, ..
      } => Some(target_instance),
      Diagnostic::UnstartableCycle { instances } => instances.first().map(String::as_str),
    }
  }
}

/// The ordered result of validating a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
  diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
  pub(crate) fn new(diagnostics: Vec<Diagnostic>) -> Self {
    Self { diagnostics }
  }

  /// True when there are no errors. Warnings do not make a graph invalid.
  pub fn is_valid(&self) -> bool {
    self.error_count() == 0
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| d.is_error())
  }

  pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| !d.is_error())
  }

  pub fn error_count(&self) -> usize {
    self.errors().count()
  }

  pub fn into_diagnostics(self) -> Vec<Diagnostic> {
    self.diagnostics
  }
}
