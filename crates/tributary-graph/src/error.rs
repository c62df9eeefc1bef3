use thiserror::Error;

use crate::diagnostic::ValidationReport;

/// Errors raised while building a graph from a definition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
  #[error("instance '{instance_id}' has unknown node type '{type_name}'")]
  UnknownType {
    instance_id: String,
    type_name: String,
  },

  #[error("duplicate instance id: {instance_id}")]
  DuplicateInstanceId { instance_id: String },
}

/// A graph failed validation; the report lists every diagnostic.
#[derive(Debug, Error)]
#[error("graph failed validation with {} error(s)", .0.error_count())]
pub struct ValidationError(pub ValidationReport);

impl ValidationError {
  pub fn report(&self) -> &ValidationReport {
    &self.0
  }
}
