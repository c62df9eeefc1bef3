use thiserror::Error;

/// Errors raised while registering node types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
  #[error("node type already registered: {name}")]
  DuplicateType { name: String },

  #[error("invalid schema for node type '{name}': {message}")]
  InvalidSchema { name: String, message: String },
}
