//! Tributary Graph
//!
//! Turns a [`GraphDef`](tributary_config::GraphDef) into an executable graph.
//!
//! ```text
//! GraphDef ──build(catalog)──▶ Graph ──validate()──▶ ValidationReport
//!                                 └──into_validated()──▶ ValidatedGraph ──▶ engine
//! ```
//!
//! - [`build`] resolves type names against a [`NodeCatalog`](tributary_catalog::NodeCatalog)
//!   and rejects duplicate instance ids. It does no semantic checking.
//! - [`validate`] checks endpoints, port types, and cycle safety, collecting
//!   every problem instead of stopping at the first one.
//! - [`ValidatedGraph`] is the only form the engine accepts, so a graph that
//!   failed validation can never be run.

mod build;
mod diagnostic;
mod error;
mod graph;
mod validate;

pub use build::build;
pub use diagnostic::{Diagnostic, PortDirection, Severity, ValidationReport};
pub use error::{BuildError, ValidationError};
pub use graph::{Graph, Instance, Wire};
pub use petgraph::graph::NodeIndex;
pub use validate::{ValidatedGraph, validate};
