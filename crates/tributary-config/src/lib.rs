//! Tributary Config
//!
//! This crate contains the serializable graph definition types for tributary.
//! A definition is a flat list of node instances and port-to-port edges, as
//! produced by an editor or written by hand. It carries no schema information;
//! the builder in `tributary-graph` resolves each instance's type name against
//! a node catalog.
//!
//! Definitions are loaded from JSON files (via the CLI) and accept the editor's
//! `sourceHandle`/`targetHandle` wire names as aliases for the port fields.
//! Entry bindings seed chosen inputs with values at run start; the CLI also
//! accepts them as `instance.input=value` flags.

mod edge;
mod entry;
mod enums;
mod graph;
mod instance;

pub use edge::EdgeDef;
pub use entry::{EntryBinding, EntryBindingParseError};
pub use enums::{FailurePolicy, TriggerMode};
pub use graph::GraphDef;
pub use instance::InstanceDef;
