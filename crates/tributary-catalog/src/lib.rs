//! Tributary Catalog
//!
//! The node catalog maps a type name to everything the engine needs to place
//! and fire an instance of that type:
//!
//! - a [`NodePortSchema`] declaring typed input and output ports, initial and
//!   default values, and the trigger / log-sink capability flags
//! - a [`Computation`] capability object, invoked with bound inputs and
//!   producing a lazy stream of `(port, value)` outputs
//!
//! The engine treats computations as opaque. New node types are added by
//! registering them here; nothing in the graph or engine crates changes.
//!
//! ```ignore
//! let mut catalog = NodeCatalog::new();
//! catalog.register(
//!   "double",
//!   NodePortSchema::new()
//!     .input(InputPort::new("value", "int"))
//!     .output("result", "int"),
//!   computation_fn(|inputs| async move {
//!     Ok(vec![Output::new("result", inputs.int("value")? * 2)])
//!   }),
//! )?;
//! ```

mod catalog;
mod computation;
mod error;
mod port;

pub use catalog::{NodeCatalog, NodeType};
pub use computation::{
  Computation, Inputs, NodeError, Output, OutputStream, computation_fn, stream_fn,
};
pub use error::CatalogError;
pub use port::{InputPort, NodePortSchema, OutputPort, PortType};
