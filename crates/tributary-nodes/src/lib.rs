//! Tributary Nodes
//!
//! A reference library of node types, enough to build and run real graphs
//! from the CLI. The engine never depends on this crate; any catalog works.
//!
//! | group     | types                                                   |
//! |-----------|---------------------------------------------------------|
//! | triggers  | `trigger`, `terminal_input` (int), `text_input` (str)   |
//! | io        | `terminal_output`, `logger`, `const_int`, `const_str`   |
//! | math      | `add`, `multiply`, `double`, `triple`, `square`, `negate` |
//! | branching | `is_even`, `is_positive`, `compare`                     |
//! | text      | `to_string`, `format_text`, `concat`, `split_words`     |
//! | utility   | `passthrough`, `delay`                                  |

mod branching;
mod io;
mod math;
mod text;
mod triggers;
mod utility;

use tributary_catalog::{CatalogError, NodeCatalog};

/// Register every built-in node type.
pub fn register_builtins(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
  triggers::register(catalog)?;
  io::register(catalog)?;
  math::register(catalog)?;
  branching::register(catalog)?;
  text::register(catalog)?;
  utility::register(catalog)?;
  Ok(())
}

/// A catalog holding only the built-in node types.
pub fn builtin_catalog() -> Result<NodeCatalog, CatalogError> {
  let mut catalog = NodeCatalog::new();
  register_builtins(&mut catalog)?;
  Ok(catalog)
}
