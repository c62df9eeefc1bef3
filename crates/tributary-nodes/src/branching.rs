//! Nodes that route their input to one of several output ports.

use std::cmp::Ordering;

use tributary_catalog::{
  CatalogError, InputPort, NodeCatalog, NodePortSchema, Output, computation_fn,
};

pub(crate) fn register(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
  catalog.register(
    "is_even",
    NodePortSchema::new()
      .category("Logic")
      .input(InputPort::new("value", "int"))
      .output("yes", "int")
      .output("no", "int"),
    computation_fn(|inputs| async move {
      let value = inputs.int("value")?;
      let port = if value % 2 == 0 { "yes" } else { "no" };
      Ok(vec![Output::new(port, value)])
    }),
  )?;

  catalog.register(
    "is_positive",
    NodePortSchema::new()
      .category("Logic")
      .input(InputPort::new("value", "int"))
      .output("positive", "int")
      .output("negative", "int")
      .output("zero", "int"),
    computation_fn(|inputs| async move {
      let value = inputs.int("value")?;
      let port = match value.cmp(&0) {
        Ordering::Greater => "positive",
        Ordering::Less => "negative",
        Ordering::Equal => "zero",
      };
      Ok(vec![Output::new(port, value)])
    }),
  )?;

  // The larger value goes out on `greater`/`less`.
  catalog.register(
    "compare",
    NodePortSchema::new()
      .category("Logic")
      .input(InputPort::new("a", "int"))
      .input(InputPort::new("b", "int"))
      .output("greater", "int")
      .output("less", "int")
      .output("equal", "int"),
    computation_fn(|inputs| async move {
      let (a, b) = (inputs.int("a")?, inputs.int("b")?);
      let output = match a.cmp(&b) {
        Ordering::Greater => Output::new("greater", a),
        Ordering::Less => Output::new("less", b),
        Ordering::Equal => Output::new("equal", a),
      };
      Ok(vec![output])
    }),
  )?;

  Ok(())
}
