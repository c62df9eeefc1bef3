use std::time::Duration;

use tributary_catalog::{
  CatalogError, InputPort, NodeCatalog, NodeError, NodePortSchema, Output, computation_fn,
};

pub(crate) fn register(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
  catalog.register(
    "passthrough",
    NodePortSchema::new()
      .category("Utility")
      .input(InputPort::new("value", "Any"))
      .output("out", "Any"),
    computation_fn(|mut inputs| async move {
      let value = inputs.take("value").unwrap_or_default();
      Ok(vec![Output::new("out", value)])
    }),
  )?;

  catalog.register(
    "delay",
    NodePortSchema::new()
      .category("Utility")
      .input(InputPort::new("value", "int"))
      .input(InputPort::new("seconds", "float").with_default(0.5))
      .output("out", "int"),
    computation_fn(|inputs| async move {
      let seconds = inputs.float("seconds")?;
      let wait = Duration::try_from_secs_f64(seconds)
        .map_err(|_| NodeError::new(format!("invalid delay: {} seconds", seconds)))?;
      tokio::time::sleep(wait).await;
      Ok(vec![Output::new("out", inputs.require("value")?.clone())])
    }),
  )?;

  Ok(())
}
