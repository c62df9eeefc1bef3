//! Sinks and constants.

use serde_json::Value;
use tributary_catalog::{
  CatalogError, InputPort, NodeCatalog, NodePortSchema, Output, computation_fn,
};

/// Strings print bare; everything else prints as JSON.
pub(crate) fn display(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

pub(crate) fn register(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
  catalog.register(
    "terminal_output",
    NodePortSchema::new()
      .category("Outputs")
      .input(InputPort::new("value", "Any"))
      .output("done", "str"),
    computation_fn(|inputs| async move {
      Ok(vec![Output::new("done", display(inputs.require("value")?))])
    }),
  )?;

  catalog.register(
    "logger",
    NodePortSchema::new()
      .category("Outputs")
      .input(InputPort::new("msg", "Any"))
      .output("logged", "str")
      .log_sink(),
    computation_fn(|inputs| async move {
      Ok(vec![Output::new("logged", display(inputs.require("msg")?))])
    }),
  )?;

  catalog.register(
    "const_int",
    NodePortSchema::new()
      .category("Constants")
      .input(InputPort::new("value", "int").with_initial(0))
      .output("out", "int"),
    computation_fn(|inputs| async move { Ok(vec![Output::new("out", inputs.int("value")?)]) }),
  )?;

  catalog.register(
    "const_str",
    NodePortSchema::new()
      .category("Constants")
      .input(InputPort::new("value", "str").with_initial(""))
      .output("out", "str"),
    computation_fn(|inputs| async move { Ok(vec![Output::new("out", inputs.str("value")?)]) }),
  )?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tributary_catalog::NodeCatalog;

  use crate::testing::invoke;

  fn catalog() -> NodeCatalog {
    let mut catalog = NodeCatalog::new();
    super::register(&mut catalog).unwrap();
    catalog
  }

  #[tokio::test]
  async fn test_terminal_output_displays_value() {
    let catalog = catalog();

    assert_eq!(
      invoke(&catalog, "terminal_output", &[("value", json!("ok"))])
        .await
        .unwrap(),
      vec![("done".to_string(), json!("ok"))]
    );
    assert_eq!(
      invoke(&catalog, "terminal_output", &[("value", json!({"a": 1}))])
        .await
        .unwrap(),
      vec![("done".to_string(), json!(r#"{"a":1}"#))]
    );
  }

  #[test]
  fn test_logger_is_a_log_sink_and_constants_are_seeded() {
    let catalog = catalog();

    assert!(catalog.get("logger").unwrap().schema().log_sink);
    let const_int = catalog.get("const_int").unwrap();
    assert_eq!(const_int.schema().inputs[0].initial, Some(json!(0)));
  }
}
