use tributary_catalog::{
  CatalogError, InputPort, NodeCatalog, NodePortSchema, Output, computation_fn,
};

pub(crate) fn register(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
  for (name, port_type) in [
    ("trigger", "int"),
    ("terminal_input", "int"),
    ("text_input", "str"),
  ] {
    catalog.register(
      name,
      NodePortSchema::trigger(InputPort::new("value", port_type))
        .output("out", port_type)
        .category("Triggers"),
      computation_fn(|inputs| async move {
        Ok(vec![Output::new("out", inputs.require("value")?.clone())])
      }),
    )?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tributary_catalog::NodeCatalog;

  use crate::testing::invoke;

  #[tokio::test]
  async fn test_trigger_emits_resolved_value() {
    let mut catalog = NodeCatalog::new();
    super::register(&mut catalog).unwrap();

    for name in ["trigger", "terminal_input", "text_input"] {
      assert!(catalog.get(name).unwrap().is_trigger(), "{name}");
    }
    assert_eq!(
      invoke(&catalog, "trigger", &[("value", json!(9))]).await.unwrap(),
      vec![("out".to_string(), json!(9))]
    );
    assert_eq!(
      invoke(&catalog, "text_input", &[("value", json!("hi"))])
        .await
        .unwrap(),
      vec![("out".to_string(), json!("hi"))]
    );
  }
}
