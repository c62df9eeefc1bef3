use async_stream::stream;
use tributary_catalog::{
  CatalogError, InputPort, NodeCatalog, NodeError, NodePortSchema, Output, computation_fn,
  stream_fn,
};

use crate::io::display;

pub(crate) fn register(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
  catalog.register(
    "to_string",
    NodePortSchema::new()
      .category("String")
      .input(InputPort::new("value", "int"))
      .output("result", "str"),
    computation_fn(|inputs| async move {
      Ok(vec![Output::new("result", display(inputs.require("value")?))])
    }),
  )?;

  // Every `{}` in the template is replaced by the value.
  catalog.register(
    "format_text",
    NodePortSchema::new()
      .category("String")
      .input(InputPort::new("template", "str").with_default("Value: {}"))
      .input(InputPort::new("value", "int").with_default(0))
      .output("result", "str"),
    computation_fn(|inputs| async move {
      let text = inputs
        .str("template")?
        .replace("{}", &display(inputs.require("value")?));
      Ok(vec![Output::new("result", text)])
    }),
  )?;

  catalog.register(
    "concat",
    NodePortSchema::new()
      .category("String")
      .input(InputPort::new("a", "str"))
      .input(InputPort::new("b", "str"))
      .output("result", "str"),
    computation_fn(|inputs| async move {
      let text = format!("{}{}", inputs.str("a")?, inputs.str("b")?);
      Ok(vec![Output::new("result", text)])
    }),
  )?;

  catalog.register(
    "split_words",
    NodePortSchema::new()
      .category("String")
      .input(InputPort::new("text", "str"))
      .output("word", "str")
      .output("count", "int"),
    stream_fn(|inputs| {
      stream! {
        let text = match inputs.str("text") {
          Ok(text) => text.to_string(),
          Err(e) => {
            yield Err(e);
            return;
          }
        };
        let mut count = 0;
        for word in text.split_whitespace() {
          count += 1;
          yield Ok::<_, NodeError>(Output::new("word", word));
          // Let downstream instances run between words.
          tokio::task::yield_now().await;
        }
        yield Ok(Output::new("count", count));
      }
    }),
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
  async fn test_format_text_fills_template() {
    let outputs = invoke(
      &catalog(),
      "format_text",
      &[("template", json!("{} apples")), ("value", json!(3))],
    )
    .await
    .unwrap();

    assert_eq!(outputs, vec![("result".to_string(), json!("3 apples"))]);
  }

  #[tokio::test]
  async fn test_concat_requires_strings() {
    let catalog = catalog();

    assert_eq!(
      invoke(&catalog, "concat", &[("a", json!("ab")), ("b", json!("cd"))])
        .await
        .unwrap(),
      vec![("result".to_string(), json!("abcd"))]
    );
    let err = invoke(&catalog, "concat", &[("a", json!("ab")), ("b", json!(1))])
      .await
      .unwrap_err();
    assert!(err.contains("not a string"));
  }

  #[tokio::test]
  async fn test_split_words_streams_one_output_per_word() {
    let outputs = invoke(&catalog(), "split_words", &[("text", json!("  the quick fox "))])
      .await
      .unwrap();

    assert_eq!(
      outputs,
      vec![
        ("word".to_string(), json!("the")),
        ("word".to_string(), json!("quick")),
        ("word".to_string(), json!("fox")),
        ("count".to_string(), json!(3)),
      ]
    );
  }
}
