use tributary_catalog::{
  CatalogError, InputPort, NodeCatalog, NodeError, NodePortSchema, Output, computation_fn,
};

fn overflow(op: &str) -> NodeError {
  NodeError::new(format!("integer overflow in {}", op))
}

fn binary(
  catalog: &mut NodeCatalog,
  name: &'static str,
  op: fn(i64, i64) -> Option<i64>,
) -> Result<(), CatalogError> {
  catalog.register(
    name,
    NodePortSchema::new()
      .category("Logic")
      .input(InputPort::new("a", "int"))
      .input(InputPort::new("b", "int"))
      .output("result", "int"),
    computation_fn(move |inputs| async move {
      let result = op(inputs.int("a")?, inputs.int("b")?).ok_or_else(|| overflow(name))?;
      Ok(vec![Output::new("result", result)])
    }),
  )
}

fn unary(
  catalog: &mut NodeCatalog,
  name: &'static str,
  op: fn(i64) -> Option<i64>,
) -> Result<(), CatalogError> {
  catalog.register(
    name,
    NodePortSchema::new()
      .category("Logic")
      .input(InputPort::new("value", "int"))
      .output("result", "int"),
    computation_fn(move |inputs| async move {
      let result = op(inputs.int("value")?).ok_or_else(|| overflow(name))?;
      Ok(vec![Output::new("result", result)])
    }),
  )
}

pub(crate) fn register(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
  binary(catalog, "add", i64::checked_add)?;
  binary(catalog, "multiply", i64::checked_mul)?;
  unary(catalog, "double", |v| v.checked_mul(2))?;
  unary(catalog, "triple", |v| v.checked_mul(3))?;
  unary(catalog, "square", |v| v.checked_mul(v))?;
  unary(catalog, "negate", i64::checked_neg)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tributary_catalog::NodeCatalog;

  use crate::testing::invoke;

  #[tokio::test]
  async fn test_math_nodes() {
    let mut catalog = NodeCatalog::new();
    super::register(&mut catalog).unwrap();

    let cases = [
      ("add", vec![("a", json!(2)), ("b", json!(3))], 5),
      ("multiply", vec![("a", json!(4)), ("b", json!(-2))], -8),
      ("double", vec![("value", json!(7))], 14),
      ("triple", vec![("value", json!(7))], 21),
      ("square", vec![("value", json!(-3))], 9),
      ("negate", vec![("value", json!(5))], -5),
    ];
    for (name, inputs, expected) in cases {
      assert_eq!(
        invoke(&catalog, name, &inputs).await.unwrap(),
        vec![("result".to_string(), json!(expected))],
        "{name}"
      );
    }
  }

  #[tokio::test]
  async fn test_overflow_is_a_node_error() {
    let mut catalog = NodeCatalog::new();
    super::register(&mut catalog).unwrap();

    let err = invoke(&catalog, "square", &[("value", json!(i64::MAX))])
      .await
      .unwrap_err();
    assert_eq!(err, "integer overflow in square");
  }
}
