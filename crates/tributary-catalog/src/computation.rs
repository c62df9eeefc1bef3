//! Computation units.
//!
//! A computation is invoked once per firing with the values bound to the
//! instance's inputs. It answers with a stream of outputs, so a node can emit
//! partial results while it is still working and downstream instances can
//! start on them immediately.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;
use thiserror::Error;

/// The lazily produced outputs of one firing.
pub type OutputStream = BoxStream<'static, Result<Output, NodeError>>;

/// A node type's behavior.
pub trait Computation: Send + Sync {
  /// Start a firing with the given bound inputs.
  fn invoke(&self, inputs: Inputs) -> OutputStream;
}

/// One value emitted on an output port.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
  pub port: String,
  pub value: Value,
}

impl Output {
  pub fn new(port: impl Into<String>, value: impl Into<Value>) -> Self {
    Self {
      port: port.into(),
      value: value.into(),
    }
  }
}

/// An error raised by a computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NodeError {
  message: String,
}

impl NodeError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

/// Argument values for one firing, keyed by input name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs(BTreeMap<String, Value>);

impl Inputs {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, value: Value) {
    self.0.insert(name.into(), value);
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.0.get(name)
  }

  /// Remove and return a value, leaving the rest in place.
  pub fn take(&mut self, name: &str) -> Option<Value> {
    self.0.remove(name)
  }

  pub fn require(&self, name: &str) -> Result<&Value, NodeError> {
    self
      .get(name)
      .ok_or_else(|| NodeError::new(format!("missing input '{}'", name)))
  }

  pub fn int(&self, name: &str) -> Result<i64, NodeError> {
    let value = self.require(name)?;
    value
      .as_i64()
      .ok_or_else(|| NodeError::new(format!("input '{}' is not an integer: {}", name, value)))
  }

  pub fn float(&self, name: &str) -> Result<f64, NodeError> {
    let value = self.require(name)?;
    value
      .as_f64()
      .ok_or_else(|| NodeError::new(format!("input '{}' is not a number: {}", name, value)))
  }

  pub fn str(&self, name: &str) -> Result<&str, NodeError> {
    let value = self.require(name)?;
    value
      .as_str()
      .ok_or_else(|| NodeError::new(format!("input '{}' is not a string: {}", name, value)))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl FromIterator<(String, Value)> for Inputs {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

struct FnComputation<F>(F);

impl<F, Fut> Computation for FnComputation<F>
where
  F: Fn(Inputs) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Vec<Output>, NodeError>> + Send + 'static,
{
  fn invoke(&self, inputs: Inputs) -> OutputStream {
    stream::once((self.0)(inputs))
      .flat_map(|result| {
        let items: Vec<Result<Output, NodeError>> = match result {
          Ok(outputs) => outputs.into_iter().map(Ok).collect(),
          Err(e) => vec![Err(e)],
        };
        stream::iter(items)
      })
      .boxed()
  }
}

struct StreamComputation<F>(F);

impl<F, S> Computation for StreamComputation<F>
where
  F: Fn(Inputs) -> S + Send + Sync,
  S: Stream<Item = Result<Output, NodeError>> + Send + 'static,
{
  fn invoke(&self, inputs: Inputs) -> OutputStream {
    (self.0)(inputs).boxed()
  }
}

/// Wrap an async function that returns all of its outputs at once.
pub fn computation_fn<F, Fut>(f: F) -> Arc<dyn Computation>
where
  F: Fn(Inputs) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Vec<Output>, NodeError>> + Send + 'static,
{
  Arc::new(FnComputation(f))
}

/// Wrap a function that returns a stream of outputs.
pub fn stream_fn<F, S>(f: F) -> Arc<dyn Computation>
where
  F: Fn(Inputs) -> S + Send + Sync + 'static,
  S: Stream<Item = Result<Output, NodeError>> + Send + 'static,
{
  Arc::new(StreamComputation(f))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_computation_fn_yields_each_output() {
    let add = computation_fn(|inputs: Inputs| async move {
      let sum = inputs.int("a")? + inputs.int("b")?;
      Ok(vec![Output::new("result", sum), Output::new("done", true)])
    });

    let inputs: Inputs = [("a".to_string(), json!(2)), ("b".to_string(), json!(3))]
      .into_iter()
      .collect();
    let outputs: Vec<_> = add.invoke(inputs).collect().await;

    assert_eq!(
      outputs,
      vec![
        Ok(Output::new("result", 5)),
        Ok(Output::new("done", true))
      ]
    );
  }

  #[tokio::test]
  async fn test_computation_fn_error_becomes_single_item() {
    let failing = computation_fn(|inputs: Inputs| async move {
      inputs.int("missing")?;
      Ok(vec![])
    });

    let outputs: Vec<_> = failing.invoke(Inputs::new()).collect().await;
    assert_eq!(outputs, vec![Err(NodeError::new("missing input 'missing'"))]);
  }

  #[tokio::test]
  async fn test_stream_fn_passes_stream_through() {
    let counter = stream_fn(|_inputs| stream::iter((1..=3).map(|i| Ok(Output::new("n", i)))));

    let values: Vec<Value> = counter
      .invoke(Inputs::new())
      .map(|r| r.unwrap().value)
      .collect()
      .await;
    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
  }

  #[test]
  fn test_typed_accessors_report_wrong_types() {
    let mut inputs = Inputs::new();
    inputs.insert("text", json!("hello"));

    assert_eq!(inputs.str("text").unwrap(), "hello");
    let err = inputs.int("text").unwrap_err();
    assert!(err.message().contains("not an integer"));
    assert_eq!(inputs.take("text"), Some(json!("hello")));
    assert!(inputs.is_empty());
  }
}
