use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A value pushed into an instance's input queue when a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryBinding {
  pub instance_id: String,
  pub input: String,
  pub value: Value,
}

impl EntryBinding {
  pub fn new(instance_id: impl Into<String>, input: impl Into<String>, value: impl Into<Value>) -> Self {
    Self {
      instance_id: instance_id.into(),
      input: input.into(),
      value: value.into(),
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid entry binding '{text}': expected <instance>.<input>=<value>")]
pub struct EntryBindingParseError {
  pub text: String,
}

/// Parses `instance.input=value`. The value is read as JSON and falls back
/// to a plain string. The instance id is everything before the last `.`.
impl FromStr for EntryBinding {
  type Err = EntryBindingParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || EntryBindingParseError {
      text: s.to_string(),
    };

    let (target, raw) = s.split_once('=').ok_or_else(invalid)?;
    let (instance_id, input) = target.trim().rsplit_once('.').ok_or_else(invalid)?;
    if instance_id.is_empty() || input.is_empty() {
      return Err(invalid());
    }

    let raw = raw.trim();
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok(Self::new(instance_id, input, value))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_json_and_plain_values() {
    assert_eq!(
      "const-1.value=5".parse::<EntryBinding>().unwrap(),
      EntryBinding::new("const-1", "value", 5)
    );
    assert_eq!(
      "a.b.text = hello there".parse::<EntryBinding>().unwrap(),
      EntryBinding::new("a.b", "text", "hello there")
    );
    assert_eq!(
      r#"x.cfg={"n": [1, 2]}"#.parse::<EntryBinding>().unwrap().value,
      json!({"n": [1, 2]})
    );
  }

  #[test]
  fn test_parse_rejects_missing_parts() {
    for text in ["value=5", "x.value", ".value=1", "x.=1"] {
      assert_eq!(
        text.parse::<EntryBinding>(),
        Err(EntryBindingParseError {
          text: text.to_string()
        }),
        "{text}"
      );
    }
  }
}
