use serde::{Deserialize, Serialize};

use crate::expression::{self, normalize_expression};

/// One unit of work in a pipeline.
///
/// Every field is optional. A step with nothing set is legal and encodes to
/// an empty object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
  /// Lets later steps address this step's output.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,

  /// Remote capability to invoke, e.g. "chunker/chunk".
  /// When unset the step only reshapes data through `xin`/`xout`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub function: Option<String>,

  /// Addressing expression evaluated before invocation to build the input.
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "expression::deserialize_optional"
  )]
  pub xin: Option<String>,

  /// Addressing expression evaluated after invocation to update the state.
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "expression::deserialize_optional"
  )]
  pub xout: Option<String>,
}

impl Step {
  pub fn new() -> Self {
    Self::default()
  }

  /// Step that invokes `function` with the current state as input.
  pub fn call(function: impl Into<String>) -> Self {
    Self::new().with_function(function)
  }

  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  pub fn with_function(mut self, function: impl Into<String>) -> Self {
    self.function = Some(function.into());
    self
  }

  /// Set the input expression. Common indentation and surrounding
  /// whitespace are removed.
  pub fn with_xin(mut self, xin: impl AsRef<str>) -> Self {
    self.xin = Some(normalize_expression(xin.as_ref()));
    self
  }

  /// Set the output expression. Common indentation and surrounding
  /// whitespace are removed.
  pub fn with_xout(mut self, xout: impl AsRef<str>) -> Self {
    self.xout = Some(normalize_expression(xout.as_ref()));
    self
  }

  /// True when none of the four fields is set.
  pub fn is_empty(&self) -> bool {
    self.id.is_none() && self.function.is_none() && self.xin.is_none() && self.xout.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_builder_sets_fields() {
    let step = Step::call("chunker/chunk")
      .with_id("chunking")
      .with_xin("{ text: state.fullText }");

    assert_eq!(step.id.as_deref(), Some("chunking"));
    assert_eq!(step.function.as_deref(), Some("chunker/chunk"));
    assert_eq!(step.xin.as_deref(), Some("{ text: state.fullText }"));
    assert!(step.xout.is_none());
    assert!(!step.is_empty());
  }

  #[test]
  fn test_expressions_are_normalized_on_construction() {
    let step = Step::new().with_xout(
      "
          {
              chunks: state.chunks
          }
      ",
    );
    assert_eq!(step.xout.as_deref(), Some("{\n    chunks: state.chunks\n}"));
  }

  #[test]
  fn test_empty_step_serializes_to_empty_object() {
    let step = Step::new();
    assert!(step.is_empty());
    assert_eq!(serde_json::to_value(&step).unwrap(), json!({}));
  }

  #[test]
  fn test_serialize_skips_unset_fields() {
    let step = Step::call("wikipedia/it").with_xin("{ title: start.input.page }");
    assert_eq!(
      serde_json::to_string(&step).unwrap(),
      r#"{"function":"wikipedia/it","xin":"{ title: start.input.page }"}"#
    );
  }

  #[test]
  fn test_deserialize_normalizes_expressions() {
    let step: Step =
      serde_json::from_value(json!({"id": "a", "xin": "\n    state.x\n  ", "xout": null})).unwrap();
    assert_eq!(step.id.as_deref(), Some("a"));
    assert_eq!(step.xin.as_deref(), Some("state.x"));
    assert!(step.xout.is_none());
    assert!(step.function.is_none());
  }
}
