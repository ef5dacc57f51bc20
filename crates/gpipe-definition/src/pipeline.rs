use std::collections::HashSet;

use gpipe_value::{Value, normalize};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

use crate::error::DefinitionError;
use crate::step::Step;

/// A pipeline definition: a free-form input payload plus an ordered list of
/// steps.
///
/// Step order is the default execution order. On the wire the steps live
/// under `_workflow.steps`:
///
/// ```json
/// { "input": "Dolomiti", "_workflow": { "steps": [ { "function": "wikipedia/it" } ] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "PipelineFile")]
pub struct Pipeline {
  /// Runtime payload handed to the first step. Opaque to this crate.
  pub input: Option<Value>,
  pub steps: Vec<Step>,
}

impl Pipeline {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_input(mut self, input: impl Into<Value>) -> Self {
    self.input = Some(input.into());
    self
  }

  /// Set the input from any serializable value, such as a caller struct or
  /// a `serde_json::Value`.
  pub fn try_with_input<T: serde::Serialize + ?Sized>(
    mut self,
    input: &T,
  ) -> Result<Self, DefinitionError> {
    self.input = Some(normalize(input)?);
    Ok(self)
  }

  /// Append a step. Returns `&mut Self` so calls can be chained.
  pub fn add_step(&mut self, step: Step) -> &mut Self {
    self.steps.push(step);
    self
  }

  /// Append a step from its four optional fields.
  pub fn step(
    &mut self,
    id: Option<&str>,
    function: Option<&str>,
    xin: Option<&str>,
    xout: Option<&str>,
  ) -> &mut Self {
    let mut step = Step::new();
    if let Some(id) = id {
      step = step.with_id(id);
    }
    if let Some(function) = function {
      step = step.with_function(function);
    }
    if let Some(xin) = xin {
      step = step.with_xin(xin);
    }
    if let Some(xout) = xout {
      step = step.with_xout(xout);
    }
    self.add_step(step)
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  /// Find a step by id.
  pub fn find_step(&self, id: &str) -> Option<&Step> {
    self.steps.iter().find(|s| s.id.as_deref() == Some(id))
  }

  /// Check that step ids can be used to address step outputs: ids must be
  /// non-empty and unique. Steps without an id are ignored.
  pub fn validate(&self) -> Result<(), DefinitionError> {
    let mut seen = HashSet::new();
    for (index, step) in self.steps.iter().enumerate() {
      let Some(id) = step.id.as_deref() else {
        continue;
      };
      if id.is_empty() {
        return Err(DefinitionError::EmptyStepId { index });
      }
      if !seen.insert(id) {
        return Err(DefinitionError::DuplicateStepId(id.to_string()));
      }
    }
    Ok(())
  }
}

/// The steps block nested under `_workflow`.
struct WorkflowBlock<'a> {
  steps: &'a [Step],
}

impl Serialize for WorkflowBlock<'_> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut block = serializer.serialize_struct("WorkflowBlock", 1)?;
    block.serialize_field("steps", self.steps)?;
    block.end()
  }
}

impl Serialize for Pipeline {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let fields = if self.input.is_some() { 2 } else { 1 };
    let mut envelope = serializer.serialize_struct("Pipeline", fields)?;
    if let Some(input) = &self.input {
      envelope.serialize_field("input", input)?;
    } else {
      envelope.skip_field("input")?;
    }
    envelope.serialize_field("_workflow", &WorkflowBlock { steps: &self.steps })?;
    envelope.end()
  }
}

/// On-disk definition form. Accepts top-level `steps`, the wire form's
/// `_workflow.steps`, or both (top-level steps first).
#[derive(Deserialize)]
struct PipelineFile {
  #[serde(default)]
  input: Option<Value>,
  #[serde(default)]
  steps: Vec<Step>,
  #[serde(default, rename = "_workflow")]
  workflow: Option<WorkflowFile>,
}

#[derive(Deserialize)]
struct WorkflowFile {
  #[serde(default)]
  steps: Vec<Step>,
}

impl From<PipelineFile> for Pipeline {
  fn from(file: PipelineFile) -> Self {
    let mut steps = file.steps;
    if let Some(workflow) = file.workflow {
      steps.extend(workflow.steps);
    }
    Pipeline {
      input: file.input,
      steps,
    }
  }
}
