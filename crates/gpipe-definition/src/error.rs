use gpipe_value::EncodingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
  #[error("duplicate step id: {0}")]
  DuplicateStepId(String),

  #[error("step {index} has an empty id")]
  EmptyStepId { index: usize },

  #[error("failed to normalize pipeline input: {0}")]
  Encoding(#[from] EncodingError),
}
