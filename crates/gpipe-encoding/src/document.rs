//! Structured-document encoder.
//!
//! The document is the normalized [`Value`] itself; rendering it is left to
//! `serde_json`, which keeps mapping keys in insertion order.

use gpipe_definition::Pipeline;
use gpipe_value::{EncodingError, Value, normalize};

/// Normalize a pipeline into its wire document:
/// `{ "input": ..., "_workflow": { "steps": [...] } }`, with `input` left
/// out when unset.
pub fn encode_document(pipeline: &Pipeline) -> Result<Value, EncodingError> {
  normalize(pipeline)
}

/// Compact JSON rendering of [`encode_document`].
pub fn to_json_string(pipeline: &Pipeline) -> Result<String, EncodingError> {
  let document = encode_document(pipeline)?;
  serde_json::to_string(&document).map_err(|e| EncodingError::Custom(e.to_string()))
}

/// Two-space indented JSON rendering of [`encode_document`].
pub fn to_json_string_pretty(pipeline: &Pipeline) -> Result<String, EncodingError> {
  let document = encode_document(pipeline)?;
  serde_json::to_string_pretty(&document).map_err(|e| EncodingError::Custom(e.to_string()))
}
