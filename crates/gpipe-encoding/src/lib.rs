//! gpipe Encoding
//!
//! Renders a [`Pipeline`] in the two wire formats the orchestrator accepts.
//! Both start from the same normalized [`gpipe_value::Value`], so they carry
//! identical content: the structured document (JSON) and the canonical text
//! form (YAML).
//!
//! ```
//! use gpipe_definition::{Pipeline, Step};
//! use gpipe_encoding::{WireFormat, encode};
//!
//! let mut pipeline = Pipeline::new().with_input("Dolomiti");
//! pipeline.add_step(Step::call("wikipedia/it"));
//!
//! let text = encode(&pipeline, WireFormat::Yaml).unwrap();
//! assert_eq!(
//!   text,
//!   "input: \"Dolomiti\"\n_workflow:\n  steps:\n  - function: \"wikipedia/it\"\n"
//! );
//! ```

mod document;
mod format;
mod text;

use gpipe_definition::Pipeline;
use gpipe_value::EncodingError;

pub use document::{encode_document, to_json_string, to_json_string_pretty};
pub use format::{UnknownFormat, WireFormat};
pub use text::{CanonicalWriter, DEFAULT_WIDTH, encode_text};

/// Encode a pipeline as the request body for `format`.
pub fn encode(pipeline: &Pipeline, format: WireFormat) -> Result<String, EncodingError> {
  match format {
    WireFormat::Json => to_json_string(pipeline),
    WireFormat::Yaml => encode_text(pipeline),
  }
}
