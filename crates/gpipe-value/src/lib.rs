//! gpipe Value
//!
//! The value model every pipeline definition passes through on its way to a
//! wire format, and the normalization pass that produces it.
//!
//! [`Value`] is a plain tagged union (null, bool, number, string, sequence,
//! insertion-ordered mapping). [`normalize`] converts any `Serialize` type
//! into it, omitting absent values at every depth, so the encoders never
//! see a caller's own types.

mod error;
mod normalize;
mod number;
mod value;

pub use error::EncodingError;
pub use normalize::normalize;
pub use number::Number;
pub use value::{Mapping, Value};
