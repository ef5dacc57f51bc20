use std::fmt::Display;

use thiserror::Error;

/// Errors raised while converting a value into the [`Value`](crate::Value) model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
  /// A map key that is not a string, char or integer.
  #[error("map keys must be strings, found {0}")]
  KeyMustBeString(&'static str),

  /// NaN or an infinity, which neither wire format can carry.
  #[error("number is not finite: {0}")]
  NonFiniteNumber(f64),

  /// A 128-bit integer that does not fit the 64-bit number model.
  #[error("integer out of range: {0}")]
  IntegerOutOfRange(String),

  /// A data shape the value model has no representation for.
  #[error("unsupported value type: {0}")]
  Unsupported(&'static str),

  /// Error reported by a `Serialize` implementation.
  #[error("{0}")]
  Custom(String),
}

impl serde::ser::Error for EncodingError {
  fn custom<T: Display>(msg: T) -> Self {
    EncodingError::Custom(msg.to_string())
  }
}
