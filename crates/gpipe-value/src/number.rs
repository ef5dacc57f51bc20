use std::fmt;

/// A numeric scalar.
///
/// Integers and floats are kept apart so that `0` and `1000.0` keep their
/// literal form through both wire formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
  /// Non-negative integer.
  PosInt(u64),
  /// Negative integer.
  NegInt(i64),
  /// Floating point value. Finite when produced by normalization.
  Float(f64),
}

impl Number {
  pub fn is_integer(&self) -> bool {
    !matches!(self, Number::Float(_))
  }

  pub fn is_float(&self) -> bool {
    matches!(self, Number::Float(_))
  }

  pub fn as_i64(&self) -> Option<i64> {
    match *self {
      Number::PosInt(n) => i64::try_from(n).ok(),
      Number::NegInt(n) => Some(n),
      Number::Float(_) => None,
    }
  }

  pub fn as_u64(&self) -> Option<u64> {
    match *self {
      Number::PosInt(n) => Some(n),
      Number::NegInt(_) | Number::Float(_) => None,
    }
  }

  pub fn as_f64(&self) -> f64 {
    match *self {
      Number::PosInt(n) => n as f64,
      Number::NegInt(n) => n as f64,
      Number::Float(f) => f,
    }
  }
}

impl From<u64> for Number {
  fn from(n: u64) -> Self {
    Number::PosInt(n)
  }
}

impl From<i64> for Number {
  fn from(n: i64) -> Self {
    if n < 0 {
      Number::NegInt(n)
    } else {
      Number::PosInt(n as u64)
    }
  }
}

impl From<f64> for Number {
  fn from(f: f64) -> Self {
    Number::Float(f)
  }
}

macro_rules! from_unsigned {
  ($($ty:ty),*) => {
    $(
      impl From<$ty> for Number {
        fn from(n: $ty) -> Self {
          Number::PosInt(n as u64)
        }
      }
    )*
  };
}

macro_rules! from_signed {
  ($($ty:ty),*) => {
    $(
      impl From<$ty> for Number {
        fn from(n: $ty) -> Self {
          Number::from(n as i64)
        }
      }
    )*
  };
}

from_unsigned!(u8, u16, u32, usize);
from_signed!(i8, i16, i32, isize);

impl From<f32> for Number {
  fn from(f: f32) -> Self {
    Number::Float(f64::from(f))
  }
}

/// Literal form used by the canonical text encoder.
///
/// Floats always carry a decimal point, and exponents always carry a sign,
/// so a reader never mistakes `1000.0` for an integer.
impl fmt::Display for Number {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      Number::PosInt(n) => write!(f, "{}", n),
      Number::NegInt(n) => write!(f, "{}", n),
      Number::Float(v) => f.write_str(&format_float(v)),
    }
  }
}

fn format_float(v: f64) -> String {
  if v.is_nan() {
    return ".nan".to_string();
  }
  if v.is_infinite() {
    return if v > 0.0 { ".inf" } else { "-.inf" }.to_string();
  }

  // `{:?}` keeps the shortest round-tripping digits and always yields either
  // a '.' or an exponent.
  let repr = format!("{:?}", v);
  match repr.split_once('e') {
    Some((mantissa, exponent)) => {
      let mantissa = if mantissa.contains('.') {
        mantissa.to_string()
      } else {
        format!("{}.0", mantissa)
      };
      let exponent = if exponent.starts_with('-') {
        exponent.to_string()
      } else {
        format!("+{}", exponent)
      };
      format!("{}e{}", mantissa, exponent)
    }
    None if repr.contains('.') => repr,
    None => format!("{}.0", repr),
  }
}
