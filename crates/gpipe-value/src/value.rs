use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::number::Number;

/// Insertion-ordered mapping with unique keys.
pub type Mapping = IndexMap<String, Value>;

static NULL: Value = Value::Null;

/// The canonical intermediate form every pipeline is converted to before
/// it is rendered in a wire format.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Number(Number),
  String(String),
  Sequence(Vec<Value>),
  Mapping(Mapping),
}

impl Value {
  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_number(&self) -> Option<&Number> {
    match self {
      Value::Number(n) => Some(n),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    self.as_number().and_then(Number::as_i64)
  }

  pub fn as_u64(&self) -> Option<u64> {
    self.as_number().and_then(Number::as_u64)
  }

  pub fn as_f64(&self) -> Option<f64> {
    self.as_number().map(Number::as_f64)
  }

  pub fn as_sequence(&self) -> Option<&Vec<Value>> {
    match self {
      Value::Sequence(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_mapping(&self) -> Option<&Mapping> {
    match self {
      Value::Mapping(map) => Some(map),
      _ => None,
    }
  }

  pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
    match self {
      Value::Mapping(map) => Some(map),
      _ => None,
    }
  }

  /// Look up a key when this value is a mapping.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.as_mapping().and_then(|map| map.get(key))
  }

  /// Short name of the variant, used in diagnostics.
  pub fn kind(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Sequence(_) => "sequence",
      Value::Mapping(_) => "mapping",
    }
  }
}

impl Index<&str> for Value {
  type Output = Value;

  /// Missing keys and non-mappings index to `Null`.
  fn index(&self, key: &str) -> &Value {
    self.get(key).unwrap_or(&NULL)
  }
}

impl Index<usize> for Value {
  type Output = Value;

  fn index(&self, index: usize) -> &Value {
    self
      .as_sequence()
      .and_then(|items| items.get(index))
      .unwrap_or(&NULL)
  }
}

impl PartialEq<str> for Value {
  fn eq(&self, other: &str) -> bool {
    self.as_str() == Some(other)
  }
}

impl PartialEq<&str> for Value {
  fn eq(&self, other: &&str) -> bool {
    self.as_str() == Some(*other)
  }
}

impl PartialEq<bool> for Value {
  fn eq(&self, other: &bool) -> bool {
    self.as_bool() == Some(*other)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::String(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::String(s)
  }
}

impl From<Number> for Value {
  fn from(n: Number) -> Self {
    Value::Number(n)
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::Sequence(items)
  }
}

impl From<Mapping> for Value {
  fn from(map: Mapping) -> Self {
    Value::Mapping(map)
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(opt: Option<T>) -> Self {
    opt.map(Into::into).unwrap_or(Value::Null)
  }
}

macro_rules! from_number {
  ($($ty:ty),*) => {
    $(
      impl From<$ty> for Value {
        fn from(n: $ty) -> Self {
          Value::Number(Number::from(n))
        }
      }
    )*
  };
}

from_number!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Value::Mapping(
      iter
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect(),
    )
  }
}

impl Serialize for Value {
  /// `Null` serializes as unit, which the normalization pass treats as an
  /// absent value.
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Value::Null => serializer.serialize_unit(),
      Value::Bool(b) => serializer.serialize_bool(*b),
      Value::Number(Number::PosInt(n)) => serializer.serialize_u64(*n),
      Value::Number(Number::NegInt(n)) => serializer.serialize_i64(*n),
      Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
      Value::String(s) => serializer.serialize_str(s),
      Value::Sequence(items) => {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
          seq.serialize_element(item)?;
        }
        seq.end()
      }
      Value::Mapping(entries) => {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
          map.serialize_entry(key, value)?;
        }
        map.end()
      }
    }
  }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
  type Value = Value;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("any structured-document value")
  }

  fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
    Ok(Value::Bool(b))
  }

  fn visit_i64<E>(self, n: i64) -> Result<Value, E> {
    Ok(Value::Number(Number::from(n)))
  }

  fn visit_u64<E>(self, n: u64) -> Result<Value, E> {
    Ok(Value::Number(Number::PosInt(n)))
  }

  fn visit_f64<E>(self, f: f64) -> Result<Value, E> {
    Ok(Value::Number(Number::Float(f)))
  }

  fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
    Ok(Value::String(s.to_string()))
  }

  fn visit_string<E>(self, s: String) -> Result<Value, E> {
    Ok(Value::String(s))
  }

  fn visit_unit<E>(self) -> Result<Value, E> {
    Ok(Value::Null)
  }

  fn visit_none<E>(self) -> Result<Value, E> {
    Ok(Value::Null)
  }

  fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
    Deserialize::deserialize(deserializer)
  }

  fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
    let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
    while let Some(item) = seq.next_element()? {
      items.push(item);
    }
    Ok(Value::Sequence(items))
  }

  fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
    let mut map = Mapping::with_capacity(access.size_hint().unwrap_or(0));
    while let Some((key, value)) = access.next_entry::<String, Value>()? {
      map.insert(key, value);
    }
    Ok(Value::Mapping(map))
  }
}

impl<'de> Deserialize<'de> for Value {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    deserializer.deserialize_any(ValueVisitor)
  }
}
