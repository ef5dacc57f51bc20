//! Normalization pass.
//!
//! Converts anything that implements [`Serialize`] into the [`Value`] model.
//! This is the only place where caller-defined structs, maps and sequences
//! cross into the encoders.
//!
//! The one rule that matters: an absent value is omitted, never encoded as
//! null. `None`, `()` and unit structs are absent, and so is `Value::Null`.
//! Struct fields, map entries and sequence elements that turn out absent are
//! dropped, at every depth.
//!
//! ```
//! use gpipe_value::normalize;
//!
//! #[derive(serde::Serialize)]
//! struct Source {
//!   page: &'static str,
//!   lang: Option<&'static str>,
//! }
//!
//! let value = normalize(&Source { page: "Dolomiti", lang: None }).unwrap();
//! assert_eq!(value["page"], "Dolomiti");
//! assert!(value.get("lang").is_none());
//! ```

use serde::ser::{self, Impossible, Serialize};

use crate::error::EncodingError;
use crate::number::Number;
use crate::value::{Mapping, Value};

/// Normalize a value into the [`Value`] model, dropping absent values.
///
/// A value that is absent at the top level yields [`Value::Null`].
pub fn normalize<T: Serialize + ?Sized>(value: &T) -> Result<Value, EncodingError> {
  Ok(value.serialize(Normalizer)?.unwrap_or(Value::Null))
}

/// `Ok(None)` means the serialized value is absent.
struct Normalizer;

type Normalized = Option<Value>;

impl ser::Serializer for Normalizer {
  type Ok = Normalized;
  type Error = EncodingError;

  type SerializeSeq = SeqNormalizer;
  type SerializeTuple = SeqNormalizer;
  type SerializeTupleStruct = SeqNormalizer;
  type SerializeTupleVariant = VariantNormalizer<SeqNormalizer>;
  type SerializeMap = MapNormalizer;
  type SerializeStruct = MapNormalizer;
  type SerializeStructVariant = VariantNormalizer<MapNormalizer>;

  fn serialize_bool(self, v: bool) -> Result<Normalized, EncodingError> {
    Ok(Some(Value::Bool(v)))
  }

  fn serialize_i8(self, v: i8) -> Result<Normalized, EncodingError> {
    self.serialize_i64(i64::from(v))
  }

  fn serialize_i16(self, v: i16) -> Result<Normalized, EncodingError> {
    self.serialize_i64(i64::from(v))
  }

  fn serialize_i32(self, v: i32) -> Result<Normalized, EncodingError> {
    self.serialize_i64(i64::from(v))
  }

  fn serialize_i64(self, v: i64) -> Result<Normalized, EncodingError> {
    Ok(Some(Value::Number(Number::from(v))))
  }

  fn serialize_i128(self, v: i128) -> Result<Normalized, EncodingError> {
    if let Ok(n) = u64::try_from(v) {
      Ok(Some(Value::Number(Number::PosInt(n))))
    } else if let Ok(n) = i64::try_from(v) {
      Ok(Some(Value::Number(Number::NegInt(n))))
    } else {
      Err(EncodingError::IntegerOutOfRange(v.to_string()))
    }
  }

  fn serialize_u8(self, v: u8) -> Result<Normalized, EncodingError> {
    self.serialize_u64(u64::from(v))
  }

  fn serialize_u16(self, v: u16) -> Result<Normalized, EncodingError> {
    self.serialize_u64(u64::from(v))
  }

  fn serialize_u32(self, v: u32) -> Result<Normalized, EncodingError> {
    self.serialize_u64(u64::from(v))
  }

  fn serialize_u64(self, v: u64) -> Result<Normalized, EncodingError> {
    Ok(Some(Value::Number(Number::PosInt(v))))
  }

  fn serialize_u128(self, v: u128) -> Result<Normalized, EncodingError> {
    u64::try_from(v)
      .map(|n| Some(Value::Number(Number::PosInt(n))))
      .map_err(|_| EncodingError::IntegerOutOfRange(v.to_string()))
  }

  fn serialize_f32(self, v: f32) -> Result<Normalized, EncodingError> {
    self.serialize_f64(f64::from(v))
  }

  fn serialize_f64(self, v: f64) -> Result<Normalized, EncodingError> {
    if v.is_finite() {
      Ok(Some(Value::Number(Number::Float(v))))
    } else {
      Err(EncodingError::NonFiniteNumber(v))
    }
  }

  fn serialize_char(self, v: char) -> Result<Normalized, EncodingError> {
    Ok(Some(Value::String(v.to_string())))
  }

  fn serialize_str(self, v: &str) -> Result<Normalized, EncodingError> {
    Ok(Some(Value::String(v.to_string())))
  }

  fn serialize_bytes(self, _v: &[u8]) -> Result<Normalized, EncodingError> {
    Err(EncodingError::Unsupported("bytes"))
  }

  fn serialize_none(self) -> Result<Normalized, EncodingError> {
    Ok(None)
  }

  fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Normalized, EncodingError> {
    value.serialize(self)
  }

  fn serialize_unit(self) -> Result<Normalized, EncodingError> {
    Ok(None)
  }

  fn serialize_unit_struct(self, _name: &'static str) -> Result<Normalized, EncodingError> {
    Ok(None)
  }

  fn serialize_unit_variant(
    self,
    _name: &'static str,
    _index: u32,
    variant: &'static str,
  ) -> Result<Normalized, EncodingError> {
    Ok(Some(Value::String(variant.to_string())))
  }

  fn serialize_newtype_struct<T: Serialize + ?Sized>(
    self,
    _name: &'static str,
    value: &T,
  ) -> Result<Normalized, EncodingError> {
    value.serialize(self)
  }

  fn serialize_newtype_variant<T: Serialize + ?Sized>(
    self,
    _name: &'static str,
    _index: u32,
    variant: &'static str,
    value: &T,
  ) -> Result<Normalized, EncodingError> {
    let mut map = Mapping::new();
    if let Some(inner) = value.serialize(Normalizer)? {
      map.insert(variant.to_string(), inner);
    }
    Ok(Some(Value::Mapping(map)))
  }

  fn serialize_seq(self, len: Option<usize>) -> Result<SeqNormalizer, EncodingError> {
    Ok(SeqNormalizer {
      items: Vec::with_capacity(len.unwrap_or(0)),
    })
  }

  fn serialize_tuple(self, len: usize) -> Result<SeqNormalizer, EncodingError> {
    self.serialize_seq(Some(len))
  }

  fn serialize_tuple_struct(
    self,
    _name: &'static str,
    len: usize,
  ) -> Result<SeqNormalizer, EncodingError> {
    self.serialize_seq(Some(len))
  }

  fn serialize_tuple_variant(
    self,
    _name: &'static str,
    _index: u32,
    variant: &'static str,
    len: usize,
  ) -> Result<VariantNormalizer<SeqNormalizer>, EncodingError> {
    Ok(VariantNormalizer {
      variant,
      inner: self.serialize_seq(Some(len))?,
    })
  }

  fn serialize_map(self, len: Option<usize>) -> Result<MapNormalizer, EncodingError> {
    Ok(MapNormalizer {
      map: Mapping::with_capacity(len.unwrap_or(0)),
      next_key: None,
    })
  }

  fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapNormalizer, EncodingError> {
    self.serialize_map(Some(len))
  }

  fn serialize_struct_variant(
    self,
    _name: &'static str,
    _index: u32,
    variant: &'static str,
    len: usize,
  ) -> Result<VariantNormalizer<MapNormalizer>, EncodingError> {
    Ok(VariantNormalizer {
      variant,
      inner: self.serialize_map(Some(len))?,
    })
  }
}

struct SeqNormalizer {
  items: Vec<Value>,
}

impl SeqNormalizer {
  fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodingError> {
    if let Some(item) = value.serialize(Normalizer)? {
      self.items.push(item);
    }
    Ok(())
  }

  fn finish(self) -> Value {
    Value::Sequence(self.items)
  }
}

impl ser::SerializeSeq for SeqNormalizer {
  type Ok = Normalized;
  type Error = EncodingError;

  fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodingError> {
    self.push(value)
  }

  fn end(self) -> Result<Normalized, EncodingError> {
    Ok(Some(self.finish()))
  }
}

impl ser::SerializeTuple for SeqNormalizer {
  type Ok = Normalized;
  type Error = EncodingError;

  fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodingError> {
    self.push(value)
  }

  fn end(self) -> Result<Normalized, EncodingError> {
    Ok(Some(self.finish()))
  }
}

impl ser::SerializeTupleStruct for SeqNormalizer {
  type Ok = Normalized;
  type Error = EncodingError;

  fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodingError> {
    self.push(value)
  }

  fn end(self) -> Result<Normalized, EncodingError> {
    Ok(Some(self.finish()))
  }
}

struct MapNormalizer {
  map: Mapping,
  next_key: Option<String>,
}

impl MapNormalizer {
  fn insert<T: Serialize + ?Sized>(&mut self, key: String, value: &T) -> Result<(), EncodingError> {
    if let Some(value) = value.serialize(Normalizer)? {
      self.map.insert(key, value);
    }
    Ok(())
  }

  fn finish(self) -> Value {
    Value::Mapping(self.map)
  }
}

impl ser::SerializeMap for MapNormalizer {
  type Ok = Normalized;
  type Error = EncodingError;

  fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), EncodingError> {
    self.next_key = Some(key.serialize(KeyNormalizer)?);
    Ok(())
  }

  fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodingError> {
    let key = self
      .next_key
      .take()
      .ok_or_else(|| EncodingError::Custom("map value serialized before its key".to_string()))?;
    self.insert(key, value)
  }

  fn end(self) -> Result<Normalized, EncodingError> {
    Ok(Some(self.finish()))
  }
}

impl ser::SerializeStruct for MapNormalizer {
  type Ok = Normalized;
  type Error = EncodingError;

  fn serialize_field<T: Serialize + ?Sized>(
    &mut self,
    key: &'static str,
    value: &T,
  ) -> Result<(), EncodingError> {
    self.insert(key.to_string(), value)
  }

  fn end(self) -> Result<Normalized, EncodingError> {
    Ok(Some(self.finish()))
  }
}

/// Wraps a tuple or struct variant payload as `{variant: payload}`.
struct VariantNormalizer<S> {
  variant: &'static str,
  inner: S,
}

impl<S> VariantNormalizer<S> {
  fn wrap(variant: &'static str, payload: Value) -> Normalized {
    let mut map = Mapping::new();
    map.insert(variant.to_string(), payload);
    Some(Value::Mapping(map))
  }
}

impl ser::SerializeTupleVariant for VariantNormalizer<SeqNormalizer> {
  type Ok = Normalized;
  type Error = EncodingError;

  fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodingError> {
    self.inner.push(value)
  }

  fn end(self) -> Result<Normalized, EncodingError> {
    Ok(Self::wrap(self.variant, self.inner.finish()))
  }
}

impl ser::SerializeStructVariant for VariantNormalizer<MapNormalizer> {
  type Ok = Normalized;
  type Error = EncodingError;

  fn serialize_field<T: Serialize + ?Sized>(
    &mut self,
    key: &'static str,
    value: &T,
  ) -> Result<(), EncodingError> {
    self.inner.insert(key.to_string(), value)
  }

  fn end(self) -> Result<Normalized, EncodingError> {
    Ok(Self::wrap(self.variant, self.inner.finish()))
  }
}

/// Accepts the key shapes a mapping may carry and renders them as strings.
struct KeyNormalizer;

impl KeyNormalizer {
  fn reject(kind: &'static str) -> EncodingError {
    EncodingError::KeyMustBeString(kind)
  }
}

impl ser::Serializer for KeyNormalizer {
  type Ok = String;
  type Error = EncodingError;

  type SerializeSeq = Impossible<String, EncodingError>;
  type SerializeTuple = Impossible<String, EncodingError>;
  type SerializeTupleStruct = Impossible<String, EncodingError>;
  type SerializeTupleVariant = Impossible<String, EncodingError>;
  type SerializeMap = Impossible<String, EncodingError>;
  type SerializeStruct = Impossible<String, EncodingError>;
  type SerializeStructVariant = Impossible<String, EncodingError>;

  fn serialize_bool(self, _v: bool) -> Result<String, EncodingError> {
    Err(Self::reject("bool"))
  }

  fn serialize_i8(self, v: i8) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_i16(self, v: i16) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_i32(self, v: i32) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_i64(self, v: i64) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_i128(self, v: i128) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_u8(self, v: u8) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_u16(self, v: u16) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_u32(self, v: u32) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_u64(self, v: u64) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_u128(self, v: u128) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_f32(self, _v: f32) -> Result<String, EncodingError> {
    Err(Self::reject("float"))
  }

  fn serialize_f64(self, _v: f64) -> Result<String, EncodingError> {
    Err(Self::reject("float"))
  }

  fn serialize_char(self, v: char) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_str(self, v: &str) -> Result<String, EncodingError> {
    Ok(v.to_string())
  }

  fn serialize_bytes(self, _v: &[u8]) -> Result<String, EncodingError> {
    Err(Self::reject("bytes"))
  }

  fn serialize_none(self) -> Result<String, EncodingError> {
    Err(Self::reject("none"))
  }

  fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<String, EncodingError> {
    value.serialize(self)
  }

  fn serialize_unit(self) -> Result<String, EncodingError> {
    Err(Self::reject("unit"))
  }

  fn serialize_unit_struct(self, _name: &'static str) -> Result<String, EncodingError> {
    Err(Self::reject("unit struct"))
  }

  fn serialize_unit_variant(
    self,
    _name: &'static str,
    _index: u32,
    variant: &'static str,
  ) -> Result<String, EncodingError> {
    Ok(variant.to_string())
  }

  fn serialize_newtype_struct<T: Serialize + ?Sized>(
    self,
    _name: &'static str,
    value: &T,
  ) -> Result<String, EncodingError> {
    value.serialize(self)
  }

  fn serialize_newtype_variant<T: Serialize + ?Sized>(
    self,
    _name: &'static str,
    _index: u32,
    _variant: &'static str,
    _value: &T,
  ) -> Result<String, EncodingError> {
    Err(Self::reject("enum"))
  }

  fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, EncodingError> {
    Err(Self::reject("sequence"))
  }

  fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, EncodingError> {
    Err(Self::reject("tuple"))
  }

  fn serialize_tuple_struct(
    self,
    _name: &'static str,
    _len: usize,
  ) -> Result<Self::SerializeTupleStruct, EncodingError> {
    Err(Self::reject("tuple struct"))
  }

  fn serialize_tuple_variant(
    self,
    _name: &'static str,
    _index: u32,
    _variant: &'static str,
    _len: usize,
  ) -> Result<Self::SerializeTupleVariant, EncodingError> {
    Err(Self::reject("enum"))
  }

  fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, EncodingError> {
    Err(Self::reject("map"))
  }

  fn serialize_struct(
    self,
    _name: &'static str,
    _len: usize,
  ) -> Result<Self::SerializeStruct, EncodingError> {
    Err(Self::reject("struct"))
  }

  fn serialize_struct_variant(
    self,
    _name: &'static str,
    _index: u32,
    _variant: &'static str,
    _len: usize,
  ) -> Result<Self::SerializeStructVariant, EncodingError> {
    Err(Self::reject("enum"))
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use serde::Serialize;
  use serde_json::json;

  use super::*;

  #[derive(Serialize)]
  struct Page {
    title: String,
    lang: Option<String>,
    tags: Vec<Option<String>>,
  }

  #[derive(Serialize)]
  struct Nested {
    page: Page,
    extra: Option<Page>,
  }

  #[derive(Serialize)]
  enum Mode {
    Fast,
    Limited(u32),
    Window { from: u32, to: Option<u32> },
  }

  fn to_json(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap()
  }

  #[test]
  fn test_struct_drops_absent_fields() {
    let page = Page {
      title: "Dolomiti".to_string(),
      lang: None,
      tags: vec![],
    };
    let value = normalize(&page).unwrap();
    assert_eq!(to_json(&value), json!({"title": "Dolomiti", "tags": []}));
  }

  #[test]
  fn test_sequence_drops_absent_elements() {
    let page = Page {
      title: "t".to_string(),
      lang: Some("it".to_string()),
      tags: vec![Some("a".to_string()), None, Some("b".to_string())],
    };
    let value = normalize(&page).unwrap();
    assert_eq!(value["tags"], Value::Sequence(vec!["a".into(), "b".into()]));
  }

  #[test]
  fn test_absent_dropped_at_every_depth() {
    let nested = Nested {
      page: Page {
        title: "t".to_string(),
        lang: None,
        tags: vec![None],
      },
      extra: None,
    };
    let value = normalize(&nested).unwrap();
    assert_eq!(to_json(&value), json!({"page": {"title": "t", "tags": []}}));
  }

  #[test]
  fn test_map_drops_null_entries_and_keeps_order() {
    let mut map = Mapping::new();
    map.insert("z".to_string(), Value::from(1));
    map.insert("gone".to_string(), Value::Null);
    map.insert("a".to_string(), Value::Sequence(vec![Value::Null, true.into()]));
    let value = normalize(&Value::Mapping(map)).unwrap();

    let keys: Vec<&String> = value.as_mapping().unwrap().keys().collect();
    assert_eq!(keys, vec!["z", "a"]);
    assert_eq!(value["a"], Value::Sequence(vec![true.into()]));
  }

  #[test]
  fn test_json_object_input_matches_struct_input() {
    let page = Page {
      title: "t".to_string(),
      lang: None,
      tags: vec![Some("x".to_string())],
    };
    let as_json = json!({"title": "t", "lang": null, "tags": ["x", null]});
    assert_eq!(normalize(&page).unwrap(), normalize(&as_json).unwrap());
  }

  #[test]
  fn test_normalize_is_idempotent() {
    let input = json!({"a": {"b": null, "c": [1, null, {"d": null}]}, "e": 1000.0});
    let once = normalize(&input).unwrap();
    let twice = normalize(&once).unwrap();
    assert_eq!(once, twice);
    assert_eq!(to_json(&once), json!({"a": {"c": [1, {}]}, "e": 1000.0}));
  }

  #[test]
  fn test_top_level_absent_is_null() {
    assert_eq!(normalize(&None::<String>).unwrap(), Value::Null);
    assert_eq!(normalize(&()).unwrap(), Value::Null);
  }

  #[test]
  fn test_enum_variants() {
    assert_eq!(normalize(&Mode::Fast).unwrap(), "Fast");
    assert_eq!(to_json(&normalize(&Mode::Limited(3)).unwrap()), json!({"Limited": 3}));
    assert_eq!(
      to_json(&normalize(&Mode::Window { from: 1, to: None }).unwrap()),
      json!({"Window": {"from": 1}})
    );
  }

  #[test]
  fn test_integer_keys_are_stringified() {
    let mut map = BTreeMap::new();
    map.insert(2u32, "two");
    map.insert(1u32, "one");
    let value = normalize(&map).unwrap();
    assert_eq!(value["1"], "one");
    assert_eq!(value["2"], "two");
  }

  #[test]
  fn test_non_string_key_is_rejected() {
    let mut map = BTreeMap::new();
    map.insert(vec![1u8], "x");
    assert_eq!(
      normalize(&map).unwrap_err(),
      EncodingError::KeyMustBeString("sequence")
    );
  }

  #[test]
  fn test_non_finite_float_is_rejected() {
    assert!(matches!(
      normalize(&f64::NAN),
      Err(EncodingError::NonFiniteNumber(_))
    ));
  }

  #[test]
  fn test_bytes_are_rejected() {
    struct Raw;
    impl Serialize for Raw {
      fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(b"abc")
      }
    }
    assert_eq!(
      normalize(&Raw).unwrap_err(),
      EncodingError::Unsupported("bytes")
    );
  }

  #[test]
  fn test_numbers_keep_their_kind() {
    let value = normalize(&json!({"i": 0, "f": 1000.0, "n": -7})).unwrap();
    assert_eq!(value["i"], Value::Number(Number::PosInt(0)));
    assert_eq!(value["f"], Value::Number(Number::Float(1000.0)));
    assert_eq!(value["n"], Value::Number(Number::NegInt(-7)));
  }
}
