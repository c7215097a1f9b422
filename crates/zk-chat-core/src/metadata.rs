//! Front-matter metadata values and the append merge policy.
//!
//! Note front-matter is arbitrary YAML, so metadata is modelled as a
//! recursive [`MetaValue`] keyed by strings. Scalar keys of any type
//! (`1: a`, `true: b`) are read as their string form at every depth. Keys
//! are kept in a [`BTreeMap`] so serialized front-matter comes out in
//! sorted key order.
//!
//! # Merge rules
//!
//! [`merge_metadata`] folds new metadata into existing metadata, key by key:
//!
//! | original | new | result |
//! |----------|-----|--------|
//! | absent | any | new |
//! | `null` | any | new |
//! | any | `null` | original |
//! | list | list | union, duplicates removed |
//! | map | map | recursive merge |
//! | any | any | new |

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

/// A string-keyed metadata mapping, as found in note front-matter.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A YAML-compatible metadata value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    String(String),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

impl<'de> Deserialize<'de> for MetaValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MetaValueVisitor)
    }
}

struct MetaValueVisitor;

impl<'de> Visitor<'de> for MetaValueVisitor {
    type Value = MetaValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a front-matter value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<MetaValue, E> {
        Ok(MetaValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<MetaValue, E> {
        Ok(MetaValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<MetaValue, D::Error> {
        MetaValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MetaValue, E> {
        Ok(MetaValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MetaValue, E> {
        Ok(MetaValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MetaValue, E> {
        Ok(i64::try_from(v)
            .map(MetaValue::Integer)
            .unwrap_or(MetaValue::Unsigned(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MetaValue, E> {
        Ok(MetaValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MetaValue, E> {
        Ok(MetaValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MetaValue, E> {
        Ok(MetaValue::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<MetaValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(MetaValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<MetaValue, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((MetaKey(key), value)) = map.next_entry::<MetaKey, MetaValue>()? {
            entries.insert(key, value);
        }
        Ok(MetaValue::Map(entries))
    }
}

/// A mapping key in string form.
struct MetaKey(String);

impl<'de> Deserialize<'de> for MetaKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MetaKeyVisitor)
    }
}

struct MetaKeyVisitor;

impl<'de> Visitor<'de> for MetaKeyVisitor {
    type Value = MetaKey;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_unit<E: de::Error>(self) -> Result<MetaKey, E> {
        Ok(MetaKey("null".to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<MetaKey, E> {
        Ok(MetaKey("null".to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MetaKey, E> {
        Ok(MetaKey(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MetaKey, E> {
        Ok(MetaKey(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MetaKey, E> {
        Ok(MetaKey(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MetaKey, E> {
        Ok(MetaKey(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MetaKey, E> {
        Ok(MetaKey(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MetaKey, E> {
        Ok(MetaKey(v))
    }
}

impl MetaValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MetaValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<i32> for MetaValue {
    fn from(value: i32) -> Self {
        MetaValue::Integer(value as i64)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(values: Vec<T>) -> Self {
        MetaValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Merge `new` into a copy of `original` using last-writer-wins with list
/// union and deep map merge. Neither input is modified.
pub fn merge_metadata(original: &Metadata, new: &Metadata) -> Metadata {
    let mut result = original.clone();

    for (key, new_value) in new {
        let merged = match result.get(key) {
            None => new_value.clone(),
            Some(original_value) => merge_value(original_value, new_value),
        };
        result.insert(key.clone(), merged);
    }

    result
}

fn merge_value(original: &MetaValue, new: &MetaValue) -> MetaValue {
    match (original, new) {
        (MetaValue::Null, _) => new.clone(),
        (_, MetaValue::Null) => original.clone(),
        (MetaValue::List(a), MetaValue::List(b)) => MetaValue::List(union(a, b)),
        (MetaValue::Map(a), MetaValue::Map(b)) => MetaValue::Map(merge_metadata(a, b)),
        _ => new.clone(),
    }
}

/// Set union of two lists. `MetaValue` holds floats, so it is neither
/// `Eq` nor `Hash`; duplicates are found by linear comparison.
fn union(a: &[MetaValue], b: &[MetaValue]) -> Vec<MetaValue> {
    let mut out: Vec<MetaValue> = Vec::with_capacity(a.len() + b.len());
    for item in a.iter().chain(b.iter()) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}
