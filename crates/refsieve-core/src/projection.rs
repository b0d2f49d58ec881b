//! Projection model.
//!
//! A projection maps field paths to a flag (include/exclude) or to a
//! directive that shapes the returned value without deciding whether the
//! field is included: `$slice`, `$meta`, and `$elemMatch`. Positional matches
//! are spelled in the key (`"items.$": 1`) and stay ordinary flags.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const SLICE: &str = "$slice";
pub const META: &str = "$meta";
pub const ELEM_MATCH: &str = "$elemMatch";

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionValue {
    /// A primitive include/exclude flag (`1`, `0`, `true`, `"x"`, `null`, ...).
    Flag(Value),
    /// `{$slice: n}` or `{$slice: [skip, limit]}`.
    Slice(Value),
    /// `{$meta: "textScore"}`.
    Meta(Value),
    /// `{$elemMatch: {...}}`, selecting which array elements come back.
    ElemMatch(Value),
    /// A nested projection object.
    Nested(Projection),
}

impl ProjectionValue {
    pub fn from_json(value: &Value) -> Self {
        let Value::Object(obj) = value else {
            return ProjectionValue::Flag(value.clone());
        };
        if let Some(v) = obj.get(META) {
            ProjectionValue::Meta(v.clone())
        } else if let Some(v) = obj.get(SLICE) {
            ProjectionValue::Slice(v.clone())
        } else if let Some(v) = obj.get(ELEM_MATCH) {
            ProjectionValue::ElemMatch(v.clone())
        } else {
            ProjectionValue::Nested(Projection::from_map(obj))
        }
    }

    pub fn to_json(&self) -> Value {
        let directive = |key: &str, v: &Value| {
            let mut m = Map::new();
            m.insert(key.to_string(), v.clone());
            Value::Object(m)
        };
        match self {
            ProjectionValue::Flag(v) => v.clone(),
            ProjectionValue::Slice(v) => directive(SLICE, v),
            ProjectionValue::Meta(v) => directive(META, v),
            ProjectionValue::ElemMatch(v) => directive(ELEM_MATCH, v),
            ProjectionValue::Nested(p) => p.to_json(),
        }
    }

    pub fn flag(&self) -> Option<&Value> {
        match self {
            ProjectionValue::Flag(v) => Some(v),
            _ => None,
        }
    }

    /// Truthiness as a query projection reads it. Directives and nested
    /// objects are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ProjectionValue::Flag(v) => truthy(v),
            _ => true,
        }
    }

    /// True for an explicit `0` / `false` flag.
    pub fn is_explicit_exclusion(&self) -> bool {
        match self {
            ProjectionValue::Flag(Value::Bool(false)) => true,
            ProjectionValue::Flag(Value::Number(n)) => n.as_f64() == Some(0.0),
            _ => false,
        }
    }
}

impl From<Value> for ProjectionValue {
    fn from(value: Value) -> Self {
        ProjectionValue::from_json(&value)
    }
}

impl From<i64> for ProjectionValue {
    fn from(flag: i64) -> Self {
        ProjectionValue::Flag(Value::from(flag))
    }
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Ordered path → value entries with unique keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    entries: Vec<(String, ProjectionValue)>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a JSON projection. `null` is the empty projection.
    pub fn from_json(value: &Value) -> Result<Projection> {
        match value {
            Value::Null => Ok(Projection::new()),
            Value::Object(obj) => Ok(Projection::from_map(obj)),
            other => Err(Error::Shape(format!(
                "projection must be an object, got {}",
                other
            ))),
        }
    }

    pub fn from_map(map: &Map<String, Value>) -> Projection {
        Projection {
            entries: map
                .iter()
                .map(|(k, v)| (k.clone(), ProjectionValue::from_json(v)))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<Map<String, Value>>(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&ProjectionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ProjectionValue> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace, keeping the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ProjectionValue>) {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ProjectionValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProjectionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ProjectionValue)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Projection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Projection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Projection::from_json(&value).map_err(serde::de::Error::custom)
    }
}
