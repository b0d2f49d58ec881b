//! Target-collection schema model and the type registry consumed by id
//! validation.
//!
//! Schemas are explicit trees of [`SchemaNode`] variants. Path lookup is a
//! visitor walk that descends through subdocuments and document arrays, so
//! `"items.owner"` resolves inside an array of embedded documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    ObjectId,
    String,
    Number,
    Boolean,
    /// Accepts anything.
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaNode {
    Scalar(ScalarType),
    Array(Box<SchemaNode>),
    Map(Box<SchemaNode>),
    Subdocument(Schema),
    DocumentArray(Schema),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cast to {kind} failed for value {value}")]
pub struct CastError {
    pub kind: &'static str,
    pub value: String,
}

impl CastError {
    fn new(kind: &'static str, value: &Value) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::ObjectId => "ObjectId",
            ScalarType::String => "String",
            ScalarType::Number => "Number",
            ScalarType::Boolean => "Boolean",
            ScalarType::Mixed => "Mixed",
        }
    }

    pub fn cast(self, value: &Value) -> Result<Value, CastError> {
        let fail = || CastError::new(self.name(), value);
        match self {
            ScalarType::Mixed => Ok(value.clone()),
            ScalarType::ObjectId => match value {
                Value::String(s) if is_object_id(s) => Ok(Value::String(s.to_ascii_lowercase())),
                Value::Object(obj) => match obj.get("$oid") {
                    Some(Value::String(s)) if obj.len() == 1 && is_object_id(s) => {
                        Ok(Value::String(s.to_ascii_lowercase()))
                    }
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
            ScalarType::String => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                _ => Err(fail()),
            },
            ScalarType::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::Bool(b) => Ok(Value::from(u8::from(*b))),
                Value::String(s) => {
                    let trimmed = s.trim();
                    if let Ok(i) = trimmed.parse::<i64>() {
                        return Ok(Value::from(i));
                    }
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .ok_or_else(fail)
                }
                _ => Err(fail()),
            },
            ScalarType::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::Number(n) => match n.as_f64() {
                    Some(f) if f == 1.0 => Ok(Value::Bool(true)),
                    Some(f) if f == 0.0 => Ok(Value::Bool(false)),
                    _ => Err(fail()),
                },
                Value::String(s) => match s.as_str() {
                    "true" | "yes" | "1" => Ok(Value::Bool(true)),
                    "false" | "no" | "0" => Ok(Value::Bool(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
        }
    }
}

fn is_object_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl SchemaNode {
    /// Cast `value` to this type. A single value cast against an array type
    /// is checked as one element.
    pub fn cast(&self, value: &Value) -> Result<Value, CastError> {
        match self {
            SchemaNode::Scalar(t) => t.cast(value),
            SchemaNode::Array(inner) => match value {
                Value::Array(items) => items
                    .iter()
                    .map(|v| inner.cast(v))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => inner.cast(other),
            },
            SchemaNode::Map(inner) => match value {
                Value::Object(obj) => {
                    let mut out = serde_json::Map::with_capacity(obj.len());
                    for (k, v) in obj {
                        out.insert(k.clone(), inner.cast(v)?);
                    }
                    Ok(Value::Object(out))
                }
                _ => Err(CastError::new("Map", value)),
            },
            SchemaNode::Subdocument(_) => match value {
                Value::Object(_) => Ok(value.clone()),
                _ => Err(CastError::new("Subdocument", value)),
            },
            SchemaNode::DocumentArray(_) => match value {
                Value::Object(_) => Ok(value.clone()),
                Value::Array(items) if items.iter().all(Value::is_object) => Ok(value.clone()),
                _ => Err(CastError::new("DocumentArray", value)),
            },
        }
    }
}

/// A named set of top-level paths.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    paths: BTreeMap<String, SchemaNode>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, node: SchemaNode) -> Self {
        self.paths.insert(path.into(), node);
        self
    }

    pub fn get(&self, segment: &str) -> Option<&SchemaNode> {
        self.paths.get(segment)
    }

    pub fn paths(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a dotted path through nested schemas.
    pub fn path(&self, path: &str) -> Option<&SchemaNode> {
        let mut walker = PathWalker {
            segments: path.split('.').collect(),
            found: None,
        };
        walker.visit_schema(self, 0);
        walker.found
    }
}

/// Looks up schema types for dotted paths.
pub trait TypeRegistry {
    fn path_type(&self, path: &str) -> Option<&SchemaNode>;
}

impl TypeRegistry for Schema {
    fn path_type(&self, path: &str) -> Option<&SchemaNode> {
        self.path(path)
    }
}

/// Visitor over a schema tree.
///
/// Default methods recurse into every child; implementors override the hooks
/// they care about.
pub trait SchemaVisitor<'s> {
    fn visit_schema(&mut self, schema: &'s Schema, depth: usize) {
        for (_, node) in schema.paths.iter() {
            self.visit_node(node, depth);
        }
    }

    fn visit_node(&mut self, node: &'s SchemaNode, depth: usize) {
        match node {
            SchemaNode::Scalar(_) => {}
            SchemaNode::Array(inner) | SchemaNode::Map(inner) => self.visit_node(inner, depth),
            SchemaNode::Subdocument(s) | SchemaNode::DocumentArray(s) => {
                self.visit_schema(s, depth + 1)
            }
        }
    }
}

/// Walks one segment per schema level. Numeric indexes and positional `$`
/// segments address array elements and are skipped.
struct PathWalker<'p, 's> {
    segments: Vec<&'p str>,
    found: Option<&'s SchemaNode>,
}

impl<'p, 's> PathWalker<'p, 's> {
    fn skip_positional(&self, mut idx: usize) -> usize {
        while idx < self.segments.len() && is_positional(self.segments[idx]) {
            idx += 1;
        }
        idx
    }
}

fn is_positional(segment: &str) -> bool {
    segment == "$" || (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
}

impl<'p, 's> SchemaVisitor<'s> for PathWalker<'p, 's> {
    fn visit_schema(&mut self, schema: &'s Schema, depth: usize) {
        let idx = self.skip_positional(depth);
        if idx >= self.segments.len() {
            return;
        }
        // Longest dotted key wins, so "a.b" declared flat is found before "a".
        for end in (idx + 1..=self.segments.len()).rev() {
            let key = self.segments[idx..end].join(".");
            if let Some(node) = schema.get(&key) {
                let next = self.skip_positional(end);
                if next >= self.segments.len() {
                    self.found = Some(node);
                } else {
                    self.visit_node(node, next);
                }
                return;
            }
        }
    }

    fn visit_node(&mut self, node: &'s SchemaNode, depth: usize) {
        match node {
            SchemaNode::Array(inner) => self.visit_node(inner, depth),
            SchemaNode::Map(inner) => {
                // Map keys are arbitrary; consume one segment.
                let next = depth + 1;
                if next >= self.segments.len() {
                    self.found = Some(&**inner);
                } else {
                    self.visit_node(inner, next);
                }
            }
            SchemaNode::Subdocument(s) | SchemaNode::DocumentArray(s) => self.visit_schema(s, depth),
            SchemaNode::Scalar(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        let item = Schema::new()
            .with("owner", SchemaNode::Scalar(ScalarType::ObjectId))
            .with("qty", SchemaNode::Scalar(ScalarType::Number));
        Schema::new()
            .with("_id", SchemaNode::Scalar(ScalarType::ObjectId))
            .with("name", SchemaNode::Scalar(ScalarType::String))
            .with("items", SchemaNode::DocumentArray(item.clone()))
            .with("profile", SchemaNode::Subdocument(item))
            .with("tags", SchemaNode::Array(Box::new(SchemaNode::Scalar(ScalarType::String))))
            .with("scores", SchemaNode::Map(Box::new(SchemaNode::Scalar(ScalarType::Number))))
            .with("meta.flag", SchemaNode::Scalar(ScalarType::Boolean))
    }

    #[test]
    fn test_path_lookup_nested() {
        let s = schema();
        assert_eq!(s.path("_id"), Some(&SchemaNode::Scalar(ScalarType::ObjectId)));
        assert_eq!(s.path("items.owner"), Some(&SchemaNode::Scalar(ScalarType::ObjectId)));
        assert_eq!(s.path("items.0.qty"), Some(&SchemaNode::Scalar(ScalarType::Number)));
        assert_eq!(s.path("items.$.qty"), Some(&SchemaNode::Scalar(ScalarType::Number)));
        assert_eq!(s.path("profile.qty"), Some(&SchemaNode::Scalar(ScalarType::Number)));
        assert_eq!(s.path("scores.math"), Some(&SchemaNode::Scalar(ScalarType::Number)));
        assert_eq!(s.path("meta.flag"), Some(&SchemaNode::Scalar(ScalarType::Boolean)));
        assert!(s.path("missing").is_none());
        assert!(s.path("name.deeper").is_none());
    }

    #[test]
    fn test_default_visitor_reaches_nested_scalars() {
        struct Count(usize);
        impl<'s> SchemaVisitor<'s> for Count {
            fn visit_node(&mut self, node: &'s SchemaNode, depth: usize) {
                match node {
                    SchemaNode::Scalar(_) => self.0 += 1,
                    SchemaNode::Array(inner) | SchemaNode::Map(inner) => {
                        self.visit_node(inner, depth)
                    }
                    SchemaNode::Subdocument(s) | SchemaNode::DocumentArray(s) => {
                        self.visit_schema(s, depth + 1)
                    }
                }
            }
        }
        let mut count = Count(0);
        count.visit_schema(&schema(), 0);
        // _id, name, tags, scores, meta.flag, plus two fields in each embedded schema
        assert_eq!(count.0, 9);
    }

    #[test]
    fn test_object_id_cast() {
        let t = ScalarType::ObjectId;
        assert!(t.cast(&json!("5f1d7f8e9b1e8a3c4d5e6f70")).is_ok());
        assert!(t.cast(&json!({"$oid": "5f1d7f8e9b1e8a3c4d5e6f70"})).is_ok());
        assert!(t.cast(&json!("not-an-id")).is_err());
        assert!(t.cast(&json!(42)).is_err());
    }

    #[test]
    fn test_number_and_boolean_cast() {
        assert_eq!(ScalarType::Number.cast(&json!("42")).unwrap(), json!(42));
        assert_eq!(ScalarType::Number.cast(&json!(true)).unwrap(), json!(1));
        assert!(ScalarType::Number.cast(&json!("forty")).is_err());
        assert_eq!(ScalarType::Boolean.cast(&json!("yes")).unwrap(), json!(true));
        assert!(ScalarType::Boolean.cast(&json!(2)).is_err());
    }

    #[test]
    fn test_array_cast_accepts_single_element() {
        let node = SchemaNode::Array(Box::new(SchemaNode::Scalar(ScalarType::Number)));
        assert!(node.cast(&json!(3)).is_ok());
        assert!(node.cast(&json!([1, "2"])).is_ok());
        assert!(node.cast(&json!([1, "x"])).is_err());
    }

    #[test]
    fn test_cast_error_message() {
        let err = ScalarType::ObjectId.cast(&json!("abc")).unwrap_err();
        assert_eq!(err.to_string(), "cast to ObjectId failed for value \"abc\"");
    }
}
