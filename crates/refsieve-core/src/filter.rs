//! Filter node model.
//!
//! Raw filters arrive as untyped JSON. [`Filter::from_json`] normalizes them
//! once into explicit variants so the sanitizer and the reference-filter
//! builder can match exhaustively:
//!
//! ```text
//! Filter  := [Clause]
//! Clause  := Field(path, Node) | And([Filter]) | Or([Filter]) | Nor([Filter])
//!          | Command($key, Node)
//! Node    := Literal(json) | Operator([($key, Node)]) | Filter(Filter)
//!          | Marked(Marker, Node)
//! ```
//!
//! Clause and operator order is preserved in the model. Rendering through
//! [`Filter::to_json`] goes into a `serde_json::Map`, which orders keys, so
//! the JSON form is key-sorted. Markers are dropped by [`Filter::to_json`]
//! and never produced by [`Filter::from_json`].
//!
//! A logical key whose value is not an array of objects stays a
//! [`Clause::Command`] holding the raw literal.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::marker::{Marker, MarkerKind};

/// Prefix that marks query-operator keys.
pub const RESERVED_PREFIX: char = '$';

pub const AND: &str = "$and";
pub const OR: &str = "$or";
pub const NOR: &str = "$nor";
pub const EQ: &str = "$eq";
pub const IN: &str = "$in";
pub const ELEM_MATCH: &str = "$elemMatch";

pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// True when `value` is an object carrying at least one reserved-prefix key.
pub fn has_reserved_keys(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.keys().any(|k| is_reserved(k)))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A plain value compared by equality (scalars, arrays, operator-free
    /// embedded documents).
    Literal(Value),
    /// An object with at least one reserved-prefix key.
    Operator(Operators),
    /// A nested filter, as taken by `$elemMatch`.
    Filter(Filter),
    /// A node carrying a marker tag.
    Marked(Marker, Box<Node>),
}

impl Node {
    pub fn from_json(value: &Value) -> Node {
        match value.as_object() {
            Some(obj) if obj.keys().any(|k| is_reserved(k)) => {
                let mut ops = Operators::new();
                for (k, v) in obj {
                    let arg = match (k.as_str(), v) {
                        (ELEM_MATCH, Value::Object(inner)) => Node::Filter(Filter::from_map(inner)),
                        _ => Node::from_json(v),
                    };
                    ops.insert(k.clone(), arg);
                }
                Node::Operator(ops)
            }
            _ => Node::Literal(value.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Node::Literal(v) => v.clone(),
            Node::Operator(ops) => ops.to_json(),
            Node::Filter(f) => f.to_json(),
            Node::Marked(_, inner) => inner.to_json(),
        }
    }

    /// `{$in: values}`.
    pub fn in_list(values: Vec<Value>) -> Node {
        Node::Operator(Operators::single(IN, Node::Literal(Value::Array(values))))
    }

    /// `{$eq: node}`.
    pub fn equals(node: Node) -> Node {
        Node::Operator(Operators::single(EQ, node))
    }

    /// The node below any marker layers.
    pub fn unmarked(&self) -> &Node {
        let mut cur = self;
        while let Node::Marked(_, inner) = cur {
            cur = &**inner;
        }
        cur
    }

    pub fn unmarked_mut(&mut self) -> &mut Node {
        let mut cur = self;
        while let Node::Marked(_, inner) = cur {
            cur = &mut **inner;
        }
        cur
    }

    pub fn is_marked(&self, kind: MarkerKind) -> bool {
        let mut cur = self;
        while let Node::Marked(marker, inner) = cur {
            if marker.kind() == kind {
                return true;
            }
            cur = &**inner;
        }
        false
    }

    pub fn is_trusted(&self) -> bool {
        self.is_marked(MarkerKind::Trusted)
    }

    pub fn is_selector(&self) -> bool {
        self.is_marked(MarkerKind::Selector)
    }

    pub fn operators(&self) -> Option<&Operators> {
        match self.unmarked() {
            Node::Operator(ops) => Some(ops),
            _ => None,
        }
    }

    pub fn operators_mut(&mut self) -> Option<&mut Operators> {
        match self.unmarked_mut() {
            Node::Operator(ops) => Some(ops),
            _ => None,
        }
    }

    /// True for an operator object, looking through markers.
    pub fn is_operator(&self) -> bool {
        self.operators().is_some()
    }

    /// True for exactly `{$eq: v}`.
    pub fn is_eq_form(&self) -> bool {
        self.operators()
            .map(|ops| ops.len() == 1 && ops.contains(EQ))
            .unwrap_or(false)
    }

    /// A deep copy rebuilt from plain data. Every marker is lost.
    pub fn structural_copy(&self) -> Node {
        match self {
            Node::Literal(v) => Node::Literal(v.clone()),
            Node::Operator(ops) => Node::Operator(Operators(
                ops.iter()
                    .map(|(k, v)| (k.to_string(), v.structural_copy()))
                    .collect(),
            )),
            Node::Filter(f) => Node::Filter(f.structural_copy()),
            Node::Marked(_, inner) => inner.structural_copy(),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from_json(&value)
    }
}

impl From<Operators> for Node {
    fn from(ops: Operators) -> Self {
        Node::Operator(ops)
    }
}

/// Ordered operator entries of an operator object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Operators(Vec<(String, Node)>);

impl Operators {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(key: impl Into<String>, node: Node) -> Self {
        Self(vec![(key.into(), node)])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace in place, keeping the original position.
    pub fn insert(&mut self, key: impl Into<String>, node: Node) {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = node,
            None => self.0.push((key, node)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` over `self`; keys already present are overwritten.
    pub fn extend(&mut self, other: Operators) {
        for (k, v) in other.0 {
            self.insert(k, v);
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<Map<String, Value>>(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Field(String, Node),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    /// Any other top-level reserved key (`$where`, `$text`, `$expr`, ...).
    Command(String, Node),
}

impl Clause {
    pub fn key(&self) -> &str {
        match self {
            Clause::Field(k, _) | Clause::Command(k, _) => k,
            Clause::And(_) => AND,
            Clause::Or(_) => OR,
            Clause::Nor(_) => NOR,
        }
    }

    fn from_entry(key: &str, value: &Value) -> Clause {
        if let Some(list) = logical_list(value) {
            match key {
                AND => return Clause::And(list),
                OR => return Clause::Or(list),
                NOR => return Clause::Nor(list),
                _ => {}
            }
        }
        if is_reserved(key) {
            Clause::Command(key.to_string(), Node::from_json(value))
        } else {
            Clause::Field(key.to_string(), Node::from_json(value))
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Clause::Field(_, node) | Clause::Command(_, node) => node.to_json(),
            Clause::And(list) | Clause::Or(list) | Clause::Nor(list) => {
                Value::Array(list.iter().map(Filter::to_json).collect())
            }
        }
    }

    fn structural_copy(&self) -> Clause {
        match self {
            Clause::Field(k, node) => Clause::Field(k.clone(), node.structural_copy()),
            Clause::Command(k, node) => Clause::Command(k.clone(), node.structural_copy()),
            Clause::And(list) => Clause::And(list.iter().map(Filter::structural_copy).collect()),
            Clause::Or(list) => Clause::Or(list.iter().map(Filter::structural_copy).collect()),
            Clause::Nor(list) => Clause::Nor(list.iter().map(Filter::structural_copy).collect()),
        }
    }
}

/// A logical container is an array of objects; anything else stays a command.
fn logical_list(value: &Value) -> Option<Vec<Filter>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_object().map(Filter::from_map))
        .collect()
}

/// A query filter: ordered clauses with unique keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a JSON filter. Fails only if `value` is not an object.
    pub fn from_json(value: &Value) -> Result<Filter> {
        value
            .as_object()
            .map(Filter::from_map)
            .ok_or_else(|| Error::Shape(format!("filter must be an object, got {}", value)))
    }

    pub fn from_map(map: &Map<String, Value>) -> Filter {
        Filter {
            clauses: map.iter().map(|(k, v)| Clause::from_entry(k, v)).collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.clauses
                .iter()
                .map(|c| (c.key().to_string(), c.to_json()))
                .collect::<Map<String, Value>>(),
        )
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn clauses_mut(&mut self) -> &mut [Clause] {
        &mut self.clauses
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.key() == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Clause> {
        self.clauses.iter_mut().find(|c| c.key() == key)
    }

    /// The node constraining field `path`, if any.
    pub fn field(&self, path: &str) -> Option<&Node> {
        match self.get(path)? {
            Clause::Field(_, node) => Some(node),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, path: &str) -> Option<&mut Node> {
        match self.get_mut(path)? {
            Clause::Field(_, node) => Some(node),
            _ => None,
        }
    }

    /// Insert or replace by key, keeping the original position.
    pub fn insert(&mut self, clause: Clause) {
        match self.clauses.iter().position(|c| c.key() == clause.key()) {
            Some(idx) => self.clauses[idx] = clause,
            None => self.clauses.push(clause),
        }
    }

    /// Shorthand for `insert(Clause::Field(path, node))`.
    pub fn set_field(&mut self, path: impl Into<String>, node: Node) {
        self.insert(Clause::Field(path.into(), node));
    }

    pub fn remove(&mut self, key: &str) -> Option<Clause> {
        let idx = self.clauses.iter().position(|c| c.key() == key)?;
        Some(self.clauses.remove(idx))
    }

    /// A deep copy rebuilt from plain data. Every marker is lost.
    pub fn structural_copy(&self) -> Filter {
        Filter {
            clauses: self.clauses.iter().map(Clause::structural_copy).collect(),
        }
    }
}

impl From<Vec<Clause>> for Filter {
    fn from(clauses: Vec<Clause>) -> Self {
        let mut f = Filter::new();
        for c in clauses {
            f.insert(c);
        }
        f
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Filter::from_json(&value).map_err(serde::de::Error::custom)
    }
}
