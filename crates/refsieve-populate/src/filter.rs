//! Reference filter synthesis.
//!
//! Shape of the output for ids `I`:
//!
//! - one foreign field `f`:        `{...match, f: {$in: I}}`
//! - `f` under an `$elemMatch`'d ancestor `a`: `{a: {$elemMatch: {...,
//!   <f relative to a>: {$in: I}}}}`
//! - `f` already pinned by match: `{f: {$in: I, ...pinned}}` (`_id` mostly)
//! - several fields `f, g`:        `{...match, $or: [{f: {$in: I}}, {g: {$in: I}}]}`
//! - several fields, match has `$or`: `{$and: [{$or: old}, {$or: new}]}`

use refsieve_core::config::SieveConfig;
use refsieve_core::filter::{Clause, Filter, Node, Operators, AND, ELEM_MATCH, EQ, IN, OR};
use refsieve_core::marker::selector;
use refsieve_core::path::{ancestors, relative_suffix};
use refsieve_core::schema::TypeRegistry;
use serde_json::Value;

use crate::ids::{filter_invalid_ids, RefId};

/// Everything about one reference except the ids and the target registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceQuery {
    /// Target-collection fields the ids must match. Must not be empty.
    pub foreign_fields: Vec<String>,
    /// Match fragments, one per requesting document; OR-ed when several.
    pub matches: Vec<Filter>,
    pub skip_invalid_ids: bool,
}

impl ReferenceQuery {
    pub fn new(foreign_field: impl Into<String>) -> Self {
        Self {
            foreign_fields: vec![foreign_field.into()],
            ..Self::default()
        }
    }

    pub fn with_config(mut self, cfg: &SieveConfig) -> Self {
        self.skip_invalid_ids = cfg.skip_invalid_ids;
        self
    }

    pub fn foreign_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.foreign_fields.contains(&field) {
            self.foreign_fields.push(field);
        }
        self
    }

    pub fn matching(mut self, fragment: Filter) -> Self {
        self.matches.push(fragment);
        self
    }

    pub fn skip_invalid_ids(mut self, skip: bool) -> Self {
        self.skip_invalid_ids = skip;
        self
    }

    pub fn build(&self, ids: &[RefId], registry: &dyn TypeRegistry) -> Filter {
        build_reference_filter(
            ids,
            &self.matches,
            &self.foreign_fields,
            registry,
            self.skip_invalid_ids,
        )
    }
}

/// Combine match fragments: none → `{}`, one → copy, several → `{$or: [...]}`.
pub fn format_match(matches: &[Filter]) -> Filter {
    match matches {
        [] => Filter::new(),
        [only] => only.clone(),
        many => Filter::from(vec![Clause::Or(many.to_vec())]),
    }
}

/// Build the filter selecting target documents whose foreign field(s) hold
/// one of `ids`.
///
/// An empty `foreign_fields` is a caller error; the formatted match is
/// returned as-is.
pub fn build_reference_filter(
    ids: &[RefId],
    matches: &[Filter],
    foreign_fields: &[String],
    registry: &dyn TypeRegistry,
    skip_invalid_ids: bool,
) -> Filter {
    let mut out = format_match(matches);
    let valid_ids =
        |field: &str| filter_invalid_ids(ids, registry.path_type(field), skip_invalid_ids);

    match foreign_fields {
        [] => {}
        [field] => {
            let ids = valid_ids(field.as_str());
            let injected = selector(Node::in_list(ids.clone()));
            // An `$elemMatch` container takes the ids even over a sibling pin.
            if !inject_into_elem_match(&mut out, field, &injected) {
                if pins_field(&out, field) {
                    merge_pinned(&mut out, field, ids);
                } else {
                    out.set_field(field.clone(), injected);
                }
            }
        }
        fields => {
            let mut alternatives = Vec::with_capacity(fields.len());
            for field in fields {
                if pins_field(&out, field) {
                    merge_pinned(&mut out, field, valid_ids(field.as_str()));
                } else {
                    let injected = selector(Node::in_list(valid_ids(field.as_str())));
                    alternatives.push(Filter::from(vec![Clause::Field(field.clone(), injected)]));
                }
            }
            if !alternatives.is_empty() {
                add_alternatives(&mut out, alternatives);
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(fields = ?foreign_fields, filter = %out, "built reference filter");

    out
}

/// True when the match already constrains `field` with a non-null value.
fn pins_field(filter: &Filter, field: &str) -> bool {
    match filter.field(field).map(Node::unmarked) {
        None | Some(Node::Literal(Value::Null)) => false,
        Some(_) => true,
    }
}

/// `field: {$in: ids, ...existing}`; a literal pin becomes `$eq`.
fn merge_pinned(filter: &mut Filter, field: &str, ids: Vec<Value>) {
    let Some(existing) = filter.field(field) else {
        return;
    };
    let user_ops = match existing.operators() {
        Some(ops) => ops.clone(),
        None => Operators::single(EQ, existing.unmarked().clone()),
    };
    let mut combined = Operators::single(IN, Node::Literal(Value::Array(ids)));
    combined.extend(user_ops);
    filter.set_field(field, selector(Node::Operator(combined)));
}

/// Place `injected` inside the `$elemMatch` of the nearest constrained
/// ancestor of `field`, removing any sibling `field` key. Returns false when
/// no ancestor carries an `$elemMatch`.
fn inject_into_elem_match(filter: &mut Filter, field: &str, injected: &Node) -> bool {
    for ancestor in ancestors(field) {
        let Some(suffix) = relative_suffix(ancestor, field) else {
            // The last ancestor is the field itself.
            break;
        };
        let Some(container) = filter.field_mut(ancestor).and_then(elem_match_filter) else {
            continue;
        };
        container.set_field(suffix, injected.clone());
        filter.remove(field);
        return true;
    }
    false
}

fn elem_match_filter(node: &mut Node) -> Option<&mut Filter> {
    match node.operators_mut()?.get_mut(ELEM_MATCH)?.unmarked_mut() {
        Node::Filter(f) => Some(f),
        _ => None,
    }
}

/// Add `$or: alternatives`, AND-ing with any `$or` the match already has.
fn add_alternatives(filter: &mut Filter, alternatives: Vec<Filter>) {
    let new_or = Clause::Or(alternatives);
    let Some(existing_or) = filter.remove(OR) else {
        filter.insert(new_or);
        return;
    };
    let pair = vec![Filter::from(vec![existing_or]), Filter::from(vec![new_or])];
    let combined = match filter.remove(AND) {
        Some(Clause::And(mut list)) => {
            list.extend(pair);
            list
        }
        Some(other) => {
            let mut list = vec![Filter::from(vec![other])];
            list.extend(pair);
            list
        }
        None => pair,
    };
    filter.insert(Clause::And(combined));
}
