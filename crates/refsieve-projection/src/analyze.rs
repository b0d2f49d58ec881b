//! Projection classification.
//!
//! Only primitive flags decide whether a projection includes or excludes.
//! `$slice`, `$meta` and `$elemMatch` shape a field that is returned anyway,
//! and `+path` keys force-select a field without changing the mode.

use refsieve_core::path::{ancestors, positional};
use refsieve_core::projection::{truthy, Projection, ProjectionValue};

pub const ID_FIELD: &str = "_id";
pub const FORCE_SELECT_PREFIX: char = '+';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    Inclusive,
    Exclusive,
    Indeterminate,
}

/// True when some defining flag selects its field.
///
/// `_id` only counts when it is the sole key, since it is returned by
/// default and `{name: 0, _id: 1}` is still an exclusion.
pub fn is_inclusive(projection: Option<&Projection>) -> bool {
    let Some(projection) = projection else {
        return false;
    };
    let lone_id = is_lone_id(projection);
    projection.iter().any(|(key, value)| {
        if key.starts_with(FORCE_SELECT_PREFIX) || (key == ID_FIELD && !lone_id) {
            return false;
        }
        matches!(value, ProjectionValue::Flag(flag) if truthy(flag))
    })
}

/// `Some(true)` for an exclusion projection, `Some(false)` for an inclusion
/// one, `None` when no key defines the mode.
pub fn is_exclusive(projection: Option<&Projection>) -> Option<bool> {
    let projection = projection?;
    if is_lone_id(projection) {
        return projection.get(ID_FIELD).map(|v| !v.is_truthy());
    }
    let decided = first_defining(projection);
    // A mixed projection is rejected by the database; report it as an
    // inclusion so the two predicates never both hold.
    if decided == Some(true) && is_inclusive(Some(projection)) {
        return Some(false);
    }
    decided
}

fn first_defining(projection: &Projection) -> Option<bool> {
    for (key, value) in projection.iter() {
        if key == ID_FIELD || key.starts_with(FORCE_SELECT_PREFIX) {
            continue;
        }
        match value {
            ProjectionValue::Flag(flag) => return Some(!truthy(flag)),
            ProjectionValue::Nested(inner) => return is_exclusive(Some(inner)),
            ProjectionValue::Slice(_)
            | ProjectionValue::Meta(_)
            | ProjectionValue::ElemMatch(_) => {}
        }
    }
    None
}

fn is_lone_id(projection: &Projection) -> bool {
    projection.len() == 1 && projection.contains_key(ID_FIELD)
}

pub fn classify(projection: Option<&Projection>) -> ProjectionKind {
    if is_inclusive(projection) {
        ProjectionKind::Inclusive
    } else if is_exclusive(projection) == Some(true) {
        ProjectionKind::Exclusive
    } else {
        ProjectionKind::Indeterminate
    }
}

/// Whether `path` would be left out of documents returned under
/// `projection`.
pub fn is_path_excluded(projection: Option<&Projection>, path: &str) -> bool {
    let Some(p) = projection else {
        return false;
    };
    if path == ID_FIELD {
        return p.get(ID_FIELD).is_some_and(ProjectionValue::is_explicit_exclusion);
    }
    match classify(Some(p)) {
        ProjectionKind::Exclusive => ancestors(path).any(|a| {
            p.get(a).is_some_and(ProjectionValue::is_explicit_exclusion)
        }),
        ProjectionKind::Inclusive => !ancestors(path).any(|a| {
            let selected = |key: &str| p.get(key).is_some_and(ProjectionValue::is_truthy);
            selected(a) || selected(&positional(a))
        }),
        ProjectionKind::Indeterminate => false,
    }
}
