//! Make room for populated paths in the outbound projection.
//!
//! A populate needs the reference path (and, for polymorphic references, its
//! discriminator field) in the returned documents. The reconciler adds those
//! to an inclusion projection and pulls them out of an exclusion projection,
//! unless the caller said otherwise about the same key or an ancestor.

use std::collections::BTreeMap;

use refsieve_core::path::{ancestors, positional};
use refsieve_core::projection::{Projection, ProjectionValue};
use serde::{Deserialize, Serialize};

use crate::analyze::{classify, ProjectionKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PopulateOptions {
    /// Field holding the referenced model's name, for polymorphic refs.
    pub discriminator_field: Option<String>,
}

impl PopulateOptions {
    pub fn with_discriminator(field: impl Into<String>) -> Self {
        Self { discriminator_field: Some(field.into()) }
    }
}

/// Requested reference paths, keyed by dotted path.
pub type PopulatePaths = BTreeMap<String, PopulateOptions>;

/// Adjust `fields` so every path in `paths` comes back from the query.
///
/// The mode comes from `fields`, the projection actually sent, which may
/// carry schema-level deselects the caller never wrote. `original` is what
/// the caller asked for and only decides which keys are the caller's own.
/// Returns the detected mode.
pub fn reconcile(
    fields: &mut Projection,
    original: &Projection,
    paths: &PopulatePaths,
) -> ProjectionKind {
    let kind = classify(Some(fields));
    let targets = paths.iter().flat_map(|(path, opts)| {
        std::iter::once(path.as_str()).chain(opts.discriminator_field.as_deref())
    });

    match kind {
        ProjectionKind::Inclusive => {
            for path in targets {
                if !is_path_in_fields(original, path) {
                    fields.insert(path, 1i64);
                    #[cfg(feature = "tracing")]
                    tracing::trace!(path, "selected populated path");
                } else if original.get(path).is_some_and(ProjectionValue::is_explicit_exclusion) {
                    fields.remove(path);
                    #[cfg(feature = "tracing")]
                    tracing::trace!(path, "dropped excluded populated path");
                }
            }
        }
        ProjectionKind::Exclusive => {
            for path in targets {
                if !mentions(original, path) && fields.remove(path).is_some() {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(path, "un-excluded populated path");
                }
            }
        }
        ProjectionKind::Indeterminate => {}
    }
    kind
}

/// True when the caller's projection names `path`, an ancestor of it, or
/// the positional form of either.
pub fn is_path_in_fields(original: &Projection, path: &str) -> bool {
    ancestors(path).any(|a| mentions(original, a) || mentions(original, &positional(a)))
}

fn mentions(projection: &Projection, key: &str) -> bool {
    !matches!(projection.get(key), None | Some(ProjectionValue::Flag(serde_json::Value::Null)))
}
