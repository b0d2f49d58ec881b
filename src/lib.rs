#![forbid(unsafe_code)]
//! refsieve: reference resolution and safe filter synthesis for document
//! queries.
//!
//! Design intent:
//! - Build the secondary query that fetches referenced documents from ids
//!   gathered off already-loaded source documents (`populate`).
//! - Keep the outbound projection consistent with what the caller asked for
//!   while still returning the fields a populate needs (`projection`).
//! - Strip operator injection from untrusted filters without touching nodes
//!   the application vouched for (`sanitize`).
//!
//! The member crates can be used directly; this crate re-exports them under
//! shorter names and wires [`SieveConfig`] through to the sanitizer and
//! builder.

pub use refsieve_core as core;
pub use refsieve_populate as populate;
pub use refsieve_projection as projection;
pub use refsieve_sanitize as sanitize;

pub use refsieve_core::config::{SanitizeMode, SieveConfig};
pub use refsieve_core::filter::{Clause, Filter, Node};
pub use refsieve_core::marker::{selector, trusted};
pub use refsieve_core::projection::Projection;
pub use refsieve_populate::{build_reference_filter, ReferenceQuery, RefId};
pub use refsieve_projection::{classify, reconcile, PopulateOptions, PopulatePaths, ProjectionKind};
pub use refsieve_sanitize::{SanitizeError, Sanitizer};

use refsieve_core::schema::TypeRegistry;

/// Build a reference filter and run it through a sanitizer configured from
/// the same settings.
///
/// The synthesized `$in` selectors survive even a strict sanitizer; operator
/// objects smuggled in through `matches` do not.
pub fn build_sanitized(
    cfg: &SieveConfig,
    query: &ReferenceQuery,
    ids: &[RefId],
    registry: &dyn TypeRegistry,
) -> Result<Filter, SanitizeError> {
    let mut filter = query.build(ids, registry);
    Sanitizer::new(cfg)?.sanitize(&mut filter)?;
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use refsieve_core::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_build_sanitized_strict() {
        let cfg = SieveConfig {
            sanitize_mode: SanitizeMode::Strict,
            ..SieveConfig::default()
        };
        let query = ReferenceQuery::new("owner").foreign_field("editor");
        let ids = [RefId::Id(json!(1)), RefId::Id(json!(2))];
        let filter = build_sanitized(&cfg, &query, &ids, &Schema::new()).unwrap();
        assert_eq!(
            filter.to_json(),
            json!({"$or": [{"owner": {"$in": [1, 2]}}, {"editor": {"$in": [1, 2]}}]})
        );

        let bad = query.matching(Filter::from_json(&json!({"$where": "1"})).unwrap());
        assert!(build_sanitized(&cfg, &bad, &ids, &Schema::new()).is_err());
    }
}
