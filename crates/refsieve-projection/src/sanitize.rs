//! Untrusted projection cleanup.

use refsieve_core::projection::{Projection, ProjectionValue};
use serde_json::Value;

/// Replace string-valued flags with `1`, recursing into nested projections.
/// Returns how many flags were rewritten.
pub fn sanitize_projection(projection: &mut Projection) -> usize {
    let mut rewritten = 0;
    for (_key, value) in projection.iter_mut() {
        match value {
            ProjectionValue::Flag(flag @ Value::String(_)) => {
                *flag = Value::from(1);
                rewritten += 1;
            }
            ProjectionValue::Nested(inner) => rewritten += sanitize_projection(inner),
            _ => {}
        }
    }
    #[cfg(feature = "tracing")]
    {
        if rewritten > 0 {
            tracing::trace!(rewritten, "sanitized string projection flags");
        }
    }
    rewritten
}
