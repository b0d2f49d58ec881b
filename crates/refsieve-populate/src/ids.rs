//! Id batch validation against the foreign field's schema type.

use refsieve_core::schema::SchemaNode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One identifier collected from a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RefId {
    Id(Value),
    /// Intentionally absent: the source document asked not to be resolved.
    Skip(Value),
}

impl RefId {
    pub fn value(&self) -> &Value {
        match self {
            RefId::Id(v) | RefId::Skip(v) => v,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, RefId::Skip(_))
    }
}

impl From<Value> for RefId {
    fn from(value: Value) -> Self {
        RefId::Id(value)
    }
}

/// Reduce `ids` to the values that belong in an `$in` list.
///
/// `Skip` entries are always dropped. With `skip_invalid` set, ids that fail
/// to cast to `field_type` are dropped too; otherwise they pass through and
/// the database rejects or empty-matches them. Without a known field type no
/// cast check is possible and ids pass through. Original values are kept,
/// not their cast forms.
pub fn filter_invalid_ids(
    ids: &[RefId],
    field_type: Option<&SchemaNode>,
    skip_invalid: bool,
) -> Vec<Value> {
    let present = ids.iter().filter_map(|id| match id {
        RefId::Id(v) => Some(v),
        RefId::Skip(_) => None,
    });

    let out: Vec<Value> = match (skip_invalid, field_type) {
        (true, Some(ty)) => present.filter(|v| ty.cast(v).is_ok()).cloned().collect(),
        _ => present.cloned().collect(),
    };

    #[cfg(feature = "tracing")]
    {
        let skipped = ids.iter().filter(|id| id.is_skip()).count();
        tracing::trace!(
            total = ids.len(),
            kept = out.len(),
            skipped,
            typed = field_type.is_some(),
            "filtered reference ids"
        );
    }

    out
}
