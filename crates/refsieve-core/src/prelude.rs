//! Convenient re-exports for downstream crates.

pub use crate::config::{SanitizeMode, SieveConfig};
pub use crate::error::{Error, Result};
pub use crate::filter::{Clause, Filter, Node, Operators, RESERVED_PREFIX};
pub use crate::marker::{selector, trusted, Marker, MarkerKind};
pub use crate::path::decompose;
pub use crate::projection::{Projection, ProjectionValue};
pub use crate::schema::{CastError, ScalarType, Schema, SchemaNode, TypeRegistry};
