#![forbid(unsafe_code)]
//! refsieve-projection: classify projections and make room for populated
//! paths.
//!
//! - `analyze`: inclusive / exclusive / indeterminate classification and
//!   path-exclusion checks.
//! - `reconcile`: add or drop reference paths in the outbound projection
//!   without overriding what the caller asked for.
//! - `sanitize`: neutralize string-valued flags from untrusted projections.

pub mod analyze;
pub mod reconcile;
pub mod sanitize;

pub use analyze::{classify, is_exclusive, is_inclusive, is_path_excluded, ProjectionKind};
pub use reconcile::{reconcile, PopulateOptions, PopulatePaths};
pub use sanitize::sanitize_projection;
