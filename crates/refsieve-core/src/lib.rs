#![forbid(unsafe_code)]
//! refsieve-core: shared building blocks for reference-filter synthesis.
//!
//! Design intent:
//! - Pure, synchronous data transformations; no I/O and no async.
//! - Untyped JSON is normalized once at the boundary (`Filter::from_json`,
//!   `Projection::from_json`) so downstream crates pattern-match on explicit
//!   variants instead of sniffing shapes.
//! - Trust annotations are explicit `Node::Marked` wrappers issued by a
//!   once-built registry (`marker`), never hidden state on caller data.

pub mod config;
pub mod error;
pub mod filter;
pub mod hash;
pub mod marker;
pub mod path;
pub mod prelude;
pub mod projection;
pub mod schema;

pub use error::{Error, Result};
