#![forbid(unsafe_code)]
//! refsieve-populate: build the secondary filter that fetches referenced
//! documents.
//!
//! Given ids gathered from already-fetched source documents, the foreign
//! field(s) on the target collection, and any match fragments supplied with
//! the reference, produce one filter selecting exactly the target documents.
//! Synthesized `$in` selectors carry the selector marker so a later,
//! independent sanitizing pass leaves them intact.

pub mod filter;
pub mod ids;

pub use filter::{build_reference_filter, ReferenceQuery};
pub use ids::{filter_invalid_ids, RefId};
