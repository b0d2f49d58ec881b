#![forbid(unsafe_code)]
//! refsieve-sanitize: neutralize operator injection in query filters.
//!
//! Untrusted filters may carry operator objects (`{pwd: {$ne: null}}`) where
//! the application expected a plain value. The sanitizer either rejects them
//! (strict) or rewrites them to forced equality (permissive). Nodes wrapped
//! by `refsieve_core::marker::trusted` or `selector` are left alone.
//!
//! Checking runs to completion before any rewrite, so a failing call leaves
//! the filter untouched.

pub mod error;
pub mod sanitizer;

pub use error::{FilterSnapshot, Result, SanitizeError};
pub use sanitizer::{sanitize_filter, Sanitizer};
