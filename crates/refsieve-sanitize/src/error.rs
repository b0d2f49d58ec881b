use std::fmt;

use refsieve_core::filter::Filter;
use refsieve_core::hash::Digest;
use thiserror::Error;

/// Result type local to refsieve-sanitize.
pub type Result<T> = std::result::Result<T, SanitizeError>;

#[derive(Debug, Error)]
pub enum SanitizeError {
    /// `field` is the clause key; `path` also names the enclosing logical
    /// containers (`$or.1.pwd`).
    #[error("disallowed operator in filter at '{path}': {filter}")]
    DisallowedOperator {
        field: String,
        path: String,
        filter: FilterSnapshot,
    },

    #[error("forbidden operator '{operator}' in filter: {filter}")]
    ForbiddenOperator {
        operator: String,
        filter: FilterSnapshot,
    },

    #[error(transparent)]
    Core(#[from] refsieve_core::Error),
}

impl SanitizeError {
    /// The offending key: the field name, or the forbidden operator.
    pub fn key(&self) -> Option<&str> {
        match self {
            SanitizeError::DisallowedOperator { field, .. } => Some(field),
            SanitizeError::ForbiddenOperator { operator, .. } => Some(operator),
            SanitizeError::Core(_) => None,
        }
    }

    pub fn filter(&self) -> Option<&FilterSnapshot> {
        match self {
            SanitizeError::DisallowedOperator { filter, .. }
            | SanitizeError::ForbiddenOperator { filter, .. } => Some(filter),
            SanitizeError::Core(_) => None,
        }
    }
}

/// Printable copy of the filter that failed, with a digest for log
/// correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSnapshot {
    json: String,
    digest: Digest,
}

impl FilterSnapshot {
    pub fn of(filter: &Filter) -> Self {
        let value = filter.to_json();
        Self {
            json: value.to_string(),
            digest: Digest::of_json(&value),
        }
    }

    pub fn json(&self) -> &str {
        &self.json
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }
}

impl fmt::Display for FilterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.json, self.digest.short())
    }
}
