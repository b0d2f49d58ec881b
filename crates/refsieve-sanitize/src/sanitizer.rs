//! Strict / permissive filter sanitizing.

use refsieve_core::config::{SanitizeMode, SieveConfig};
use refsieve_core::filter::{Clause, Filter, Node, AND, NOR, OR};
use serde_json::Value;

use crate::error::{FilterSnapshot, Result, SanitizeError};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sanitizer {
    cfg: SieveConfig,
}

enum Violation {
    Disallowed { field: String, path: String },
    Forbidden { operator: String },
}

impl Violation {
    fn into_error(self, root: &Filter) -> SanitizeError {
        let filter = FilterSnapshot::of(root);
        match self {
            Violation::Disallowed { field, path } => SanitizeError::DisallowedOperator {
                field,
                path,
                filter,
            },
            Violation::Forbidden { operator } => {
                SanitizeError::ForbiddenOperator { operator, filter }
            }
        }
    }
}

/// An operator object that is neither marked nor already `{$eq: v}`.
fn needs_rewrite(node: &Node) -> bool {
    !node.is_trusted() && !node.is_selector() && node.is_operator() && !node.is_eq_form()
}

impl Sanitizer {
    /// Build a sanitizer from `cfg`, rejecting an invalid config.
    pub fn new(cfg: &SieveConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg: cfg.clone() })
    }

    pub fn strict() -> Self {
        Self::with_mode(SanitizeMode::Strict)
    }

    pub fn permissive() -> Self {
        Self::with_mode(SanitizeMode::Permissive)
    }

    fn with_mode(mode: SanitizeMode) -> Self {
        Self {
            cfg: SieveConfig {
                sanitize_mode: mode,
                ..SieveConfig::default()
            },
        }
    }

    pub fn mode(&self) -> SanitizeMode {
        self.cfg.sanitize_mode
    }

    pub fn config(&self) -> &SieveConfig {
        &self.cfg
    }

    /// Sanitize `filter` in place.
    ///
    /// Strict mode returns `DisallowedOperator` for the first untrusted
    /// operator object. Permissive mode wraps each one in `$eq`. Both modes
    /// return `ForbiddenOperator` for an untrusted forbidden key. On error the
    /// filter is unchanged.
    pub fn sanitize(&self, filter: &mut Filter) -> Result<()> {
        if let Some(v) = self.find_violation(filter, "") {
            return Err(v.into_error(filter));
        }
        if self.mode() == SanitizeMode::Permissive {
            let _rewritten = self.rewrite(filter, "");
            #[cfg(feature = "tracing")]
            if _rewritten > 0 {
                tracing::trace!(rewritten = _rewritten, "forced equality on operator objects");
            }
        }
        Ok(())
    }

    /// Sanitize every filter; if any fails, none is modified.
    pub fn sanitize_all(&self, filters: &mut [Filter]) -> Result<()> {
        for f in filters.iter() {
            if let Some(v) = self.find_violation(f, "") {
                return Err(v.into_error(f));
            }
        }
        for f in filters.iter_mut() {
            self.sanitize(f)?;
        }
        Ok(())
    }

    /// Sanitize raw JSON: an object filter, or an array of them.
    pub fn sanitize_json(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Array(items) => {
                let mut filters = items
                    .iter()
                    .map(Filter::from_json)
                    .collect::<refsieve_core::Result<Vec<_>>>()?;
                self.sanitize_all(&mut filters)?;
                Ok(Value::Array(filters.iter().map(Filter::to_json).collect()))
            }
            other => {
                let mut filter = Filter::from_json(other)?;
                self.sanitize(&mut filter)?;
                Ok(filter.to_json())
            }
        }
    }

    fn find_violation(&self, filter: &Filter, prefix: &str) -> Option<Violation> {
        for clause in filter.clauses() {
            match clause {
                Clause::Command(key, node) if self.cfg.is_forbidden(key) && !node.is_trusted() => {
                    return Some(Violation::Forbidden {
                        operator: key.clone(),
                    });
                }
                Clause::Command(key, node) if self.walks_loose_list(key, node) => {
                    if let Node::Literal(Value::Array(items)) = node.unmarked() {
                        for (i, item) in items.iter().enumerate() {
                            let Value::Object(map) = item else {
                                continue;
                            };
                            let inner = Filter::from_map(map);
                            let path = format!("{}{}.{}.", prefix, key, i);
                            if let Some(v) = self.find_violation(&inner, &path) {
                                return Some(v);
                            }
                        }
                    }
                }
                Clause::Field(key, node) | Clause::Command(key, node) => {
                    if self.mode() == SanitizeMode::Strict && needs_rewrite(node) {
                        return Some(Violation::Disallowed {
                            field: key.clone(),
                            path: format!("{}{}", prefix, key),
                        });
                    }
                }
                Clause::And(list) | Clause::Or(list) => {
                    if let Some(v) = self.find_in_list(clause.key(), list, prefix) {
                        return Some(v);
                    }
                }
                Clause::Nor(list) => {
                    if self.cfg.recurse_nor {
                        if let Some(v) = self.find_in_list(clause.key(), list, prefix) {
                            return Some(v);
                        }
                    }
                }
            }
        }
        None
    }

    /// A logical key whose array also holds non-objects. The filter model
    /// keeps it as an opaque command, so its object elements are walked here.
    fn walks_loose_list(&self, key: &str, node: &Node) -> bool {
        let logical = key == AND || key == OR || (key == NOR && self.cfg.recurse_nor);
        logical
            && !node.is_trusted()
            && matches!(node.unmarked(), Node::Literal(Value::Array(_)))
    }

    fn find_in_list(&self, key: &str, list: &[Filter], prefix: &str) -> Option<Violation> {
        list.iter().enumerate().find_map(|(i, f)| {
            self.find_violation(f, &format!("{}{}.{}.", prefix, key, i))
        })
    }

    fn rewrite(&self, filter: &mut Filter, prefix: &str) -> usize {
        let mut count = 0;
        for clause in filter.clauses_mut() {
            let key = clause.key().to_string();
            match clause {
                Clause::Command(_, node) if self.walks_loose_list(&key, node) => {
                    if let Node::Literal(Value::Array(items)) = node.unmarked_mut() {
                        for (i, item) in items.iter_mut().enumerate() {
                            let mut inner = match item {
                                Value::Object(map) => Filter::from_map(map),
                                _ => continue,
                            };
                            let path = format!("{}{}.{}.", prefix, key, i);
                            let rewritten = self.rewrite(&mut inner, &path);
                            if rewritten > 0 {
                                *item = inner.to_json();
                                count += rewritten;
                            }
                        }
                    }
                }
                Clause::Field(_, node) | Clause::Command(_, node) => {
                    if needs_rewrite(node) {
                        let original = std::mem::replace(node, Node::Literal(Value::Null));
                        *node = Node::equals(original);
                        count += 1;
                        #[cfg(feature = "tracing")]
                        tracing::trace!(path = %format!("{}{}", prefix, key), "wrapped operator object in $eq");
                    }
                }
                Clause::And(list) | Clause::Or(list) => {
                    count += self.rewrite_list(&key, list, prefix);
                }
                Clause::Nor(list) => {
                    if self.cfg.recurse_nor {
                        count += self.rewrite_list(&key, list, prefix);
                    }
                }
            }
        }
        count
    }

    fn rewrite_list(&self, key: &str, list: &mut [Filter], prefix: &str) -> usize {
        list.iter_mut()
            .enumerate()
            .map(|(i, f)| self.rewrite(f, &format!("{}{}.{}.", prefix, key, i)))
            .sum()
    }
}

/// Permissive sanitizing with the default forbidden-operator set.
pub fn sanitize_filter(filter: &mut Filter) -> Result<()> {
    Sanitizer::permissive().sanitize(filter)
}
