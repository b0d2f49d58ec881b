//! Identity-scoped trust markers.
//!
//! A marker is attached to a filter node by wrapping it in
//! [`Node::Marked`](crate::filter::Node::Marked). Markers are only issued by
//! the process-wide [`MarkerRegistry`], which is built once on first use and
//! never mutated afterwards. They do not serialize: rendering a node to JSON
//! (or taking a [`structural_copy`](crate::filter::Node::structural_copy))
//! drops every marker, so anything rebuilt from plain data is untrusted again.

use std::fmt;

use once_cell::sync::Lazy;

use crate::filter::Node;

/// The two kinds of marker the sanitizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Applied by application code to fragments it authored.
    Trusted,
    /// Applied internally to synthesized `$in` selectors.
    Selector,
}

/// Opaque marker tag. Only obtainable through [`markers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker {
    id: u32,
    kind: MarkerKind,
}

impl Marker {
    pub fn kind(self) -> MarkerKind {
        self.kind
    }

    pub fn id(self) -> u32 {
        self.id
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.id)
    }
}

pub struct MarkerRegistry {
    trusted: Marker,
    selector: Marker,
}

impl MarkerRegistry {
    fn build() -> Self {
        Self {
            trusted: Marker {
                id: 1,
                kind: MarkerKind::Trusted,
            },
            selector: Marker {
                id: 2,
                kind: MarkerKind::Selector,
            },
        }
    }

    pub fn trusted(&self) -> Marker {
        self.trusted
    }

    pub fn selector(&self) -> Marker {
        self.selector
    }

    pub fn get(&self, kind: MarkerKind) -> Marker {
        match kind {
            MarkerKind::Trusted => self.trusted,
            MarkerKind::Selector => self.selector,
        }
    }
}

static REGISTRY: Lazy<MarkerRegistry> = Lazy::new(MarkerRegistry::build);

pub fn markers() -> &'static MarkerRegistry {
    &REGISTRY
}

/// Mark `node` as authored by trusted application code.
///
/// Trusted nodes are exempt from operator rewriting and from the forbidden
/// top-level operator check. Never apply this to end-user input.
pub fn trusted(node: impl Into<Node>) -> Node {
    Node::Marked(markers().trusted(), Box::new(node.into()))
}

/// Mark a synthesized selector so later sanitizing passes leave it alone.
pub fn selector(node: impl Into<Node>) -> Node {
    Node::Marked(markers().selector(), Box::new(node.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_is_stable() {
        assert_eq!(markers().trusted(), markers().trusted());
        assert_ne!(markers().trusted(), markers().selector());
        assert_eq!(markers().get(MarkerKind::Selector).kind(), MarkerKind::Selector);
    }

    #[test]
    fn test_stacked_markers_are_visible() {
        let node = trusted(selector(json!({"$in": [1, 2]})));
        assert!(node.is_marked(MarkerKind::Trusted));
        assert!(node.is_marked(MarkerKind::Selector));
        assert_eq!(node.to_json(), json!({"$in": [1, 2]}));
    }

    #[test]
    fn test_structural_copy_drops_markers() {
        let node = trusted(json!({"$ne": null}));
        let copy = node.structural_copy();
        assert!(node.is_trusted());
        assert!(!copy.is_trusted());
        assert_eq!(copy.to_json(), node.to_json());
    }
}
