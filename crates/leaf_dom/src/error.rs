use core::fmt;

use crate::document::NodeKey;

/// Failures of primitive document operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The key does not name a live node (never created, or already removed).
    UnknownNode(NodeKey),
    /// `child` is not a direct child of `parent`.
    NotAChild {
        /// Expected parent.
        parent: NodeKey,
        /// Node that was expected under `parent`.
        child: NodeKey,
    },
    /// An element-only operation was applied to a text or document node.
    NotAnElement(NodeKey),
    /// A text-only operation was applied to a non-text node.
    NotText(NodeKey),
    /// The insertion would make a node its own ancestor.
    CycleDetected {
        /// Insertion parent.
        parent: NodeKey,
        /// Node being inserted.
        node: NodeKey,
    },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(node) => write!(f, "unknown node {node}"),
            Self::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of {parent}")
            }
            Self::NotAnElement(node) => write!(f, "node {node} is not an element"),
            Self::NotText(node) => write!(f, "node {node} is not a text node"),
            Self::CycleDetected { parent, node } => {
                write!(f, "inserting {node} under {parent} would create a cycle")
            }
        }
    }
}

impl std::error::Error for DomError {}
