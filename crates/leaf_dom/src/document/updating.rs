use anyhow::Error;

use super::NodeKey;

/// One applied primitive mutation, journaled by the document and mirrored to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DOMUpdate {
    CreateElement {
        node: NodeKey,
        tag: String,
    },
    CreateText {
        node: NodeKey,
        text: String,
    },
    SetText {
        node: NodeKey,
        text: String,
    },
    SetAttr {
        node: NodeKey,
        name: String,
        value: String,
    },
    RemoveAttr {
        node: NodeKey,
        name: String,
    },
    AddListener {
        node: NodeKey,
        event: String,
    },
    RemoveListener {
        node: NodeKey,
        event: String,
    },
    InsertBefore {
        parent: NodeKey,
        node: NodeKey,
        before: NodeKey,
    },
    AppendChild {
        parent: NodeKey,
        node: NodeKey,
    },
    RemoveChild {
        parent: NodeKey,
        node: NodeKey,
    },
}

impl DOMUpdate {
    /// Returns true for updates that change the shape of the attached tree.
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InsertBefore { .. } | Self::AppendChild { .. } | Self::RemoveChild { .. }
        )
    }
}

/// A subscriber that receives `DOMUpdate` values and mirrors them into its own state.
pub trait DOMSubscriber {
    /// Apply a single `DOMUpdate` to the subscriber state.
    fn apply_update(&mut self, update: &DOMUpdate) -> Result<(), Error>;
}
