//! The primitive-operation boundary between the reconciler and a live document.

use crate::document::{Document, NodeKey, NodeKind};
use crate::error::DomError;
use crate::events::{EventListener, is_known_event_name};

/// A live mutable tree of nodes.
///
/// The reconciler issues only these operations; it never queries layout or
/// styling. Newly created nodes are detached until inserted.
pub trait RenderTarget {
    fn create_element(&mut self, tag: &str) -> NodeKey;

    fn create_text_node(&mut self, text: &str) -> NodeKey;

    fn set_text(&mut self, node: NodeKey, text: &str) -> Result<(), DomError>;

    fn set_attribute(&mut self, node: NodeKey, name: &str, value: &str) -> Result<(), DomError>;

    fn remove_attribute(&mut self, node: NodeKey, name: &str) -> Result<(), DomError>;

    /// Attach `listener` for `event`, replacing any listener already attached for it.
    fn add_event_listener(
        &mut self,
        node: NodeKey,
        event: &str,
        listener: EventListener,
    ) -> Result<(), DomError>;

    fn remove_event_listener(&mut self, node: NodeKey, event: &str) -> Result<(), DomError>;

    /// Insert `node` under `parent` before `reference`, or append when `reference` is `None`.
    /// A node that is already attached is moved.
    fn insert_before(
        &mut self,
        parent: NodeKey,
        node: NodeKey,
        reference: Option<NodeKey>,
    ) -> Result<(), DomError>;

    fn append_child(&mut self, parent: NodeKey, node: NodeKey) -> Result<(), DomError> {
        self.insert_before(parent, node, None)
    }

    /// Remove `node` and its whole subtree from `parent`.
    fn remove_child(&mut self, parent: NodeKey, node: NodeKey) -> Result<(), DomError>;

    /// Whether `node` understands `event`. Unknown events may still be attached.
    fn is_known_event(&self, node: NodeKey, event: &str) -> bool;
}

impl RenderTarget for Document {
    fn create_element(&mut self, tag: &str) -> NodeKey {
        self.create_element_node(tag)
    }

    fn create_text_node(&mut self, text: &str) -> NodeKey {
        self.create_text(text)
    }

    fn set_text(&mut self, node: NodeKey, text: &str) -> Result<(), DomError> {
        self.write_text(node, text)
    }

    fn set_attribute(&mut self, node: NodeKey, name: &str, value: &str) -> Result<(), DomError> {
        self.write_attr(node, name, value)
    }

    fn remove_attribute(&mut self, node: NodeKey, name: &str) -> Result<(), DomError> {
        self.clear_attr(node, name)
    }

    fn add_event_listener(
        &mut self,
        node: NodeKey,
        event: &str,
        listener: EventListener,
    ) -> Result<(), DomError> {
        self.attach_listener(node, event, listener)
    }

    fn remove_event_listener(&mut self, node: NodeKey, event: &str) -> Result<(), DomError> {
        self.detach_listener(node, event)
    }

    fn insert_before(
        &mut self,
        parent: NodeKey,
        node: NodeKey,
        reference: Option<NodeKey>,
    ) -> Result<(), DomError> {
        self.insert_node(parent, node, reference)
    }

    fn remove_child(&mut self, parent: NodeKey, node: NodeKey) -> Result<(), DomError> {
        self.remove_node(parent, node)
    }

    fn is_known_event(&self, node: NodeKey, event: &str) -> bool {
        matches!(
            self.get(node).map(|entry| &entry.kind),
            Some(NodeKind::Element { .. })
        ) && is_known_event_name(event)
    }
}
