use core::fmt;
use std::collections::HashMap;

use indextree::{Arena, NodeError, NodeId};
use log::{error, trace};
use smallvec::SmallVec;

use crate::error::DomError;
use crate::events::{Event, EventListener};

mod printing;
mod updating;

pub use updating::{DOMSubscriber, DOMUpdate};

/// A stable handle to a node of a [`Document`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeKey(NodeId);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DOMNode {
    pub kind: NodeKind,
    pub attrs: SmallVec<[(String, String); 4]>,
}

/// Arena-backed mutable document.
///
/// Nodes are created detached and become part of the document once inserted
/// under [`Document::root`] (directly or through an attached ancestor).
pub struct Document {
    dom: Arena<DOMNode>,
    root: NodeId,
    listeners: HashMap<NodeKey, Vec<(String, EventListener)>>,
    journal: Vec<DOMUpdate>,
    applied: u64,
    subscribers: Vec<Box<dyn DOMSubscriber>>,
}

impl Document {
    pub fn new() -> Self {
        let mut dom = Arena::new();
        Self {
            root: dom.new_node(DOMNode::default()),
            dom,
            listeners: HashMap::new(),
            journal: Vec::new(),
            applied: 0,
            subscribers: Vec::new(),
        }
    }

    /// The document node.
    #[inline]
    pub fn root(&self) -> NodeKey {
        NodeKey(self.root)
    }

    /// Look up a live node.
    pub fn get(&self, node: NodeKey) -> Option<&DOMNode> {
        if node.0.is_removed(&self.dom) {
            return None;
        }
        self.dom.get(node.0).map(indextree::Node::get)
    }

    /// Returns true if `node` names a live node.
    pub fn contains(&self, node: NodeKey) -> bool {
        self.get(node).is_some()
    }

    pub fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        self.get(node)?;
        self.dom.get(node.0)?.parent().map(NodeKey)
    }

    pub fn children(&self, node: NodeKey) -> Vec<NodeKey> {
        if self.get(node).is_none() {
            return Vec::new();
        }
        node.0.children(&self.dom).map(NodeKey).collect()
    }

    pub fn attribute(&self, node: NodeKey, name: &str) -> Option<&str> {
        self.get(node)?
            .attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of every text node below (and including) `node`.
    pub fn text_content(&self, node: NodeKey) -> String {
        let mut out = String::new();
        if self.get(node).is_none() {
            return out;
        }
        for id in node.0.descendants(&self.dom) {
            if let Some(NodeKind::Text { text }) = self.dom.get(id).map(|entry| &entry.get().kind) {
                out.push_str(text);
            }
        }
        out
    }

    /// Number of listeners currently attached to `node`.
    pub fn listener_count(&self, node: NodeKey) -> usize {
        self.listeners.get(&node).map_or(0, Vec::len)
    }

    /// Listeners for `event` along the bubbling path, target first.
    ///
    /// The handles are cloned so callers can release their borrow of the
    /// document before invoking them.
    pub fn listeners_for(&self, node: NodeKey, event: &str) -> Vec<(NodeKey, EventListener)> {
        if self.get(node).is_none() {
            return Vec::new();
        }
        node.0
            .ancestors(&self.dom)
            .map(NodeKey)
            .flat_map(|current| {
                self.listeners
                    .get(&current)
                    .into_iter()
                    .flatten()
                    .filter(|(name, _)| name == event)
                    .map(move |(_, listener)| (current, EventListener::clone(listener)))
            })
            .collect()
    }

    /// Dispatch `event` on `node`, bubbling towards the root. Returns the number
    /// of listeners invoked.
    pub fn dispatch_event(&self, node: NodeKey, event: &str) -> usize {
        let listeners = self.listeners_for(node, event);
        let count = listeners.len();
        for (current, listener) in listeners {
            listener(&Event {
                kind: event.to_owned(),
                target: node,
                current_target: current,
            });
        }
        count
    }

    /// Register a mirror that receives every applied update.
    pub fn subscribe(&mut self, subscriber: Box<dyn DOMSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Drain the journal of applied updates.
    pub fn take_updates(&mut self) -> Vec<DOMUpdate> {
        core::mem::take(&mut self.journal)
    }

    /// Total number of updates applied since creation.
    #[inline]
    pub fn update_count(&self) -> u64 {
        self.applied
    }

    fn record(&mut self, update: DOMUpdate) {
        trace!(target: "leaf_dom", "apply {update:?}");
        for subscriber in &mut self.subscribers {
            if let Err(err) = subscriber.apply_update(&update) {
                error!(target: "leaf_dom", "subscriber failed to mirror {update:?}: {err:#}");
            }
        }
        self.applied = self.applied.saturating_add(1);
        self.journal.push(update);
    }

    fn live(&self, node: NodeKey) -> Result<&DOMNode, DomError> {
        self.get(node).ok_or(DomError::UnknownNode(node))
    }

    fn live_mut(&mut self, node: NodeKey) -> Result<&mut DOMNode, DomError> {
        if node.0.is_removed(&self.dom) {
            return Err(DomError::UnknownNode(node));
        }
        self.dom
            .get_mut(node.0)
            .map(indextree::Node::get_mut)
            .ok_or(DomError::UnknownNode(node))
    }

    fn element_mut(&mut self, node: NodeKey) -> Result<&mut DOMNode, DomError> {
        let entry = self.live_mut(node)?;
        if matches!(entry.kind, NodeKind::Element { .. }) {
            Ok(entry)
        } else {
            Err(DomError::NotAnElement(node))
        }
    }

    pub(crate) fn create_element_node(&mut self, tag: &str) -> NodeKey {
        let node = NodeKey(self.dom.new_node(DOMNode {
            kind: NodeKind::Element {
                tag: tag.to_owned(),
            },
            attrs: SmallVec::new(),
        }));
        self.record(DOMUpdate::CreateElement {
            node,
            tag: tag.to_owned(),
        });
        node
    }

    pub(crate) fn create_text(&mut self, text: &str) -> NodeKey {
        let node = NodeKey(self.dom.new_node(DOMNode {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        }));
        self.record(DOMUpdate::CreateText {
            node,
            text: text.to_owned(),
        });
        node
    }

    pub(crate) fn write_text(&mut self, node: NodeKey, value: &str) -> Result<(), DomError> {
        match &mut self.live_mut(node)?.kind {
            NodeKind::Text { text } => {
                value.clone_into(text);
            }
            NodeKind::Document | NodeKind::Element { .. } => return Err(DomError::NotText(node)),
        }
        self.record(DOMUpdate::SetText {
            node,
            text: value.to_owned(),
        });
        Ok(())
    }

    pub(crate) fn write_attr(&mut self, node: NodeKey, name: &str, value: &str) -> Result<(), DomError> {
        let entry = self.element_mut(node)?;
        if let Some(slot) = entry.attrs.iter_mut().find(|(attr, _)| attr == name) {
            value.clone_into(&mut slot.1);
        } else {
            entry.attrs.push((name.to_owned(), value.to_owned()));
        }
        self.record(DOMUpdate::SetAttr {
            node,
            name: name.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    pub(crate) fn clear_attr(&mut self, node: NodeKey, name: &str) -> Result<(), DomError> {
        let entry = self.element_mut(node)?;
        let before = entry.attrs.len();
        entry.attrs.retain(|(attr, _)| attr != name);
        if entry.attrs.len() != before {
            self.record(DOMUpdate::RemoveAttr {
                node,
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    pub(crate) fn attach_listener(
        &mut self,
        node: NodeKey,
        event: &str,
        listener: EventListener,
    ) -> Result<(), DomError> {
        self.element_mut(node)?;
        let slot = self.listeners.entry(node).or_default();
        slot.retain(|(name, _)| name != event);
        slot.push((event.to_owned(), listener));
        self.record(DOMUpdate::AddListener {
            node,
            event: event.to_owned(),
        });
        Ok(())
    }

    pub(crate) fn detach_listener(&mut self, node: NodeKey, event: &str) -> Result<(), DomError> {
        self.element_mut(node)?;
        let Some(slot) = self.listeners.get_mut(&node) else {
            return Ok(());
        };
        let before = slot.len();
        slot.retain(|(name, _)| name != event);
        if slot.len() != before {
            self.record(DOMUpdate::RemoveListener {
                node,
                event: event.to_owned(),
            });
        }
        Ok(())
    }

    pub(crate) fn insert_node(
        &mut self,
        parent: NodeKey,
        node: NodeKey,
        reference: Option<NodeKey>,
    ) -> Result<(), DomError> {
        self.live(parent)?;
        self.live(node)?;
        if let Some(reference) = reference {
            self.live(reference)?;
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }
        if parent.0.ancestors(&self.dom).any(|id| id == node.0) {
            return Err(DomError::CycleDetected { parent, node });
        }
        node.0.detach(&mut self.dom);
        let outcome = match reference {
            Some(reference) => reference.0.checked_insert_before(node.0, &mut self.dom),
            None => parent.0.checked_append(node.0, &mut self.dom),
        };
        outcome.map_err(|err| match err {
            NodeError::Removed => DomError::UnknownNode(node),
            _ => DomError::CycleDetected { parent, node },
        })?;
        self.record(match reference {
            Some(before) => DOMUpdate::InsertBefore {
                parent,
                node,
                before,
            },
            None => DOMUpdate::AppendChild { parent, node },
        });
        Ok(())
    }

    pub(crate) fn remove_node(&mut self, parent: NodeKey, node: NodeKey) -> Result<(), DomError> {
        self.live(node)?;
        if self.parent(node) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: node,
            });
        }
        let subtree: Vec<NodeId> = node.0.descendants(&self.dom).collect();
        for id in subtree {
            self.listeners.remove(&NodeKey(id));
        }
        node.0.remove_subtree(&mut self.dom);
        self.record(DOMUpdate::RemoveChild { parent, node });
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
