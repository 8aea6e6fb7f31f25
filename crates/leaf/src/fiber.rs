//! Fiber trees: one per render pass, stored in an `indextree` arena.
//!
//! A fiber carries everything the diff and commit phases need about one node of
//! the rendered description: its kind, props, stable instance key, the
//! classification assigned by the diff, the matching fiber of the previous tree
//! and the host node it owns once committed.

use std::collections::HashMap;
use std::rc::Rc;

use indextree::{Arena, NodeId};
use leaf_dom::NodeKey;
use log::warn;
use serde::Serialize;

use crate::error::RenderError;
use crate::props::Props;

/// Stable identity of a node position across passes.
pub type InstanceKey = Rc<str>;

/// Key of the root fiber.
pub const ROOT_KEY: &str = "root";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Classification {
    /// Unchanged: carries its host node forward.
    #[default]
    None,
    /// New: creates and inserts its host node.
    Placement,
    /// Changed props or text on an existing host node.
    Update,
    /// Only ever set on fibers of the previous tree.
    Deletion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FiberKind {
    Root,
    Native(String),
    Component(&'static str),
    Fragment,
    Text,
    Empty,
}

impl FiberKind {
    /// Discriminator appended to instance keys.
    pub fn discriminator(&self) -> &str {
        match self {
            Self::Root => ROOT_KEY,
            Self::Native(tag) => tag,
            Self::Component(name) => name,
            Self::Fragment => "#fragment",
            Self::Text => "#text",
            Self::Empty => "#empty",
        }
    }

    /// Whether fibers of this kind own a host node.
    pub const fn is_host(&self) -> bool {
        matches!(self, Self::Root | Self::Native(_) | Self::Text)
    }
}

#[derive(Clone, Debug)]
pub struct FiberNode {
    pub kind: FiberKind,
    pub key: InstanceKey,
    pub props: Props,
    /// Text content of text fibers.
    pub content: Option<String>,
    pub classification: Classification,
    /// Matching fiber in the previous tree.
    pub alternate: Option<NodeId>,
    /// Host node, assigned during commit.
    pub handle: Option<NodeKey>,
}

impl FiberNode {
    pub fn new(kind: FiberKind, key: InstanceKey, props: Props) -> Self {
        Self {
            kind,
            key,
            props,
            content: None,
            classification: Classification::None,
            alternate: None,
            handle: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Build the instance key of a child.
///
/// Explicit keys are prefixed with `@` so they never collide with positional indices.
pub fn child_key(parent: &str, key: Option<&str>, index: usize, kind: &FiberKind) -> InstanceKey {
    let disc = kind.discriminator();
    match key {
        Some(key) => Rc::from(format!("{parent}-@{key}:{disc}")),
        None => Rc::from(format!("{parent}-{index}:{disc}")),
    }
}

#[derive(Debug, Default)]
pub struct FiberTree {
    arena: Arena<FiberNode>,
    root: Option<NodeId>,
    by_key: HashMap<InstanceKey, NodeId>,
}

impl FiberTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node` as the last child of `parent`, or as the root when `parent` is `None`.
    pub fn insert(&mut self, parent: Option<NodeId>, node: FiberNode) -> NodeId {
        let key = Rc::clone(&node.key);
        let id = self.arena.new_node(node);
        match parent {
            Some(parent) => parent.append(id, &mut self.arena),
            None => self.root = Some(id),
        }
        if self.by_key.insert(Rc::clone(&key), id).is_some() {
            warn!(target: "leaf::build", "duplicate instance key {key}; siblings share a key");
        }
        id
    }

    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_id(&self) -> Result<NodeId, RenderError> {
        self.root
            .ok_or_else(|| RenderError::StructuralInvariant("fiber tree has no root".to_owned()))
    }

    pub fn get(&self, id: NodeId) -> Option<&FiberNode> {
        self.arena.get(id).map(indextree::Node::get)
    }

    pub fn node(&self, id: NodeId) -> Result<&FiberNode, RenderError> {
        self.get(id)
            .ok_or_else(|| RenderError::StructuralInvariant(format!("fiber {id} missing from its tree")))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut FiberNode, RenderError> {
        self.arena
            .get_mut(id)
            .map(indextree::Node::get_mut)
            .ok_or_else(|| RenderError::StructuralInvariant(format!("fiber {id} missing from its tree")))
    }

    pub fn lookup(&self, key: &str) -> Option<&FiberNode> {
        self.by_key.get(key).and_then(|id| self.get(*id))
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        id.children(&self.arena).collect()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(indextree::Node::parent)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(indextree::Node::next_sibling)
    }

    /// `id` and all its descendants in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        id.descendants(&self.arena).collect()
    }

    /// Every fiber in pre-order, starting at the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        self.root.map(|root| self.descendants(root)).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Nearest proper ancestor of `id` that owns a host node.
    pub fn host_parent(&self, id: NodeId) -> Result<NodeKey, RenderError> {
        id.ancestors(&self.arena)
            .skip(1)
            .find_map(|ancestor| self.get(ancestor).and_then(|fiber| fiber.handle))
            .ok_or_else(|| {
                RenderError::StructuralInvariant(format!("fiber {id} has no host ancestor"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_positional_unless_explicit() {
        let div = FiberKind::Native("div".to_owned());
        assert_eq!(&*child_key(ROOT_KEY, None, 2, &div), "root-2:div");
        assert_eq!(&*child_key(ROOT_KEY, Some("2"), 0, &div), "root-@2:div");
        assert_eq!(
            &*child_key("root-0:App", None, 0, &FiberKind::Text),
            "root-0:App-0:#text"
        );
    }

    #[test]
    fn host_parent_skips_hostless_fibers() -> Result<(), RenderError> {
        let mut tree = FiberTree::new();
        let root_key: InstanceKey = Rc::from(ROOT_KEY);
        let root = tree.insert(None, FiberNode::new(FiberKind::Root, root_key, Props::new()));
        let component = tree.insert(
            Some(root),
            FiberNode::new(FiberKind::Component("App"), Rc::from("root-0:App"), Props::new()),
        );
        let text = tree.insert(
            Some(component),
            FiberNode::new(FiberKind::Text, Rc::from("root-0:App-0:#text"), Props::new()),
        );
        let doc = leaf_dom::Document::new();
        tree.node_mut(root)?.handle = Some(doc.root());

        assert_eq!(tree.host_parent(text)?, doc.root());
        assert_eq!(tree.preorder(), vec![root, component, text]);
        assert!(tree.lookup("root-0:App").is_some());
        Ok(())
    }
}
