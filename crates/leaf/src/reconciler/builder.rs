//! Build phase: expand an element description into a fresh fiber tree.
//!
//! Component render functions run here, with the hook scope bound to the
//! instance being built. Nothing touches the render target.

use std::rc::Rc;

use indextree::NodeId;
use leaf_dom::NodeKey;
use log::trace;

use super::RenderContext;
use crate::element::{Component, ElementKind, Node};
use crate::error::RenderError;
use crate::fiber::{FiberKind, FiberNode, FiberTree, InstanceKey, ROOT_KEY, child_key};
use crate::props::Props;

/// Build the fiber tree for `node` mounted under `container`.
pub(crate) fn build_tree(
    ctx: &mut RenderContext,
    node: &Node,
    container: NodeKey,
) -> Result<FiberTree, RenderError> {
    let mut tree = FiberTree::new();
    let mut root = FiberNode::new(FiberKind::Root, Rc::from(ROOT_KEY), Props::new());
    root.handle = Some(container);
    let root = tree.insert(None, root);
    build_node(ctx, &mut tree, node, root, 0)?;
    Ok(tree)
}

fn build_node(
    ctx: &mut RenderContext,
    tree: &mut FiberTree,
    node: &Node,
    parent: NodeId,
    index: usize,
) -> Result<NodeId, RenderError> {
    let parent_key = Rc::clone(&tree.node(parent)?.key);
    match node {
        Node::Empty => {
            let key = child_key(&parent_key, None, index, &FiberKind::Empty);
            Ok(tree.insert(Some(parent), FiberNode::new(FiberKind::Empty, key, Props::new())))
        }
        Node::Text(text) => {
            let key = child_key(&parent_key, None, index, &FiberKind::Text);
            let fiber = FiberNode::new(FiberKind::Text, key, Props::new()).with_content(text.as_str());
            Ok(tree.insert(Some(parent), fiber))
        }
        Node::Element(element) => {
            let kind = match &element.kind {
                ElementKind::Native(tag) => FiberKind::Native(tag.clone()),
                ElementKind::Component(component) => FiberKind::Component(component.name()),
                ElementKind::Fragment => FiberKind::Fragment,
            };
            let key = child_key(&parent_key, element.key.as_deref(), index, &kind);
            trace!(target: "leaf::build", "building {key}");
            let id = tree.insert(
                Some(parent),
                FiberNode::new(kind, Rc::clone(&key), element.props.clone()),
            );
            if let ElementKind::Component(component) = &element.kind {
                let rendered = render_component(ctx, component, &key, &element.props)?;
                build_node(ctx, tree, &rendered, id, 0)?;
            } else {
                for (position, child) in element.children.iter().enumerate() {
                    build_node(ctx, tree, child, id, position)?;
                }
            }
            Ok(id)
        }
    }
}

/// Call a component's render function with the scope bound to its hook store.
fn render_component(
    ctx: &mut RenderContext,
    component: &Component,
    key: &InstanceKey,
    props: &Props,
) -> Result<Node, RenderError> {
    if !ctx.hooks.contains(key) {
        ctx.mounted.push(Rc::clone(key));
    }
    let store = ctx.hooks.fetch_or_create(key);
    store.borrow_mut().begin_build();
    ctx.scope.bind(Rc::clone(key), Rc::clone(&store));
    let rendered = component.render(&ctx.scope, props);
    ctx.scope.unbind();
    let rendered = rendered?;
    store.borrow_mut().finish_build(ctx.config.hook_checks);
    Ok(rendered)
}
