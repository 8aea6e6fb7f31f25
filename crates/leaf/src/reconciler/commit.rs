//! Commit phase: apply a classified fiber tree to the render target.
//!
//! Runs in three steps: deletions against the previous tree, materialization of
//! host nodes in pre-order, then insertion of placed host nodes before their
//! first already-positioned following sibling.

use indextree::NodeId;
use leaf_dom::{NodeKey, RenderTarget};
use log::{trace, warn};

use super::RenderContext;
use crate::effects;
use crate::error::RenderError;
use crate::fiber::{Classification, FiberKind, FiberNode, FiberTree};
use crate::hooks::HookRegistry;
use crate::props::{HostProp, Props, Value, host_prop};

/// Counts of the primitive operations a commit issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CommitStats {
    pub(crate) deleted: usize,
    pub(crate) created: usize,
    pub(crate) inserted: usize,
    pub(crate) removed: usize,
    pub(crate) cleanup_failures: usize,
}

pub(crate) fn commit(
    ctx: &mut RenderContext,
    tree: &mut FiberTree,
    previous: Option<&FiberTree>,
    target: &mut dyn RenderTarget,
) -> Result<CommitStats, RenderError> {
    let mut stats = CommitStats::default();
    let deletions = core::mem::take(&mut ctx.deletions);
    if !deletions.is_empty() {
        let prev_tree = previous.ok_or_else(|| {
            RenderError::StructuralInvariant("deletions without a previous tree".to_owned())
        })?;
        stats.deleted = deletions.len();
        for stale in deletions {
            stats.cleanup_failures += unmount_instances(&mut ctx.hooks, prev_tree, stale)?;
            let parent = prev_tree.host_parent(stale)?;
            stats.removed += remove_host_nodes(prev_tree, stale, parent, target)?;
        }
    }

    for id in tree.preorder() {
        let handle = materialize(tree.node(id)?, previous, target, &mut stats)?;
        tree.node_mut(id)?.handle = handle;
    }

    for id in tree.preorder() {
        let fiber = tree.node(id)?;
        if fiber.classification != Classification::Placement || fiber.kind == FiberKind::Root {
            continue;
        }
        let Some(handle) = fiber.handle else {
            continue;
        };
        let parent = tree.host_parent(id)?;
        let before = next_positioned_host(tree, id);
        trace!(target: "leaf::commit", "insert {} under {parent} before {before:?}", fiber.key);
        target.insert_before(parent, handle, before)?;
        stats.inserted += 1;
    }
    Ok(stats)
}

/// Drop the hook stores of every component under `stale`, running their cleanups.
fn unmount_instances(
    hooks: &mut HookRegistry,
    prev_tree: &FiberTree,
    stale: NodeId,
) -> Result<usize, RenderError> {
    let mut failures = 0;
    for id in prev_tree.descendants(stale) {
        let fiber = prev_tree.node(id)?;
        if !matches!(fiber.kind, FiberKind::Component(_)) {
            continue;
        }
        let Some(store) = hooks.remove(&fiber.key) else {
            continue;
        };
        let cleanups = store.borrow_mut().take_all_cleanups();
        trace!(target: "leaf::commit", "unmounting {} ({} cleanups)", fiber.key, cleanups.len());
        failures += effects::run_cleanups(&fiber.key, cleanups);
    }
    Ok(failures)
}

/// Remove the topmost host nodes under `stale` from `parent`.
fn remove_host_nodes(
    prev_tree: &FiberTree,
    stale: NodeId,
    parent: NodeKey,
    target: &mut dyn RenderTarget,
) -> Result<usize, RenderError> {
    let fiber = prev_tree.node(stale)?;
    if let Some(handle) = fiber.handle {
        trace!(target: "leaf::commit", "remove {} from {parent}", fiber.key);
        target.remove_child(parent, handle)?;
        return Ok(1);
    }
    let mut removed = 0;
    for child in prev_tree.children(stale) {
        removed += remove_host_nodes(prev_tree, child, parent, target)?;
    }
    Ok(removed)
}

/// Host node owned by `fiber` after this commit.
fn materialize(
    fiber: &FiberNode,
    previous: Option<&FiberTree>,
    target: &mut dyn RenderTarget,
    stats: &mut CommitStats,
) -> Result<Option<NodeKey>, RenderError> {
    match fiber.classification {
        Classification::Placement => {
            let handle = match &fiber.kind {
                FiberKind::Root => fiber.handle,
                FiberKind::Native(tag) => {
                    let node = target.create_element(tag);
                    apply_props(target, node, None, &fiber.props)?;
                    Some(node)
                }
                FiberKind::Text => Some(target.create_text_node(fiber.content.as_deref().unwrap_or_default())),
                FiberKind::Component(_) | FiberKind::Fragment | FiberKind::Empty => None,
            };
            if handle.is_some() && fiber.kind != FiberKind::Root {
                stats.created += 1;
            }
            Ok(handle)
        }
        Classification::Update | Classification::None => {
            let alternate = alternate_of(fiber, previous)?;
            if fiber.kind == FiberKind::Root {
                return Ok(fiber.handle);
            }
            let handle = alternate.handle;
            if fiber.classification == Classification::Update && fiber.kind.is_host() {
                let node = handle.ok_or_else(|| {
                    RenderError::StructuralInvariant(format!("{} was updated but owns no host node", fiber.key))
                })?;
                if fiber.kind == FiberKind::Text {
                    let text = fiber.content.as_deref().unwrap_or_default();
                    if alternate.content.as_deref() != Some(text) {
                        target.set_text(node, text)?;
                    }
                } else {
                    apply_props(target, node, Some(&alternate.props), &fiber.props)?;
                }
            }
            Ok(handle)
        }
        Classification::Deletion => Err(RenderError::StructuralInvariant(format!(
            "{} is classified for deletion in the new tree",
            fiber.key
        ))),
    }
}

fn alternate_of<'prev>(
    fiber: &FiberNode,
    previous: Option<&'prev FiberTree>,
) -> Result<&'prev FiberNode, RenderError> {
    previous
        .zip(fiber.alternate)
        .and_then(|(prev_tree, alternate)| prev_tree.get(alternate))
        .ok_or_else(|| {
            RenderError::StructuralInvariant(format!(
                "{} is {:?} but has no alternate",
                fiber.key, fiber.classification
            ))
        })
}

/// First host node after `id` in document order that is already in place.
///
/// Placed siblings are skipped since they are not positioned yet. Host-less
/// siblings (components, fragments) are searched through, and when the
/// siblings run out the search continues after the nearest host-less ancestor.
fn next_positioned_host(tree: &FiberTree, id: NodeId) -> Option<NodeKey> {
    let mut current = id;
    loop {
        let mut sibling = tree.next_sibling(current);
        while let Some(candidate) = sibling {
            if let Some(handle) = first_positioned_host(tree, candidate) {
                return Some(handle);
            }
            sibling = tree.next_sibling(candidate);
        }
        let parent = tree.parent(current)?;
        if tree.get(parent)?.handle.is_some() {
            return None;
        }
        current = parent;
    }
}

fn first_positioned_host(tree: &FiberTree, id: NodeId) -> Option<NodeKey> {
    let fiber = tree.get(id)?;
    if fiber.classification == Classification::Placement {
        return None;
    }
    if fiber.handle.is_some() {
        return fiber.handle;
    }
    tree.children(id)
        .into_iter()
        .find_map(|child| first_positioned_host(tree, child))
}

/// Apply the difference between `old` and `new` props to a native host node.
fn apply_props(
    target: &mut dyn RenderTarget,
    node: NodeKey,
    old: Option<&Props>,
    new: &Props,
) -> Result<(), RenderError> {
    if let Some(old) = old {
        for (name, value) in old.iter() {
            if new.get(name).is_none() {
                clear_prop(target, node, name, value)?;
            }
        }
    }
    for (name, value) in new.iter() {
        let before = old.and_then(|old| old.get(name));
        if before == Some(value) {
            continue;
        }
        if let Some(before) = before
            && is_listener(name, before) != is_listener(name, value)
        {
            clear_prop(target, node, name, before)?;
        }
        set_prop(target, node, name, value)?;
    }
    Ok(())
}

fn is_listener(name: &str, value: &Value) -> bool {
    matches!(host_prop(name, value), HostProp::Listener { .. })
}

fn set_prop(
    target: &mut dyn RenderTarget,
    node: NodeKey,
    name: &str,
    value: &Value,
) -> Result<(), RenderError> {
    match host_prop(name, value) {
        HostProp::Listener { event, listener } => {
            if !target.is_known_event(node, &event) {
                warn!(target: "leaf::commit", "UnknownHostEvent: {event} on {node}; attaching anyway");
            }
            target.add_event_listener(node, &event, leaf_dom::EventListener::clone(listener))?;
        }
        HostProp::Attribute {
            name,
            value: Some(text),
        } => target.set_attribute(node, name, &text)?,
        HostProp::Attribute { name, value: None } => target.remove_attribute(node, name)?,
    }
    Ok(())
}

fn clear_prop(
    target: &mut dyn RenderTarget,
    node: NodeKey,
    name: &str,
    value: &Value,
) -> Result<(), RenderError> {
    match host_prop(name, value) {
        HostProp::Listener { event, .. } => target.remove_event_listener(node, &event)?,
        HostProp::Attribute { name, .. } => target.remove_attribute(node, name)?,
    }
    Ok(())
}
