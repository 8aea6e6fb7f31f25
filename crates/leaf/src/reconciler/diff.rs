//! Diff phase: classify every fiber of the new tree against the previous tree.
//!
//! Classification is parent-driven. Below a placement everything is a
//! placement. Otherwise a fiber is matched to the previous fiber with the same
//! instance key among the children of its parent's alternate. Previous children
//! that nothing matched are marked for deletion.

use std::collections::{HashMap, HashSet, VecDeque};

use indextree::NodeId;
use log::trace;

use crate::error::RenderError;
use crate::fiber::{Classification, FiberTree, InstanceKey};

/// Classify `tree` against `previous`, appending unmatched previous fibers to `deletions`.
pub(crate) fn diff(
    tree: &mut FiberTree,
    previous: Option<&mut FiberTree>,
    deletions: &mut Vec<NodeId>,
) -> Result<(), RenderError> {
    let root = tree.root_id()?;
    let previous_root = previous.as_ref().and_then(|prev| prev.root());
    diff_node(tree, root, previous, previous_root, Classification::None, deletions)
}

fn diff_node(
    tree: &mut FiberTree,
    id: NodeId,
    mut previous: Option<&mut FiberTree>,
    alternate: Option<NodeId>,
    parent: Classification,
    deletions: &mut Vec<NodeId>,
) -> Result<(), RenderError> {
    let classification = match parent {
        Classification::Deletion => {
            return Err(RenderError::StructuralInvariant(format!(
                "{} is the child of a fiber classified for deletion",
                tree.node(id)?.key
            )));
        }
        Classification::Placement => Classification::Placement,
        Classification::None | Classification::Update => match (previous.as_deref(), alternate) {
            (Some(prev_tree), Some(alternate)) => {
                let before = prev_tree.node(alternate)?;
                let after = tree.node(id)?;
                if before.kind == after.kind
                    && before.content == after.content
                    && before.props.shallow_eq(&after.props)
                {
                    Classification::None
                } else {
                    Classification::Update
                }
            }
            _ => Classification::Placement,
        },
    };

    let fiber = tree.node_mut(id)?;
    fiber.classification = classification;
    if classification != Classification::Placement {
        fiber.alternate = alternate;
    }
    trace!(target: "leaf::diff", "{} -> {classification:?}", fiber.key);

    let children = tree.children(id);
    let (Some(prev_tree), Some(alternate), false) = (
        previous.as_deref_mut(),
        alternate,
        classification == Classification::Placement,
    ) else {
        for child in children {
            diff_node(tree, child, None, None, Classification::Placement, deletions)?;
        }
        return Ok(());
    };

    // Siblings sharing a key are matched in order, one previous fiber each.
    let mut unmatched: HashMap<InstanceKey, VecDeque<NodeId>> = HashMap::new();
    for child in prev_tree.children(alternate) {
        if let Some(fiber) = prev_tree.get(child) {
            unmatched
                .entry(InstanceKey::clone(&fiber.key))
                .or_default()
                .push_back(child);
        }
    }
    for child in children {
        let matched = unmatched
            .get_mut(&tree.node(child)?.key)
            .and_then(VecDeque::pop_front);
        diff_node(tree, child, Some(&mut *prev_tree), matched, classification, deletions)?;
    }

    let stale: HashSet<NodeId> = unmatched.into_values().flatten().collect();
    for child in prev_tree.children(alternate) {
        if !stale.contains(&child) {
            continue;
        }
        let fiber = prev_tree.node_mut(child)?;
        fiber.classification = Classification::Deletion;
        trace!(target: "leaf::diff", "{} -> Deletion", fiber.key);
        deletions.push(child);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::fiber::{FiberKind, FiberNode, ROOT_KEY};
    use crate::props::Props;

    fn list(items: &[&str]) -> FiberTree {
        let mut tree = FiberTree::new();
        let root = tree.insert(None, FiberNode::new(FiberKind::Root, Rc::from(ROOT_KEY), Props::new()));
        let ul = tree.insert(
            Some(root),
            FiberNode::new(FiberKind::Native("ul".to_owned()), Rc::from("root-0:ul"), Props::new()),
        );
        for item in items {
            tree.insert(
                Some(ul),
                FiberNode::new(
                    FiberKind::Native("li".to_owned()),
                    Rc::from(format!("root-0:ul-@{item}:li")),
                    Props::new(),
                ),
            );
        }
        tree
    }

    fn classification_of(tree: &FiberTree, key: &str) -> Option<Classification> {
        tree.lookup(key).map(|fiber| fiber.classification)
    }

    #[test]
    fn keyed_children_match_by_key() -> Result<(), RenderError> {
        let mut previous = list(&["a", "b", "c"]);
        let mut next = list(&["a", "c"]);
        let mut deletions = Vec::new();
        diff(&mut next, Some(&mut previous), &mut deletions)?;

        assert_eq!(classification_of(&next, "root-0:ul-@a:li"), Some(Classification::None));
        assert_eq!(classification_of(&next, "root-0:ul-@c:li"), Some(Classification::None));
        assert_eq!(deletions.len(), 1);
        assert_eq!(
            classification_of(&previous, "root-0:ul-@b:li"),
            Some(Classification::Deletion)
        );
        Ok(())
    }

    #[test]
    fn duplicate_keys_match_in_order() -> Result<(), RenderError> {
        let mut previous = list(&["dup", "dup"]);
        let mut next = list(&["dup", "dup"]);
        let mut deletions = Vec::new();
        diff(&mut next, Some(&mut previous), &mut deletions)?;

        assert!(deletions.is_empty());
        let alternates: Vec<_> = next
            .preorder()
            .iter()
            .filter_map(|id| next.get(*id))
            .filter(|fiber| fiber.key.ends_with("@dup:li"))
            .map(|fiber| fiber.alternate)
            .collect();
        assert_eq!(alternates.len(), 2);
        assert!(alternates.iter().all(Option::is_some));
        assert_ne!(alternates[0], alternates[1]);

        let mut shorter = list(&["dup"]);
        diff(&mut shorter, Some(&mut next), &mut deletions)?;
        assert_eq!(deletions.len(), 1);
        Ok(())
    }

    #[test]
    fn first_pass_places_everything() -> Result<(), RenderError> {
        let mut next = list(&["a"]);
        let mut deletions = Vec::new();
        diff(&mut next, None, &mut deletions)?;
        assert!(
            next.preorder()
                .iter()
                .filter_map(|id| next.get(*id))
                .all(|fiber| fiber.classification == Classification::Placement)
        );
        assert!(deletions.is_empty());
        Ok(())
    }
}
