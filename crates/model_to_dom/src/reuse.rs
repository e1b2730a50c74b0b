//! Incremental element reuse.
//!
//! Contract (single-pass reference-cursor protocol):
//! - The caller walks its children in model order and threads a reference
//!   cursor: the next existing host sibling that must either be reused or
//!   evicted.
//! - `reuse_cached_element` places `candidate` at the cursor position with
//!   the fewest possible mutations and returns the updated cursor.
//! - Siblings removed on the way to a reused candidate are gone for good,
//!   except entity wrappers/placeholders, which are skipped over; entities
//!   may carry externally-owned state that must survive reordering.

use crate::entity::is_entity_node;
use dom_core::{DomError, HostTree, NodeKey};

/// Place `candidate` under `parent` at the position marked by `ref_node`.
///
/// Returns the reference cursor for the next sibling: unchanged when the
/// candidate was (re-)inserted before it, or advanced past the candidate
/// when the candidate was already in place further along.
pub(crate) fn reuse_cached_element(
    tree: &mut HostTree,
    parent: NodeKey,
    candidate: NodeKey,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    if tree.parent(candidate)? != Some(parent) {
        // detached, or cached under a stale parent: (re-)insert at the cursor
        tree.insert_before(parent, candidate, ref_node)?;
        return Ok(ref_node);
    }
    let mut cursor = ref_node;
    let mut first_kept = None;
    while let Some(node) = cursor {
        if node == candidate {
            log::trace!(target: "model_to_dom.reuse", "reused {candidate:?} in place");
            return tree.next_sibling(candidate);
        }
        let next = tree.next_sibling(node)?;
        if is_entity_node(tree, node)? {
            log::trace!(target: "model_to_dom.reuse", "skipping entity {node:?}");
            if first_kept.is_none() {
                first_kept = Some(node);
            }
        } else {
            tree.remove_child(parent, node)?;
        }
        cursor = next;
    }
    // the candidate sits behind the cursor; re-place it where the cursor
    // survives, ahead of any entity nodes the walk skipped
    tree.insert_before(parent, candidate, first_kept)?;
    Ok(first_kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ENTITY_CLASS;

    fn setup() -> (HostTree, NodeKey) {
        let mut tree = HostTree::new();
        let parent = tree.create_fragment();
        (tree, parent)
    }

    #[test]
    fn detached_candidate_is_inserted_at_cursor() {
        let (mut tree, parent) = setup();
        let existing = tree.create_element("p");
        tree.append_child(parent, existing).unwrap();
        let candidate = tree.create_element("div");
        let next = reuse_cached_element(&mut tree, parent, candidate, Some(existing)).unwrap();
        assert_eq!(next, Some(existing));
        assert_eq!(tree.children(parent).unwrap(), &[candidate, existing]);
    }

    #[test]
    fn in_place_candidate_costs_no_mutation() {
        let (mut tree, parent) = setup();
        let candidate = tree.create_element("div");
        let after = tree.create_element("p");
        tree.append_child(parent, candidate).unwrap();
        tree.append_child(parent, after).unwrap();
        let before = tree.counters();
        let next = reuse_cached_element(&mut tree, parent, candidate, Some(candidate)).unwrap();
        assert_eq!(next, Some(after));
        assert_eq!(tree.counters(), before);
    }

    #[test]
    fn walk_evicts_stale_siblings() {
        let (mut tree, parent) = setup();
        let stale_a = tree.create_element("span");
        let stale_b = tree.create_text("x");
        let candidate = tree.create_element("div");
        tree.append_child(parent, stale_a).unwrap();
        tree.append_child(parent, stale_b).unwrap();
        tree.append_child(parent, candidate).unwrap();
        let next = reuse_cached_element(&mut tree, parent, candidate, Some(stale_a)).unwrap();
        assert_eq!(next, None);
        assert_eq!(tree.children(parent).unwrap(), &[candidate]);
    }

    #[test]
    fn walk_skips_entity_wrappers() {
        let (mut tree, parent) = setup();
        let stale = tree.create_element("span");
        let entity = tree.create_element("div");
        tree.set_attr(entity, "class", ENTITY_CLASS).unwrap();
        let candidate = tree.create_element("div");
        tree.append_child(parent, stale).unwrap();
        tree.append_child(parent, entity).unwrap();
        tree.append_child(parent, candidate).unwrap();
        reuse_cached_element(&mut tree, parent, candidate, Some(stale)).unwrap();
        assert_eq!(tree.children(parent).unwrap(), &[entity, candidate]);
    }

    #[test]
    fn candidate_behind_cursor_moves_to_walk_end() {
        let (mut tree, parent) = setup();
        let candidate = tree.create_element("div");
        let cursor_node = tree.create_element("p");
        tree.append_child(parent, candidate).unwrap();
        tree.append_child(parent, cursor_node).unwrap();
        // cursor starts after the candidate, so the walk never finds it
        let next = reuse_cached_element(&mut tree, parent, candidate, Some(cursor_node)).unwrap();
        assert_eq!(next, None);
        assert_eq!(tree.children(parent).unwrap(), &[candidate]);
    }

    #[test]
    fn candidate_behind_cursor_lands_before_surviving_entities() {
        let (mut tree, parent) = setup();
        let candidate = tree.create_element("div");
        let stale = tree.create_element("p");
        let entity = tree.create_element("div");
        tree.set_attr(entity, "class", ENTITY_CLASS).unwrap();
        tree.append_child(parent, candidate).unwrap();
        tree.append_child(parent, stale).unwrap();
        tree.append_child(parent, entity).unwrap();
        let next = reuse_cached_element(&mut tree, parent, candidate, Some(stale)).unwrap();
        assert_eq!(next, Some(entity));
        assert_eq!(tree.children(parent).unwrap(), &[candidate, entity]);
    }
}
