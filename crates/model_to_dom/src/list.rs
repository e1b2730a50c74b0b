//! List container reconciliation.
//!
//! Invariants:
//! - `list_stack[0]` is the insertion parent; entry `n` is the container for
//!   nesting depth `n - 1`. The stack never grows past the current item's
//!   level count plus one.
//! - A level with `start_number_override` never reuses a container:
//!   numbering restart is container-scoped in the host tree.
//! - `thread_item_counts[d]` counts items placed at depth `d` and survives
//!   stack resets, which is what lets a numbering thread continue across
//!   separated containers of compatible style. An unordered container at a
//!   depth ends that depth's thread.

use crate::context::{ListStackEntry, RenderContext};
use crate::dispatch::{render_block, render_group_children};
use crate::format::ApplierKind;
use content_model::{Block, ListItem, ListLevel, ListType};
use dom_core::{DomError, HostTree, NodeKey};

fn level_matches(entry: &ListStackEntry, level: &ListLevel) -> bool {
    entry.list_type == Some(level.list_type)
        && entry.ordered_style == level.ordered_style
        && entry.unordered_style == level.unordered_style
        && level.start_number_override.is_none()
}

/// Reuse or rebuild the container chain for `levels`, returning the
/// innermost container. New level-0 containers are inserted at the
/// reference cursor; deeper ones append under their parent level.
pub(crate) fn reconcile_list_levels(
    tree: &mut HostTree,
    levels: &[ListLevel],
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<NodeKey, DomError> {
    let mut matched = 0;
    while matched < levels.len()
        && matched + 1 < ctx.list_stack.len()
        && level_matches(&ctx.list_stack[matched + 1], &levels[matched])
    {
        matched += 1;
    }
    ctx.list_stack.truncate(matched + 1);
    if matched < levels.len() {
        log::trace!(
            target: "model_to_dom.list",
            "list stack truncated at depth {matched}, rebuilding {} level(s)",
            levels.len() - matched
        );
    }
    for depth in matched..levels.len() {
        let level = &levels[depth];
        let tag = match level.list_type {
            ListType::Ol => "ol",
            ListType::Ul => "ul",
        };
        let list = tree.create_element(tag);
        ctx.appliers
            .apply(ApplierKind::ListLevel, &level.format, tree, list, &ctx.editor)?;
        if ctx.thread_item_counts.len() <= depth {
            ctx.thread_item_counts.resize(depth + 1, 0);
        }
        match level.list_type {
            ListType::Ol => {
                if let Some(start) = level.start_number_override {
                    tree.set_attr(list, "start", &start.to_string())?;
                    ctx.thread_item_counts[depth] = start.saturating_sub(1);
                } else if ctx.thread_item_counts[depth] > 0 {
                    // continue the numbering thread of a prior container
                    let start = ctx.thread_item_counts[depth] + 1;
                    tree.set_attr(list, "start", &start.to_string())?;
                }
            }
            ListType::Ul => {
                ctx.thread_item_counts[depth] = 0;
            }
        }
        let host = ctx.list_stack[depth].node;
        if depth == 0 {
            tree.insert_before(host, list, ref_node)?;
        } else {
            tree.append_child(host, list)?;
        }
        ctx.list_stack.push(ListStackEntry::level(list, level));
    }
    Ok(ctx
        .list_stack
        .last()
        .expect("stack holds the insertion parent and one entry per level")
        .node)
}

/// Render one list item: reconcile containers, then render the item body as
/// an `li` under the innermost container. An item without levels is not a
/// list member and renders as a plain block in the original parent.
pub(crate) fn render_list_item(
    tree: &mut HostTree,
    parent: NodeKey,
    item: &mut ListItem,
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    if item.levels.is_empty() {
        let mut ref_node = ref_node;
        for block in item.blocks.iter_mut() {
            if let Block::Paragraph(paragraph) = block {
                if paragraph.is_implicit {
                    // a bare block must not merge visually with its sibling
                    paragraph.is_implicit = false;
                    paragraph.cached = None;
                }
            }
            ref_node = render_block(tree, parent, block, ctx, ref_node)?;
        }
        return Ok(ref_node);
    }

    if ctx.list_stack.first().map(|entry| entry.node) != Some(parent) {
        ctx.list_stack.clear();
        ctx.list_stack.push(ListStackEntry::root(parent));
    }
    let innermost = reconcile_list_levels(tree, &item.levels, ctx, ref_node)?;

    let depth = item.levels.len() - 1;
    if ctx.thread_item_counts.len() <= depth {
        ctx.thread_item_counts.resize(depth + 1, 0);
    }
    ctx.thread_item_counts[depth] += 1;

    let li = tree.create_element("li");
    tree.append_child(innermost, li)?;
    ctx.appliers
        .apply(ApplierKind::ListItem, &item.format, tree, li, &ctx.editor)?;
    ctx.appliers.apply(
        ApplierKind::ListItem,
        &item.format_holder.format,
        tree,
        li,
        &ctx.editor,
    )?;
    // the innermost level carries the item-level format of its members
    ctx.appliers.apply(
        ApplierKind::ListItem,
        &item.levels[depth].format,
        tree,
        li,
        &ctx.editor,
    )?;
    ctx.current.block = Some(li);
    ctx.current.segment = None;
    if item.format_holder.is_selected {
        ctx.note_selection_start();
        ctx.note_selection_end();
    }
    render_group_children(tree, li, &mut item.blocks, ctx)?;
    Ok(ref_node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ConvertOptions, EditorContext};

    fn context() -> RenderContext {
        RenderContext::new(EditorContext::default(), ConvertOptions::default())
    }

    fn ol_level() -> ListLevel {
        ListLevel::new(ListType::Ol)
    }

    #[test]
    fn compatible_levels_reuse_the_stack() {
        let mut tree = HostTree::new();
        let root = tree.create_fragment();
        let mut ctx = context();
        ctx.list_stack.push(ListStackEntry::root(root));

        let first = reconcile_list_levels(&mut tree, &[ol_level()], &mut ctx, None).unwrap();
        let second = reconcile_list_levels(&mut tree, &[ol_level()], &mut ctx, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.children(root).unwrap().len(), 1);
    }

    #[test]
    fn start_number_override_forces_new_container() {
        let mut tree = HostTree::new();
        let root = tree.create_fragment();
        let mut ctx = context();
        ctx.list_stack.push(ListStackEntry::root(root));

        reconcile_list_levels(&mut tree, &[ol_level()], &mut ctx, None).unwrap();
        let mut level = ol_level();
        level.start_number_override = Some(7);
        let restarted = reconcile_list_levels(&mut tree, &[level], &mut ctx, None).unwrap();
        assert_eq!(tree.children(root).unwrap().len(), 2);
        assert_eq!(tree.get_attr(restarted, "start").unwrap(), Some("7"));
        // the thread count rebases onto the override
        assert_eq!(ctx.thread_item_counts[0], 6);
    }

    #[test]
    fn style_change_continues_the_numbering_thread() {
        let mut tree = HostTree::new();
        let root = tree.create_fragment();
        let mut ctx = context();
        ctx.list_stack.push(ListStackEntry::root(root));

        reconcile_list_levels(&mut tree, &[ol_level()], &mut ctx, None).unwrap();
        ctx.thread_item_counts = vec![1];
        let mut styled = ol_level();
        styled.ordered_style = Some("lower-alpha".to_string());
        let sibling = reconcile_list_levels(&mut tree, &[styled], &mut ctx, None).unwrap();
        assert_eq!(tree.children(root).unwrap().len(), 2);
        assert_eq!(tree.get_attr(sibling, "start").unwrap(), Some("2"));
    }

    #[test]
    fn unordered_container_ends_the_thread() {
        let mut tree = HostTree::new();
        let root = tree.create_fragment();
        let mut ctx = context();
        ctx.list_stack.push(ListStackEntry::root(root));
        ctx.thread_item_counts = vec![3];

        reconcile_list_levels(&mut tree, &[ListLevel::new(ListType::Ul)], &mut ctx, None).unwrap();
        assert_eq!(ctx.thread_item_counts[0], 0);
        ctx.list_stack.truncate(1);
        let ol = reconcile_list_levels(&mut tree, &[ol_level()], &mut ctx, None).unwrap();
        assert_eq!(tree.get_attr(ol, "start").unwrap(), None);
    }

    #[test]
    fn li_carries_the_last_level_item_format() {
        let mut tree = HostTree::new();
        let root = tree.create_fragment();
        let mut ctx = context();

        let mut level = ol_level();
        level.format.set("textColor", "red");
        let mut item = ListItem::new(vec![level]);
        render_list_item(&mut tree, root, &mut item, &mut ctx, None).unwrap();

        let ol = tree.first_child(root).unwrap().unwrap();
        let li = tree.first_child(ol).unwrap().unwrap();
        assert_eq!(tree.get_attr(li, "style").unwrap(), Some("color: red"));
        // item-level keys never leak onto the container
        assert_eq!(tree.get_attr(ol, "style").unwrap(), None);
    }

    #[test]
    fn nested_levels_append_under_outer_container() {
        let mut tree = HostTree::new();
        let root = tree.create_fragment();
        let mut ctx = context();
        ctx.list_stack.push(ListStackEntry::root(root));

        let inner = reconcile_list_levels(
            &mut tree,
            &[ol_level(), ListLevel::new(ListType::Ul)],
            &mut ctx,
            None,
        )
        .unwrap();
        let outer = ctx.list_stack[1].node;
        assert_eq!(tree.parent(inner).unwrap(), Some(outer));
        assert_eq!(tree.parent(outer).unwrap(), Some(root));
        assert_eq!(tree.tag(inner).unwrap(), "ul");
        assert_eq!(tree.tag(outer).unwrap(), "ol");
    }
}
