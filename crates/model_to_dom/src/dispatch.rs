//! Recursive model walk.
//!
//! Contract:
//! - One synchronous, depth-first, pre-order pass; render order within a
//!   parent equals model order.
//! - Block renderers take and return a reference cursor: the next existing
//!   host sibling that must be reused or evicted. After a group's children
//!   are processed, leftover siblings are removed, except entity nodes.
//! - Cached nodes are reused wholesale only when their subtree carries no
//!   selection; selection forces a rebuild so bookmarks land on concrete
//!   nodes.
//! - Malformed or degenerate nodes are skipped, never raised: the model is
//!   long-lived persisted data and rendering favors forward compatibility.
//! - Host-tree failures propagate; there is no fallback for a broken
//!   substrate.

use crate::context::RenderContext;
use crate::entity::{is_entity_node, render_entity_block, render_entity_segment};
use crate::format::{ApplierKind, FormatAppliers};
use crate::list::render_list_item;
use crate::reuse::reuse_cached_element;
use crate::table::render_table;
use content_model::{
    Block, BlockGroup, Divider, DividerTag, FormatBag, FormatContainer, GeneralBlock,
    GeneralSegment, Paragraph, Quote, Segment,
};
use dom_core::{DomError, HostTree, NodeKey};

/// Render a group's blocks under `parent` and evict host children that no
/// longer correspond to any model node. The list stack is scoped to this
/// group; numbering threads persist.
pub(crate) fn render_group_children(
    tree: &mut HostTree,
    parent: NodeKey,
    blocks: &mut [Block],
    ctx: &mut RenderContext,
) -> Result<(), DomError> {
    let saved_stack = std::mem::take(&mut ctx.list_stack);
    let mut ref_node = tree.first_child(parent)?;
    for block in blocks.iter_mut() {
        if !matches!(block, Block::Group(BlockGroup::ListItem(_))) {
            // a non-list sibling ends the current list chain
            ctx.list_stack.clear();
        }
        ref_node = render_block(tree, parent, block, ctx, ref_node)?;
    }
    let mut cursor = ref_node;
    while let Some(node) = cursor {
        let next = tree.next_sibling(node)?;
        if is_entity_node(tree, node)? {
            log::trace!(target: "model_to_dom.dispatch", "leftover entity {node:?} kept");
        } else {
            tree.remove_child(parent, node)?;
        }
        cursor = next;
    }
    ctx.list_stack = saved_stack;
    Ok(())
}

pub(crate) fn render_block(
    tree: &mut HostTree,
    parent: NodeKey,
    block: &mut Block,
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    let handler = match block {
        Block::Paragraph(_) => ctx.dispatch.paragraph,
        Block::Table(_) => ctx.dispatch.table,
        Block::Divider(_) => ctx.dispatch.divider,
        Block::Entity(_) => ctx.dispatch.entity_block,
        Block::Group(BlockGroup::FormatContainer(_)) => ctx.dispatch.format_container,
        Block::Group(BlockGroup::ListItem(_)) => ctx.dispatch.list_item,
        Block::Group(BlockGroup::Quote(_)) => ctx.dispatch.quote,
        Block::Group(BlockGroup::General(_)) => ctx.dispatch.general_block,
    };
    if let Some(handler) = handler {
        return handler(tree, parent, block, ctx, ref_node);
    }
    match block {
        Block::Paragraph(paragraph) => render_paragraph(tree, parent, paragraph, ctx, ref_node),
        Block::Table(table) => render_table(tree, parent, table, ctx, ref_node),
        Block::Divider(divider) => render_divider(tree, parent, divider, ctx, ref_node),
        Block::Entity(entity) => render_entity_block(tree, parent, entity, ctx, ref_node),
        Block::Group(group) => match group {
            BlockGroup::FormatContainer(container) => {
                render_format_container(tree, parent, container, ctx, ref_node)
            }
            BlockGroup::ListItem(item) => render_list_item(tree, parent, item, ctx, ref_node),
            BlockGroup::Quote(quote) => render_quote(tree, parent, quote, ctx, ref_node),
            BlockGroup::General(general) => {
                render_general_block(tree, parent, general, ctx, ref_node)
            }
        },
    }
}

/// Whether any node in the block's subtree is selected. Cached host nodes
/// are only reused wholesale when this is false.
pub(crate) fn block_has_selection(block: &Block) -> bool {
    match block {
        Block::Paragraph(paragraph) => paragraph.segments.iter().any(Segment::is_selected),
        Block::Table(table) => table
            .rows
            .iter()
            .flatten()
            .any(|cell| cell.is_selected || cell.blocks.iter().any(block_has_selection)),
        Block::Divider(divider) => divider.is_selected,
        Block::Entity(entity) => entity.is_selected,
        Block::Group(group) => match group {
            BlockGroup::FormatContainer(container) => {
                container.blocks.iter().any(block_has_selection)
            }
            BlockGroup::ListItem(item) => {
                item.format_holder.is_selected || item.blocks.iter().any(block_has_selection)
            }
            BlockGroup::Quote(quote) => quote.blocks.iter().any(block_has_selection),
            BlockGroup::General(general) => {
                general.is_selected || general.blocks.iter().any(block_has_selection)
            }
        },
    }
}

fn render_paragraph(
    tree: &mut HostTree,
    parent: NodeKey,
    paragraph: &mut Paragraph,
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    let has_selection = paragraph.segments.iter().any(Segment::is_selected);
    if let Some(cached) = paragraph.cached {
        if tree.contains(cached) && !has_selection {
            ctx.current.block = Some(cached);
            ctx.current.segment = None;
            return reuse_cached_element(tree, parent, cached, ref_node);
        }
    }
    if paragraph.is_implicit {
        if paragraph.segments.is_empty() {
            return Ok(ref_node);
        }
        ctx.current.block = Some(parent);
        ctx.current.segment = None;
        for segment in paragraph.segments.iter_mut() {
            render_segment(tree, parent, segment, ctx, ref_node)?;
        }
        return Ok(ref_node);
    }
    let container = tree.create_element("div");
    ctx.appliers.apply(
        ApplierKind::Block,
        &paragraph.format,
        tree,
        container,
        &ctx.editor,
    )?;
    tree.insert_before(parent, container, ref_node)?;
    paragraph.cached = Some(container);
    ctx.current.block = Some(container);
    ctx.current.segment = None;
    for segment in paragraph.segments.iter_mut() {
        render_segment(tree, container, segment, ctx, None)?;
    }
    Ok(ref_node)
}

fn render_divider(
    tree: &mut HostTree,
    parent: NodeKey,
    divider: &mut Divider,
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    if let Some(cached) = divider.cached {
        if tree.contains(cached) && !divider.is_selected {
            ctx.current.block = Some(cached);
            ctx.current.segment = None;
            return reuse_cached_element(tree, parent, cached, ref_node);
        }
    }
    let tag = match divider.tag {
        DividerTag::Hr => "hr",
        DividerTag::Div => "div",
    };
    let node = tree.create_element(tag);
    ctx.appliers
        .apply(ApplierKind::Divider, &divider.format, tree, node, &ctx.editor)?;
    tree.insert_before(parent, node, ref_node)?;
    divider.cached = Some(node);
    ctx.current.block = Some(node);
    ctx.current.segment = None;
    if divider.is_selected {
        ctx.note_selection_start();
        ctx.note_selection_end();
    }
    Ok(ref_node)
}

fn render_format_container(
    tree: &mut HostTree,
    parent: NodeKey,
    container: &mut FormatContainer,
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    if container.blocks.is_empty() {
        // empty containers collapse to nothing
        return Ok(ref_node);
    }
    let has_selection = container.blocks.iter().any(block_has_selection);
    if let Some(cached) = container.cached {
        if tree.contains(cached) && !has_selection {
            ctx.current.block = Some(cached);
            ctx.current.segment = None;
            return reuse_cached_element(tree, parent, cached, ref_node);
        }
    }
    let node = tree.create_element(&container.tag_name);
    ctx.appliers.apply(
        ApplierKind::Container,
        &container.format,
        tree,
        node,
        &ctx.editor,
    )?;
    tree.insert_before(parent, node, ref_node)?;
    container.cached = Some(node);
    render_group_children(tree, node, &mut container.blocks, ctx)?;
    Ok(ref_node)
}

fn render_quote(
    tree: &mut HostTree,
    parent: NodeKey,
    quote: &mut Quote,
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    let has_selection = quote.blocks.iter().any(block_has_selection);
    if let Some(cached) = quote.cached {
        if tree.contains(cached) && !has_selection {
            ctx.current.block = Some(cached);
            ctx.current.segment = None;
            return reuse_cached_element(tree, parent, cached, ref_node);
        }
    }
    let node = tree.create_element("blockquote");
    ctx.appliers
        .apply(ApplierKind::Container, &quote.format, tree, node, &ctx.editor)?;
    tree.insert_before(parent, node, ref_node)?;
    quote.cached = Some(node);
    render_group_children(tree, node, &mut quote.blocks, ctx)?;
    Ok(ref_node)
}

fn render_general_block(
    tree: &mut HostTree,
    parent: NodeKey,
    general: &mut GeneralBlock,
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    let Some(node) = general.node.filter(|&key| tree.contains(key)) else {
        // the wrapped external node is gone; nothing to render
        return Ok(ref_node);
    };
    let next = reuse_cached_element(tree, parent, node, ref_node)?;
    ctx.current.block = Some(node);
    ctx.current.segment = None;
    if general.is_selected {
        ctx.note_selection_start();
        ctx.note_selection_end();
    }
    render_group_children(tree, node, &mut general.blocks, ctx)?;
    Ok(next)
}

/// Insert `node` at a segment position: directly at the anchor when the
/// target is the paragraph container itself, appended otherwise (the target
/// is then a freshly built decorator chain).
fn attach_segment_node(
    tree: &mut HostTree,
    container: NodeKey,
    outer: NodeKey,
    node: NodeKey,
    before: Option<NodeKey>,
) -> Result<(), DomError> {
    if outer == container {
        tree.insert_before(container, node, before)
    } else {
        tree.append_child(outer, node)
    }
}

/// Wrap a segment in its decorator chain (link, code, styled span) as
/// demanded by its format bag, returning the innermost insertion target.
fn build_decorators(
    tree: &mut HostTree,
    container: NodeKey,
    format: &FormatBag,
    ctx: &mut RenderContext,
    before: Option<NodeKey>,
) -> Result<NodeKey, DomError> {
    let mut outer = container;
    if format.get("href").is_some() {
        let anchor = tree.create_element("a");
        ctx.appliers
            .apply(ApplierKind::Link, format, tree, anchor, &ctx.editor)?;
        attach_segment_node(tree, container, outer, anchor, before)?;
        outer = anchor;
    }
    if format.get("isCode").is_some() {
        let code = tree.create_element("code");
        ctx.appliers
            .apply(ApplierKind::Code, format, tree, code, &ctx.editor)?;
        attach_segment_node(tree, container, outer, code, before)?;
        outer = code;
    }
    if FormatAppliers::applies_any(ApplierKind::Segment, format) {
        let span = tree.create_element("span");
        ctx.appliers
            .apply(ApplierKind::Segment, format, tree, span, &ctx.editor)?;
        attach_segment_node(tree, container, outer, span, before)?;
        outer = span;
    }
    Ok(outer)
}

fn render_segment(
    tree: &mut HostTree,
    container: NodeKey,
    segment: &mut Segment,
    ctx: &mut RenderContext,
    before: Option<NodeKey>,
) -> Result<(), DomError> {
    let handler = match segment {
        Segment::Text(_) => ctx.dispatch.text,
        Segment::Br(_) => ctx.dispatch.br,
        Segment::Image(_) => ctx.dispatch.image,
        Segment::General(_) => ctx.dispatch.general_segment,
        Segment::Entity(_) => ctx.dispatch.entity_segment,
        Segment::SelectionMarker(_) => ctx.dispatch.selection_marker,
    };
    if let Some(handler) = handler {
        return handler(tree, container, segment, ctx, before);
    }
    match segment {
        Segment::Text(text) => {
            if text.is_selected {
                ctx.note_selection_start();
            }
            let outer = build_decorators(tree, container, &text.format, ctx, before)?;
            let node = tree.create_text(&text.text);
            attach_segment_node(tree, container, outer, node, before)?;
            ctx.current.segment = Some(node);
            if text.is_selected {
                ctx.note_selection_end();
            }
        }
        Segment::Br(br) => {
            if br.is_selected {
                ctx.note_selection_start();
            }
            let node = tree.create_element("br");
            tree.insert_before(container, node, before)?;
            ctx.current.segment = Some(node);
            if br.is_selected {
                ctx.note_selection_end();
            }
        }
        Segment::Image(image) => {
            let regular = image.is_selected && !image.is_selected_as_image_selection;
            if regular {
                ctx.note_selection_start();
            }
            let node = tree.create_element("img");
            tree.set_attr(node, "src", &image.src)?;
            if let Some(alt) = &image.alt {
                tree.set_attr(node, "alt", alt)?;
            }
            ctx.appliers
                .apply(ApplierKind::Image, &image.format, tree, node, &ctx.editor)?;
            tree.insert_before(container, node, before)?;
            ctx.current.segment = Some(node);
            if image.is_selected_as_image_selection {
                ctx.image_selection = Some(node);
            } else if regular {
                ctx.note_selection_end();
            }
        }
        Segment::SelectionMarker(marker) => {
            // zero-width: pins the cursor position, renders nothing
            if marker.is_selected {
                ctx.note_selection_start();
                ctx.note_selection_end();
            }
        }
        Segment::General(general) => render_general_segment(tree, container, general, ctx, before)?,
        Segment::Entity(entity) => render_entity_segment(tree, container, entity, ctx, before)?,
    }
    Ok(())
}

fn render_general_segment(
    tree: &mut HostTree,
    container: NodeKey,
    general: &mut GeneralSegment,
    ctx: &mut RenderContext,
    before: Option<NodeKey>,
) -> Result<(), DomError> {
    let Some(node) = general.node.filter(|&key| tree.contains(key)) else {
        return Ok(());
    };
    if general.is_selected {
        ctx.note_selection_start();
    }
    tree.insert_before(container, node, before)?;
    let saved = ctx.current;
    render_group_children(tree, node, &mut general.blocks, ctx)?;
    ctx.current = saved;
    ctx.current.segment = Some(node);
    if general.is_selected {
        ctx.note_selection_end();
    }
    Ok(())
}
