//! Content model to host tree reconciliation.
//!
//! Contract:
//! - [`convert`] renders a document model into a fresh fragment;
//!   [`render_into`] reconciles it against an existing root, reusing cached
//!   host nodes and evicting siblings the model no longer accounts for.
//! - Rendering an unchanged, unselected model against its own previous
//!   output performs no structural mutation (see [`HostTree::counters`]).
//! - Cached node keys are written back into the model as blocks render, so
//!   the model handed to the next call addresses the tree this call built.
//! - Selection is collected during the walk and resolved once, at the end;
//!   precedence is image, then regular range, then table.
//!
//! ```
//! use content_model::{Block, Document, Paragraph, Segment, TextSegment};
//! use dom_core::HostTree;
//! use model_to_dom::{convert, ConvertOptions, EditorContext};
//!
//! let mut tree = HostTree::new();
//! let mut model = Document::default();
//! let mut paragraph = Paragraph::new();
//! paragraph.segments.push(Segment::Text(TextSegment::new("hello")));
//! model.blocks.push(Block::Paragraph(paragraph));
//!
//! let out = convert(&mut tree, &mut model, EditorContext::default(), ConvertOptions::default())
//!     .unwrap();
//! assert_eq!(tree.children(out.root).unwrap().len(), 1);
//! ```

mod context;
mod dispatch;
mod entity;
mod format;
mod list;
mod reuse;
mod selection;
mod table;

pub use context::{
    BlockHandler, ConvertOptions, Cursor, DispatchOverrides, EditorContext, EntityPair,
    ListStackEntry, RenderContext, SegmentHandler,
};
pub use entity::swap_entity_placeholders;
pub use format::{append_style, ApplierKind, FormatApplier, FormatAppliers};
pub use selection::{Position, SelectionDescriptor, TableSelection};

use content_model::Document;
use dispatch::render_group_children;
use dom_core::{DomError, HostTree, NodeKey, NodeKind};
use selection::extract_selection;
use std::collections::BTreeMap;

/// Result of one conversion pass.
#[derive(Debug)]
pub struct Conversion {
    /// The root the model was rendered under.
    pub root: NodeKey,
    pub selection: SelectionDescriptor,
    /// Entity id to live wrapper node, for every entity that rendered.
    pub entities: BTreeMap<String, NodeKey>,
    /// Deferred entities awaiting [`swap_entity_placeholders`].
    pub entity_pairs: Vec<EntityPair>,
}

/// Render `model` into a new fragment root.
pub fn convert(
    tree: &mut HostTree,
    model: &mut Document,
    editor: EditorContext,
    options: ConvertOptions,
) -> Result<Conversion, DomError> {
    let root = tree.create_fragment();
    render_into(tree, root, model, editor, options)
}

/// Reconcile `model` against the children of `root`.
pub fn render_into(
    tree: &mut HostTree,
    root: NodeKey,
    model: &mut Document,
    editor: EditorContext,
    options: ConvertOptions,
) -> Result<Conversion, DomError> {
    let before = tree.counters();
    let mut ctx = context::RenderContext::new(editor, options);
    if matches!(tree.kind(root)?, NodeKind::Element) {
        ctx.appliers
            .apply(ApplierKind::Container, &model.format, tree, root, &ctx.editor)?;
    }
    render_group_children(tree, root, &mut model.blocks, &mut ctx)?;
    model.cached = Some(root);
    let selection = extract_selection(tree, &ctx);
    let after = tree.counters();
    log::trace!(
        target: "model_to_dom",
        "rendered {} block(s): +{} nodes, {} inserts, {} removals",
        model.blocks.len(),
        after.nodes_created - before.nodes_created,
        after.children_inserted - before.children_inserted,
        after.children_removed - before.children_removed,
    );
    Ok(Conversion {
        root,
        selection,
        entities: ctx.entity_map,
        entity_pairs: ctx.entity_pairs,
    })
}
