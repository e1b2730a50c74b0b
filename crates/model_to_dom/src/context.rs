//! Shared traversal context.
//!
//! One instance lives for exactly one conversion call and is threaded by
//! `&mut` through the whole recursion. Stack-like fields (`list_stack`) are
//! saved and restored around nested block-group recursion by the dispatch
//! code; `thread_item_counts` deliberately survives those resets so that
//! numbering can continue across separated list containers.

use crate::format::FormatAppliers;
use crate::selection::TableSelection;
use content_model::{Block, ListLevel, ListType, Segment};
use dom_core::{DomError, HostTree, NodeKey};
use std::collections::BTreeMap;

/// Host-independent editor flags, consumed by format appliers only.
#[derive(Clone, Copy, Debug)]
pub struct EditorContext {
    pub is_dark_mode: bool,
    pub is_rtl: bool,
    pub zoom_scale: f32,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self {
            is_dark_mode: false,
            is_rtl: false,
            zoom_scale: 1.0,
        }
    }
}

/// Replacement renderer for one block kind. Receives the full [`Block`] so
/// it can fall through (return the cursor unchanged) on other variants.
pub type BlockHandler = fn(
    &mut HostTree,
    NodeKey,
    &mut Block,
    &mut RenderContext,
    Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError>;

/// Replacement renderer for one segment kind.
pub type SegmentHandler = fn(
    &mut HostTree,
    NodeKey,
    &mut Segment,
    &mut RenderContext,
    Option<NodeKey>,
) -> Result<(), DomError>;

/// Per-node-kind dispatch overrides. A populated slot replaces the default
/// renderer for that variant; empty slots keep the built-in behavior.
#[derive(Clone, Copy, Debug, Default)]
pub struct DispatchOverrides {
    pub paragraph: Option<BlockHandler>,
    pub table: Option<BlockHandler>,
    pub divider: Option<BlockHandler>,
    pub entity_block: Option<BlockHandler>,
    pub format_container: Option<BlockHandler>,
    pub list_item: Option<BlockHandler>,
    pub quote: Option<BlockHandler>,
    pub general_block: Option<BlockHandler>,
    pub text: Option<SegmentHandler>,
    pub br: Option<SegmentHandler>,
    pub image: Option<SegmentHandler>,
    pub general_segment: Option<SegmentHandler>,
    pub entity_segment: Option<SegmentHandler>,
    pub selection_marker: Option<SegmentHandler>,
}

/// Per-conversion knobs. Everything is optional; defaults match the
/// standard applier table with entities rendered in place.
#[derive(Debug, Default)]
pub struct ConvertOptions {
    /// Replaces the standard format applier table.
    pub appliers: Option<FormatAppliers>,
    /// Replaces individual block/segment renderers.
    pub dispatch: DispatchOverrides,
    /// Substitute live entity wrappers with placeholder comments instead of
    /// moving them; see [`crate::swap_entity_placeholders`].
    pub defer_entities: bool,
    /// Externally computed table selection, lowest extraction precedence.
    pub table_selection: Option<TableSelection>,
}

/// Traversal cursor: the host nodes most recently produced for a block and
/// for a segment within it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub block: Option<NodeKey>,
    pub segment: Option<NodeKey>,
}

/// One reconciled list container. Index 0 of the stack holds the insertion
/// parent and carries no list data.
#[derive(Clone, Debug)]
pub struct ListStackEntry {
    pub node: NodeKey,
    pub list_type: Option<ListType>,
    pub ordered_style: Option<String>,
    pub unordered_style: Option<String>,
}

impl ListStackEntry {
    pub fn root(node: NodeKey) -> Self {
        Self {
            node,
            list_type: None,
            ordered_style: None,
            unordered_style: None,
        }
    }

    pub fn level(node: NodeKey, level: &ListLevel) -> Self {
        Self {
            node,
            list_type: Some(level.list_type),
            ordered_style: level.ordered_style.clone(),
            unordered_style: level.unordered_style.clone(),
        }
    }
}

/// A deferred entity wrapper and the comment node standing in for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityPair {
    pub wrapper: NodeKey,
    pub placeholder: NodeKey,
}

/// The shared traversal state. Created by the engine per conversion call;
/// dispatch-override handlers receive it by `&mut`.
#[derive(Debug)]
pub struct RenderContext {
    pub current: Cursor,
    pub selection_start: Option<Cursor>,
    pub selection_end: Option<Cursor>,
    pub list_stack: Vec<ListStackEntry>,
    pub thread_item_counts: Vec<u32>,
    pub entity_pairs: Vec<EntityPair>,
    pub entity_map: BTreeMap<String, NodeKey>,
    pub image_selection: Option<NodeKey>,
    pub table_selection: Option<TableSelection>,
    pub defer_entities: bool,
    pub editor: EditorContext,
    pub appliers: FormatAppliers,
    pub dispatch: DispatchOverrides,
}

impl RenderContext {
    pub(crate) fn new(editor: EditorContext, options: ConvertOptions) -> Self {
        Self {
            current: Cursor::default(),
            selection_start: None,
            selection_end: None,
            list_stack: Vec::new(),
            thread_item_counts: Vec::new(),
            entity_pairs: Vec::new(),
            entity_map: BTreeMap::new(),
            image_selection: None,
            table_selection: options.table_selection,
            defer_entities: options.defer_entities,
            editor,
            appliers: options.appliers.unwrap_or_else(FormatAppliers::standard),
            dispatch: options.dispatch,
        }
    }

    /// First selected node of the walk pins the start bookmark.
    pub fn note_selection_start(&mut self) {
        if self.selection_start.is_none() {
            self.selection_start = Some(self.current);
        }
    }

    /// Every selected node refreshes the end bookmark (last-write-wins).
    pub fn note_selection_end(&mut self) {
        if self.selection_start.is_some() {
            self.selection_end = Some(self.current);
        }
    }
}
