//! Selection extraction.
//!
//! During the walk the context records cursor snapshots (bookmarks) for the
//! first and last selected node. At extraction time the three descriptor
//! sources are never merged; precedence is fixed: an image selection wins
//! over a regular range, which wins over a table selection. A start bookmark
//! without a resolvable end yields no regular selection rather than a
//! partial range.

use crate::context::{Cursor, RenderContext};
use dom_core::{HostTree, NodeKey, NodeKind};

/// A concrete position in the host tree. `offset` is a character count
/// within text nodes and a child index otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub node: NodeKey,
    pub offset: usize,
}

/// Externally computed table selection, passed through `ConvertOptions`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableSelection {
    pub table: NodeKey,
    pub first_cell: NodeKey,
    pub last_cell: NodeKey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionDescriptor {
    None,
    Image {
        node: NodeKey,
    },
    Table {
        table: NodeKey,
        first_cell: NodeKey,
        last_cell: NodeKey,
    },
    Regular {
        start: Position,
        end: Position,
    },
}

pub(crate) fn extract_selection(tree: &HostTree, ctx: &RenderContext) -> SelectionDescriptor {
    if let Some(node) = ctx.image_selection {
        return SelectionDescriptor::Image { node };
    }
    if let (Some(start), Some(end)) = (&ctx.selection_start, &ctx.selection_end) {
        if let (Some(start), Some(end)) = (
            resolve_bookmark(tree, start),
            resolve_bookmark(tree, end),
        ) {
            return SelectionDescriptor::Regular { start, end };
        }
        log::trace!(target: "model_to_dom.selection", "unresolvable bookmark pair dropped");
    }
    if let Some(sel) = ctx.table_selection {
        return SelectionDescriptor::Table {
            table: sel.table,
            first_cell: sel.first_cell,
            last_cell: sel.last_cell,
        };
    }
    SelectionDescriptor::None
}

/// Resolve a cursor snapshot to a concrete position:
/// - no segment node: start of the block node;
/// - text segment node: end-of-text offset within it;
/// - any other segment node: its parent, just past the node's index.
fn resolve_bookmark(tree: &HostTree, cursor: &Cursor) -> Option<Position> {
    let pos = match cursor.segment {
        None => Position {
            node: cursor.block?,
            offset: 0,
        },
        Some(segment) => {
            if !tree.contains(segment) {
                return None;
            }
            match tree.kind(segment).ok()? {
                NodeKind::Text => Position {
                    node: segment,
                    offset: tree.text(segment).ok()?.chars().count(),
                },
                _ => {
                    let parent = tree.parent(segment).ok()??;
                    let index = tree.child_index(segment).ok()??;
                    Position {
                        node: parent,
                        offset: index + 1,
                    }
                }
            }
        }
    };
    Some(normalize_position(tree, pos))
}

/// Merge a position anchored on a fragment root into its content.
pub(crate) fn normalize_position(tree: &HostTree, mut pos: Position) -> Position {
    while matches!(tree.kind(pos.node), Ok(NodeKind::Fragment)) {
        let Ok(children) = tree.children(pos.node) else {
            break;
        };
        if children.is_empty() {
            break;
        }
        pos = if pos.offset >= children.len() {
            let last = children[children.len() - 1];
            Position {
                node: last,
                offset: node_end_offset(tree, last),
            }
        } else {
            Position {
                node: children[pos.offset],
                offset: 0,
            }
        };
    }
    pos
}

fn node_end_offset(tree: &HostTree, key: NodeKey) -> usize {
    match tree.kind(key) {
        Ok(NodeKind::Text) => tree.text(key).map(|t| t.chars().count()).unwrap_or(0),
        Ok(NodeKind::Element) | Ok(NodeKind::Fragment) => {
            tree.children(key).map(|c| c.len()).unwrap_or(0)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ConvertOptions, EditorContext};

    fn context() -> RenderContext {
        RenderContext::new(EditorContext::default(), ConvertOptions::default())
    }

    #[test]
    fn text_bookmark_resolves_to_end_of_text() {
        let mut tree = HostTree::new();
        let block = tree.create_element("div");
        let text = tree.create_text("héllo");
        tree.append_child(block, text).unwrap();
        let cursor = Cursor {
            block: Some(block),
            segment: Some(text),
        };
        assert_eq!(
            resolve_bookmark(&tree, &cursor),
            Some(Position {
                node: text,
                offset: 5
            })
        );
    }

    #[test]
    fn element_bookmark_resolves_past_its_index() {
        let mut tree = HostTree::new();
        let block = tree.create_element("div");
        let first = tree.create_text("a");
        let img = tree.create_element("img");
        tree.append_child(block, first).unwrap();
        tree.append_child(block, img).unwrap();
        let cursor = Cursor {
            block: Some(block),
            segment: Some(img),
        };
        assert_eq!(
            resolve_bookmark(&tree, &cursor),
            Some(Position {
                node: block,
                offset: 2
            })
        );
    }

    #[test]
    fn missing_segment_falls_back_to_block_start() {
        let mut tree = HostTree::new();
        let block = tree.create_element("div");
        let cursor = Cursor {
            block: Some(block),
            segment: None,
        };
        assert_eq!(
            resolve_bookmark(&tree, &cursor),
            Some(Position {
                node: block,
                offset: 0
            })
        );
    }

    #[test]
    fn detached_element_bookmark_is_unresolvable() {
        let mut tree = HostTree::new();
        let block = tree.create_element("div");
        let img = tree.create_element("img");
        let cursor = Cursor {
            block: Some(block),
            segment: Some(img),
        };
        assert_eq!(resolve_bookmark(&tree, &cursor), None);
    }

    #[test]
    fn fragment_positions_normalize_into_children() {
        let mut tree = HostTree::new();
        let fragment = tree.create_fragment();
        let text = tree.create_text("ab");
        let div = tree.create_element("div");
        tree.append_child(fragment, text).unwrap();
        tree.append_child(fragment, div).unwrap();
        assert_eq!(
            normalize_position(
                &tree,
                Position {
                    node: fragment,
                    offset: 0
                }
            ),
            Position {
                node: text,
                offset: 0
            }
        );
        assert_eq!(
            normalize_position(
                &tree,
                Position {
                    node: fragment,
                    offset: 5
                }
            ),
            Position {
                node: div,
                offset: 0
            }
        );
    }

    #[test]
    fn image_selection_wins_over_regular() {
        let mut tree = HostTree::new();
        let block = tree.create_element("div");
        let text = tree.create_text("x");
        tree.append_child(block, text).unwrap();
        let img = tree.create_element("img");

        let mut ctx = context();
        ctx.current = Cursor {
            block: Some(block),
            segment: Some(text),
        };
        ctx.note_selection_start();
        ctx.note_selection_end();
        ctx.image_selection = Some(img);
        assert_eq!(
            extract_selection(&tree, &ctx),
            SelectionDescriptor::Image { node: img }
        );
    }

    #[test]
    fn regular_wins_over_table() {
        let mut tree = HostTree::new();
        let block = tree.create_element("div");
        let table = tree.create_element("table");
        let cell = tree.create_element("td");

        let mut ctx = context();
        ctx.table_selection = Some(TableSelection {
            table,
            first_cell: cell,
            last_cell: cell,
        });
        ctx.current = Cursor {
            block: Some(block),
            segment: None,
        };
        ctx.note_selection_start();
        ctx.note_selection_end();
        assert!(matches!(
            extract_selection(&tree, &ctx),
            SelectionDescriptor::Regular { .. }
        ));

        // with no bookmarks the table selection surfaces
        ctx.selection_start = None;
        ctx.selection_end = None;
        assert!(matches!(
            extract_selection(&tree, &ctx),
            SelectionDescriptor::Table { .. }
        ));
    }

    #[test]
    fn start_without_resolvable_end_is_no_selection() {
        let tree = HostTree::new();
        let mut ctx = context();
        // a selected node was seen before any block node existed
        ctx.selection_start = Some(Cursor::default());
        ctx.selection_end = Some(Cursor::default());
        assert_eq!(extract_selection(&tree, &ctx), SelectionDescriptor::None);
    }
}
