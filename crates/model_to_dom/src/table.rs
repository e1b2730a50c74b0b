//! Table grid reconstruction.
//!
//! The model stores a full row-major grid; merged regions are encoded on
//! the covered cells via `span_above`/`span_left`. Rendering emits only
//! origin cells, with spans computed from local run-length counts, so
//! irregular staircase merges tile exactly without a global packing pass.

use crate::context::RenderContext;
use crate::dispatch::{block_has_selection, render_group_children};
use crate::format::ApplierKind;
use crate::reuse::reuse_cached_element;
use content_model::{Table, TableCell};
use dom_core::{DomError, HostTree, NodeKey};

fn row_span_at(rows: &[Vec<TableCell>], r: usize, c: usize) -> usize {
    let mut span = 1;
    while rows
        .get(r + span)
        .and_then(|row| row.get(c))
        .is_some_and(|cell| cell.span_above)
    {
        span += 1;
    }
    span
}

fn col_span_at(rows: &[Vec<TableCell>], r: usize, c: usize) -> usize {
    let mut span = 1;
    while rows[r].get(c + span).is_some_and(|cell| cell.span_left) {
        span += 1;
    }
    span
}

fn table_has_selection(table: &Table) -> bool {
    table
        .rows
        .iter()
        .flatten()
        .any(|cell| cell.is_selected || cell.blocks.iter().any(block_has_selection))
}

/// Render a table block. An empty grid (no rows, or only empty rows)
/// produces no node at all.
pub(crate) fn render_table(
    tree: &mut HostTree,
    parent: NodeKey,
    table: &mut Table,
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    if table.rows.is_empty() || table.rows.iter().all(|row| row.is_empty()) {
        log::trace!(target: "model_to_dom.table", "empty grid, table elided");
        return Ok(ref_node);
    }

    if let Some(cached) = table.cached {
        if tree.contains(cached) && !table_has_selection(table) && ctx.table_selection.is_none() {
            ctx.current.block = Some(cached);
            ctx.current.segment = None;
            return reuse_cached_element(tree, parent, cached, ref_node);
        }
    }

    let table_el = tree.create_element("table");
    ctx.appliers
        .apply(ApplierKind::Table, &table.format, tree, table_el, &ctx.editor)?;
    tree.insert_before(parent, table_el, ref_node)?;
    table.cached = Some(table_el);
    let tbody = tree.create_element("tbody");
    tree.append_child(table_el, tbody)?;

    for r in 0..table.rows.len() {
        if table.rows[r].is_empty() {
            continue;
        }
        let tr = tree.create_element("tr");
        tree.append_child(tbody, tr)?;
        let cols = table.rows[r].len();
        for c in 0..cols {
            let (covered, is_header, selected) = {
                let cell = &table.rows[r][c];
                (
                    cell.span_above || cell.span_left,
                    cell.is_header,
                    cell.is_selected,
                )
            };
            if covered {
                continue;
            }
            let row_span = row_span_at(&table.rows, r, c);
            let col_span = col_span_at(&table.rows, r, c);
            let td = tree.create_element(if is_header { "th" } else { "td" });
            tree.append_child(tr, td)?;
            if row_span > 1 {
                tree.set_attr(td, "rowspan", &row_span.to_string())?;
            }
            if col_span > 1 {
                tree.set_attr(td, "colspan", &col_span.to_string())?;
            }
            {
                let cell = &table.rows[r][c];
                ctx.appliers
                    .apply(ApplierKind::TableCell, &cell.format, tree, td, &ctx.editor)?;
            }
            table.rows[r][c].cached = Some(td);
            ctx.current.block = Some(td);
            ctx.current.segment = None;
            if selected {
                ctx.note_selection_start();
                ctx.note_selection_end();
            }
            render_group_children(tree, td, &mut table.rows[r][c].blocks, ctx)?;
        }
    }
    Ok(ref_node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> TableCell {
        TableCell::new()
    }

    fn covered_above() -> TableCell {
        TableCell {
            span_above: true,
            ..TableCell::new()
        }
    }

    fn covered_left() -> TableCell {
        TableCell {
            span_left: true,
            ..TableCell::new()
        }
    }

    #[test]
    fn run_length_spans_stop_at_first_gap() {
        let rows = vec![
            vec![origin(), covered_left(), origin()],
            vec![covered_above(), origin(), covered_above()],
            vec![origin(), origin(), covered_above()],
        ];
        assert_eq!(row_span_at(&rows, 0, 0), 2);
        assert_eq!(col_span_at(&rows, 0, 0), 2);
        assert_eq!(row_span_at(&rows, 0, 2), 3);
        assert_eq!(row_span_at(&rows, 2, 0), 1);
        assert_eq!(col_span_at(&rows, 2, 1), 1);
    }

    #[test]
    fn spans_handle_ragged_rows() {
        let rows = vec![vec![origin(), origin()], vec![covered_above()]];
        assert_eq!(row_span_at(&rows, 0, 0), 2);
        // column 1 does not exist in row 1
        assert_eq!(row_span_at(&rows, 0, 1), 1);
    }
}
