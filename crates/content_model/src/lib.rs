//! Content model: a structured, serializable rich-text document.
//!
//! The model is a closed set of tagged variants over blocks, block groups
//! and segments. Every variant carries an opaque [`FormatBag`] and, where the
//! renderer can reuse previously produced host nodes, a `cached` back-pointer
//! into the host tree.
//!
//! Cache and wrapper pointers are weak, lookup-only linkage: the host tree
//! owns node lifetime, a lost or stale pointer forces recreation and nothing
//! else. They are skipped during serialization.

mod blocks;
mod format;
mod segments;

pub use crate::blocks::{
    Block, BlockGroup, Divider, DividerTag, Document, FormatContainer, GeneralBlock, ListItem,
    ListLevel, ListType, Paragraph, Quote, Table, TableCell,
};
pub use crate::format::FormatBag;
pub use crate::segments::{Br, Entity, GeneralSegment, ImageSegment, Segment, SelectionMarker, TextSegment};

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        let mut doc = Document::new();
        let mut para = Paragraph::new();
        para.segments.push(Segment::Text(TextSegment::new("hello")));
        para.segments.push(Segment::Br(Br::default()));
        doc.blocks.push(Block::Paragraph(para));

        let mut item = ListItem::new(vec![ListLevel::new(ListType::Ol)]);
        let mut body = Paragraph::new();
        body.is_implicit = true;
        body.segments.push(Segment::Text(TextSegment::new("first")));
        item.blocks.push(Block::Paragraph(body));
        doc.blocks.push(Block::Group(BlockGroup::ListItem(item)));

        let cell = TableCell::new();
        let mut covered = TableCell::new();
        covered.span_above = true;
        doc.blocks.push(Block::Table(Table {
            format: FormatBag::new(),
            rows: vec![vec![cell], vec![covered]],
            cached: None,
        }));
        doc
    }

    #[test]
    fn serde_round_trip_preserves_content() {
        let doc = sample_document();
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn cached_pointers_are_not_serialized() {
        let mut doc = sample_document();
        let mut tree = dom_core::HostTree::new();
        let div = tree.create_element("div");
        if let Block::Paragraph(para) = &mut doc.blocks[0] {
            para.cached = Some(div);
        }
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("cached"));
        let back: Document = serde_json::from_str(&json).unwrap();
        if let Block::Paragraph(para) = &back.blocks[0] {
            assert_eq!(para.cached, None);
        } else {
            panic!("expected paragraph");
        }
    }
}
