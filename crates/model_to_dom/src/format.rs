//! Format applier table.
//!
//! The engine never interprets format keys itself. For each node kind it
//! walks a fixed key order and invokes the applier registered for each key
//! that is present in the node's format bag. The standard table maps the
//! common keys to inline styles and attributes; callers may override or
//! extend it through `ConvertOptions`.

use crate::context::EditorContext;
use content_model::FormatBag;
use dom_core::{DomError, HostTree, NodeKey};
use std::collections::BTreeMap;

pub type FormatApplier = fn(&str, &mut HostTree, NodeKey, &EditorContext) -> Result<(), DomError>;

/// Node kinds with distinct applier orderings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplierKind {
    Block,
    Segment,
    Container,
    Table,
    TableCell,
    Divider,
    Image,
    Link,
    Code,
    Dataset,
    ListLevel,
    ListItem,
}

const BLOCK_KEYS: &[&str] = &[
    "backgroundColor",
    "textAlign",
    "direction",
    "lineHeight",
    "textIndent",
    "marginTop",
    "marginBottom",
];
const SEGMENT_KEYS: &[&str] = &[
    "fontFamily",
    "fontSize",
    "textColor",
    "backgroundColor",
    "fontWeight",
    "italic",
    "underline",
    "strikethrough",
];
const CONTAINER_KEYS: &[&str] = &[
    "backgroundColor",
    "borderColor",
    "direction",
    "marginTop",
    "marginBottom",
    "paddingLeft",
    "paddingRight",
];
const TABLE_KEYS: &[&str] = &[
    "backgroundColor",
    "borderCollapse",
    "marginTop",
    "marginBottom",
    "dataset",
];
const TABLE_CELL_KEYS: &[&str] = &[
    "backgroundColor",
    "borderColor",
    "textAlign",
    "verticalAlign",
    "wordBreak",
];
const DIVIDER_KEYS: &[&str] = &["borderColor", "marginTop", "marginBottom"];
const IMAGE_KEYS: &[&str] = &["borderColor", "boxShadow", "maxWidth"];
const LINK_KEYS: &[&str] = &["href", "textColor", "underline"];
const CODE_KEYS: &[&str] = &["fontFamily"];
const DATASET_KEYS: &[&str] = &["dataset"];
const LIST_LEVEL_KEYS: &[&str] = &[
    "listStyleType",
    "direction",
    "marginTop",
    "marginBottom",
    "paddingLeft",
    "dataset",
];
const LIST_ITEM_KEYS: &[&str] = &["listStyleType", "textColor", "fontSize"];

macro_rules! style_applier {
    ($prop:literal) => {{
        fn applier(
            value: &str,
            tree: &mut HostTree,
            node: NodeKey,
            _editor: &EditorContext,
        ) -> Result<(), DomError> {
            append_style(tree, node, $prop, value)
        }
        applier as FormatApplier
    }};
}

#[derive(Debug)]
pub struct FormatAppliers {
    by_key: BTreeMap<String, FormatApplier>,
}

impl FormatAppliers {
    /// The default key → applier mapping.
    pub fn standard() -> Self {
        let mut table = Self {
            by_key: BTreeMap::new(),
        };
        table.set("backgroundColor", apply_background_color);
        table.set("textColor", apply_text_color);
        table.set("textAlign", style_applier!("text-align"));
        table.set("direction", apply_direction);
        table.set("lineHeight", style_applier!("line-height"));
        table.set("textIndent", style_applier!("text-indent"));
        table.set("marginTop", style_applier!("margin-top"));
        table.set("marginBottom", style_applier!("margin-bottom"));
        table.set("paddingLeft", style_applier!("padding-left"));
        table.set("paddingRight", style_applier!("padding-right"));
        table.set("fontFamily", style_applier!("font-family"));
        table.set("fontSize", style_applier!("font-size"));
        table.set("fontWeight", style_applier!("font-weight"));
        table.set("italic", apply_italic);
        table.set("underline", apply_underline);
        table.set("strikethrough", apply_strikethrough);
        table.set("borderColor", style_applier!("border-color"));
        table.set("borderCollapse", style_applier!("border-collapse"));
        table.set("verticalAlign", style_applier!("vertical-align"));
        table.set("wordBreak", style_applier!("word-break"));
        table.set("boxShadow", style_applier!("box-shadow"));
        table.set("maxWidth", style_applier!("max-width"));
        table.set("listStyleType", style_applier!("list-style-type"));
        table.set("href", apply_href);
        table.set("dataset", apply_dataset);
        table
    }

    /// Register or replace the applier for a key.
    pub fn set(&mut self, key: &str, applier: FormatApplier) -> &mut Self {
        self.by_key.insert(key.to_string(), applier);
        self
    }

    /// Fixed per-kind key order.
    pub fn key_order(kind: ApplierKind) -> &'static [&'static str] {
        match kind {
            ApplierKind::Block => BLOCK_KEYS,
            ApplierKind::Segment => SEGMENT_KEYS,
            ApplierKind::Container => CONTAINER_KEYS,
            ApplierKind::Table => TABLE_KEYS,
            ApplierKind::TableCell => TABLE_CELL_KEYS,
            ApplierKind::Divider => DIVIDER_KEYS,
            ApplierKind::Image => IMAGE_KEYS,
            ApplierKind::Link => LINK_KEYS,
            ApplierKind::Code => CODE_KEYS,
            ApplierKind::Dataset => DATASET_KEYS,
            ApplierKind::ListLevel => LIST_LEVEL_KEYS,
            ApplierKind::ListItem => LIST_ITEM_KEYS,
        }
    }

    pub fn apply(
        &self,
        kind: ApplierKind,
        format: &FormatBag,
        tree: &mut HostTree,
        node: NodeKey,
        editor: &EditorContext,
    ) -> Result<(), DomError> {
        for key in Self::key_order(kind) {
            if let (Some(value), Some(applier)) = (format.get(key), self.by_key.get(*key)) {
                applier(value, tree, node, editor)?;
            }
        }
        Ok(())
    }

    /// True when the bag carries any key the given kind would apply.
    pub fn applies_any(kind: ApplierKind, format: &FormatBag) -> bool {
        Self::key_order(kind).iter().any(|key| format.get(key).is_some())
    }
}

/// Append one `prop: value` declaration to the node's inline style.
pub fn append_style(
    tree: &mut HostTree,
    node: NodeKey,
    prop: &str,
    value: &str,
) -> Result<(), DomError> {
    let style = match tree.get_attr(node, "style")? {
        Some(existing) if !existing.is_empty() => format!("{existing}; {prop}: {value}"),
        _ => format!("{prop}: {value}"),
    };
    tree.set_attr(node, "style", &style)
}

fn apply_text_color(
    value: &str,
    tree: &mut HostTree,
    node: NodeKey,
    editor: &EditorContext,
) -> Result<(), DomError> {
    append_style(tree, node, "color", value)?;
    if editor.is_dark_mode {
        // remember the original light-mode color for round-tripping
        tree.set_attr(node, "data-ogsc", value)?;
    }
    Ok(())
}

fn apply_background_color(
    value: &str,
    tree: &mut HostTree,
    node: NodeKey,
    editor: &EditorContext,
) -> Result<(), DomError> {
    append_style(tree, node, "background-color", value)?;
    if editor.is_dark_mode {
        tree.set_attr(node, "data-ogsb", value)?;
    }
    Ok(())
}

fn apply_direction(
    value: &str,
    tree: &mut HostTree,
    node: NodeKey,
    _editor: &EditorContext,
) -> Result<(), DomError> {
    tree.set_attr(node, "dir", value)
}

fn apply_italic(
    value: &str,
    tree: &mut HostTree,
    node: NodeKey,
    _editor: &EditorContext,
) -> Result<(), DomError> {
    if value == "true" {
        append_style(tree, node, "font-style", "italic")?;
    }
    Ok(())
}

fn apply_underline(
    value: &str,
    tree: &mut HostTree,
    node: NodeKey,
    _editor: &EditorContext,
) -> Result<(), DomError> {
    if value == "true" {
        append_style(tree, node, "text-decoration", "underline")?;
    }
    Ok(())
}

fn apply_strikethrough(
    value: &str,
    tree: &mut HostTree,
    node: NodeKey,
    _editor: &EditorContext,
) -> Result<(), DomError> {
    if value == "true" {
        append_style(tree, node, "text-decoration", "line-through")?;
    }
    Ok(())
}

fn apply_href(
    value: &str,
    tree: &mut HostTree,
    node: NodeKey,
    _editor: &EditorContext,
) -> Result<(), DomError> {
    tree.set_attr(node, "href", value)
}

fn apply_dataset(
    value: &str,
    tree: &mut HostTree,
    node: NodeKey,
    _editor: &EditorContext,
) -> Result<(), DomError> {
    tree.set_attr(node, "data-editing-info", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_keys_in_fixed_order() {
        let mut tree = HostTree::new();
        let node = tree.create_element("div");
        let mut format = FormatBag::new();
        format.set("marginTop", "4px");
        format.set("backgroundColor", "red");
        let table = FormatAppliers::standard();
        table
            .apply(
                ApplierKind::Block,
                &format,
                &mut tree,
                node,
                &EditorContext::default(),
            )
            .unwrap();
        // backgroundColor sorts after marginTop in the bag but applies first
        assert_eq!(
            tree.get_attr(node, "style").unwrap(),
            Some("background-color: red; margin-top: 4px")
        );
    }

    #[test]
    fn dark_mode_keeps_original_colors() {
        let mut tree = HostTree::new();
        let node = tree.create_element("span");
        let mut format = FormatBag::new();
        format.set("textColor", "#123456");
        let editor = EditorContext {
            is_dark_mode: true,
            ..EditorContext::default()
        };
        FormatAppliers::standard()
            .apply(ApplierKind::Segment, &format, &mut tree, node, &editor)
            .unwrap();
        assert_eq!(tree.get_attr(node, "data-ogsc").unwrap(), Some("#123456"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut tree = HostTree::new();
        let node = tree.create_element("div");
        let mut format = FormatBag::new();
        format.set("notAKnownKey", "x");
        FormatAppliers::standard()
            .apply(
                ApplierKind::Block,
                &format,
                &mut tree,
                node,
                &EditorContext::default(),
            )
            .unwrap();
        assert_eq!(tree.get_attr(node, "style").unwrap(), None);
    }
}
