use crate::format::FormatBag;
use crate::segments::{Segment, SelectionMarker};
use dom_core::NodeKey;
use serde::{Deserialize, Serialize};

/// Root of the content model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(skip)]
    pub cached: Option<NodeKey>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Block-level content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "blockType")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Divider(Divider),
    Entity(crate::segments::Entity),
    Group(BlockGroup),
}

/// A block that owns other blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "blockGroupType")]
pub enum BlockGroup {
    FormatContainer(FormatContainer),
    ListItem(ListItem),
    Quote(Quote),
    General(GeneralBlock),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// An implicit paragraph renders its segments directly into the parent
    /// container instead of materializing a wrapper of its own.
    #[serde(default)]
    pub is_implicit: bool,
    #[serde(skip)]
    pub cached: Option<NodeKey>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Row-major grid of cells. Merged regions are encoded on the covered
/// cells via `span_above`/`span_left`, never on the origin cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub rows: Vec<Vec<TableCell>>,
    #[serde(skip)]
    pub cached: Option<NodeKey>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub span_above: bool,
    #[serde(default)]
    pub span_left: bool,
    #[serde(default)]
    pub is_header: bool,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(skip)]
    pub cached: Option<NodeKey>,
}

impl TableCell {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DividerTag {
    #[default]
    Hr,
    Div,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Divider {
    #[serde(default)]
    pub tag: DividerTag,
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(skip)]
    pub cached: Option<NodeKey>,
}

/// A named wrapper element around nested blocks. Collapses to nothing when
/// it owns no blocks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatContainer {
    pub tag_name: String,
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(skip)]
    pub cached: Option<NodeKey>,
}

impl FormatContainer {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(skip)]
    pub cached: Option<NodeKey>,
}

/// A block group wrapping an opaque external host node used verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralBlock {
    #[serde(skip)]
    pub node: Option<NodeKey>,
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub is_selected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListType {
    Ol,
    Ul,
}

/// One nesting level of a list item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListLevel {
    pub list_type: ListType,
    #[serde(default)]
    pub ordered_style: Option<String>,
    #[serde(default)]
    pub unordered_style: Option<String>,
    /// Restarts numbering. An override always forces a fresh list container,
    /// since numbering restart is container-scoped in the host tree.
    #[serde(default)]
    pub start_number_override: Option<u32>,
    #[serde(default)]
    pub format: FormatBag,
}

impl ListLevel {
    pub fn new(list_type: ListType) -> Self {
        Self {
            list_type,
            ordered_style: None,
            unordered_style: None,
            start_number_override: None,
            format: FormatBag::new(),
        }
    }
}

/// A list member. An item with no levels is not a list member at all and
/// renders as a plain block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    pub levels: Vec<ListLevel>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Marker segment carrying the item-level (bullet) format and selection.
    #[serde(default)]
    pub format_holder: SelectionMarker,
    #[serde(default)]
    pub format: FormatBag,
}

impl ListItem {
    pub fn new(levels: Vec<ListLevel>) -> Self {
        Self {
            levels,
            ..Self::default()
        }
    }
}
