use crate::blocks::Block;
use crate::format::FormatBag;
use dom_core::NodeKey;
use serde::{Deserialize, Serialize};

/// Inline content of a paragraph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "segmentType")]
pub enum Segment {
    Text(TextSegment),
    Br(Br),
    Image(ImageSegment),
    General(GeneralSegment),
    Entity(Entity),
    SelectionMarker(SelectionMarker),
}

impl Segment {
    /// Whether this segment participates in a regular or image selection.
    pub fn is_selected(&self) -> bool {
        match self {
            Segment::Text(text) => text.is_selected,
            Segment::Br(br) => br.is_selected,
            Segment::Image(image) => image.is_selected || image.is_selected_as_image_selection,
            Segment::General(general) => general.is_selected,
            Segment::Entity(entity) => entity.is_selected,
            Segment::SelectionMarker(marker) => marker.is_selected,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub is_selected: bool,
}

impl TextSegment {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Br {
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub is_selected: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSegment {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub is_selected: bool,
    /// Selects the image itself (resize handles), not a text range over it.
    #[serde(default)]
    pub is_selected_as_image_selection: bool,
}

impl ImageSegment {
    pub fn new(src: &str) -> Self {
        Self {
            src: src.to_string(),
            ..Self::default()
        }
    }
}

/// A block group reused as an inline segment, wrapping an opaque host node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralSegment {
    #[serde(skip)]
    pub node: Option<NodeKey>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub is_selected: bool,
}

/// Opaque, possibly stateful subtree. The wrapper node is externally owned
/// and must survive reconciliation unless the entity leaves the model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub is_readonly: bool,
    #[serde(skip)]
    pub wrapper: Option<NodeKey>,
    #[serde(default)]
    pub is_selected: bool,
}

impl Entity {
    pub fn new(id: &str, entity_type: &str) -> Self {
        Self {
            id: id.to_string(),
            entity_type: entity_type.to_string(),
            ..Self::default()
        }
    }
}

/// Zero-width selection placeholder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionMarker {
    #[serde(default)]
    pub format: FormatBag,
    #[serde(default)]
    pub is_selected: bool,
}

impl SelectionMarker {
    pub fn selected() -> Self {
        Self {
            is_selected: true,
            ..Self::default()
        }
    }
}
