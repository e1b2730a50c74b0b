//! Host tree arena.
//!
//! Contract:
//! - Keys are stable for the lifetime of the tree and never reused; removal
//!   detaches a subtree but keeps its slots allocated, so a stale key held by
//!   a caller can never alias a different node.
//! - Only elements and fragments may have children.
//! - `insert_before` with `before == None` appends; inserting a node that
//!   already has a parent detaches it first.
//! - Attribute order is insertion order and duplicates are rejected by
//!   `set_attr` (last write updates in place).
//! - Structural mutations update `Counters`; attribute and text updates do
//!   not count as structural.

use std::fmt;

/// Stable handle to a node within one [`HostTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u32);

impl NodeKey {
    /// Reserved sentinel for "unassigned" identity.
    pub const INVALID: NodeKey = NodeKey(0);

    fn index(self) -> usize {
        self.0 as usize - 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Fragment,
}

#[derive(Clone, Debug)]
pub enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    Fragment,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::Fragment => NodeKind::Fragment,
        }
    }
}

#[derive(Debug)]
pub enum DomError {
    MissingNode(NodeKey),
    NotAnElement(NodeKey),
    NotAText(NodeKey),
    NotAParent(NodeKey),
    NotAChild { parent: NodeKey, child: NodeKey },
    Cycle { parent: NodeKey, child: NodeKey },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::MissingNode(key) => write!(f, "no node for key {key:?}"),
            DomError::NotAnElement(key) => write!(f, "node {key:?} is not an element"),
            DomError::NotAText(key) => write!(f, "node {key:?} is not a text or comment node"),
            DomError::NotAParent(key) => write!(f, "node {key:?} cannot have children"),
            DomError::NotAChild { parent, child } => {
                write!(f, "node {child:?} is not a child of {parent:?}")
            }
            DomError::Cycle { parent, child } => {
                write!(f, "inserting {child:?} under {parent:?} would create a cycle")
            }
        }
    }
}

impl std::error::Error for DomError {}

/// Structural mutation counters for instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub nodes_created: u64,
    pub children_inserted: u64,
    pub children_removed: u64,
}

#[derive(Debug)]
struct Slot {
    data: NodeData,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

#[derive(Debug, Default)]
pub struct HostTree {
    slots: Vec<Slot>,
    counters: Counters,
}

impl HostTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, data: NodeData) -> NodeKey {
        self.slots.push(Slot {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.counters.nodes_created += 1;
        NodeKey(self.slots.len() as u32)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeKey {
        self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeKey {
        self.alloc(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeKey {
        self.alloc(NodeData::Comment(text.to_string()))
    }

    pub fn create_fragment(&mut self) -> NodeKey {
        self.alloc(NodeData::Fragment)
    }

    fn slot(&self, key: NodeKey) -> Result<&Slot, DomError> {
        if key == NodeKey::INVALID {
            return Err(DomError::MissingNode(key));
        }
        self.slots.get(key.index()).ok_or(DomError::MissingNode(key))
    }

    fn slot_mut(&mut self, key: NodeKey) -> Result<&mut Slot, DomError> {
        if key == NodeKey::INVALID {
            return Err(DomError::MissingNode(key));
        }
        self.slots
            .get_mut(key.index())
            .ok_or(DomError::MissingNode(key))
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        key != NodeKey::INVALID && key.index() < self.slots.len()
    }

    pub fn kind(&self, key: NodeKey) -> Result<NodeKind, DomError> {
        Ok(self.slot(key)?.data.kind())
    }

    pub fn tag(&self, key: NodeKey) -> Result<&str, DomError> {
        match &self.slot(key)?.data {
            NodeData::Element { tag, .. } => Ok(tag),
            _ => Err(DomError::NotAnElement(key)),
        }
    }

    /// Text content of a text or comment node.
    pub fn text(&self, key: NodeKey) -> Result<&str, DomError> {
        match &self.slot(key)?.data {
            NodeData::Text(text) | NodeData::Comment(text) => Ok(text),
            _ => Err(DomError::NotAText(key)),
        }
    }

    pub fn set_text(&mut self, key: NodeKey, value: &str) -> Result<(), DomError> {
        match &mut self.slot_mut(key)?.data {
            NodeData::Text(text) | NodeData::Comment(text) => {
                text.clear();
                text.push_str(value);
                Ok(())
            }
            _ => Err(DomError::NotAText(key)),
        }
    }

    pub fn parent(&self, key: NodeKey) -> Result<Option<NodeKey>, DomError> {
        Ok(self.slot(key)?.parent)
    }

    pub fn children(&self, key: NodeKey) -> Result<&[NodeKey], DomError> {
        Ok(&self.slot(key)?.children)
    }

    pub fn first_child(&self, key: NodeKey) -> Result<Option<NodeKey>, DomError> {
        Ok(self.slot(key)?.children.first().copied())
    }

    /// Position of `child` in its parent's child list, or `None` when detached.
    pub fn child_index(&self, child: NodeKey) -> Result<Option<usize>, DomError> {
        let Some(parent) = self.slot(child)?.parent else {
            return Ok(None);
        };
        Ok(self.slot(parent)?.children.iter().position(|&k| k == child))
    }

    pub fn next_sibling(&self, key: NodeKey) -> Result<Option<NodeKey>, DomError> {
        let Some(index) = self.child_index(key)? else {
            return Ok(None);
        };
        let parent = self.slot(key)?.parent.expect("indexed child has a parent");
        Ok(self.slot(parent)?.children.get(index + 1).copied())
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Result<Option<NodeKey>, DomError> {
        let Some(index) = self.child_index(key)? else {
            return Ok(None);
        };
        if index == 0 {
            return Ok(None);
        }
        let parent = self.slot(key)?.parent.expect("indexed child has a parent");
        Ok(self.slot(parent)?.children.get(index - 1).copied())
    }

    fn can_have_children(&self, key: NodeKey) -> Result<bool, DomError> {
        Ok(matches!(
            self.slot(key)?.data.kind(),
            NodeKind::Element | NodeKind::Fragment
        ))
    }

    /// True when `ancestor` is `node` or transitively contains it.
    pub fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> Result<bool, DomError> {
        let mut current = Some(node);
        while let Some(key) = current {
            if key == ancestor {
                return Ok(true);
            }
            current = self.slot(key)?.parent;
        }
        Ok(false)
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent`, before `before` (append when `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: Option<NodeKey>,
    ) -> Result<(), DomError> {
        if !self.can_have_children(parent)? {
            return Err(DomError::NotAParent(parent));
        }
        self.slot(child)?;
        if self.is_ancestor(child, parent)? {
            return Err(DomError::Cycle { parent, child });
        }
        self.detach(child)?;
        let position = match before {
            Some(before) => {
                if before == child {
                    return Err(DomError::NotAChild {
                        parent,
                        child: before,
                    });
                }
                self.slot(parent)?
                    .children
                    .iter()
                    .position(|&k| k == before)
                    .ok_or(DomError::NotAChild {
                        parent,
                        child: before,
                    })?
            }
            None => self.slot(parent)?.children.len(),
        };
        self.slot_mut(parent)?.children.insert(position, child);
        self.slot_mut(child)?.parent = Some(parent);
        self.counters.children_inserted += 1;
        log::trace!(target: "dom_core.tree", "inserted {child:?} under {parent:?} at index {position}");
        Ok(())
    }

    /// Unlink `child` from its parent, if any. The subtree stays intact.
    pub fn detach(&mut self, child: NodeKey) -> Result<(), DomError> {
        let Some(parent) = self.slot(child)?.parent else {
            return Ok(());
        };
        self.slot_mut(parent)?.children.retain(|&k| k != child);
        self.slot_mut(child)?.parent = None;
        self.counters.children_removed += 1;
        log::trace!(target: "dom_core.tree", "detached {child:?} from {parent:?}");
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        if self.slot(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child)
    }

    /// Copy a node without its children (or its parent link).
    pub fn clone_shallow(&mut self, key: NodeKey) -> Result<NodeKey, DomError> {
        let data = self.slot(key)?.data.clone();
        Ok(self.alloc(data))
    }

    pub fn get_attr(&self, key: NodeKey, name: &str) -> Result<Option<&str>, DomError> {
        match &self.slot(key)?.data {
            NodeData::Element { attrs, .. } => Ok(attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())),
            _ => Err(DomError::NotAnElement(key)),
        }
    }

    pub fn set_attr(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.slot_mut(key)?.data {
            NodeData::Element { attrs, .. } => {
                if let Some(entry) = attrs.iter_mut().find(|(k, _)| k == name) {
                    entry.1 = value.to_string();
                } else {
                    attrs.push((name.to_string(), value.to_string()));
                }
                Ok(())
            }
            _ => Err(DomError::NotAnElement(key)),
        }
    }

    pub fn remove_attr(&mut self, key: NodeKey, name: &str) -> Result<(), DomError> {
        match &mut self.slot_mut(key)?.data {
            NodeData::Element { attrs, .. } => {
                attrs.retain(|(k, _)| k != name);
                Ok(())
            }
            _ => Err(DomError::NotAnElement(key)),
        }
    }

    pub fn attrs(&self, key: NodeKey) -> Result<&[(String, String)], DomError> {
        match &self.slot(key)?.data {
            NodeData::Element { attrs, .. } => Ok(attrs),
            _ => Err(DomError::NotAnElement(key)),
        }
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }
}
