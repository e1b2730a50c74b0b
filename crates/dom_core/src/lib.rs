//! Arena-backed host tree for rich-text rendering.
//!
//! The engine crates only depend on the operation surface defined here:
//! node creation (`create_element`/`create_text`/`create_comment`/
//! `create_fragment`), structural mutation (`append_child`, `insert_before`,
//! `remove_child`, `detach`, `clone_shallow`) and introspection (`parent`,
//! `children`, sibling walks, `kind`, attributes).

#[cfg(any(test, feature = "dom-snapshot"))]
pub mod snapshot;
mod tree;

pub use crate::tree::{Counters, DomError, HostTree, NodeData, NodeKey, NodeKind};
