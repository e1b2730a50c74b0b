use crate::{DomError, HostTree, NodeData, NodeKey};
use std::fmt;

/// Deterministic host-tree serialization for test comparisons.
/// Not a public stable format.
///
/// Rendering rules:
/// - One line per node, two-space indent per depth.
/// - Elements render as `<tag attr="value">` with attributes in insertion
///   order; fragments render as `#fragment`.
/// - Text renders quoted, comments as `<!-- text -->`.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotOptions {
    pub include_attrs: bool,
    pub include_comments: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            include_attrs: true,
            include_comments: true,
        }
    }
}

#[derive(Debug)]
pub struct TreeSnapshot {
    lines: Vec<String>,
}

impl TreeSnapshot {
    pub fn new(tree: &HostTree, root: NodeKey, options: SnapshotOptions) -> Result<Self, DomError> {
        let mut lines = Vec::new();
        walk(tree, root, &options, 0, &mut lines)?;
        Ok(Self { lines })
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

fn walk(
    tree: &HostTree,
    key: NodeKey,
    options: &SnapshotOptions,
    depth: usize,
    lines: &mut Vec<String>,
) -> Result<(), DomError> {
    let indent = "  ".repeat(depth);
    let data = node_data(tree, key)?;
    match data {
        NodeData::Element { tag, attrs } => {
            let mut line = format!("{indent}<{tag}");
            if options.include_attrs {
                for (name, value) in attrs {
                    line.push_str(&format!(r#" {name}="{value}""#));
                }
            }
            line.push('>');
            lines.push(line);
        }
        NodeData::Text(text) => lines.push(format!("{indent}\"{text}\"")),
        NodeData::Comment(text) => {
            if options.include_comments {
                lines.push(format!("{indent}<!-- {text} -->"));
            }
        }
        NodeData::Fragment => lines.push(format!("{indent}#fragment")),
    }
    for child in tree.children(key)?.to_vec() {
        walk(tree, child, options, depth + 1, lines)?;
    }
    Ok(())
}

fn node_data(tree: &HostTree, key: NodeKey) -> Result<NodeData, DomError> {
    Ok(match tree.kind(key)? {
        crate::NodeKind::Element => NodeData::Element {
            tag: tree.tag(key)?.to_string(),
            attrs: tree.attrs(key)?.to_vec(),
        },
        crate::NodeKind::Text => NodeData::Text(tree.text(key)?.to_string()),
        crate::NodeKind::Comment => NodeData::Comment(tree.text(key)?.to_string()),
        crate::NodeKind::Fragment => NodeData::Fragment,
    })
}

/// Panic with both snapshots when the subtrees differ.
pub fn assert_tree_eq(tree: &HostTree, actual: NodeKey, expected: &str) {
    let snapshot = TreeSnapshot::new(tree, actual, SnapshotOptions::default())
        .expect("snapshot of live subtree");
    let rendered = snapshot.render();
    let expected = expected.trim_matches('\n');
    if rendered != expected {
        panic!("tree mismatch\nexpected:\n{expected}\nactual:\n{rendered}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_indented_lines() {
        let mut tree = HostTree::new();
        let root = tree.create_fragment();
        let div = tree.create_element("div");
        tree.set_attr(div, "class", "p").unwrap();
        let text = tree.create_text("hi");
        tree.append_child(root, div).unwrap();
        tree.append_child(div, text).unwrap();
        assert_tree_eq(
            &tree,
            root,
            "#fragment\n  <div class=\"p\">\n    \"hi\"",
        );
    }
}
