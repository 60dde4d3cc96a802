//! Document tree node model.
//!
//! # Responsibility
//! - Define the closed set of node variants a document can hold.
//! - Provide read helpers used by commands, codecs and the editor.
//!
//! # Invariants
//! - Paragraph content is kept in normal form: adjacent text runs are merged
//!   and empty runs are dropped, so `paragraph("")` equals `paragraph()`.
//! - Nodes are plain owned values; every edit produces a new tree.
//!
//! # See also
//! - `model::schema` for nesting legality.

use serde::{Deserialize, Serialize};

use crate::model::schema::NodeType;

/// Attributes carried by one task item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskItemAttrs {
    /// Checkbox state. Newly created items are always `false`.
    #[serde(default)]
    pub done: bool,
}

impl TaskItemAttrs {
    pub fn new(done: bool) -> Self {
        Self { done }
    }
}

/// One node of the document tree.
///
/// Serialized with a `type` tag and camelCase names, matching the node JSON
/// shape used by browser-side rich-text editors
/// (`{"type":"taskItem","attrs":{"done":false},"content":[...]}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// Document root.
    Doc {
        #[serde(default)]
        content: Vec<Node>,
    },
    /// Textblock holding inline text runs.
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    /// Inline text run. Never empty inside a committed document.
    Text { text: String },
    /// Container of task items.
    TaskList {
        #[serde(default)]
        content: Vec<Node>,
    },
    /// Checkbox list entry wrapping exactly one paragraph.
    TaskItem {
        #[serde(default)]
        attrs: TaskItemAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
}

impl Node {
    /// Creates a paragraph in normal form from plain text.
    pub fn paragraph_from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let content = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::Text { text }]
        };
        Node::Paragraph { content }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Doc { .. } => NodeType::Doc,
            Node::Paragraph { .. } => NodeType::Paragraph,
            Node::Text { .. } => NodeType::Text,
            Node::TaskList { .. } => NodeType::TaskList,
            Node::TaskItem { .. } => NodeType::TaskItem,
        }
    }

    /// Child nodes. Text leaves have none.
    pub fn content(&self) -> &[Node] {
        match self {
            Node::Doc { content }
            | Node::Paragraph { content }
            | Node::TaskList { content }
            | Node::TaskItem { content, .. } => content,
            Node::Text { .. } => &[],
        }
    }

    /// Mutable child list, or `None` for text leaves.
    pub fn content_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Doc { content }
            | Node::Paragraph { content }
            | Node::TaskList { content }
            | Node::TaskItem { content, .. } => Some(content),
            Node::Text { .. } => None,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content().get(index)
    }

    pub fn child_count(&self) -> usize {
        self.content().len()
    }

    pub fn is_textblock(&self) -> bool {
        matches!(self, Node::Paragraph { .. })
    }

    /// Returns whether this is a paragraph without any text.
    pub fn is_empty_textblock(&self) -> bool {
        self.is_textblock() && self.char_len() == 0
    }

    /// Task item attributes, when this node is a task item.
    pub fn task_attrs(&self) -> Option<TaskItemAttrs> {
        match self {
            Node::TaskItem { attrs, .. } => Some(*attrs),
            _ => None,
        }
    }

    /// Concatenated text of all descendants, without separators.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { text } => out.push_str(text),
            other => {
                for child in other.content() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Number of characters (Unicode scalar values) of text in this subtree.
    pub fn char_len(&self) -> usize {
        match self {
            Node::Text { text } => text.chars().count(),
            other => other.content().iter().map(Node::char_len).sum(),
        }
    }

    /// Resolves a child-index path from this node.
    ///
    /// An empty path resolves to `self`.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let mut current = self;
        for &index in path {
            current = current.child(index)?;
        }
        Some(current)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut current = self;
        for &index in path {
            current = current.content_mut()?.get_mut(index)?;
        }
        Some(current)
    }

    /// Rewrites paragraph content into normal form, recursively.
    pub fn normalize(&mut self) {
        match self {
            Node::Paragraph { content } => {
                let text = content
                    .iter()
                    .filter_map(|child| match child {
                        Node::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<String>();
                let has_foreign_children = content
                    .iter()
                    .any(|child| !matches!(child, Node::Text { .. }));
                if has_foreign_children {
                    // Leave illegal children in place so schema checks can report them.
                    content.retain(|child| !matches!(child, Node::Text { text } if text.is_empty()));
                    return;
                }
                *content = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Node::Text { text }]
                };
            }
            Node::Text { .. } => {}
            other => {
                if let Some(content) = other.content_mut() {
                    for child in content.iter_mut() {
                        child.normalize();
                    }
                }
            }
        }
    }
}

/// Splits `text` at a character offset, clamping past-the-end offsets.
pub(crate) fn split_at_char(text: &str, offset: usize) -> (String, String) {
    let byte_index = text
        .char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    let (left, right) = text.split_at(byte_index);
    (left.to_string(), right.to_string())
}

/// Terse constructors for building documents in code and tests.
pub mod builders {
    use super::{Node, TaskItemAttrs};

    pub fn doc(content: Vec<Node>) -> Node {
        Node::Doc { content }
    }

    pub fn paragraph(text: &str) -> Node {
        Node::paragraph_from_text(text)
    }

    pub fn empty_paragraph() -> Node {
        Node::Paragraph {
            content: Vec::new(),
        }
    }

    pub fn task_list(items: Vec<Node>) -> Node {
        Node::TaskList { content: items }
    }

    /// Task item with `done = false`.
    pub fn task_item(paragraph: Node) -> Node {
        Node::TaskItem {
            attrs: TaskItemAttrs::default(),
            content: vec![paragraph],
        }
    }

    pub fn task_item_done(paragraph: Node) -> Node {
        Node::TaskItem {
            attrs: TaskItemAttrs::new(true),
            content: vec![paragraph],
        }
    }

    /// Empty document in normal form: one empty paragraph.
    pub fn empty_doc() -> Node {
        doc(vec![empty_paragraph()])
    }
}

#[cfg(test)]
mod tests {
    use super::builders::{doc, empty_paragraph, paragraph, task_item, task_list};
    use super::{split_at_char, Node};

    #[test]
    fn empty_text_paragraph_equals_empty_paragraph() {
        assert_eq!(paragraph(""), empty_paragraph());
    }

    #[test]
    fn text_content_concatenates_without_separators() {
        let document = doc(vec![
            paragraph("Hello"),
            task_list(vec![task_item(paragraph(" world"))]),
        ]);
        assert_eq!(document.text_content(), "Hello world");
    }

    #[test]
    fn node_at_follows_child_indices() {
        let document = doc(vec![
            paragraph("a"),
            task_list(vec![task_item(paragraph("b"))]),
        ]);
        let target = document.node_at(&[1, 0, 0]).expect("path should resolve");
        assert_eq!(target, &paragraph("b"));
        assert!(document.node_at(&[1, 1]).is_none());
        assert!(document.node_at(&[0, 0, 0]).is_none());
    }

    #[test]
    fn normalize_merges_runs_and_drops_empty_ones() {
        let mut node = Node::Paragraph {
            content: vec![
                Node::Text {
                    text: "ab".to_string(),
                },
                Node::Text {
                    text: String::new(),
                },
                Node::Text {
                    text: "c".to_string(),
                },
            ],
        };
        node.normalize();
        assert_eq!(node, paragraph("abc"));
    }

    #[test]
    fn split_at_char_counts_scalar_values() {
        assert_eq!(
            split_at_char("héllo", 2),
            ("hé".to_string(), "llo".to_string())
        );
        assert_eq!(split_at_char("ab", 9), ("ab".to_string(), String::new()));
    }
}
