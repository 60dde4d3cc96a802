//! Cursor and selection addressing.
//!
//! # Responsibility
//! - Address text positions as (textblock path, character offset).
//! - Resolve and validate positions against a document.
//!
//! # Invariants
//! - A valid position always points into a paragraph, with
//!   `offset <= paragraph.char_len()`.
//! - Positions order by document order: path lexicographically, then offset.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::node::Node;
use crate::model::schema::display_path;

/// Text position inside one textblock.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Child indices from the doc root down to a paragraph.
    pub path: Vec<usize>,
    /// Character offset inside the paragraph text.
    pub offset: usize,
}

impl Position {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Resolves the paragraph this position points into.
    ///
    /// # Errors
    /// - `NotATextblock` when the path does not reach a paragraph.
    /// - `OffsetOutOfRange` when the offset exceeds the paragraph length.
    pub fn resolve<'doc>(&self, doc: &'doc Node) -> Result<&'doc Node, SelectionError> {
        let node = doc
            .node_at(&self.path)
            .filter(|node| node.is_textblock())
            .ok_or_else(|| SelectionError::NotATextblock(self.path.clone()))?;
        let len = node.char_len();
        if self.offset > len {
            return Err(SelectionError::OffsetOutOfRange {
                path: self.path.clone(),
                offset: self.offset,
                len,
            });
        }
        Ok(node)
    }
}

/// Anchor/head selection. Collapsed when both ends are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    /// Collapsed selection (plain cursor).
    pub fn cursor(position: Position) -> Self {
        Self {
            anchor: position.clone(),
            head: position,
        }
    }

    pub fn range(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Start of the selection in document order.
    pub fn start(&self) -> &Position {
        std::cmp::min(&self.anchor, &self.head)
    }

    /// End of the selection in document order.
    pub fn end(&self) -> &Position {
        std::cmp::max(&self.anchor, &self.head)
    }

    /// Returns whether both ends sit in the same textblock.
    pub fn within_single_textblock(&self) -> bool {
        self.anchor.path == self.head.path
    }

    /// Cursor at the start of the first textblock.
    pub fn at_start(doc: &Node) -> Option<Self> {
        let path = first_textblock_path(doc)?;
        Some(Self::cursor(Position::new(path, 0)))
    }

    /// Cursor at the end of the last textblock.
    pub fn at_end(doc: &Node) -> Option<Self> {
        let path = last_textblock_path(doc)?;
        let offset = doc.node_at(&path).map(Node::char_len).unwrap_or(0);
        Some(Self::cursor(Position::new(path, offset)))
    }

    /// Validates both ends against `doc`.
    pub fn validate(&self, doc: &Node) -> Result<(), SelectionError> {
        self.anchor.resolve(doc)?;
        self.head.resolve(doc)?;
        Ok(())
    }
}

/// Errors raised when a selection does not fit a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    NotATextblock(Vec<usize>),
    OffsetOutOfRange {
        path: Vec<usize>,
        offset: usize,
        len: usize,
    },
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotATextblock(path) => {
                write!(f, "selection path {} is not a textblock", display_path(path))
            }
            Self::OffsetOutOfRange { path, offset, len } => write!(
                f,
                "offset {offset} out of range for textblock {} of length {len}",
                display_path(path)
            ),
        }
    }
}

impl Error for SelectionError {}

/// Paths of all textblocks in document order.
pub fn textblock_paths(doc: &Node) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    collect_textblocks(doc, &mut path, &mut out);
    out
}

fn collect_textblocks(node: &Node, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    if node.is_textblock() {
        out.push(path.clone());
        return;
    }
    for (index, child) in node.content().iter().enumerate() {
        path.push(index);
        collect_textblocks(child, path, out);
        path.pop();
    }
}

pub fn first_textblock_path(doc: &Node) -> Option<Vec<usize>> {
    textblock_paths(doc).into_iter().next()
}

pub fn last_textblock_path(doc: &Node) -> Option<Vec<usize>> {
    textblock_paths(doc).pop()
}

#[cfg(test)]
mod tests {
    use super::{Position, Selection, SelectionError};
    use crate::model::node::builders::{doc, empty_paragraph, paragraph, task_item, task_list};

    #[test]
    fn at_end_points_past_last_character() {
        let document = doc(vec![
            paragraph("first"),
            task_list(vec![task_item(paragraph("test"))]),
        ]);
        let selection = Selection::at_end(&document).expect("document has textblocks");
        assert_eq!(selection.head, Position::new(vec![1, 0, 0], 4));
        assert!(selection.is_collapsed());
    }

    #[test]
    fn at_start_is_first_textblock() {
        let document = doc(vec![
            task_list(vec![task_item(empty_paragraph())]),
            paragraph("tail"),
        ]);
        let selection = Selection::at_start(&document).expect("document has textblocks");
        assert_eq!(selection.anchor, Position::new(vec![0, 0, 0], 0));
    }

    #[test]
    fn start_and_end_follow_document_order() {
        let selection = Selection::range(Position::new(vec![1], 0), Position::new(vec![0], 3));
        assert_eq!(selection.start(), &Position::new(vec![0], 3));
        assert_eq!(selection.end(), &Position::new(vec![1], 0));
        assert!(!selection.within_single_textblock());
    }

    #[test]
    fn resolve_rejects_container_paths_and_long_offsets() {
        let document = doc(vec![task_list(vec![task_item(paragraph("ab"))])]);
        assert_eq!(
            Position::new(vec![0, 0], 0).resolve(&document),
            Err(SelectionError::NotATextblock(vec![0, 0]))
        );
        assert_eq!(
            Position::new(vec![0, 0, 0], 3).resolve(&document),
            Err(SelectionError::OffsetOutOfRange {
                path: vec![0, 0, 0],
                offset: 3,
                len: 2,
            })
        );
    }

    #[test]
    fn empty_doc_has_no_cursor() {
        assert!(Selection::at_start(&doc(Vec::new())).is_none());
    }
}
