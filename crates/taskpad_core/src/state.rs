//! Editor state and atomic transactions.
//!
//! # Responsibility
//! - Hold the current document plus selection as one immutable value.
//! - Build edits as ordered steps on a working copy and commit them atomically.
//!
//! # Invariants
//! - A committed state always passes the schema check and has a selection
//!   that resolves into a textblock.
//! - A rejected transaction leaves the originating state untouched.

use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;

use crate::model::node::builders::empty_doc;
use crate::model::node::{split_at_char, Node};
use crate::model::schema::{check_document, display_path, SchemaError};
use crate::model::selection::{Position, Selection, SelectionError};

/// Errors from building or committing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Path does not resolve to a node.
    InvalidPath(Vec<usize>),
    /// Path resolves to a text leaf, which has no children.
    NotAContainer(Vec<usize>),
    /// Path resolves to something other than a paragraph.
    NotATextblock(Vec<usize>),
    /// Path resolves to something other than a task item.
    NotATaskItem(Vec<usize>),
    /// Replacement range does not fit the target.
    RangeOutOfBounds {
        path: Vec<usize>,
        from: usize,
        to: usize,
        len: usize,
    },
    /// Selection crosses textblock boundaries where only one is supported.
    SelectionSpansBlocks,
    /// Selection does not fit the resulting document.
    Selection(SelectionError),
    /// Resulting document violates the schema.
    Schema(SchemaError),
}

impl Display for TransactionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "no node at {}", display_path(path)),
            Self::NotAContainer(path) => {
                write!(f, "node at {} cannot hold children", display_path(path))
            }
            Self::NotATextblock(path) => {
                write!(f, "node at {} is not a paragraph", display_path(path))
            }
            Self::NotATaskItem(path) => {
                write!(f, "node at {} is not a task item", display_path(path))
            }
            Self::RangeOutOfBounds {
                path,
                from,
                to,
                len,
            } => write!(
                f,
                "range {from}..{to} out of bounds at {} (len {len})",
                display_path(path)
            ),
            Self::SelectionSpansBlocks => {
                write!(f, "selection spans more than one textblock")
            }
            Self::Selection(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransactionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Selection(err) => Some(err),
            Self::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for TransactionError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<SelectionError> for TransactionError {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

/// One contiguous edit recorded by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Replace children `from..to` of the node at `parent`.
    ReplaceChildren {
        parent: Vec<usize>,
        from: usize,
        to: usize,
        nodes: Vec<Node>,
    },
    /// Replace characters `from..to` of the paragraph at `path`.
    ReplaceText {
        path: Vec<usize>,
        from: usize,
        to: usize,
        text: String,
    },
    /// Set the `done` attribute of the task item at `path`.
    SetTaskDone { path: Vec<usize>, done: bool },
}

/// Immutable document + selection pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    doc: Node,
    selection: Selection,
}

impl EditorState {
    /// Creates a validated state.
    ///
    /// # Errors
    /// - Returns schema or selection errors when the pair is not committable.
    pub fn new(doc: Node, selection: Selection) -> Result<Self, TransactionError> {
        check_document(&doc)?;
        selection.validate(&doc)?;
        Ok(Self { doc, selection })
    }

    /// Creates a state with the cursor at the document start.
    pub fn with_cursor_at_start(doc: Node) -> Result<Self, TransactionError> {
        let selection =
            Selection::at_start(&doc).ok_or(TransactionError::NotATextblock(Vec::new()))?;
        Self::new(doc, selection)
    }

    /// Creates a state with the cursor at the document end.
    pub fn with_cursor_at_end(doc: Node) -> Result<Self, TransactionError> {
        let selection =
            Selection::at_end(&doc).ok_or(TransactionError::NotATextblock(Vec::new()))?;
        Self::new(doc, selection)
    }

    /// State of an empty document: one empty paragraph with the cursor in it.
    pub fn empty() -> Self {
        let doc = empty_doc();
        let selection = Selection::cursor(Position::new(vec![0], 0));
        Self { doc, selection }
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Same document with another selection.
    pub fn with_selection(&self, selection: Selection) -> Result<EditorState, SelectionError> {
        selection.validate(&self.doc)?;
        Ok(EditorState {
            doc: self.doc.clone(),
            selection,
        })
    }

    /// Starts a transaction over a working copy of this state.
    pub fn transaction(&self) -> Transaction {
        Transaction {
            doc: self.doc.clone(),
            selection: self.selection.clone(),
            steps: Vec::new(),
        }
    }

    /// Commits `tr`, producing the next state.
    ///
    /// # Errors
    /// - `Schema` when the resulting document is structurally illegal.
    /// - `Selection` when the resulting selection does not resolve.
    pub fn apply(&self, tr: Transaction) -> Result<EditorState, TransactionError> {
        if let Err(err) = check_document(&tr.doc) {
            debug!(
                "event=transaction_commit module=state status=rejected steps={} reason=schema",
                tr.steps.len()
            );
            return Err(err.into());
        }
        if let Err(err) = tr.selection.validate(&tr.doc) {
            debug!(
                "event=transaction_commit module=state status=rejected steps={} reason=selection",
                tr.steps.len()
            );
            return Err(err.into());
        }
        Ok(EditorState {
            doc: tr.doc,
            selection: tr.selection,
        })
    }
}

/// Ordered list of steps applied to a working copy of one state.
///
/// Each step either applies completely or fails without touching the
/// working copy. Nothing reaches the editor until `EditorState::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    doc: Node,
    selection: Selection,
    steps: Vec<Step>,
}

impl Transaction {
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns whether any step changed the document.
    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection;
        self
    }

    /// Replaces children `range` of the node at `parent` with `nodes`.
    pub fn replace_children(
        &mut self,
        parent: &[usize],
        range: Range<usize>,
        nodes: Vec<Node>,
    ) -> Result<&mut Self, TransactionError> {
        let target = self
            .doc
            .node_at_mut(parent)
            .ok_or_else(|| TransactionError::InvalidPath(parent.to_vec()))?;
        let content = target
            .content_mut()
            .ok_or_else(|| TransactionError::NotAContainer(parent.to_vec()))?;
        if range.start > range.end || range.end > content.len() {
            return Err(TransactionError::RangeOutOfBounds {
                path: parent.to_vec(),
                from: range.start,
                to: range.end,
                len: content.len(),
            });
        }
        content.splice(range.clone(), nodes.iter().cloned());
        self.steps.push(Step::ReplaceChildren {
            parent: parent.to_vec(),
            from: range.start,
            to: range.end,
            nodes,
        });
        Ok(self)
    }

    /// Replaces characters `range` of the paragraph at `path` with `text`.
    pub fn replace_text(
        &mut self,
        path: &[usize],
        range: Range<usize>,
        text: &str,
    ) -> Result<&mut Self, TransactionError> {
        let paragraph = self
            .doc
            .node_at_mut(path)
            .ok_or_else(|| TransactionError::InvalidPath(path.to_vec()))?;
        if !paragraph.is_textblock() {
            return Err(TransactionError::NotATextblock(path.to_vec()));
        }
        let current = paragraph.text_content();
        let len = current.chars().count();
        if range.start > range.end || range.end > len {
            return Err(TransactionError::RangeOutOfBounds {
                path: path.to_vec(),
                from: range.start,
                to: range.end,
                len,
            });
        }
        let (head, rest) = split_at_char(&current, range.start);
        let (_, tail) = split_at_char(&rest, range.end - range.start);
        *paragraph = Node::paragraph_from_text(format!("{head}{text}{tail}"));
        self.steps.push(Step::ReplaceText {
            path: path.to_vec(),
            from: range.start,
            to: range.end,
            text: text.to_string(),
        });
        Ok(self)
    }

    /// Sets `done` on the task item at `path`.
    pub fn set_task_done(
        &mut self,
        path: &[usize],
        done: bool,
    ) -> Result<&mut Self, TransactionError> {
        match self.doc.node_at_mut(path) {
            Some(Node::TaskItem { attrs, .. }) => attrs.done = done,
            Some(_) => return Err(TransactionError::NotATaskItem(path.to_vec())),
            None => return Err(TransactionError::InvalidPath(path.to_vec())),
        }
        self.steps.push(Step::SetTaskDone {
            path: path.to_vec(),
            done,
        });
        Ok(self)
    }

    /// Deletes the selected text and collapses the selection to its start.
    ///
    /// A collapsed selection is left as is.
    ///
    /// # Errors
    /// - `SelectionSpansBlocks` when anchor and head sit in different textblocks.
    pub fn delete_selection(&mut self) -> Result<&mut Self, TransactionError> {
        if self.selection.is_collapsed() {
            return Ok(self);
        }
        if !self.selection.within_single_textblock() {
            return Err(TransactionError::SelectionSpansBlocks);
        }
        let start = self.selection.start().clone();
        let end_offset = self.selection.end().offset;
        self.replace_text(&start.path, start.offset..end_offset, "")?;
        self.selection = Selection::cursor(start);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorState, Step, TransactionError};
    use crate::model::node::builders::{doc, empty_paragraph, paragraph, task_item, task_list};
    use crate::model::selection::{Position, Selection};

    #[test]
    fn rejected_transaction_keeps_state() {
        let state = EditorState::with_cursor_at_end(doc(vec![task_list(vec![task_item(
            paragraph("a"),
        )])]))
        .expect("valid state");
        let mut tr = state.transaction();
        tr.replace_children(&[0], 0..1, Vec::new())
            .expect("range is in bounds");

        let err = state.apply(tr).expect_err("empty task list must be rejected");
        assert!(matches!(err, TransactionError::Schema(_)));
        assert_eq!(state.doc().child_count(), 1);
    }

    #[test]
    fn replace_text_records_step_and_rewrites_paragraph() {
        let state = EditorState::with_cursor_at_end(doc(vec![paragraph("Hello world")]))
            .expect("valid state");
        let mut tr = state.transaction();
        tr.replace_text(&[0], 5..11, "!").expect("range is in bounds");
        assert_eq!(tr.doc(), &doc(vec![paragraph("Hello!")]));
        assert_eq!(
            tr.steps(),
            &[Step::ReplaceText {
                path: vec![0],
                from: 5,
                to: 11,
                text: "!".to_string(),
            }]
        );
    }

    #[test]
    fn out_of_bounds_step_leaves_working_copy_untouched() {
        let state = EditorState::empty();
        let mut tr = state.transaction();
        let err = tr
            .replace_children(&[], 0..3, vec![empty_paragraph()])
            .expect_err("range exceeds children");
        assert!(matches!(err, TransactionError::RangeOutOfBounds { len: 1, .. }));
        assert!(!tr.doc_changed());
        assert_eq!(tr.doc(), state.doc());
    }

    #[test]
    fn delete_selection_within_one_block_collapses_to_start() {
        let state = EditorState::new(
            doc(vec![paragraph("abcdef")]),
            Selection::range(Position::new(vec![0], 4), Position::new(vec![0], 1)),
        )
        .expect("valid state");
        let mut tr = state.transaction();
        tr.delete_selection().expect("single block selection");
        assert_eq!(tr.doc(), &doc(vec![paragraph("aef")]));
        assert_eq!(tr.selection(), &Selection::cursor(Position::new(vec![0], 1)));
    }

    #[test]
    fn delete_selection_across_blocks_is_refused() {
        let state = EditorState::new(
            doc(vec![paragraph("ab"), paragraph("cd")]),
            Selection::range(Position::new(vec![0], 1), Position::new(vec![1], 1)),
        )
        .expect("valid state");
        let mut tr = state.transaction();
        assert_eq!(
            tr.delete_selection().map(|_| ()),
            Err(TransactionError::SelectionSpansBlocks)
        );
    }

    #[test]
    fn set_task_done_requires_task_item() {
        let state = EditorState::with_cursor_at_end(doc(vec![task_list(vec![task_item(
            paragraph("x"),
        )])]))
        .expect("valid state");
        let mut tr = state.transaction();
        assert!(matches!(
            tr.set_task_done(&[0], true),
            Err(TransactionError::NotATaskItem(_))
        ));
        tr.set_task_done(&[0, 0], true).expect("task item path");
        let attrs = tr
            .doc()
            .node_at(&[0, 0])
            .and_then(|node| node.task_attrs())
            .expect("task item attrs");
        assert!(attrs.done);
    }
}
