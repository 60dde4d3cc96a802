//! Enter-key commands.
//!
//! # Responsibility
//! - Decide what Enter does inside and around task lists.
//! - Provide the plain paragraph split used as fallback.
//!
//! # Invariants
//! - Outcomes are evaluated in fixed order: outside a task item (pass),
//!   non-empty item (split), empty item with siblings (exit list),
//!   sole empty item (dissolve list).
//! - A task list is never left without items.
//! - A selection inside one textblock is deleted first; a selection
//!   spanning textblocks makes every Enter handler pass.

use crate::commands::CommandOutcome;
use crate::model::node::builders::{empty_paragraph, task_item};
use crate::model::node::{split_at_char, Node, TaskItemAttrs};
use crate::model::selection::{Position, Selection};
use crate::state::{EditorState, Transaction};

/// Location of the task item that holds a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TaskItemContext {
    attrs: TaskItemAttrs,
    list_path: Vec<usize>,
    item_index: usize,
    list_len: usize,
}

fn task_item_context(doc: &Node, paragraph_path: &[usize]) -> Option<TaskItemContext> {
    let (_, item_path) = paragraph_path.split_last()?;
    let attrs = doc.node_at(item_path)?.task_attrs()?;
    let (&item_index, list_path) = item_path.split_last()?;
    let list = doc.node_at(list_path)?;
    if !matches!(list, Node::TaskList { .. }) {
        return None;
    }
    Some(TaskItemContext {
        attrs,
        list_path: list_path.to_vec(),
        item_index,
        list_len: list.child_count(),
    })
}

/// Starts a transaction with the selection collapsed, or `None` when the
/// selection cannot be collapsed safely.
fn collapsed_transaction(state: &EditorState) -> Option<(Transaction, Position)> {
    let mut tr = state.transaction();
    tr.delete_selection().ok()?;
    let cursor = tr.selection().head.clone();
    Some((tr, cursor))
}

/// Enter inside a task item.
///
/// - Non-empty paragraph: the item keeps the text before the cursor and a new
///   `done = false` item with the rest is inserted right after it.
/// - Empty paragraph, other items exist: the item is removed and an empty
///   paragraph is inserted right after the list.
/// - Empty paragraph, sole item: the list is replaced by an empty paragraph.
///
/// Passes when the cursor is not inside a task item.
pub fn split_task_item(state: &EditorState) -> CommandOutcome {
    let Some((mut tr, cursor)) = collapsed_transaction(state) else {
        return CommandOutcome::Pass;
    };
    let Some(context) = task_item_context(tr.doc(), &cursor.path) else {
        return CommandOutcome::Pass;
    };
    let Some(paragraph) = tr.doc().node_at(&cursor.path) else {
        return CommandOutcome::Pass;
    };

    let result = if paragraph.is_empty_textblock() {
        if context.list_len > 1 {
            exit_task_list(&mut tr, &context)
        } else {
            dissolve_task_list(&mut tr, &context)
        }
    } else {
        let text = paragraph.text_content();
        split_item_at(&mut tr, &context, &text, cursor.offset)
    };

    match result {
        Some(()) => CommandOutcome::Handled(tr),
        None => CommandOutcome::Pass,
    }
}

fn split_item_at(
    tr: &mut Transaction,
    context: &TaskItemContext,
    text: &str,
    offset: usize,
) -> Option<()> {
    let (before, after) = split_at_char(text, offset);
    let kept = Node::TaskItem {
        attrs: context.attrs,
        content: vec![Node::paragraph_from_text(before)],
    };
    let created = task_item(Node::paragraph_from_text(after));
    let index = context.item_index;
    tr.replace_children(&context.list_path, index..index + 1, vec![kept, created])
        .ok()?;

    let mut path = context.list_path.clone();
    path.extend([index + 1, 0]);
    tr.set_selection(Selection::cursor(Position::new(path, 0)));
    Some(())
}

fn exit_task_list(tr: &mut Transaction, context: &TaskItemContext) -> Option<()> {
    let (&list_index, parent_path) = context.list_path.split_last()?;
    let index = context.item_index;
    tr.replace_children(&context.list_path, index..index + 1, Vec::new())
        .ok()?;
    tr.replace_children(
        parent_path,
        list_index + 1..list_index + 1,
        vec![empty_paragraph()],
    )
    .ok()?;

    let mut path = parent_path.to_vec();
    path.push(list_index + 1);
    tr.set_selection(Selection::cursor(Position::new(path, 0)));
    Some(())
}

fn dissolve_task_list(tr: &mut Transaction, context: &TaskItemContext) -> Option<()> {
    let (&list_index, parent_path) = context.list_path.split_last()?;
    tr.replace_children(
        parent_path,
        list_index..list_index + 1,
        vec![empty_paragraph()],
    )
    .ok()?;

    let mut path = parent_path.to_vec();
    path.push(list_index);
    tr.set_selection(Selection::cursor(Position::new(path, 0)));
    Some(())
}

/// Splits the cursor's paragraph in two within the same parent.
///
/// Inside a task item the result is schema-illegal, so the commit is
/// rejected and the chain moves on.
pub fn split_block(state: &EditorState) -> CommandOutcome {
    let Some((mut tr, cursor)) = collapsed_transaction(state) else {
        return CommandOutcome::Pass;
    };
    let Some((&index, parent_path)) = cursor.path.split_last() else {
        return CommandOutcome::Pass;
    };
    let Some(paragraph) = tr.doc().node_at(&cursor.path) else {
        return CommandOutcome::Pass;
    };
    let (before, after) = split_at_char(&paragraph.text_content(), cursor.offset);
    let parts = vec![
        Node::paragraph_from_text(before),
        Node::paragraph_from_text(after),
    ];
    if tr.replace_children(parent_path, index..index + 1, parts).is_err() {
        return CommandOutcome::Pass;
    }

    let mut path = parent_path.to_vec();
    path.push(index + 1);
    tr.set_selection(Selection::cursor(Position::new(path, 0)));
    CommandOutcome::Handled(tr)
}
