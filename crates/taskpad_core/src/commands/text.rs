//! Text and attribute commands.

use crate::commands::CommandOutcome;
use crate::model::selection::{Position, Selection};
use crate::state::EditorState;

/// Replaces the selection with `text` and places the cursor after it.
///
/// Passes for empty input or a selection spanning several textblocks.
pub fn insert_text(state: &EditorState, text: &str) -> CommandOutcome {
    if text.is_empty() {
        return CommandOutcome::Pass;
    }
    let mut tr = state.transaction();
    if tr.delete_selection().is_err() {
        return CommandOutcome::Pass;
    }
    let cursor = tr.selection().head.clone();
    if tr
        .replace_text(&cursor.path, cursor.offset..cursor.offset, text)
        .is_err()
    {
        return CommandOutcome::Pass;
    }
    let offset = cursor.offset + text.chars().count();
    tr.set_selection(Selection::cursor(Position::new(cursor.path, offset)));
    CommandOutcome::Handled(tr)
}

/// Deletes selected text inside one textblock.
pub fn delete_selection(state: &EditorState) -> CommandOutcome {
    if state.selection().is_collapsed() {
        return CommandOutcome::Pass;
    }
    let mut tr = state.transaction();
    match tr.delete_selection() {
        Ok(_) => CommandOutcome::Handled(tr),
        Err(_) => CommandOutcome::Pass,
    }
}

/// Flips `done` on the task item that contains the textblock at `path`.
///
/// `path` may also point at the task item itself. Passes anywhere else.
pub fn toggle_task_done(state: &EditorState, path: &[usize]) -> CommandOutcome {
    let doc = state.doc();
    let item_path = match doc.node_at(path) {
        Some(node) if node.task_attrs().is_some() => path,
        Some(node) if node.is_textblock() => match path.split_last() {
            Some((_, parent)) => parent,
            None => return CommandOutcome::Pass,
        },
        _ => return CommandOutcome::Pass,
    };
    let Some(attrs) = doc.node_at(item_path).and_then(|node| node.task_attrs()) else {
        return CommandOutcome::Pass;
    };

    let mut tr = state.transaction();
    match tr.set_task_done(item_path, !attrs.done) {
        Ok(_) => CommandOutcome::Handled(tr),
        Err(_) => CommandOutcome::Pass,
    }
}
