//! Editing commands and the handler chain that dispatches them.
//!
//! # Responsibility
//! - Express each edit as a pure function from state to a tagged outcome.
//! - Try handlers in order until one produces a committable transaction.
//!
//! # Invariants
//! - Commands never mutate state directly; they return transactions.
//! - A handled transaction that fails to commit counts as a pass, so the
//!   next handler in the chain gets its turn.

use log::debug;

use crate::state::{EditorState, Transaction};

pub mod enter;
pub mod text;

pub use enter::{split_block, split_task_item};
pub use text::{delete_selection, insert_text, toggle_task_done};

/// Tagged result of running one command against a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Command applies and produced this transaction.
    Handled(Transaction),
    /// Command does not apply here; try the next one.
    Pass,
}

/// Named handler usable in key bindings.
#[derive(Clone, Copy)]
pub struct Command {
    name: &'static str,
    handler: fn(&EditorState) -> CommandOutcome,
}

impl Command {
    pub const fn new(name: &'static str, handler: fn(&EditorState) -> CommandOutcome) -> Self {
        Self { name, handler }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn run(&self, state: &EditorState) -> CommandOutcome {
        (self.handler)(state)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command").field("name", &self.name).finish()
    }
}

/// Enter inside task items: split, exit or dissolve the list.
pub const SPLIT_TASK_ITEM: Command = Command::new("split_task_item", split_task_item);
/// Plain paragraph split, the fallback for Enter.
pub const SPLIT_BLOCK: Command = Command::new("split_block", split_block);
/// Removes selected text inside one textblock; passes on a collapsed cursor.
pub const DELETE_SELECTION: Command = Command::new("delete_selection", delete_selection);

/// State produced by the first handler that accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// Name of the accepting command.
    pub command: &'static str,
    /// Committed next state.
    pub state: EditorState,
    /// Whether the document (not only the selection) changed.
    pub doc_changed: bool,
}

/// Runs `commands` in order and commits the first accepted transaction.
///
/// Returns `None` when every handler passed or was rejected.
pub fn chain_commands(commands: &[Command], state: &EditorState) -> Option<Dispatched> {
    for command in commands {
        let tr = match command.run(state) {
            CommandOutcome::Handled(tr) => tr,
            CommandOutcome::Pass => {
                debug!(
                    "event=command module=commands status=pass command={}",
                    command.name()
                );
                continue;
            }
        };
        let doc_changed = tr.doc_changed();
        match state.apply(tr) {
            Ok(next) => {
                debug!(
                    "event=command module=commands status=handled command={} doc_changed={}",
                    command.name(),
                    doc_changed
                );
                return Some(Dispatched {
                    command: command.name(),
                    state: next,
                    doc_changed,
                });
            }
            Err(err) => {
                debug!(
                    "event=command module=commands status=rejected command={} error={}",
                    command.name(),
                    err
                );
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{chain_commands, Command, CommandOutcome, SPLIT_BLOCK, SPLIT_TASK_ITEM};
    use crate::model::node::builders::{doc, paragraph};
    use crate::state::EditorState;

    fn always_pass(_: &EditorState) -> CommandOutcome {
        CommandOutcome::Pass
    }

    fn empties_document(state: &EditorState) -> CommandOutcome {
        let mut tr = state.transaction();
        let len = state.doc().child_count();
        match tr.replace_children(&[], 0..len, Vec::new()) {
            Ok(_) => CommandOutcome::Handled(tr),
            Err(_) => CommandOutcome::Pass,
        }
    }

    #[test]
    fn chain_returns_none_when_everyone_passes() {
        let state = EditorState::empty();
        let chain = [Command::new("noop", always_pass)];
        assert!(chain_commands(&chain, &state).is_none());
    }

    #[test]
    fn rejected_transaction_falls_through_to_next_handler() {
        let state =
            EditorState::with_cursor_at_end(doc(vec![paragraph("ab")])).expect("valid state");
        let chain = [Command::new("empties_document", empties_document), SPLIT_BLOCK];
        let dispatched = chain_commands(&chain, &state).expect("split_block should accept");
        assert_eq!(dispatched.command, "split_block");
        assert!(dispatched.doc_changed);
    }

    #[test]
    fn task_command_passes_outside_task_items() {
        let state =
            EditorState::with_cursor_at_end(doc(vec![paragraph("ab")])).expect("valid state");
        assert_eq!(SPLIT_TASK_ITEM.run(&state), CommandOutcome::Pass);
    }
}
