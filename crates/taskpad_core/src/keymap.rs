//! Key bindings as explicit ordered handler lists.
//!
//! # Responsibility
//! - Map host key names to ordered command chains.
//! - Dispatch a key press through its chain.
//!
//! # Invariants
//! - Handlers run in binding order; the first accepted one wins.
//! - Unbound keys are never handled.

use std::collections::HashMap;

use crate::commands::{
    chain_commands, Command, Dispatched, DELETE_SELECTION, SPLIT_BLOCK, SPLIT_TASK_ITEM,
};
use crate::state::EditorState;

/// Platform-independent key identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Backspace,
    /// Any key the core has no dedicated variant for, by host name.
    Other(String),
}

impl Key {
    /// Parses a host key name (`"Enter"`, `"enter"`, `"Return"`, `"Backspace"`).
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "enter" | "return" => Self::Enter,
            "backspace" => Self::Backspace,
            _ => Self::Other(name.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Enter => "Enter",
            Self::Backspace => "Backspace",
            Self::Other(name) => name.as_str(),
        }
    }
}

/// Key → ordered handler list.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<Key, Vec<Command>>,
}

impl Keymap {
    /// Empty keymap: nothing is handled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default bindings: `Enter → [split_task_item, split_block]` and
    /// `Backspace → [delete_selection]`.
    ///
    /// Backspace on a collapsed cursor is left to the host.
    pub fn base() -> Self {
        let mut keymap = Self::new();
        keymap
            .bind(Key::Enter, vec![SPLIT_TASK_ITEM, SPLIT_BLOCK])
            .bind(Key::Backspace, vec![DELETE_SELECTION]);
        keymap
    }

    /// Replaces the handler list bound to `key`.
    pub fn bind(&mut self, key: Key, commands: Vec<Command>) -> &mut Self {
        self.bindings.insert(key, commands);
        self
    }

    pub fn handlers(&self, key: &Key) -> &[Command] {
        self.bindings.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dispatches `key` against `state`.
    pub fn handle(&self, key: &Key, state: &EditorState) -> Option<Dispatched> {
        chain_commands(self.handlers(key), state)
    }
}
