//! Core of the task-list rich-text editor.
//! This crate is the single source of truth for document invariants.

pub mod codec;
pub mod commands;
pub mod config;
pub mod editor;
pub mod input_rule;
pub mod keymap;
pub mod logging;
pub mod model;
pub mod state;

pub use codec::{from_json, parse_html, to_html, to_json, HtmlParseError, JsonError};
pub use commands::{chain_commands, Command, CommandOutcome, Dispatched};
pub use config::{ConfigError, EditorConfig};
pub use editor::{ChangeOrigin, DocumentChange, Editor, EditorId, SubscriptionId};
pub use input_rule::{task_list_rule, InputRule, InputRules, RuleMatch};
pub use keymap::{Key, Keymap};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::node::{builders, Node, TaskItemAttrs};
pub use model::schema::{check_document, NodeType, SchemaError};
pub use model::selection::{Position, Selection, SelectionError};
pub use state::{EditorState, Step, Transaction, TransactionError};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
