//! Live editor instance: bootstrap, input entry points and change fan-out.
//!
//! # Responsibility
//! - Build the initial state from host content, falling back to an empty
//!   document when content is absent or unusable.
//! - Route key presses through the keymap and typed text through input rules.
//! - Notify subscribers after every committed document change.
//!
//! # Invariants
//! - All edits go through `&mut self`; one transaction commits or is rejected
//!   before the next call is accepted.
//! - `version` increases by exactly one per committed document change.
//! - Rejected edits leave state and version untouched.
//! - Document text is never written to logs.

use log::{debug, info, warn};
use uuid::Uuid;

use crate::codec::html::{parse_html, to_html};
use crate::codec::json::{to_json, JsonError};
use crate::commands::{insert_text, toggle_task_done, CommandOutcome};
use crate::config::EditorConfig;
use crate::input_rule::{task_list_rule, InputRules};
use crate::keymap::{Key, Keymap};
use crate::model::node::builders::empty_doc;
use crate::model::node::Node;
use crate::model::selection::{Selection, SelectionError};
use crate::state::{EditorState, Transaction, TransactionError};

/// Stable identifier of one mounted editor.
pub type EditorId = Uuid;

/// Handle returned by `Editor::subscribe`.
pub type SubscriptionId = u64;

/// What produced a committed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A key binding handler, by command name.
    Key(&'static str),
    /// An input rule, by rule name.
    InputRule(&'static str),
    /// Plain text insertion.
    Text,
    /// Task checkbox toggle.
    ToggleTask,
    /// Caller-built transaction.
    Dispatch,
    /// Whole-document replacement.
    Replace,
}

/// Notification sent to subscribers after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub editor_id: EditorId,
    pub version: u64,
    pub origin: ChangeOrigin,
}

type Listener = Box<dyn FnMut(&DocumentChange) + Send>;

/// One editing session.
pub struct Editor {
    id: EditorId,
    config: EditorConfig,
    state: EditorState,
    keymap: Keymap,
    input_rules: InputRules,
    version: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl Editor {
    /// Mounts an editor with default configuration.
    ///
    /// `initial_content` is HTML. Absent, blank, oversized or unparsable
    /// content yields a single empty paragraph.
    pub fn mount(initial_content: Option<&str>) -> Self {
        Self::with_config(initial_content, EditorConfig::default())
    }

    /// Mounts an editor with explicit configuration.
    ///
    /// An invalid config is replaced by the default one.
    pub fn with_config(initial_content: Option<&str>, config: EditorConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                warn!("event=editor_mount module=editor status=config_fallback error={err}");
                EditorConfig::default()
            }
        };
        let id = Uuid::new_v4();
        let doc = initial_document(initial_content, &config);
        let state = EditorState::with_cursor_at_start(doc).unwrap_or_else(|err| {
            warn!("event=editor_mount module=editor status=state_fallback error={err}");
            EditorState::empty()
        });
        let input_rules = if config.input_rules_enabled {
            InputRules::new(vec![task_list_rule()], config.input_rule_lookbehind)
        } else {
            InputRules::new(Vec::new(), config.input_rule_lookbehind)
        };

        info!(
            "event=editor_mount module=editor status=ok editor_id={} blocks={} input_rules={}",
            id,
            state.doc().child_count(),
            config.input_rules_enabled
        );
        Self {
            id,
            config,
            state,
            keymap: Keymap::base(),
            input_rules,
            version: 0,
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn id(&self) -> EditorId {
        self.id
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn doc(&self) -> &Node {
        self.state.doc()
    }

    pub fn selection(&self) -> &Selection {
        self.state.selection()
    }

    /// Number of committed document changes since mount.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Plain text of the whole document, without block separators.
    pub fn text_content(&self) -> String {
        self.state.doc().text_content()
    }

    pub fn to_html(&self) -> String {
        to_html(self.state.doc())
    }

    pub fn to_json(&self) -> Result<String, JsonError> {
        to_json(self.state.doc())
    }

    /// Replaces key bindings, e.g. to add host-specific handlers.
    pub fn set_keymap(&mut self, keymap: Keymap) {
        self.keymap = keymap;
    }

    /// Handles a key press. Returns whether any handler accepted it.
    pub fn press_key(&mut self, key: &Key) -> bool {
        match self.keymap.handle(key, &self.state) {
            Some(dispatched) => {
                debug!(
                    "event=key_press module=editor status=handled editor_id={} key={} command={}",
                    self.id,
                    key.name(),
                    dispatched.command
                );
                self.commit(
                    dispatched.state,
                    dispatched.doc_changed,
                    ChangeOrigin::Key(dispatched.command),
                );
                true
            }
            None => {
                debug!(
                    "event=key_press module=editor status=unhandled editor_id={} key={}",
                    self.id,
                    key.name()
                );
                false
            }
        }
    }

    /// Handles typed text: input rules first, plain insertion otherwise.
    ///
    /// Returns `false` for empty text or when the selection spans
    /// several textblocks.
    pub fn insert_text(&mut self, text: &str) -> bool {
        if let Some(applied) = self.input_rules.run(&self.state, text) {
            self.commit(applied.state, true, ChangeOrigin::InputRule(applied.rule));
            return true;
        }
        let CommandOutcome::Handled(tr) = insert_text(&self.state, text) else {
            return false;
        };
        match self.state.apply(tr) {
            Ok(next) => {
                self.commit(next, true, ChangeOrigin::Text);
                true
            }
            Err(err) => {
                debug!(
                    "event=insert_text module=editor status=rejected editor_id={} error={}",
                    self.id, err
                );
                false
            }
        }
    }

    /// Flips `done` on the task item holding the textblock at `path`.
    pub fn toggle_task_done(&mut self, path: &[usize]) -> bool {
        let CommandOutcome::Handled(tr) = toggle_task_done(&self.state, path) else {
            return false;
        };
        match self.state.apply(tr) {
            Ok(next) => {
                self.commit(next, true, ChangeOrigin::ToggleTask);
                true
            }
            Err(_) => false,
        }
    }

    /// Moves the selection without changing the document.
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), SelectionError> {
        self.state = self.state.with_selection(selection)?;
        Ok(())
    }

    /// Commits a caller-built transaction.
    ///
    /// # Errors
    /// - Schema or selection errors; state is left unchanged.
    pub fn dispatch(&mut self, tr: Transaction) -> Result<(), TransactionError> {
        let doc_changed = tr.doc_changed();
        let next = self.state.apply(tr)?;
        self.commit(next, doc_changed, ChangeOrigin::Dispatch);
        Ok(())
    }

    /// Replaces the whole document and puts the cursor at its end.
    pub fn replace_document(&mut self, doc: Node) -> Result<(), TransactionError> {
        let next = EditorState::with_cursor_at_end(doc)?;
        self.commit(next, true, ChangeOrigin::Replace);
        Ok(())
    }

    /// Registers a change listener.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&DocumentChange) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, next: EditorState, doc_changed: bool, origin: ChangeOrigin) {
        let changed = doc_changed && next.doc() != self.state.doc();
        self.state = next;
        if !changed {
            return;
        }
        self.version += 1;
        let change = DocumentChange {
            editor_id: self.id,
            version: self.version,
            origin,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

fn initial_document(initial_content: Option<&str>, config: &EditorConfig) -> Node {
    let Some(content) = initial_content.filter(|value| !value.trim().is_empty()) else {
        return empty_doc();
    };
    if content.len() > config.max_initial_content_bytes {
        warn!(
            "event=editor_mount module=editor status=content_fallback reason=too_large bytes={} limit={}",
            content.len(),
            config.max_initial_content_bytes
        );
        return empty_doc();
    }
    match parse_html(content) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(
                "event=editor_mount module=editor status=content_fallback reason=parse_error error={err}"
            );
            empty_doc()
        }
    }
}
