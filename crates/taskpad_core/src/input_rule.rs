//! Pattern-triggered transformations applied while typing.
//!
//! # Responsibility
//! - Match typed text (plus the text right before the cursor) against rule
//!   patterns.
//! - Turn the first match into a structural transaction.
//!
//! # Invariants
//! - A rule that does not match, or whose result is schema-illegal, leaves
//!   the document alone; the caller then inserts the text normally.
//! - Only the cursor's own textblock is inspected and rewritten.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::node::builders::{task_item, task_list};
use crate::model::selection::{Position, Selection};
use crate::state::{EditorState, Transaction, TransactionError};

/// Default number of characters before the cursor fed to rule patterns.
pub const DEFAULT_LOOKBEHIND: usize = 500;

static TASK_LIST_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\]$").expect("valid task list marker regex"));

/// Match handed to a rule handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Paragraph holding the cursor.
    pub path: Vec<usize>,
    /// Character offset where the match starts in the paragraph.
    pub from: usize,
    /// Cursor offset; the already-typed part of the match is `from..to`.
    pub to: usize,
    /// Matched text including the not-yet-inserted input.
    pub matched: String,
}

/// Handler building the replacement for one match.
pub type RuleHandler = fn(&mut Transaction, &RuleMatch) -> Result<(), TransactionError>;

/// One named input rule.
#[derive(Clone)]
pub struct InputRule {
    name: &'static str,
    pattern: Regex,
    handler: RuleHandler,
}

impl std::fmt::Debug for InputRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

impl InputRule {
    /// Creates a rule. `pattern` should be anchored with `$` so it only
    /// fires on text ending at the cursor.
    pub fn new(name: &'static str, pattern: Regex, handler: RuleHandler) -> Self {
        Self {
            name,
            pattern,
            handler,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Typing `[]` turns the cursor's paragraph into a one-item task list.
pub fn task_list_rule() -> InputRule {
    InputRule::new(
        "task_list",
        Regex::clone(&TASK_LIST_MARKER_RE),
        wrap_in_task_list,
    )
}

fn wrap_in_task_list(tr: &mut Transaction, hit: &RuleMatch) -> Result<(), TransactionError> {
    tr.replace_text(&hit.path, hit.from..hit.to, "")?;
    let (&index, parent_path) = hit
        .path
        .split_last()
        .ok_or_else(|| TransactionError::NotATextblock(hit.path.clone()))?;
    let paragraph = tr
        .doc()
        .node_at(&hit.path)
        .cloned()
        .ok_or_else(|| TransactionError::InvalidPath(hit.path.clone()))?;
    tr.replace_children(
        parent_path,
        index..index + 1,
        vec![task_list(vec![task_item(paragraph)])],
    )?;

    let mut path = parent_path.to_vec();
    path.extend([index, 0, 0]);
    tr.set_selection(Selection::cursor(Position::new(path, hit.from)));
    Ok(())
}

/// Ordered rule set consulted on every text insertion.
#[derive(Debug, Clone)]
pub struct InputRules {
    rules: Vec<InputRule>,
    lookbehind: usize,
}

/// Result of a rule that fired and committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleApplied {
    pub rule: &'static str,
    pub state: EditorState,
}

impl Default for InputRules {
    fn default() -> Self {
        Self::new(vec![task_list_rule()], DEFAULT_LOOKBEHIND)
    }
}

impl InputRules {
    pub fn new(rules: Vec<InputRule>, lookbehind: usize) -> Self {
        Self { rules, lookbehind }
    }

    /// Runs rules against `text` typed at the current selection.
    ///
    /// Returns `None` when no rule fires; the caller then inserts `text`
    /// as plain text.
    pub fn run(&self, state: &EditorState, text: &str) -> Option<RuleApplied> {
        if self.rules.is_empty() || text.is_empty() {
            return None;
        }
        let mut base = state.transaction();
        base.delete_selection().ok()?;
        let cursor = base.selection().head.clone();
        let paragraph_text = base.doc().node_at(&cursor.path)?.text_content();

        let window_start = cursor.offset.saturating_sub(self.lookbehind);
        let before = paragraph_text
            .chars()
            .skip(window_start)
            .take(cursor.offset - window_start)
            .collect::<String>();
        let probe = format!("{before}{text}");

        for rule in &self.rules {
            let Some(found) = rule.pattern.find(&probe) else {
                continue;
            };
            let match_chars_before = probe[..found.start()].chars().count();
            let from = window_start + match_chars_before;
            if from > cursor.offset {
                // Match lies entirely inside the typed text; nothing in the
                // document to replace yet.
                continue;
            }
            let hit = RuleMatch {
                path: cursor.path.clone(),
                from,
                to: cursor.offset,
                matched: found.as_str().to_string(),
            };

            let mut tr = base.clone();
            if let Err(err) = (rule.handler)(&mut tr, &hit) {
                debug!(
                    "event=input_rule module=input_rule status=declined rule={} error={}",
                    rule.name(),
                    err
                );
                continue;
            }
            match state.apply(tr) {
                Ok(next) => {
                    debug!(
                        "event=input_rule module=input_rule status=applied rule={} match_len={}",
                        rule.name(),
                        hit.matched.chars().count()
                    );
                    return Some(RuleApplied {
                        rule: rule.name(),
                        state: next,
                    });
                }
                Err(err) => {
                    debug!(
                        "event=input_rule module=input_rule status=rejected rule={} error={}",
                        rule.name(),
                        err
                    );
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::InputRules;
    use crate::model::node::builders::{
        doc, empty_paragraph, paragraph, task_item, task_list,
    };
    use crate::model::selection::{Position, Selection};
    use crate::state::EditorState;

    #[test]
    fn marker_typed_at_once_wraps_empty_paragraph() {
        let applied = InputRules::default()
            .run(&EditorState::empty(), "[]")
            .expect("rule should fire");
        assert_eq!(applied.rule, "task_list");
        assert_eq!(
            applied.state.doc(),
            &doc(vec![task_list(vec![task_item(empty_paragraph())])])
        );
        assert_eq!(
            applied.state.selection(),
            &Selection::cursor(Position::new(vec![0, 0, 0], 0))
        );
    }

    #[test]
    fn closing_bracket_completes_marker_typed_earlier() {
        let state = EditorState::with_cursor_at_end(doc(vec![paragraph("[")]))
            .expect("valid state");
        let applied = InputRules::default()
            .run(&state, "]")
            .expect("rule should fire");
        assert_eq!(
            applied.state.doc(),
            &doc(vec![task_list(vec![task_item(empty_paragraph())])])
        );
    }

    #[test]
    fn marker_after_text_keeps_remaining_text() {
        let state = EditorState::with_cursor_at_end(doc(vec![paragraph("todo [")]))
            .expect("valid state");
        let applied = InputRules::default()
            .run(&state, "]")
            .expect("rule should fire");
        assert_eq!(
            applied.state.doc(),
            &doc(vec![task_list(vec![task_item(paragraph("todo "))])])
        );
        assert_eq!(
            applied.state.selection(),
            &Selection::cursor(Position::new(vec![0, 0, 0], 5))
        );
    }

    #[test]
    fn non_matching_text_does_not_fire() {
        let state = EditorState::empty();
        assert!(InputRules::default().run(&state, "[x]").is_none());
        assert!(InputRules::default().run(&state, "]").is_none());
        assert!(InputRules::default().run(&state, "[").is_none());
    }

    #[test]
    fn marker_inside_task_item_is_rejected_by_schema() {
        let state = EditorState::with_cursor_at_end(doc(vec![task_list(vec![task_item(
            paragraph("a"),
        )])]))
        .expect("valid state");
        assert!(InputRules::default().run(&state, "[]").is_none());
    }

    #[test]
    fn lookbehind_limits_inspected_text() {
        let state = EditorState::with_cursor_at_end(doc(vec![paragraph("[")]))
            .expect("valid state");
        assert!(InputRules::new(vec![super::task_list_rule()], 0)
            .run(&state, "]")
            .is_none());
    }
}
