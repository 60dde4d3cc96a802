//! FFI use-case API for Flutter-facing editor calls.
//!
//! # Responsibility
//! - Expose sync, use-case-level editor functions to Dart via FRB.
//! - Own mounted editors in a process-wide registry keyed by editor ID.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Unknown or malformed editor IDs yield failure envelopes or `None`.
//! - The registry lock is held for exactly one editor call.

use log::{info, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use taskpad_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Editor, EditorConfig, EditorId, Key,
};
use uuid::Uuid;

static EDITORS: Lazy<Mutex<HashMap<EditorId, Editor>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Action response envelope for editor input calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorActionResponse {
    /// Whether the call reached a mounted editor.
    pub ok: bool,
    /// Whether the editor accepted the input (a handler or rule fired).
    pub handled: bool,
    /// Document version after the call.
    pub version: u64,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl EditorActionResponse {
    fn applied(handled: bool, version: u64) -> Self {
        let message = if handled { "Applied." } else { "Ignored." };
        Self {
            ok: true,
            handled,
            version,
            message: message.to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            handled: false,
            version: 0,
            message: message.into(),
        }
    }
}

/// Mount response envelope for configured mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorMountResponse {
    /// Whether the editor was mounted.
    pub ok: bool,
    /// Mounted editor ID in string form.
    pub editor_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// Mounts an editor and returns its ID.
///
/// `initial_content` is HTML; unusable content yields an empty document.
///
/// # FFI contract
/// - Sync call, in-memory only.
/// - Never panics; returns empty string when the registry is unavailable.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_mount(initial_content: Option<String>) -> String {
    register(Editor::mount(initial_content.as_deref())).unwrap_or_default()
}

/// Mounts an editor with a JSON `EditorConfig`; missing fields keep defaults.
///
/// # FFI contract
/// - Sync call, in-memory only.
/// - Never panics.
/// - Invalid config JSON fails the call instead of mounting with defaults.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_mount_with_config(
    initial_content: Option<String>,
    config_json: String,
) -> EditorMountResponse {
    let config = match EditorConfig::from_json_str(&config_json) {
        Ok(config) => config,
        Err(err) => {
            return EditorMountResponse {
                ok: false,
                editor_id: None,
                message: format!("editor_mount_with_config failed: {err}"),
            };
        }
    };
    match register(Editor::with_config(initial_content.as_deref(), config)) {
        Ok(editor_id) => EditorMountResponse {
            ok: true,
            editor_id: Some(editor_id),
            message: "Editor mounted.".to_string(),
        },
        Err(err) => EditorMountResponse {
            ok: false,
            editor_id: None,
            message: err,
        },
    }
}

fn register(editor: Editor) -> Result<String, String> {
    let id = editor.id();
    let mut editors = EDITORS.lock().map_err(|_| {
        warn!("event=ffi_editor_mount module=ffi status=error reason=registry_poisoned");
        "editor registry unavailable".to_string()
    })?;
    editors.insert(id, editor);
    Ok(id.to_string())
}

/// Drops a mounted editor. Returns whether it existed.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_unmount(editor_id: String) -> bool {
    let Ok(id) = parse_editor_id(&editor_id) else {
        return false;
    };
    let removed = EDITORS
        .lock()
        .map(|mut editors| editors.remove(&id).is_some())
        .unwrap_or(false);
    if removed {
        info!("event=ffi_editor_unmount module=ffi status=ok editor_id={id}");
    }
    removed
}

/// Feeds typed text through input rules and plain insertion.
///
/// # FFI contract
/// - Sync call, in-memory only.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_insert_text(editor_id: String, text: String) -> EditorActionResponse {
    action(&editor_id, |editor| editor.insert_text(&text))
}

/// Dispatches a named key (e.g. `Enter`) through the keymap.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_press_key(editor_id: String, key: String) -> EditorActionResponse {
    let key = Key::parse(key.trim());
    action(&editor_id, |editor| editor.press_key(&key))
}

/// Flips `done` on the task item holding the paragraph at `path`.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_toggle_task_done(editor_id: String, path: Vec<u32>) -> EditorActionResponse {
    let path = path.into_iter().map(|index| index as usize).collect::<Vec<_>>();
    action(&editor_id, |editor| editor.toggle_task_done(&path))
}

/// Plain text of the document, or `None` for unknown editors.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_text_content(editor_id: String) -> Option<String> {
    read(&editor_id, |editor| editor.text_content())
}

/// HTML of the document, or `None` for unknown editors.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_html(editor_id: String) -> Option<String> {
    read(&editor_id, |editor| editor.to_html())
}

/// JSON of the document, or `None` for unknown editors.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_document_json(editor_id: String) -> Option<String> {
    read(&editor_id, |editor| editor.to_json().ok()).flatten()
}

/// Current document version, or `None` for unknown editors.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_version(editor_id: String) -> Option<u64> {
    read(&editor_id, |editor| editor.version())
}

fn parse_editor_id(raw: &str) -> Result<EditorId, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid editor id: {err}"))
}

fn with_editor<T>(editor_id: &str, f: impl FnOnce(&mut Editor) -> T) -> Result<T, String> {
    let id = parse_editor_id(editor_id)?;
    let mut editors = EDITORS
        .lock()
        .map_err(|_| "editor registry unavailable".to_string())?;
    let editor = editors
        .get_mut(&id)
        .ok_or_else(|| format!("editor not mounted: {id}"))?;
    Ok(f(editor))
}

fn action(editor_id: &str, f: impl FnOnce(&mut Editor) -> bool) -> EditorActionResponse {
    match with_editor(editor_id, |editor| {
        let handled = f(editor);
        (handled, editor.version())
    }) {
        Ok((handled, version)) => EditorActionResponse::applied(handled, version),
        Err(err) => EditorActionResponse::failure(err),
    }
}

fn read<T>(editor_id: &str, f: impl FnOnce(&Editor) -> T) -> Option<T> {
    with_editor(editor_id, |editor| f(editor)).ok()
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, editor_document_json, editor_html, editor_insert_text, editor_mount,
        editor_mount_with_config, editor_press_key, editor_text_content, editor_toggle_task_done, editor_unmount,
        editor_version, init_logging, ping,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn mount_reads_initial_html() {
        let id = editor_mount(Some("<p>Hello world</p>".to_string()));
        assert!(!id.is_empty());
        assert_eq!(
            editor_text_content(id.clone()).as_deref(),
            Some("Hello world")
        );
        assert_eq!(editor_version(id.clone()), Some(0));
        assert!(editor_unmount(id.clone()));
        assert!(!editor_unmount(id));
    }

    #[test]
    fn typing_marker_then_enter_builds_task_list() {
        let id = editor_mount(None);

        let response = editor_insert_text(id.clone(), "[]".to_string());
        assert!(response.ok, "{}", response.message);
        assert!(response.handled);
        let response = editor_insert_text(id.clone(), "milk".to_string());
        assert!(response.handled);
        let response = editor_press_key(id.clone(), "Enter".to_string());
        assert!(response.handled);
        assert_eq!(response.version, 3);

        assert_eq!(
            editor_html(id.clone()).as_deref(),
            Some(concat!(
                r#"<ul data-type="taskList">"#,
                r#"<li data-type="taskItem" data-done="false"><p>milk</p></li>"#,
                r#"<li data-type="taskItem" data-done="false"><p></p></li>"#,
                "</ul>"
            ))
        );

        let toggled = editor_toggle_task_done(id.clone(), vec![0, 0, 0]);
        assert!(toggled.handled);
        let json = editor_document_json(id.clone()).expect("mounted editor");
        assert!(json.contains(r#""done":true"#));
        assert!(editor_unmount(id));
    }

    #[test]
    fn unbound_key_is_ignored_not_failed() {
        let id = editor_mount(None);
        let response = editor_press_key(id.clone(), "Tab".to_string());
        assert!(response.ok);
        assert!(!response.handled);
        assert_eq!(response.version, 0);
        assert!(editor_unmount(id));
    }

    #[test]
    fn unknown_or_malformed_ids_fail_softly() {
        let response = editor_insert_text("not-a-uuid".to_string(), "x".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid editor id"));

        let missing = uuid::Uuid::new_v4().to_string();
        let response = editor_press_key(missing.clone(), "Enter".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("not mounted"));
        assert_eq!(editor_html(missing.clone()), None);
        assert_eq!(editor_version(missing), None);
    }

    #[test]
    fn mount_with_config_applies_decoded_settings() {
        let response =
            editor_mount_with_config(None, r#"{"input_rules_enabled": false}"#.to_string());
        assert!(response.ok, "{}", response.message);
        let id = response.editor_id.expect("mounted editor id");

        let typed = editor_insert_text(id.clone(), "[]".to_string());
        assert!(typed.handled);
        assert_eq!(editor_html(id.clone()).as_deref(), Some("<p>[]</p>"));
        assert!(editor_unmount(id));
    }

    #[test]
    fn mount_with_invalid_config_fails_without_mounting() {
        let response =
            editor_mount_with_config(None, r#"{"input_rule_lookbehind": 0}"#.to_string());
        assert!(!response.ok);
        assert!(response.editor_id.is_none());
        assert!(response.message.contains("input_rule_lookbehind"));

        let response = editor_mount_with_config(None, "{".to_string());
        assert!(!response.ok);
    }
}
