//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskpad_core` linkage.
//! - Replay editor actions against an HTML document for quick local checks.
//!
//! Usage: `taskpad [HTML] [ACTION...]` where each action is `enter`,
//! `key:<name>` or `text:<typed text>`.

use taskpad_core::{Editor, Key, Selection};

fn main() {
    println!("taskpad_core ping={}", taskpad_core::ping());
    println!("taskpad_core version={}", taskpad_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(html) = args.next() else {
        return;
    };
    let mut editor = Editor::mount(Some(html.as_str()));
    // Actions replay from the end of the document.
    if let Some(end) = Selection::at_end(editor.doc()) {
        if let Err(err) = editor.set_selection(end) {
            eprintln!("cannot place cursor: {err}");
        }
    }
    for action in args {
        let handled = apply(&mut editor, &action);
        println!("action={action} handled={handled} version={}", editor.version());
    }
    println!("html={}", editor.to_html());
    println!("text={}", editor.text_content());
}

fn apply(editor: &mut Editor, action: &str) -> bool {
    if action.eq_ignore_ascii_case("enter") {
        return editor.press_key(&Key::Enter);
    }
    if let Some(name) = action.strip_prefix("key:") {
        return editor.press_key(&Key::parse(name));
    }
    match action.strip_prefix("text:") {
        Some(text) => editor.insert_text(text),
        None => {
            eprintln!("unknown action `{action}`; expected enter, key:<name> or text:<text>");
            false
        }
    }
}
