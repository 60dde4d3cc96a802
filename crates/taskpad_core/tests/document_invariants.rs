use taskpad_core::builders::{doc, empty_paragraph, paragraph, task_item, task_list};
use taskpad_core::{check_document, Editor, Key, Node, Position, Selection};

/// Every task list has items and every task item wraps exactly one paragraph.
fn assert_task_structure(node: &Node) {
    match node {
        Node::TaskList { content } => {
            assert!(!content.is_empty(), "task list without items: {node:?}");
            for item in content {
                assert!(matches!(item, Node::TaskItem { .. }));
                assert_task_structure(item);
            }
        }
        Node::TaskItem { content, .. } => {
            assert_eq!(content.len(), 1, "task item must wrap one paragraph");
            assert!(matches!(content[0], Node::Paragraph { .. }));
        }
        Node::Doc { content } => {
            assert!(!content.is_empty());
            content.iter().for_each(assert_task_structure);
        }
        Node::Paragraph { .. } | Node::Text { .. } => {}
    }
}

fn assert_valid(editor: &Editor) {
    check_document(editor.doc()).unwrap();
    assert_task_structure(editor.doc());
    editor.selection().validate(editor.doc()).unwrap();
}

enum Action {
    Enter,
    Type(&'static str),
}

fn run(editor: &mut Editor, actions: &[Action]) {
    for action in actions {
        match action {
            Action::Enter => {
                editor.press_key(&Key::Enter);
            }
            Action::Type(text) => {
                editor.insert_text(text);
            }
        }
        assert_valid(editor);
    }
}

#[test]
fn repeated_enter_in_task_list_never_leaves_empty_list() {
    let mut editor = Editor::mount(None);
    run(
        &mut editor,
        &[
            Action::Type("[]"),
            Action::Type("a"),
            Action::Enter,
            Action::Type("b"),
            Action::Enter,
            Action::Enter,
            Action::Enter,
            Action::Enter,
            Action::Type("[]"),
            Action::Enter,
            Action::Enter,
        ],
    );

    assert_eq!(
        editor.doc(),
        &doc(vec![
            task_list(vec![task_item(paragraph("a")), task_item(paragraph("b"))]),
            empty_paragraph(),
            empty_paragraph(),
            empty_paragraph(),
            empty_paragraph(),
        ])
    );
}

#[test]
fn enter_in_empty_middle_item_moves_out_after_list() {
    let mut editor = Editor::mount(None);
    editor
        .replace_document(doc(vec![task_list(vec![
            task_item(paragraph("first")),
            task_item(empty_paragraph()),
            task_item(paragraph("third")),
        ])]))
        .unwrap();
    editor
        .set_selection(Selection::cursor(Position::new(vec![0, 1, 0], 0)))
        .unwrap();

    assert!(editor.press_key(&Key::Enter));
    assert_valid(&editor);
    assert_eq!(
        editor.doc(),
        &doc(vec![
            task_list(vec![
                task_item(paragraph("first")),
                task_item(paragraph("third")),
            ]),
            empty_paragraph(),
        ])
    );
    assert_eq!(editor.selection().head, Position::new(vec![1], 0));
}

#[test]
fn mixed_sequence_keeps_schema_after_every_step() {
    let mut editor = Editor::mount(Some("<p>Intro</p>"));
    editor
        .set_selection(Selection::cursor(Position::new(vec![0], 5)))
        .unwrap();
    run(
        &mut editor,
        &[
            Action::Enter,
            Action::Type("[]"),
            Action::Type("one"),
            Action::Enter,
            Action::Type("two"),
            Action::Enter,
            Action::Enter,
            Action::Type("outro"),
            Action::Enter,
            Action::Type("x[]"),
        ],
    );

    assert_eq!(editor.doc().child(0), Some(&paragraph("Intro")));
    assert_eq!(
        editor.doc().child(1),
        Some(&task_list(vec![
            task_item(paragraph("one")),
            task_item(paragraph("two")),
        ]))
    );
    assert_eq!(editor.doc().child(2), Some(&paragraph("outro")));
}

#[test]
fn text_without_marker_is_inserted_verbatim() {
    let mut editor = Editor::mount(Some("<p>ab</p>"));
    editor
        .set_selection(Selection::cursor(Position::new(vec![0], 1)))
        .unwrap();

    for text in ["[", "x", "]", "[ ]", "] ["] {
        let before = editor.doc().clone();
        assert!(editor.insert_text(text));
        assert_ne!(editor.doc(), &before);
        assert!(matches!(editor.doc().child(0), Some(Node::Paragraph { .. })));
    }
    assert_eq!(editor.text_content(), "a[x][ ]] [b");
}

#[test]
fn toggling_done_flips_only_the_target_item() {
    let mut editor = Editor::mount(Some(
        r#"<ul data-type="taskList"><li data-type="taskItem" data-done="false"><p>a</p></li><li data-type="taskItem" data-done="false"><p>b</p></li></ul>"#,
    ));
    assert!(editor.toggle_task_done(&[0, 1, 0]));
    assert_eq!(
        editor.to_html(),
        r#"<ul data-type="taskList"><li data-type="taskItem" data-done="false"><p>a</p></li><li data-type="taskItem" data-done="true"><p>b</p></li></ul>"#
    );
    assert!(!editor.toggle_task_done(&[5]));
    assert_eq!(editor.version(), 1);
}
