use super::*;
use crate::editor::{EditorOptions, Key};

fn math() -> Editor {
    Editor::math_field(EditorOptions::default())
}

fn text() -> Editor {
    Editor::text_field(EditorOptions::default())
}

#[test]
fn handlers_follow_block_kind() {
    assert!(write_handler(&NodeKind::RootText).is_some());
    assert!(write_handler(&NodeKind::Block(BlockKind::Math)).is_some());
    assert!(write_handler(&NodeKind::Block(BlockKind::ModeSwitch)).is_some());
    assert!(write_handler(&NodeKind::ModeSwitch).is_none());
}

#[test]
fn dollar_in_region_opens_embedded_math() {
    let mut editor = math();
    editor.typed_text("$a$");
    let block = editor.cursor.parent();
    assert!(matches!(
        editor.tree.kind(block),
        NodeKind::Block(BlockKind::ModeSwitch)
    ));
    let command = editor.command_of(block);
    let region = editor.tree.parent(command).unwrap();
    assert!(editor.tree.is_region(region));

    editor.typed_text("x+2$b");
    assert_eq!(editor.cursor.parent(), region);
    assert_eq!(editor.latex(), "\\text{a$x+2$b}");
}

#[test]
fn closing_empty_expression_writes_literal_dollar() {
    let mut editor = math();
    editor.typed_text("$a$$");
    let region = editor.cursor.parent();
    assert!(editor.tree.is_region(region));
    assert_eq!(editor.text_contents(region), "a$");
    assert_eq!(editor.latex(), "\\text{a\\$}");
}

#[test]
fn dollar_at_left_edge_exits_left() {
    let mut editor = text();
    editor.typed_text("$xy");
    editor.keystroke(Key::Home);
    editor.typed_text("$");
    let root = editor.tree.root();
    assert_eq!(editor.cursor.parent(), root);
    let command = editor.cursor[Direction::Right].unwrap();
    assert!(matches!(editor.tree.kind(command), NodeKind::ModeSwitch));
    assert_eq!(editor.latex(), "$xy$");
}

#[test]
fn moving_into_expression_announces_contents() {
    let mut editor = text();
    editor.typed_text("$xy$");
    editor.keystroke(Key::Left);
    assert_eq!(editor.last_alert(), Some("end of x y"));

    editor.keystroke(Key::End);
    editor.keystroke(Key::Right);
    assert_eq!(editor.last_alert(), Some("after x y"));
}

#[test]
fn backspace_at_root_unwraps_expression() {
    let mut editor = text();
    editor.typed_text("a$xy");
    editor.keystroke(Key::Home);
    editor.keystroke(Key::Backspace);
    let root = editor.tree.root();
    assert_eq!(editor.cursor.parent(), root);
    assert_eq!(editor.latex(), "axy");
    let left = editor.cursor[Direction::Left].unwrap();
    let right = editor.cursor[Direction::Right].unwrap();
    assert_eq!(editor.plain_text(left), "a");
    assert_eq!(editor.plain_text(right), "x");
}

#[test]
fn backspace_in_region_steps_out_of_expression() {
    let mut editor = math();
    editor.typed_text("$a$x");
    editor.keystroke(Key::Home);
    editor.keystroke(Key::Backspace);
    let region = editor.cursor.parent();
    assert!(editor.tree.is_region(region));
    let command = editor.cursor[Direction::Right].unwrap();
    assert!(matches!(editor.tree.kind(command), NodeKind::ModeSwitch));
    assert_eq!(editor.latex(), "\\text{a$x$}");
}

#[test]
fn backspace_in_empty_expression_inside_region_removes_it() {
    let mut editor = math();
    editor.typed_text("$a$");
    let block = editor.cursor.parent();
    editor.keystroke(Key::Backspace);
    let region = editor.cursor.parent();
    assert!(editor.tree.is_region(region));
    assert!(!editor.tree.is_live(block));
    assert_eq!(editor.latex(), "\\text{a}");
    let container = editor.tree.region(region).unwrap().container();
    assert_eq!(editor.surface.items(container).len(), 1);
}

#[test]
fn deleting_toward_empty_expression_removes_it() {
    let mut editor = text();
    editor.typed_text("a$");
    editor.keystroke(Key::Right);
    editor.keystroke(Key::Backspace);
    assert_eq!(editor.latex(), "a");
    assert_eq!(editor.last_alert(), Some("math"));
}
