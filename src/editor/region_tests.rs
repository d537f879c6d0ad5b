use super::*;
use crate::editor::{EditorOptions, Key};

fn math() -> Editor {
    Editor::math_field(EditorOptions::default())
}

fn only_region(editor: &Editor) -> NodeId {
    let root = editor.tree.root();
    editor
        .tree
        .children(root)
        .find(|child| editor.tree.is_region(*child))
        .expect("field should hold a text region")
}

fn text_style(editor: &Editor) -> TextStyle {
    editor.options.styles.plain()
}

#[test]
fn fuse_leaves_one_segment_and_one_run() {
    let mut editor = math();
    editor.typed_text("$abc");
    editor.keystroke(Key::Left);
    editor.keystroke(Key::Left);
    editor.keystroke(Key::Home);
    let region = editor.cursor.parent();
    assert_eq!(editor.tree.children(region).count(), 2);

    editor.keystroke(Key::Left);
    let container = editor.region(region).container();
    assert_eq!(editor.tree.children(region).count(), 1);
    assert_eq!(editor.surface.items(container).len(), 1);
    assert_eq!(editor.surface.container_text(container), "abc");
    assert_eq!(editor.cursor.point(), Point::new(editor.tree.root(), None, Some(region)));
}

#[test]
fn fuse_keeps_embedded_math_between_stretches() {
    let mut editor = math();
    editor.typed_text("$ab$x$cd");
    editor.keystroke(Key::Left);
    editor.keystroke(Key::Right);
    editor.keystroke(Key::Right);
    let region = only_region(&editor);
    assert_eq!(editor.cursor.parent(), editor.tree.root());

    let kinds: Vec<bool> = editor
        .tree
        .children(region)
        .map(|child| editor.tree.is_segment(child))
        .collect();
    assert_eq!(kinds, vec![true, false, true]);
    let container = editor.region(region).container();
    assert_eq!(editor.surface.stretches(container).len(), 2);
    assert_eq!(editor.latex(), "\\text{ab$x$cd}");
    assert_eq!(editor.text_contents(region), "abcd");
}

#[test]
fn blur_removes_empty_region() {
    let mut editor = math();
    editor.typed_text("x$");
    let region = editor.cursor.parent();
    editor.keystroke(Key::Right);
    assert!(!editor.tree.is_live(region));
    let root = editor.tree.root();
    let x = editor.tree.end(root, Direction::Left);
    assert_eq!(editor.cursor.point(), Point::new(root, x, None));
    assert_eq!(editor.latex(), "x");
}

#[test]
fn anticursor_survives_fuse_at_same_offset() {
    let mut editor = math();
    editor.typed_text("$abcd");
    editor.keystroke(Key::Left);
    editor.keystroke(Key::Left);
    let region = editor.cursor.parent();
    editor.start_selection();

    editor.ins_right_of(region);
    let parked = editor.cursor.anticursor().unwrap();
    assert_eq!(parked.parent, region);
    assert_eq!(editor.region(region).pending_anticursor_offset, Some(2));
    assert_eq!(editor.tree.children(region).count(), 1);

    editor.region_move_towards(region, Direction::Left);
    let restored = editor.cursor.anticursor().unwrap();
    assert_eq!(editor.text_offset_of(&restored), 2);
    assert_eq!(editor.region(region).pending_anticursor_offset, None);
    assert_eq!(editor.text_contents(region), "abcd");
}

#[test]
fn ending_selection_forgets_parked_offset() {
    let mut editor = math();
    editor.typed_text("$ab");
    editor.keystroke(Key::Left);
    let region = editor.cursor.parent();
    editor.start_selection();
    editor.ins_right_of(region);
    assert_eq!(editor.region(region).pending_anticursor_offset, Some(1));

    editor.end_selection();
    assert_eq!(editor.region(region).pending_anticursor_offset, None);
    assert!(editor.cursor.anticursor().is_none());
}

#[test]
fn seek_outside_box_lands_on_edges() {
    let mut editor = math();
    editor.set_latex("x\\text{ab}").unwrap();
    let region = only_region(&editor);

    editor.region_seek(region, 0);
    assert_eq!(editor.cursor.parent(), region);
    assert_eq!(editor.cursor[Direction::Left], None);

    editor.region_seek(region, 40);
    assert_eq!(editor.cursor.parent(), region);
    assert_eq!(editor.cursor[Direction::Right], None);
    assert!(editor.cursor.is_visible());
}

#[test]
fn seek_inside_splits_at_nearest_character() {
    let mut editor = math();
    editor.set_latex("\\text{abcd}").unwrap();
    let region = only_region(&editor);
    editor.region_seek(region, 3);
    assert_eq!(editor.text_offset_of(&editor.cursor.point()), 3);
    assert_eq!(editor.text_contents(region), "abcd");
    assert!(editor.aria.is_empty());
}

#[test]
fn seek_accounts_for_wide_characters() {
    let mut editor = math();
    editor.set_latex("\\text{日本語}").unwrap();
    let region = only_region(&editor);
    editor.region_seek(region, 4);
    assert_eq!(editor.text_offset_of(&editor.cursor.point()), 2);
}

#[test]
fn region_from_latex_unescapes_body() {
    let mut editor = math();
    let style = text_style(&editor);
    let region = editor.region_from_latex(style, "{a\\{b\\}\\\\}").unwrap();
    assert_eq!(editor.tree.parent(region), None);
    assert_eq!(editor.text_contents(region), "a{b}\\");
    assert_eq!(editor.region_latex(region), "\\text{a\\{b\\}\\\\}");
}

#[test]
fn region_from_latex_keeps_inner_braces_unbalanced() {
    let mut editor = math();
    let style = text_style(&editor);
    let region = editor.region_from_latex(style, "{a}b}").unwrap();
    assert_eq!(editor.text_contents(region), "a}b");
}

#[test]
fn region_from_latex_rejects_missing_brace() {
    let mut editor = math();
    let style = text_style(&editor);
    assert!(editor.region_from_latex(style, "ab").is_err());
}

#[test]
fn empty_region_serializes_to_nothing() {
    let mut editor = math();
    let style = text_style(&editor);
    let region = editor.new_region(style);
    assert_eq!(editor.region_latex(region), "");
    assert_eq!(editor.text_contents(region), "");
}

#[test]
fn replaces_with_text_replays_characters() {
    let mut editor = math();
    let style = text_style(&editor);
    let region = editor.new_region(style);
    editor.region_replaces(region, PriorContent::Text("hi".to_string()));
    editor.region_create_left_of(region);
    assert_eq!(editor.cursor.parent(), region);
    assert_eq!(editor.latex(), "\\text{hi}");
}

#[test]
fn replaced_text_fuses_into_one_segment_on_blur() {
    for text in ["héllo", "a\\b", "{x}", "a$b", "日本語"] {
        let mut editor = math();
        let style = text_style(&editor);
        let region = editor.new_region(style);
        editor.region_replaces(region, PriorContent::Text(text.to_string()));
        editor.region_create_left_of(region);
        assert_eq!(editor.text_contents(region), text);

        editor.keystroke(Key::Right);
        assert_eq!(editor.cursor.parent(), editor.tree.root());
        assert_eq!(editor.tree.children(region).count(), 1);
        let container = editor.region(region).container();
        assert_eq!(editor.surface.items(container).len(), 1);
        assert_eq!(editor.surface.container_text(container), text);
        assert_eq!(editor.text_contents(region), text);

        let exported = editor.latex();
        let mut reloaded = math();
        reloaded.set_latex(&exported).unwrap();
        assert_eq!(reloaded.text_contents(only_region(&reloaded)), text);
    }
}

#[test]
fn delete_towards_enters_nonempty_region() {
    let mut editor = math();
    editor.set_latex("\\text{ab}").unwrap();
    editor.keystroke(Key::Home);
    editor.keystroke(Key::Delete);
    let region = only_region(&editor);
    assert_eq!(editor.cursor.parent(), region);
    assert_eq!(editor.cursor[Direction::Left], None);

    editor.keystroke(Key::Delete);
    assert_eq!(editor.latex(), "\\text{b}");
}

#[test]
fn verbose_speech_wraps_label() {
    let mut editor = Editor::math_field(EditorOptions::default().with_speech_shorthand(false));
    editor.set_latex("\\textsc{ab}").unwrap();
    let region = only_region(&editor);
    assert_eq!(editor.region_speech(region), "StartVariable font, ab, EndVariable font");
}

#[test]
fn shift_arrow_out_of_fresh_empty_region_relinks_anticursor() {
    for key in [Key::ShiftRight, Key::ShiftLeft] {
        let mut editor = math();
        editor.typed_text("$");
        let region = editor.cursor.parent();
        editor.keystroke(key);

        let root = editor.tree.root();
        assert!(!editor.tree.is_live(region));
        assert_eq!(editor.cursor.parent(), root);
        assert_eq!(editor.cursor.anticursor().map(|point| point.parent), Some(root));
        assert!(editor.cursor.selection().is_none());
        assert_eq!(editor.latex(), "");

        editor.typed_text("x");
        assert_eq!(editor.latex(), "x");
    }
}

#[test]
fn shift_arrow_out_of_empty_region_between_symbols() {
    let mut editor = math();
    editor.typed_text("ab");
    editor.keystroke(Key::Left);
    editor.typed_text("$");
    editor.keystroke(Key::ShiftRight);

    let root = editor.tree.root();
    assert_eq!(editor.cursor.parent(), root);
    assert_eq!(editor.latex(), "ab");
    assert!(editor.cursor.selection().is_none());

    editor.keystroke(Key::ShiftRight);
    assert!(editor.cursor.selection().is_some());
    editor.typed_text("c");
    assert_eq!(editor.latex(), "ac");
}

#[test]
fn select_refuses_anticursor_outside_the_field() {
    let mut editor = math();
    editor.typed_text("x");
    let style = text_style(&editor);
    let region = editor.new_region(style);
    editor.cursor.anticursor = Some(Point::new(region, None, None));
    assert!(!editor.select());
    assert!(editor.cursor.selection().is_none());
}

#[test]
fn repeated_edits_reuse_arena_slots() {
    let mut editor = math();
    editor.typed_text("$ab");
    let region = editor.cursor.parent();
    let cycle = |editor: &mut Editor| {
        editor.keystroke(Key::Left);
        editor.keystroke(Key::Right);
        // Leaving the region fuses it; coming back lands at its right end.
        editor.keystroke(Key::Right);
        editor.keystroke(Key::Left);
    };

    cycle(&mut editor);
    let node_slots = editor.tree.slots();
    let run_slots = editor.surface.run_slots();
    for _ in 0..1000 {
        cycle(&mut editor);
    }
    assert_eq!(editor.tree.slots(), node_slots);
    assert_eq!(editor.surface.run_slots(), run_slots);
    assert_eq!(editor.tree.live_count(), 3);
    assert_eq!(editor.surface.live_runs(), 1);
    assert_eq!(editor.cursor.parent(), region);
    assert_eq!(editor.latex(), "\\text{ab}");
}
