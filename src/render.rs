use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::editor::Editor;
use crate::editor::layout::{self, Cell, CellKind};
use crate::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
    /// Layout column at which each screen line starts, plus the total width.
    line_starts: Vec<usize>,
    layout_width: usize,
}

impl RenderResult {
    /// Maps a screen position back to a layout column, for mouse seeking.
    pub fn layout_column_at(&self, line: usize, column: u16) -> usize {
        let Some(&start) = self.line_starts.get(line) else {
            return self.layout_width;
        };
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.layout_width);
        (start + column as usize).min(end)
    }
}

pub fn render_field(editor: &Editor, width: usize, theme: &Theme) -> RenderResult {
    let layout = layout::measure(editor);
    let mut renderer = Renderer::new(width.max(1), theme);
    for cell in layout.cells() {
        renderer.push_cell(cell);
    }
    let cursor_column = editor
        .cursor()
        .is_visible()
        .then(|| layout.gap_column(&editor.cursor().point()));
    renderer.finish(cursor_column, layout.width())
}

struct Renderer<'a> {
    wrap_width: usize,
    theme: &'a Theme,
    lines: Vec<Line<'static>>,
    line_starts: Vec<usize>,
    spans: Vec<Span<'static>>,
    pending: String,
    pending_style: Style,
    current_width: usize,
}

impl<'a> Renderer<'a> {
    fn new(wrap_width: usize, theme: &'a Theme) -> Self {
        Self {
            wrap_width,
            theme,
            lines: Vec::new(),
            line_starts: vec![0],
            spans: Vec::new(),
            pending: String::new(),
            pending_style: Style::default(),
            current_width: 0,
        }
    }

    fn push_cell(&mut self, cell: &Cell) {
        if self.current_width > 0 && self.current_width + cell.width > self.wrap_width {
            self.break_line();
            self.line_starts.push(cell.column);
        }
        let style = self.cell_style(cell);
        if style != self.pending_style {
            self.flush_span();
            self.pending_style = style;
        }
        self.pending.push(display_glyph(cell));
        self.current_width += cell.width;
    }

    fn cell_style(&self, cell: &Cell) -> Style {
        let style = match cell.kind {
            CellKind::Math => self.theme.math_style(),
            CellKind::PlainText => self.theme.text_style(),
            CellKind::Placeholder => self.theme.placeholder_style(),
            CellKind::Text(control_sequence) => self
                .theme
                .region_style()
                .add_modifier(region_modifier(control_sequence)),
        };
        if cell.selected {
            style.patch(self.theme.selection_style())
        } else {
            style
        }
    }

    fn flush_span(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.spans.push(Span::styled(text, self.pending_style));
        }
    }

    fn break_line(&mut self) {
        self.flush_span();
        let spans = std::mem::take(&mut self.spans);
        self.lines.push(Line::from(spans));
        self.current_width = 0;
    }

    fn finish(mut self, cursor_column: Option<usize>, layout_width: usize) -> RenderResult {
        self.break_line();
        let cursor = cursor_column.map(|column| self.position_of(column));
        let total_lines = self.lines.len();
        RenderResult {
            lines: self.lines,
            cursor,
            total_lines,
            line_starts: self.line_starts,
            layout_width,
        }
    }

    fn position_of(&self, column: usize) -> CursorVisualPosition {
        let line = self
            .line_starts
            .iter()
            .rposition(|start| *start <= column)
            .unwrap_or(0);
        CursorVisualPosition {
            line,
            column: (column - self.line_starts[line]) as u16,
        }
    }
}

fn region_modifier(control_sequence: &str) -> Modifier {
    match control_sequence {
        "\\textit" => Modifier::ITALIC,
        "\\textbf" => Modifier::BOLD,
        "\\texttt" => Modifier::DIM,
        "\\textsc" => Modifier::UNDERLINED,
        _ => Modifier::empty(),
    }
}

/// Case-changing regions only change glyphs that map to a single character,
/// so the layout's column widths stay valid.
fn display_glyph(cell: &Cell) -> char {
    let mapped = match cell.kind {
        CellKind::Text("\\uppercase") => single(cell.glyph.to_uppercase()),
        CellKind::Text("\\lowercase") => single(cell.glyph.to_lowercase()),
        _ => None,
    };
    mapped.unwrap_or(cell.glyph)
}

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{EditorOptions, Key};

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn region_text_carries_style_modifiers() {
        let mut editor = Editor::math_field(EditorOptions::default());
        editor.set_latex("x\\textbf{ab}").unwrap();
        let result = render_field(&editor, 80, &Theme::default());
        assert_eq!(result.total_lines, 1);
        let spans = &result.lines[0].spans;
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].content, "ab");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn uppercase_region_changes_glyphs_only() {
        let mut editor = Editor::math_field(EditorOptions::default());
        editor.set_latex("\\uppercase{aß}").unwrap();
        let result = render_field(&editor, 80, &Theme::default());
        assert_eq!(line_text(&result.lines[0]), "Aß");
        assert_eq!(editor.latex(), "\\uppercase{aß}");
    }

    #[test]
    fn long_fields_wrap_and_map_clicks_back() {
        let mut editor = Editor::text_field(EditorOptions::default());
        editor.typed_text("abcdefg");
        let result = render_field(&editor, 3, &Theme::default());
        assert_eq!(result.total_lines, 3);
        assert_eq!(line_text(&result.lines[2]), "g");
        assert_eq!(
            result.cursor,
            Some(CursorVisualPosition { line: 2, column: 1 })
        );
        assert_eq!(result.layout_column_at(1, 1), 4);
        assert_eq!(result.layout_column_at(2, 9), 7);
        assert_eq!(result.layout_column_at(5, 0), 7);
    }

    #[test]
    fn selection_is_highlighted_and_blur_hides_cursor() {
        let mut editor = Editor::math_field(EditorOptions::default());
        editor.typed_text("ab");
        editor.keystroke(Key::ShiftLeft);
        let theme = Theme::default();
        let result = render_field(&editor, 80, &theme);
        let spans = &result.lines[0].spans;
        assert_eq!(spans.last().unwrap().style.bg, Some(theme.selection_bg));

        editor.blur();
        let result = render_field(&editor, 80, &theme);
        assert_eq!(result.cursor, None);
    }
}
