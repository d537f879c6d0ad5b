use ratatui::style::{Color, Modifier, Style};

/// Terminal colours for the field and its status bar
#[derive(Clone, Debug)]
pub struct Theme {
    /// Background behind the field
    pub background: Color,

    /// Status bar text
    pub status_bar_fg: Color,

    /// Status bar fill
    pub status_bar_bg: Color,

    /// File name shown in the status bar
    pub filename_color: Color,

    /// Color for the exported LaTeX shown in the status bar
    pub latex_color: Color,

    /// Selected glyphs
    pub selection_fg: Color,

    /// Fill behind selected glyphs
    pub selection_bg: Color,

    /// Color for math symbols
    pub math_fg: Color,

    /// Color for the text of text regions inside math
    pub region_fg: Color,

    /// Color for the top-level text of a text field
    pub text_fg: Color,

    /// Color for the placeholder of an empty embedded expression
    pub placeholder_fg: Color,

    /// Color for accessibility announcements in the status bar
    pub alert_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            filename_color: Color::LightYellow,
            latex_color: Color::Gray,
            selection_fg: Color::White,
            selection_bg: Color::LightBlue,
            math_fg: Color::LightCyan,
            region_fg: Color::Reset,
            text_fg: Color::Reset,
            placeholder_fg: Color::DarkGray,
            alert_fg: Color::LightGreen,
        }
    }
}

impl Theme {
    /// Create a new theme with default colors
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    pub fn filename_style(&self) -> Style {
        Style::default().fg(self.filename_color)
    }

    pub fn latex_style(&self) -> Style {
        Style::default().fg(self.latex_color).bg(self.status_bar_bg)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    pub fn math_style(&self) -> Style {
        Style::default().fg(self.math_fg).add_modifier(Modifier::ITALIC)
    }

    /// Base style of region text; the region's control sequence adds modifiers on top.
    pub fn region_style(&self) -> Style {
        Style::default().fg(self.region_fg)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text_fg)
    }

    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.placeholder_fg)
            .add_modifier(Modifier::DIM)
    }

    pub fn alert_style(&self) -> Style {
        Style::default().fg(self.alert_fg).bg(self.status_bar_bg)
    }
}
