use std::{
    env, fs, io,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use tracing::{info, warn};

use texfield::editor::{Editor, EditorOptions, Key};
use texfield::logging::{self, LogConfig};
use texfield::render::{RenderResult, render_field};
use texfield::theme::Theme;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const USAGE: &str = "Usage: texfield [--text] [--no-shorthand] [--log-file <path>] [file.tex]";

fn main() -> Result<()> {
    run()
}

#[derive(Debug, Default)]
struct Args {
    text_mode: bool,
    no_shorthand: bool,
    log_file: Option<PathBuf>,
    path: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--text" => parsed.text_mode = true,
            "--no-shorthand" => parsed.no_shorthand = true,
            "--log-file" => {
                let Some(path) = args.next() else {
                    bail!("--log-file needs a path\n{USAGE}");
                };
                parsed.log_file = Some(PathBuf::from(path));
            }
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with('-') => bail!("unknown option {flag}\n{USAGE}"),
            _ if parsed.path.is_some() => bail!("only one file can be edited\n{USAGE}"),
            path => parsed.path = Some(PathBuf::from(path)),
        }
    }
    Ok(parsed)
}

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;

    let _log_guard = logging::init(LogConfig {
        log_file_path: args.log_file.clone(),
    })
    .map_err(|err| anyhow::anyhow!("failed to set up logging: {err}"))?;
    info!(?args, "starting texfield");

    let options = EditorOptions::default().with_speech_shorthand(!args.no_shorthand);
    let mut editor = if args.text_mode {
        Editor::text_field(options)
    } else {
        Editor::math_field(options)
    };
    let initial_status = match &args.path {
        Some(path) => load_field(&mut editor, path)?,
        None => None,
    };
    let mut app = App::new(editor, args.path, initial_status);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )
    .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn load_field(editor: &mut Editor, path: &PathBuf) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(Some("New file".to_string()));
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match editor.set_latex(content.trim_end()) {
        Ok(()) => Ok(None),
        Err(err) => {
            warn!(path = %path.display(), %err, "could not load file");
            Ok(Some(format!("Parse error: {err}. Starting with an empty field.")))
        }
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while !app.should_quit() {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt)?;
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

struct App {
    editor: Editor,
    theme: Theme,
    file_path: Option<PathBuf>,
    should_quit: bool,
    dirty: bool,
    status_message: Option<(String, Instant)>,
    field_area: Rect,
    last_render: Option<RenderResult>,
}

impl App {
    fn new(editor: Editor, file_path: Option<PathBuf>, initial_status: Option<String>) -> Self {
        Self {
            editor,
            theme: Theme::new(),
            file_path,
            should_quit: false,
            dirty: false,
            status_message: initial_status.map(|msg| (msg, Instant::now())),
            field_area: Rect::default(),
            last_render: None,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let status_height = if area.height > 2 { 3 } else { 1 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(status_height)])
            .split(area);
        let field_area = vertical[0];
        let status_area = vertical[1];

        let render = render_field(&self.editor, field_area.width.max(1) as usize, &self.theme);
        let paragraph = Paragraph::new(Text::from(render.lines.clone()))
            .style(ratatui::style::Style::default().bg(self.theme.background));
        frame.render_widget(paragraph, field_area);

        if let Some(cursor) = render.cursor {
            if cursor.line < field_area.height as usize {
                let cursor_y = field_area.y + cursor.line as u16;
                let cursor_x = field_area.x + cursor.column.min(field_area.width - 1);
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }

        let status = Paragraph::new(self.status_lines(status_height))
            .style(self.theme.status_bar_style())
            .block(Block::default().borders(Borders::NONE));
        frame.render_widget(status, status_area);

        self.field_area = field_area;
        self.last_render = Some(render);
    }

    fn status_lines(&mut self, height: u16) -> Vec<Line<'static>> {
        self.prune_status_message();
        let name = self
            .file_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "[scratch]".to_string());
        let marker = if self.dirty { "*" } else { "" };
        let mut summary = vec![Span::styled(
            format!("{name}{marker}"),
            self.theme.filename_style().bg(self.theme.status_bar_bg),
        )];
        match &self.status_message {
            Some((message, _)) => summary.push(Span::raw(format!(" | {message}"))),
            None => summary.push(Span::raw(
                " | Ctrl-S save | Ctrl-T text | Ctrl-B bold | Ctrl-Q quit",
            )),
        }
        if height < 3 {
            return vec![Line::from(summary)];
        }

        let latex = Line::from(Span::styled(self.editor.latex(), self.theme.latex_style()));
        let alert = Line::from(Span::styled(
            self.editor.last_alert().unwrap_or_default().to_string(),
            self.theme.alert_style(),
        ));
        vec![Line::from(summary), latex, alert]
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code, modifiers)?,
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::FocusGained => self.editor.focus(),
            Event::FocusLost => self.editor.blur(),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        let shift = modifiers.contains(KeyModifiers::SHIFT);
        match (code, modifiers) {
            (KeyCode::Char('q'), m) | (KeyCode::Char('c'), m)
                if m.contains(KeyModifiers::CONTROL) =>
            {
                self.should_quit = true;
            }
            (KeyCode::Char('s'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.save()?;
            }
            (KeyCode::Char('a'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.editor.keystroke(Key::SelectAll);
            }
            (KeyCode::Char('t'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.command("\\text");
            }
            (KeyCode::Char('b'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.command("\\textbf");
            }
            (KeyCode::Left, _) => {
                self.editor
                    .keystroke(if shift { Key::ShiftLeft } else { Key::Left });
            }
            (KeyCode::Right, _) => {
                self.editor
                    .keystroke(if shift { Key::ShiftRight } else { Key::Right });
            }
            (KeyCode::Home, _) => {
                self.editor
                    .keystroke(if shift { Key::ShiftHome } else { Key::Home });
            }
            (KeyCode::End, _) => {
                self.editor
                    .keystroke(if shift { Key::ShiftEnd } else { Key::End });
            }
            (KeyCode::Backspace, _) => {
                self.editor.keystroke(Key::Backspace);
                self.mark_dirty();
            }
            (KeyCode::Delete, _) => {
                self.editor.keystroke(Key::Delete);
                self.mark_dirty();
            }
            (KeyCode::Char(' '), _) => {
                let key = if shift { Key::ShiftSpacebar } else { Key::Spacebar };
                if !self.editor.keystroke(key) {
                    self.editor.typed_text(" ");
                }
                self.mark_dirty();
            }
            (KeyCode::Char(ch), m)
                if !m.contains(KeyModifiers::CONTROL) && !m.contains(KeyModifiers::ALT) =>
            {
                let mut buf = [0; 4];
                self.editor.typed_text(ch.encode_utf8(&mut buf));
                self.mark_dirty();
            }
            _ => {}
        }
        Ok(())
    }

    fn command(&mut self, control_sequence: &str) {
        if self.editor.cmd(control_sequence) {
            self.mark_dirty();
        } else {
            self.set_status(format!("{control_sequence} only works inside math"));
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let area = self.field_area;
        let Some(render) = &self.last_render else {
            return;
        };
        if mouse.row < area.y || mouse.row >= area.y + area.height || mouse.column < area.x {
            return;
        }
        let line = (mouse.row - area.y) as usize;
        let column = render.layout_column_at(line, mouse.column - area.x);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.editor.seek(column),
            MouseEventKind::Drag(MouseButton::Left) => self.editor.seek_select(column),
            _ => {}
        }
    }

    fn on_tick(&mut self) {
        self.prune_status_message();
    }

    fn save(&mut self) -> Result<()> {
        let Some(path) = &self.file_path else {
            self.set_status("No file to save to".to_string());
            return Ok(());
        };
        let mut contents = self.editor.latex();
        contents.push('\n');
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "saved field");

        self.dirty = false;
        self.set_status("Saved".to_string());
        Ok(())
    }

    fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
