//! The terminal host: owns the document value, runs SQL on execute and
//! feeds failures back to the editor as its error string.

use std::fs;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use querypad_core::{KeyChord, Language};
use querypad_exec::{QueryOutcome, ResultSet, SqliteRunner};
use querypad_ui::{chord_from_key_event, scroll_delta, Clipboard, Container, EditorProps, SqlEditor};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::{DefaultTerminal, Frame};

use crate::config::Settings;

const MIN_FONT_SIZE: f32 = 6.0;
const MAX_FONT_SIZE: f32 = 72.0;
const MAX_COLUMN_WIDTH: usize = 30;

/// Posted by the editor callbacks and handled between frames.
#[derive(Debug, Clone, PartialEq)]
pub enum AppMessage {
    ValueChanged(String),
    Execute,
}

/// Keys the host keeps for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostCommand {
    /// Fallback for terminals that report Ctrl+Enter as Ctrl+J.
    Execute,
    Quit,
    Save,
    FontLarger,
    FontSmaller,
    FontReset,
    Copy,
    Cut,
    Paste,
}

const HOST_BINDINGS: &[(&str, HostCommand)] = &[
    ("Ctrl-j", HostCommand::Execute),
    ("Ctrl-q", HostCommand::Quit),
    ("Ctrl-s", HostCommand::Save),
    ("Ctrl-=", HostCommand::FontLarger),
    ("Ctrl-+", HostCommand::FontLarger),
    ("Ctrl--", HostCommand::FontSmaller),
    ("Ctrl-0", HostCommand::FontReset),
    ("Mod-c", HostCommand::Copy),
    ("Mod-x", HostCommand::Cut),
    ("Mod-v", HostCommand::Paste),
];

fn host_command(chord: KeyChord) -> Option<HostCommand> {
    HOST_BINDINGS
        .iter()
        .find(|(notation, _)| KeyChord::parse(notation) == Some(chord))
        .map(|(_, command)| *command)
}

pub struct App {
    /// The controlled value.
    value: String,
    error: Option<String>,
    font_size: f32,
    default_font_size: f32,
    file: Option<PathBuf>,
    dirty: bool,
    result: Option<QueryOutcome>,
    status: String,
    should_quit: bool,
    editor: SqlEditor,
    runner: SqliteRunner,
    clipboard: Clipboard,
    sender: Sender<AppMessage>,
    messages: Receiver<AppMessage>,
}

impl App {
    pub fn new(
        settings: &Settings,
        file: Option<PathBuf>,
        text: String,
        runner: SqliteRunner,
        clipboard: Clipboard,
    ) -> Self {
        let (tx, messages) = mpsc::channel();
        let language = file.as_deref().map_or(Language::Sql, Language::from_path);
        log::debug!("Editing as {}", language.name());
        let editor = SqlEditor::new()
            .with_language(language)
            .with_theme(settings.theme)
            .with_line_wrapping(settings.line_wrapping)
            .on_change(post(&tx, |text| AppMessage::ValueChanged(text.to_string())))
            .on_execute({
                let tx = tx.clone();
                move || {
                    let _ = tx.send(AppMessage::Execute);
                }
            });

        Self {
            value: text,
            error: None,
            font_size: settings.font_size,
            default_font_size: settings.font_size,
            file,
            dirty: false,
            result: None,
            status: String::from("Ctrl+Enter/Ctrl+J run  Ctrl+S save  Ctrl+Q quit"),
            should_quit: false,
            editor,
            runner,
            clipboard,
            sender: tx,
            messages,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&QueryOutcome> {
        self.result.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn editor(&self) -> &SqlEditor {
        &self.editor
    }

    /// Runs the main event loop until quit.
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - querypad requires an interactive terminal")?;
        // Ctrl+Enter is only distinguishable from Enter with the enhanced
        // keyboard protocol.
        let enhanced = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )?;
        } else {
            log::warn!("Terminal lacks keyboard enhancement; Ctrl+Enter may arrive as Enter");
        }
        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;

        let result = self.event_loop(&mut terminal);

        if enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        self.editor.teardown();
        ratatui::restore();

        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            self.drain_messages();
            terminal.draw(|frame| self.render(frame))?;
            if self.should_quit {
                log::info!("Quit requested");
                return Ok(());
            }
            if event::poll(Duration::from_millis(250))? {
                self.handle_event(event::read()?);
            }
        }
    }

    /// Routes one terminal event. Document changes it causes are posted
    /// and applied by [`drain_messages`](Self::drain_messages).
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                let Some(chord) = chord_from_key_event(&key) else {
                    return;
                };
                match host_command(chord) {
                    Some(command) => self.run_host_command(command),
                    None => {
                        self.editor.handle_key(chord);
                    }
                }
            }
            Event::Mouse(mouse) => {
                if let Some(lines) = scroll_delta(&mouse) {
                    self.editor.scroll(lines);
                }
            }
            Event::Paste(text) => {
                self.editor.paste(&text);
            }
            _ => {}
        }
    }

    fn run_host_command(&mut self, command: HostCommand) {
        match command {
            // Queued behind any pending value change.
            HostCommand::Execute => {
                let _ = self.sender.send(AppMessage::Execute);
            }
            HostCommand::Quit => self.should_quit = true,
            HostCommand::Save => self.save(),
            HostCommand::FontLarger => self.set_font_size(self.font_size + 1.0),
            HostCommand::FontSmaller => self.set_font_size(self.font_size - 1.0),
            HostCommand::FontReset => self.set_font_size(self.default_font_size),
            HostCommand::Copy => {
                if let Some(text) = self.editor.copy() {
                    self.clipboard.set_text(&text);
                }
            }
            HostCommand::Cut => {
                if let Some(text) = self.editor.cut() {
                    self.clipboard.set_text(&text);
                }
            }
            HostCommand::Paste => {
                if let Some(text) = self.clipboard.get_text() {
                    self.editor.paste(&text);
                }
            }
        }
    }

    fn set_font_size(&mut self, size: f32) {
        self.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.status = format!("Font size {}", self.font_size);
    }

    /// Applies everything the editor posted since the last call.
    pub fn drain_messages(&mut self) {
        while let Ok(message) = self.messages.try_recv() {
            match message {
                AppMessage::ValueChanged(text) => {
                    self.value = text;
                    self.dirty = true;
                }
                AppMessage::Execute => self.execute(),
            }
        }
    }

    fn execute(&mut self) {
        match self.runner.execute(&self.value) {
            Ok(outcome) => {
                log::info!("Query succeeded: {}", outcome.summary());
                self.status = outcome.summary();
                self.error = None;
                self.result = Some(outcome);
            }
            Err(err) => {
                log::info!("Query failed: {err}");
                self.status = String::from("Query failed");
                self.error = Some(err.to_string());
                self.result = None;
            }
        }
    }

    fn save(&mut self) {
        let Some(path) = &self.file else {
            self.status = String::from("No file to save to (start with querypad FILE)");
            return;
        };
        match fs::write(path, &self.value)
            .with_context(|| format!("Failed to write {}", path.display()))
        {
            Ok(()) => {
                log::info!("Saved {}", path.display());
                self.status = format!("Saved {}", path.display());
                self.dirty = false;
            }
            Err(err) => {
                log::error!("{err:#}");
                self.status = format!("{err:#}");
            }
        }
    }

    // ==================== Rendering ====================

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let results_height = self.results_height(area.height);
        let [editor_area, results_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(results_height),
            Constraint::Length(1),
        ])
        .areas(area);

        let props = EditorProps {
            value: self.value.clone(),
            error: self.error.clone(),
            font_size: Some(self.font_size),
        };
        self.editor.update(&props, Container::from_rect(editor_area));
        frame.render_widget(&mut self.editor, editor_area);
        if let Some(position) = self.editor.cursor_screen_position() {
            frame.set_cursor_position(position);
        }

        if results_height > 0 {
            self.render_results(frame, results_area);
        }
        self.render_status_bar(frame, status_area);
    }

    fn results_height(&self, total: u16) -> u16 {
        let wanted = match &self.result {
            Some(QueryOutcome::Rows(set)) => u16::try_from(set.rows.len())
                .unwrap_or(u16::MAX)
                .saturating_add(2),
            Some(QueryOutcome::Affected(_)) => 2,
            None => 0,
        };
        wanted.min(total / 3)
    }

    fn render_results(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::TOP)
            .title(format!(" {} ", self.status));
        match &self.result {
            Some(QueryOutcome::Rows(set)) => {
                frame.render_widget(result_table(set).block(block), area);
            }
            Some(QueryOutcome::Affected(n)) => {
                let text = format!("{n} row(s) affected");
                frame.render_widget(Paragraph::new(text).block(block), area);
            }
            None => {}
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let name = self
            .file
            .as_ref()
            .and_then(|p| p.file_name())
            .map_or_else(|| "untitled".to_string(), |n| n.to_string_lossy().to_string());
        let dirty = if self.dirty { " [+]" } else { "" };
        let position = self
            .editor
            .editor()
            .map(|e| {
                let pos = e.cursor_position();
                format!("  Ln {}, Col {}", pos.line + 1, pos.col + 1)
            })
            .unwrap_or_default();
        let text = format!(
            " {name}{dirty}{position}  {}pt  {}",
            self.font_size, self.status
        );
        let bar = Paragraph::new(Line::from(text))
            .style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_widget(bar, area);
    }
}

fn post<F>(tx: &Sender<AppMessage>, make: F) -> impl FnMut(&str) + 'static
where
    F: Fn(&str) -> AppMessage + 'static,
{
    let tx = tx.clone();
    move |text: &str| {
        if tx.send(make(text)).is_err() {
            log::debug!("Dropping editor message, host is gone");
        }
    }
}

fn result_table(set: &ResultSet) -> Table<'static> {
    let widths: Vec<Constraint> = set
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let widest = set
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|v| v.to_string().chars().count())
                .max()
                .unwrap_or(0)
                .max(name.chars().count())
                .min(MAX_COLUMN_WIDTH);
            Constraint::Length(widest as u16)
        })
        .collect();

    let header = Row::new(set.columns.clone())
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = set
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(|v| v.to_string()).collect::<Vec<_>>()));

    Table::new(rows, widths).header(header).column_spacing(2)
}
