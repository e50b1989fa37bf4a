//! The SQL editor adapter.
//!
//! [`SqlEditor`] is a controlled component: the host owns the document
//! text and hands it in as [`EditorProps::value`] on every pass, the
//! engine reports its own edits back through the change callback. Each
//! direction is one-way per tick. Engine edits are notified and never
//! written back; host values are diffed against the document and only
//! applied when they differ, so an echo of the engine's own edit is a
//! no-op that keeps the caret and undo history intact.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crossterm::event::KeyEvent;
use querypad_core::{
    ChangeSet, Compartment, Configuration, Editor, EditorEvent, KeyAction, KeyChord, Keymap,
    Language, ListenerId, Origin, Precedence, Setting, Theme, ThemeKind, Transaction,
    DEFAULT_FONT_SIZE,
};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;

use crate::input;
use crate::view;

/// Intent emitted by the execute keybinding.
pub const EXECUTE_INTENT: &str = "execute";

/// Chord bound to [`EXECUTE_INTENT`].
const EXECUTE_KEY: &str = "Mod-Enter";

type ChangeCallback = Box<dyn FnMut(&str)>;
type ExecuteCallback = Box<dyn FnMut()>;

/// Callbacks shared between the adapter and the engine listener.
#[derive(Default)]
struct Handlers {
    on_change: Option<ChangeCallback>,
    on_execute: Option<ExecuteCallback>,
}

impl Handlers {
    fn on_document_changed(&mut self, text: &str) {
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(text);
        }
    }

    fn on_execute(&mut self) {
        if let Some(on_execute) = self.on_execute.as_mut() {
            on_execute();
        }
    }
}

/// Values the host passes on every render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorProps {
    pub value: String,
    /// Shown verbatim below the editor when non-empty.
    pub error: Option<String>,
    /// Defaults to 13.
    pub font_size: Option<f32>,
}

impl EditorProps {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }
}

/// The screen area the engine is bound to, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container {
    pub width: u16,
    pub height: u16,
}

impl Container {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// A zero-sized area is not a usable container.
    pub fn from_rect(area: Rect) -> Option<Self> {
        (area.width > 0 && area.height > 0).then(|| Self::new(area.width, area.height))
    }
}

/// A live engine instance with its listener.
pub struct EditorHandle {
    editor: Editor,
    listener: ListenerId,
    container: Container,
}

impl EditorHandle {
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn container(&self) -> Container {
        self.container
    }
}

impl fmt::Debug for EditorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorHandle")
            .field("editor", &self.editor)
            .field("listener", &self.listener)
            .field("container", &self.container)
            .finish()
    }
}

#[derive(Debug, Default)]
pub enum MountState {
    #[default]
    Unmounted,
    Mounted(EditorHandle),
}

/// Embeddable SQL editor.
pub struct SqlEditor {
    state: MountState,
    handlers: Rc<RefCell<Handlers>>,
    error: Option<String>,
    theme: ThemeKind,
    language: Language,
    line_wrapping: bool,
    /// Font size last passed in through props.
    requested_font_size: f32,
    /// Keep the caret on screen at the next render.
    follow_cursor: bool,
    /// Screen position of the caret from the last render.
    cursor_screen: Option<(u16, u16)>,
}

impl fmt::Debug for SqlEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlEditor")
            .field("state", &self.state)
            .field("error", &self.error)
            .field("theme", &self.theme)
            .field("line_wrapping", &self.line_wrapping)
            .finish()
    }
}

impl Default for SqlEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlEditor {
    pub fn new() -> Self {
        Self {
            state: MountState::Unmounted,
            handlers: Rc::new(RefCell::new(Handlers::default())),
            error: None,
            theme: ThemeKind::Dark,
            language: Language::Sql,
            line_wrapping: true,
            requested_font_size: DEFAULT_FONT_SIZE,
            follow_cursor: true,
            cursor_screen: None,
        }
    }

    /// Sets the change callback. Replacing it later takes effect for the
    /// next notification without remounting.
    pub fn on_change<F>(self, callback: F) -> Self
    where
        F: FnMut(&str) + 'static,
    {
        self.handlers.borrow_mut().on_change = Some(Box::new(callback));
        self
    }

    pub fn on_execute<F>(self, callback: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.handlers.borrow_mut().on_execute = Some(Box::new(callback));
        self
    }

    /// Theme used for the next mount; a mounted engine is reconfigured.
    pub fn with_theme(mut self, theme: ThemeKind) -> Self {
        self.set_theme(theme);
        self
    }

    /// SQL by default. Plain text turns highlighting and comment toggling
    /// off.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self.reconfigure(Compartment::LANGUAGE, Setting::Language(language));
        self
    }

    pub fn with_line_wrapping(mut self, enabled: bool) -> Self {
        self.line_wrapping = enabled;
        self.reconfigure(Compartment::LINE_WRAPPING, Setting::Flag(enabled));
        self
    }

    pub fn set_theme(&mut self, theme: ThemeKind) {
        self.theme = theme;
        self.reconfigure(Compartment::THEME, Setting::Theme(theme));
    }

    // ==================== Lifecycle ====================

    /// Creates the engine bound to `container`. Without a container
    /// nothing happens and the next [`update`](Self::update) retries.
    /// Returns whether the adapter is mounted afterwards.
    pub fn initialize(
        &mut self,
        container: Option<Container>,
        initial_value: &str,
        font_size: f32,
    ) -> bool {
        if self.is_mounted() {
            return true;
        }
        let Some(container) = container else {
            log::debug!("No container yet, deferring editor initialization");
            return false;
        };

        let font_size = if font_size.is_finite() && font_size > 0.0 {
            font_size
        } else {
            log::warn!("Invalid font size {font_size}, using {DEFAULT_FONT_SIZE}");
            DEFAULT_FONT_SIZE
        };
        let config = Configuration::default()
            .with(Compartment::FONT_SIZE, Setting::FontSize(font_size))
            .with(Compartment::THEME, Setting::Theme(self.theme))
            .with(Compartment::LANGUAGE, Setting::Language(self.language))
            .with(Compartment::LINE_WRAPPING, Setting::Flag(self.line_wrapping));

        let mut editor = Editor::new(initial_value, config);
        editor.add_keymap(
            Precedence::Highest,
            Keymap::new().bind_exclusive(EXECUTE_KEY, KeyAction::Emit(EXECUTE_INTENT.into())),
        );
        editor.set_visible_lines(container.height as usize);

        let handlers = Rc::clone(&self.handlers);
        let listener = editor.add_listener(move |event| match event {
            EditorEvent::DocChanged { text, origin } if *origin != Origin::External => {
                handlers.borrow_mut().on_document_changed(text);
            }
            EditorEvent::Intent(intent) if intent == EXECUTE_INTENT => {
                handlers.borrow_mut().on_execute();
            }
            _ => {}
        });

        log::info!(
            "Mounted SQL editor ({} chars, {}x{}, font size {font_size})",
            initial_value.chars().count(),
            container.width,
            container.height
        );
        self.state = MountState::Mounted(EditorHandle {
            editor,
            listener,
            container,
        });
        self.follow_cursor = true;
        true
    }

    /// Forwards a document change to the host's change callback. The
    /// engine listener goes through the same path. Nothing is forwarded
    /// while unmounted.
    pub fn on_document_changed(&self, new_text: &str) {
        if self.is_mounted() {
            self.handlers.borrow_mut().on_document_changed(new_text);
        }
    }

    /// Brings the engine document to `new_text`. Equal text is a no-op;
    /// otherwise the whole document is replaced in one transaction that
    /// is not reported back through the change callback. Returns whether
    /// a transaction was dispatched.
    pub fn sync_external_value(&mut self, new_text: &str) -> bool {
        let MountState::Mounted(handle) = &mut self.state else {
            return false;
        };
        let editor = &mut handle.editor;
        if editor.buffer().eq_str(new_text) {
            return false;
        }

        log::debug!(
            "Syncing external value ({} -> {} chars)",
            editor.buffer().len_chars(),
            new_text.chars().count()
        );
        let changes = ChangeSet::replace_all(editor.buffer(), new_text);
        editor.dispatch(Transaction::new(changes, Origin::External));
        self.follow_cursor = true;
        true
    }

    /// Reconfigures the font-size compartment only. Invalid sizes are
    /// logged and the current size stays.
    pub fn set_font_size(&mut self, size: f32) -> bool {
        let MountState::Mounted(handle) = &mut self.state else {
            return false;
        };
        match handle
            .editor
            .reconfigure(Compartment::FONT_SIZE, Setting::FontSize(size))
        {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Font size not changed: {err}");
                false
            }
        }
    }

    /// Removes the listener and destroys the engine. Safe to call any
    /// number of times.
    pub fn teardown(&mut self) {
        if let MountState::Mounted(mut handle) = std::mem::take(&mut self.state) {
            handle.editor.remove_listener(handle.listener);
            handle.editor.destroy();
            log::info!("Unmounted SQL editor");
        }
        self.cursor_screen = None;
    }

    /// One render pass worth of effects: mount when possible, then sync
    /// value and font size and keep the error for drawing.
    pub fn update(&mut self, props: &EditorProps, container: Option<Container>) {
        let font_size = props.font_size.unwrap_or(DEFAULT_FONT_SIZE);
        self.error = props.error.clone();

        if !self.is_mounted() {
            self.requested_font_size = font_size;
            self.initialize(container, &props.value, font_size);
            return;
        }

        if let Some(container) = container {
            self.resize(container);
        }
        self.sync_external_value(&props.value);
        if font_size != self.requested_font_size {
            self.requested_font_size = font_size;
            self.set_font_size(font_size);
        }
    }

    fn resize(&mut self, container: Container) {
        if let MountState::Mounted(handle) = &mut self.state {
            if handle.container != container {
                handle.container = container;
                handle.editor.set_visible_lines(container.height as usize);
            }
        }
    }

    fn reconfigure(&mut self, compartment: Compartment, setting: Setting) {
        if let MountState::Mounted(handle) = &mut self.state {
            if let Err(err) = handle.editor.reconfigure(compartment, setting) {
                log::warn!("Failed to reconfigure {compartment}: {err}");
            }
        }
    }

    // ==================== Input ====================

    /// Feeds a chord to the engine. Returns whether it was consumed.
    pub fn handle_key(&mut self, chord: KeyChord) -> bool {
        let MountState::Mounted(handle) = &mut self.state else {
            return false;
        };
        let handled = handle.editor.handle_key(chord).is_handled();
        if handled {
            self.follow_cursor = true;
        }
        handled
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) -> bool {
        input::chord_from_key_event(event).is_some_and(|chord| self.handle_key(chord))
    }

    /// Inserts `text` over the selection.
    pub fn paste(&mut self, text: &str) -> bool {
        let MountState::Mounted(handle) = &mut self.state else {
            return false;
        };
        let text = text.replace("\r\n", "\n");
        let update = handle.editor.replace_selection(&text, Origin::Paste);
        self.follow_cursor = true;
        update.doc_changed
    }

    pub fn copy(&self) -> Option<String> {
        self.editor()?.selected_text()
    }

    /// Removes the selection and returns its text.
    pub fn cut(&mut self) -> Option<String> {
        let MountState::Mounted(handle) = &mut self.state else {
            return None;
        };
        let text = handle.editor.selected_text()?;
        handle.editor.replace_selection("", Origin::Delete);
        self.follow_cursor = true;
        Some(text)
    }

    /// Scrolls the view without moving the caret.
    pub fn scroll(&mut self, lines: isize) {
        if let MountState::Mounted(handle) = &mut self.state {
            let offset = handle.editor.scroll_offset().saturating_add_signed(lines);
            handle.editor.set_scroll_offset(offset);
            self.follow_cursor = false;
        }
    }

    // ==================== Accessors ====================

    pub fn is_mounted(&self) -> bool {
        matches!(self.state, MountState::Mounted(_))
    }

    pub fn state(&self) -> &MountState {
        &self.state
    }

    pub fn editor(&self) -> Option<&Editor> {
        match &self.state {
            MountState::Mounted(handle) => Some(&handle.editor),
            MountState::Unmounted => None,
        }
    }

    /// Direct engine access for hosts that dispatch their own
    /// transactions.
    pub fn editor_mut(&mut self) -> Option<&mut Editor> {
        match &mut self.state {
            MountState::Mounted(handle) => Some(&mut handle.editor),
            MountState::Unmounted => None,
        }
    }

    pub fn text(&self) -> Option<String> {
        self.editor().map(Editor::text)
    }

    pub fn font_size(&self) -> Option<f32> {
        self.editor().map(|e| e.configuration().font_size())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn container(&self) -> Option<Container> {
        match &self.state {
            MountState::Mounted(handle) => Some(handle.container),
            MountState::Unmounted => None,
        }
    }

    /// Where the terminal cursor belongs after the last render.
    pub fn cursor_screen_position(&self) -> Option<(u16, u16)> {
        self.cursor_screen
    }
}

impl Drop for SqlEditor {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Widget for &mut SqlEditor {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let error = self.error.clone().filter(|e| !e.is_empty());
        let layout = view::split(area, error.as_deref());

        if let Some(container) = Container::from_rect(area) {
            self.resize(container);
        }

        self.cursor_screen = match &mut self.state {
            MountState::Mounted(handle) => {
                // The banner takes rows from the container.
                handle
                    .editor
                    .set_visible_lines(layout.editor.height as usize);
                view::render_editor(&mut handle.editor, layout.editor, buf, self.follow_cursor)
            }
            MountState::Unmounted => None,
        };

        if let (Some(error), Some(banner)) = (error.as_deref(), layout.banner) {
            let theme = match self.editor() {
                Some(editor) => editor.theme().clone(),
                None => Theme::for_kind(self.theme),
            };
            view::render_error_banner(error, &theme, banner, buf);
        }
    }
}
