//! Main editor logic.
//!
//! [`Editor`] owns the document, selection, history, configuration and
//! keymaps. Every document mutation goes through [`Editor::dispatch`], which
//! keeps the syntax tree current and notifies update listeners before
//! returning.

use crate::brackets::{self, BracketMatch};
use crate::buffer::TextBuffer;
use crate::change::{Assoc, Change, ChangeSet, Origin, Transaction};
use crate::compartment::{Compartment, ConfigError, Configuration, Setting};
use crate::cursor::{Cursor, Position, Selection};
use crate::history::{History, HistoryStep};
use crate::keymap::{Binding, EditCommand, KeyAction, KeyChord, Keymap, KeymapStack, Motion, Precedence};
use crate::syntax::{SyntaxHighlighter, Theme};

/// Handle returned by [`Editor::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Notification delivered to update listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The document text changed. Carries the full new text.
    DocChanged { text: String, origin: Origin },
    /// A keymap emitted a named intent, e.g. `execute`.
    Intent(String),
    /// One compartment was replaced.
    Reconfigured {
        compartment: Compartment,
        setting: Setting,
    },
}

/// What a dispatched transaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Update {
    pub doc_changed: bool,
    pub selection_changed: bool,
}

/// Result of feeding a key chord to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key was consumed and must not reach anything else.
    Handled,
    /// No binding wanted the key.
    Ignored,
}

impl KeyOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, KeyOutcome::Handled)
    }
}

type Listener = Box<dyn FnMut(&EditorEvent)>;

/// The main editor state.
pub struct Editor {
    /// The text buffer.
    buffer: TextBuffer,
    /// The cursor.
    cursor: Cursor,
    /// Undo/redo history.
    history: History,
    config: Configuration,
    keymaps: KeymapStack,
    /// Syntax highlighter.
    highlighter: SyntaxHighlighter,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    /// Number of visible lines (for page up/down).
    visible_lines: usize,
    /// First visible line.
    scroll_offset: usize,
    /// Closers inserted by auto-closing that typing may step over.
    auto_closers: Vec<usize>,
    destroyed: bool,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("len_chars", &self.buffer.len_chars())
            .field("selection", &self.cursor.selection)
            .field("undo_depth", &self.history.undo_depth())
            .field("listeners", &self.listeners.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new("", Configuration::default())
    }
}

impl Editor {
    /// Creates an editor holding `doc`, caret at the start, with the
    /// default keymap installed.
    pub fn new(doc: &str, config: Configuration) -> Self {
        let mut highlighter = SyntaxHighlighter::new();
        highlighter.set_theme(Theme::for_kind(config.theme()));
        highlighter.set_language(config.language());

        let mut keymaps = KeymapStack::new();
        keymaps.push(Precedence::Default, Keymap::default_keymap());

        let mut editor = Self {
            buffer: TextBuffer::from_str(doc),
            cursor: Cursor::new(),
            history: History::default(),
            config,
            keymaps,
            highlighter,
            listeners: Vec::new(),
            next_listener: 0,
            visible_lines: 40,
            scroll_offset: 0,
            auto_closers: Vec::new(),
            destroyed: false,
        };
        editor.reparse();
        editor
    }

    // ==================== Accessors ====================

    /// Returns a reference to the buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// The whole document.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn selection(&self) -> Selection {
        self.cursor.selection
    }

    /// Returns the cursor position as (line, column).
    pub fn cursor_position(&self) -> Position {
        self.cursor.line_col(&self.buffer)
    }

    /// Returns the cursor character index.
    pub fn cursor_char_index(&self) -> usize {
        self.cursor.position()
    }

    /// Returns the selected range if any, as character indices.
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        self.cursor.selected_range()
    }

    pub fn selected_text(&self) -> Option<String> {
        self.selected_range()
            .map(|(start, end)| self.buffer.slice(start, end))
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn highlighter(&self) -> &SyntaxHighlighter {
        &self.highlighter
    }

    pub fn theme(&self) -> &Theme {
        self.highlighter.theme()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The bracket next to the caret and its partner, when bracket
    /// matching is enabled.
    pub fn bracket_match(&self) -> Option<BracketMatch> {
        if !self.config.flag(Compartment::BRACKET_MATCHING) || self.cursor.has_selection() {
            return None;
        }
        brackets::match_at(&self.buffer, self.cursor.position())
    }

    // ==================== Scrolling ====================

    /// Returns the scroll offset (first visible line).
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Sets the scroll offset directly.
    pub fn set_scroll_offset(&mut self, offset: usize) {
        let max_offset = self.buffer.len_lines().saturating_sub(1);
        self.scroll_offset = offset.min(max_offset);
    }

    /// Sets the number of visible lines.
    pub fn set_visible_lines(&mut self, lines: usize) {
        self.visible_lines = lines.max(1);
    }

    /// Returns the number of visible lines.
    pub fn visible_lines(&self) -> usize {
        self.visible_lines
    }

    /// Scrolls to ensure the cursor line is visible.
    pub fn scroll_to_cursor(&mut self) {
        let line = self.cursor_position().line;
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset + self.visible_lines {
            self.scroll_offset = line + 1 - self.visible_lines;
        }
    }

    // ==================== Listeners and keymaps ====================

    /// Registers an update listener.
    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self, event: EditorEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    pub fn add_keymap(&mut self, precedence: Precedence, keymap: Keymap) {
        self.keymaps.push(precedence, keymap);
    }

    /// Tears the editor down. Listeners are dropped and later transactions
    /// are ignored.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        log::debug!("Destroying editor with {} listener(s)", self.listeners.len());
        self.listeners.clear();
        self.destroyed = true;
    }

    // ==================== Configuration ====================

    /// Replaces one compartment and applies it without rebuilding anything
    /// else.
    pub fn reconfigure(
        &mut self,
        compartment: Compartment,
        setting: Setting,
    ) -> Result<(), ConfigError> {
        let previous = self.config.reconfigure(compartment, setting)?;
        if previous == setting {
            return Ok(());
        }
        log::debug!("Reconfigured {compartment}: {previous:?} -> {setting:?}");

        match setting {
            Setting::Theme(kind) if compartment == Compartment::THEME => {
                self.highlighter.set_theme(Theme::for_kind(kind));
            }
            Setting::Language(language) if compartment == Compartment::LANGUAGE => {
                self.highlighter.set_language(language);
                self.reparse();
            }
            _ => {}
        }

        self.notify(EditorEvent::Reconfigured {
            compartment,
            setting,
        });
        Ok(())
    }

    // ==================== Transactions ====================

    /// Applies a transaction: changes, history, selection, syntax, then
    /// listeners.
    pub fn dispatch(&mut self, transaction: Transaction) -> Update {
        if self.destroyed {
            log::warn!("Ignoring {} transaction on a destroyed editor", transaction.origin.as_str());
            return Update::default();
        }

        let before = self.cursor.selection;
        let doc_changed = transaction.changes_document();

        if doc_changed {
            let inverse = self.apply_changes(&transaction.changes);
            let after = transaction
                .selection
                .unwrap_or_else(|| before.map(&transaction.changes));
            self.cursor.set_selection(after);
            self.cursor.clamp_to_buffer(&self.buffer);

            if transaction.add_to_history {
                self.history.record(
                    HistoryStep::new(transaction.changes, inverse),
                    transaction.origin,
                    before,
                    self.cursor.selection,
                );
            }
        } else if let Some(selection) = transaction.selection {
            self.cursor.set_selection(selection);
            self.cursor.clamp_to_buffer(&self.buffer);
        }

        self.scroll_to_cursor();
        let update = Update {
            doc_changed,
            selection_changed: self.cursor.selection != before,
        };
        if doc_changed {
            self.notify(EditorEvent::DocChanged {
                text: self.buffer.text(),
                origin: transaction.origin,
            });
        }
        update
    }

    /// Applies a change set to the buffer and syntax tree. Returns the
    /// inverse.
    fn apply_changes(&mut self, changes: &ChangeSet) -> ChangeSet {
        self.map_auto_closers(changes);
        let [change] = changes.changes() else {
            let inverse = changes.apply(&mut self.buffer);
            self.reparse();
            return inverse;
        };

        let start_byte = self.buffer.char_to_byte(change.from);
        let old_end_byte = self.buffer.char_to_byte(change.to);
        let start_position = self.buffer.byte_point(change.from);
        let old_end_position = self.buffer.byte_point(change.to);

        let inverse = changes.apply(&mut self.buffer);

        let new_end = change.from + change.inserted_len();
        let new_end_byte = self.buffer.char_to_byte(new_end);
        let new_end_position = self.buffer.byte_point(new_end);
        let source = self.buffer.text();
        self.highlighter.edit(
            &source,
            self.buffer.len_lines(),
            start_byte,
            old_end_byte,
            new_end_byte,
            start_position,
            old_end_position,
            new_end_position,
        );
        inverse
    }

    /// Moves tracked closers along with the text. A closer inside a
    /// replaced or deleted range is forgotten.
    fn map_auto_closers(&mut self, changes: &ChangeSet) {
        self.auto_closers.retain(|&pos| {
            !changes
                .changes()
                .iter()
                .any(|c| c.from <= pos && pos < c.to)
        });
        for pos in &mut self.auto_closers {
            *pos = changes.map_pos(*pos, Assoc::After);
        }
    }

    fn reparse(&mut self) {
        let source = self.buffer.text();
        self.highlighter.parse(&source, self.buffer.len_lines());
    }

    /// Moves the selection without touching the document.
    pub fn set_selection(&mut self, selection: Selection) {
        self.dispatch(Transaction::select(selection));
    }

    /// Replaces the selection (or inserts at the caret) with `text`.
    pub fn replace_selection(&mut self, text: &str, origin: Origin) -> Update {
        let (from, to) = self.cursor.selection.range();
        let caret = from + text.chars().count();
        self.dispatch(
            Transaction::new(ChangeSet::single(Change::replace(from, to, text)), origin)
                .with_selection(Selection::new(caret)),
        )
    }

    // ==================== Keys ====================

    /// Runs the highest precedence binding for `chord` that handles it.
    /// An unbound printable chord types its character.
    pub fn handle_key(&mut self, chord: KeyChord) -> KeyOutcome {
        if self.destroyed {
            return KeyOutcome::Ignored;
        }

        let bindings: Vec<Binding> = self.keymaps.lookup(chord).cloned().collect();
        for binding in bindings {
            let handled = match binding.action {
                KeyAction::Command(command) => self.run_command(command),
                KeyAction::Emit(intent) => {
                    log::debug!("Key {chord:?} emitted intent {intent:?}");
                    self.notify(EditorEvent::Intent(intent));
                    true
                }
            };
            if handled || binding.prevent_default {
                return KeyOutcome::Handled;
            }
        }

        match chord.text() {
            Some(ch) => {
                self.type_char(ch);
                KeyOutcome::Handled
            }
            None => KeyOutcome::Ignored,
        }
    }

    /// Runs an editing command. Returns false when it had nothing to do.
    pub fn run_command(&mut self, command: EditCommand) -> bool {
        match command {
            EditCommand::Move(motion) => self.apply_motion(motion, false),
            EditCommand::Select(motion) => self.apply_motion(motion, true),
            EditCommand::SelectAll => {
                let mut cursor = self.cursor.clone();
                cursor.select_all(&self.buffer);
                self.set_selection(cursor.selection);
                true
            }
            EditCommand::InsertNewline => self.insert_newline(),
            EditCommand::InsertTab => self.insert_tab(),
            EditCommand::DeleteBackward => self.delete_backward(),
            EditCommand::DeleteForward => self.delete_forward(),
            EditCommand::DeleteWordBackward => {
                let target = self.buffer.find_word_boundary_left(self.cursor.position());
                self.delete_to(target)
            }
            EditCommand::DeleteWordForward => {
                let target = self.buffer.find_word_boundary_right(self.cursor.position());
                self.delete_to(target)
            }
            EditCommand::ToggleComment => self.toggle_comment(),
            EditCommand::Undo => self.undo(),
            EditCommand::Redo => self.redo(),
        }
    }

    fn apply_motion(&mut self, motion: Motion, extend: bool) -> bool {
        let buffer = &self.buffer;
        let mut cursor = self.cursor.clone();
        match motion {
            Motion::CharLeft => cursor.move_left(extend),
            Motion::CharRight => cursor.move_right(buffer, extend),
            Motion::WordLeft => cursor.move_word_left(buffer, extend),
            Motion::WordRight => cursor.move_word_right(buffer, extend),
            Motion::LineUp => cursor.move_up(buffer, 1, extend),
            Motion::LineDown => cursor.move_down(buffer, 1, extend),
            Motion::LineStart => cursor.move_to_line_start(buffer, extend),
            Motion::LineEnd => cursor.move_to_line_end(buffer, extend),
            Motion::PageUp => cursor.move_up(buffer, self.visible_lines, extend),
            Motion::PageDown => cursor.move_down(buffer, self.visible_lines, extend),
            Motion::DocStart => cursor.move_to_buffer_start(extend),
            Motion::DocEnd => cursor.move_to_buffer_end(buffer, extend),
        }
        // Keep the preferred column across vertical moves.
        self.cursor = cursor;
        self.scroll_to_cursor();
        true
    }

    // ==================== Text Editing ====================

    /// Types one character, with bracket auto-closing when enabled.
    pub fn type_char(&mut self, ch: char) {
        if !self.config.flag(Compartment::CLOSE_BRACKETS) {
            self.replace_selection(&ch.to_string(), Origin::Input);
            return;
        }

        let (from, to) = self.cursor.selection.range();
        let closer = brackets::closer_for(ch);

        if from == to && self.buffer.char_at(from) == Some(ch) {
            if let Some(i) = self.auto_closers.iter().position(|&pos| pos == from) {
                // Step over a closer we inserted instead of doubling it.
                self.auto_closers.swap_remove(i);
                self.set_selection(Selection::new(from + 1));
                return;
            }
        }

        match closer {
            Some(close) if from != to => {
                let changes = ChangeSet::new(vec![
                    Change::insert(from, ch.to_string()),
                    Change::insert(to, close.to_string()),
                ]);
                self.dispatch(
                    Transaction::new(changes, Origin::Input)
                        .with_selection(Selection::with_range(from + 1, to + 1)),
                );
            }
            Some(close) if self.can_auto_close(ch, from) => {
                self.dispatch(
                    Transaction::new(
                        ChangeSet::single(Change::insert(from, format!("{ch}{close}"))),
                        Origin::Input,
                    )
                    .with_selection(Selection::new(from + 1)),
                );
                self.auto_closers.push(from + 1);
            }
            _ => {
                self.replace_selection(&ch.to_string(), Origin::Input);
            }
        }
    }

    fn can_auto_close(&self, ch: char, pos: usize) -> bool {
        if !brackets::is_safe_auto_close_position(&self.buffer, pos) {
            return false;
        }
        // Quotes right after a word character are apostrophes or closers.
        if ch == '\'' || ch == '"' {
            let prev = pos.checked_sub(1).and_then(|p| self.buffer.char_at(p));
            return !prev.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == ch);
        }
        true
    }

    fn indent_unit(&self) -> String {
        " ".repeat(self.config.tab_size())
    }

    /// Inserts a newline keeping the current indentation. Between an empty
    /// bracket pair the closer moves to its own line.
    fn insert_newline(&mut self) -> bool {
        let (from, to) = self.cursor.selection.range();
        let (line, col) = self.buffer.char_to_line_col(from);
        let indent: String = self.buffer.leading_whitespace(line).chars().take(col).collect();

        let split = from == to
            && brackets::is_inside_empty_pair(&self.buffer, from)
            && self.buffer.char_at(from).is_some_and(|c| c != '\'' && c != '"');

        let (text, caret) = if split {
            let unit = self.indent_unit();
            let opened = format!("\n{indent}{unit}");
            let caret = from + opened.chars().count();
            (format!("{opened}\n{indent}"), caret)
        } else {
            let text = format!("\n{indent}");
            let caret = from + text.chars().count();
            (text, caret)
        };

        self.dispatch(
            Transaction::new(ChangeSet::single(Change::replace(from, to, text)), Origin::Command)
                .with_selection(Selection::new(caret)),
        );
        true
    }

    /// Inserts the indent unit, or indents every selected line.
    fn insert_tab(&mut self) -> bool {
        let unit = self.indent_unit();
        let Some((start, end)) = self.cursor.selected_range() else {
            self.replace_selection(&unit, Origin::Command);
            return true;
        };

        let changes = self
            .selected_lines(start, end)
            .map(|line| Change::insert(self.buffer.line_start(line), unit.clone()))
            .collect();
        self.dispatch(Transaction::new(ChangeSet::new(changes), Origin::Command));
        true
    }

    /// Lines touched by a range. A range ending at column 0 does not
    /// include that last line.
    fn selected_lines(&self, start: usize, end: usize) -> std::ops::RangeInclusive<usize> {
        let first = self.buffer.char_to_line_col(start).0;
        let mut last = self.buffer.char_to_line_col(end).0;
        if last > first && end == self.buffer.line_start(last) {
            last -= 1;
        }
        first..=last
    }

    fn delete_backward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let pos = self.cursor.position();
        if pos == 0 {
            return false;
        }
        let (from, to) = if self.config.flag(Compartment::CLOSE_BRACKETS)
            && brackets::is_inside_empty_pair(&self.buffer, pos)
        {
            (pos - 1, pos + 1)
        } else {
            (pos - 1, pos)
        };
        self.dispatch(Transaction::new(
            ChangeSet::single(Change::delete(from, to)),
            Origin::Delete,
        ));
        true
    }

    fn delete_forward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let pos = self.cursor.position();
        if pos >= self.buffer.len_chars() {
            return false;
        }
        self.dispatch(Transaction::new(
            ChangeSet::single(Change::delete(pos, pos + 1)),
            Origin::Delete,
        ));
        true
    }

    fn delete_to(&mut self, target: usize) -> bool {
        if self.delete_selection() {
            return true;
        }
        let pos = self.cursor.position();
        if target == pos {
            return false;
        }
        self.dispatch(
            Transaction::new(ChangeSet::single(Change::delete(pos, target)), Origin::Delete)
                .with_selection(Selection::new(pos.min(target))),
        );
        true
    }

    fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.cursor.selected_range() else {
            return false;
        };
        self.dispatch(
            Transaction::new(ChangeSet::single(Change::delete(start, end)), Origin::Delete)
                .with_selection(Selection::new(start)),
        );
        true
    }

    /// Comments or uncomments the selected lines with the language's line
    /// comment token. Blank lines are left alone.
    fn toggle_comment(&mut self) -> bool {
        let Some(token) = self.config.language().line_comment() else {
            return false;
        };
        let (start, end) = self.cursor.selection.range();
        let lines: Vec<(usize, String)> = self
            .selected_lines(start, end)
            .filter_map(|line| self.buffer.line(line).map(|text| (line, text)))
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return false;
        }

        let commented = lines
            .iter()
            .all(|(_, text)| text.trim_start().starts_with(token));

        let changes: Vec<Change> = if commented {
            lines
                .iter()
                .map(|(line, text)| {
                    let indent = self.buffer.first_non_whitespace_col(*line);
                    let from = self.buffer.line_start(*line) + indent;
                    let rest = &text.trim_start()[token.len()..];
                    let width = token.chars().count() + usize::from(rest.starts_with(' '));
                    Change::delete(from, from + width)
                })
                .collect()
        } else {
            let indent = lines
                .iter()
                .map(|(line, _)| self.buffer.first_non_whitespace_col(*line))
                .min()
                .unwrap_or(0);
            lines
                .iter()
                .map(|(line, _)| Change::insert(self.buffer.line_start(*line) + indent, format!("{token} ")))
                .collect()
        };

        self.dispatch(Transaction::new(ChangeSet::new(changes), Origin::Command));
        true
    }

    // ==================== Undo/Redo ====================

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Reverts the last history group.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some((change_sets, selection)) => {
                self.replay(change_sets, selection, Origin::Undo);
                true
            }
            None => false,
        }
    }

    /// Re-applies the last undone group.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some((change_sets, selection)) => {
                self.replay(change_sets, selection, Origin::Redo);
                true
            }
            None => false,
        }
    }

    fn replay(&mut self, change_sets: Vec<ChangeSet>, selection: Selection, origin: Origin) {
        if self.destroyed {
            return;
        }
        for changes in &change_sets {
            self.apply_changes(changes);
        }
        self.cursor.set_selection(selection);
        self.cursor.clamp_to_buffer(&self.buffer);
        self.scroll_to_cursor();
        self.notify(EditorEvent::DocChanged {
            text: self.buffer.text(),
            origin,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{Key, Modifiers};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor(doc: &str) -> Editor {
        Editor::new(doc, Configuration::default())
    }

    fn type_str(editor: &mut Editor, text: &str) {
        for ch in text.chars() {
            editor.handle_key(KeyChord::ch(ch));
        }
    }

    fn press(editor: &mut Editor, notation: &str) -> KeyOutcome {
        editor.handle_key(KeyChord::parse(notation).unwrap())
    }

    fn record_events(editor: &mut Editor) -> Rc<RefCell<Vec<EditorEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        editor.add_listener(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn test_insert_and_delete() {
        let mut editor = editor("");

        type_str(&mut editor, "select");
        assert_eq!(editor.text(), "select");
        assert_eq!(editor.cursor_char_index(), 6);

        press(&mut editor, "Backspace");
        assert_eq!(editor.text(), "selec");

        press(&mut editor, "ArrowLeft");
        press(&mut editor, "Delete");
        assert_eq!(editor.text(), "sele");
    }

    #[test]
    fn test_newline_keeps_indent() {
        let mut editor = editor("    SELECT a,");
        editor.set_selection(Selection::new(13));
        press(&mut editor, "Enter");
        assert_eq!(editor.text(), "    SELECT a,\n    ");
        assert_eq!(editor.cursor_position(), Position::new(1, 4));
    }

    #[test]
    fn test_newline_splits_bracket_pair() {
        let mut editor = editor("");
        type_str(&mut editor, "count(");
        assert_eq!(editor.text(), "count()");
        press(&mut editor, "Enter");
        assert_eq!(editor.text(), "count(\n    \n)");
        assert_eq!(editor.cursor_position(), Position::new(1, 4));
    }

    #[test]
    fn test_auto_close_and_type_over() {
        let mut editor = editor("");
        type_str(&mut editor, "(1)");
        assert_eq!(editor.text(), "(1)");
        assert_eq!(editor.cursor_char_index(), 3);

        type_str(&mut editor, " 'x'");
        assert_eq!(editor.text(), "(1) 'x'");
    }

    #[test]
    fn test_typed_closer_is_not_stepped_over() {
        let mut editor = editor("f(x)");
        editor.set_selection(Selection::new(3));
        type_str(&mut editor, ")");
        assert_eq!(editor.text(), "f(x))");
        assert_eq!(editor.cursor_char_index(), 4);
    }

    #[test]
    fn test_auto_closer_tracked_through_edits() {
        let mut editor = editor("");
        type_str(&mut editor, "(");
        // An edit before the pair moves the closer.
        editor.set_selection(Selection::new(0));
        type_str(&mut editor, "ab");
        editor.set_selection(Selection::new(3));
        type_str(&mut editor, ")");
        assert_eq!(editor.text(), "ab()");
        assert_eq!(editor.cursor_char_index(), 4);

        // The closer was consumed, so typing it again inserts one.
        editor.set_selection(Selection::new(3));
        type_str(&mut editor, ")");
        assert_eq!(editor.text(), "ab())");
    }

    #[test]
    fn test_no_auto_close_before_word() {
        let mut editor = editor("name");
        type_str(&mut editor, "(");
        assert_eq!(editor.text(), "(name");
    }

    #[test]
    fn test_auto_surround_selection() {
        let mut editor = editor("SELECT a");
        editor.set_selection(Selection::with_range(7, 8));
        type_str(&mut editor, "(");
        assert_eq!(editor.text(), "SELECT (a)");
        assert_eq!(editor.selected_range(), Some((8, 9)));
    }

    #[test]
    fn test_backspace_deletes_empty_pair() {
        let mut editor = editor("");
        type_str(&mut editor, "(");
        press(&mut editor, "Backspace");
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_close_brackets_can_be_disabled() {
        let mut editor = editor("");
        editor
            .reconfigure(Compartment::CLOSE_BRACKETS, Setting::Flag(false))
            .unwrap();
        type_str(&mut editor, "(");
        assert_eq!(editor.text(), "(");
    }

    #[test]
    fn test_toggle_comment() {
        let mut editor = editor("SELECT 1;\n  SELECT 2;");
        press(&mut editor, "Mod-a");
        press(&mut editor, "Mod-/");
        // Tokens line up at the smallest indentation.
        assert_eq!(editor.text(), "-- SELECT 1;\n--   SELECT 2;");

        press(&mut editor, "Mod-a");
        press(&mut editor, "Mod-/");
        assert_eq!(editor.text(), "SELECT 1;\n  SELECT 2;");
    }

    #[test]
    fn test_tab_inserts_indent_unit() {
        let mut editor = editor("");
        press(&mut editor, "Tab");
        assert_eq!(editor.text(), "    ");
    }

    #[test]
    fn test_word_motion_and_delete() {
        let mut editor = editor("SELECT name FROM t");
        editor.set_selection(Selection::new(11));
        press(&mut editor, if cfg!(target_os = "macos") { "Alt-Backspace" } else { "Ctrl-Backspace" });
        assert_eq!(editor.text(), "SELECT  FROM t");
        assert_eq!(editor.cursor_char_index(), 7);
    }

    #[test]
    fn test_select_and_replace() {
        let mut editor = editor("SELECT 1");
        editor.set_selection(Selection::new(8));
        press(&mut editor, "Shift-ArrowLeft");
        assert_eq!(editor.selected_text().as_deref(), Some("1"));
        type_str(&mut editor, "2");
        assert_eq!(editor.text(), "SELECT 2");
    }

    #[test]
    fn test_undo_redo() {
        let mut editor = editor("");
        type_str(&mut editor, "abc");
        assert_eq!(editor.undo_depth(), 1);

        assert!(editor.undo());
        assert_eq!(editor.text(), "");
        assert_eq!(editor.redo_depth(), 1);

        press(&mut editor, "Mod-Shift-z");
        assert_eq!(editor.text(), "abc");
        assert_eq!(editor.cursor_char_index(), 3);
    }

    #[test]
    fn test_dispatch_maps_selection() {
        let mut editor = editor("SELECT 1");
        editor.set_selection(Selection::new(8));
        editor.dispatch(Transaction::new(
            ChangeSet::single(Change::insert(0, "-- q\n")),
            Origin::External,
        ));
        assert_eq!(editor.cursor_char_index(), 13);
    }

    #[test]
    fn test_listeners_receive_origin() {
        let mut editor = editor("");
        let events = record_events(&mut editor);

        type_str(&mut editor, "x");
        editor.dispatch(Transaction::new(
            ChangeSet::replace_all(editor.buffer(), "y"),
            Origin::External,
        ));

        let events = events.borrow();
        assert_eq!(
            *events,
            vec![
                EditorEvent::DocChanged {
                    text: "x".into(),
                    origin: Origin::Input
                },
                EditorEvent::DocChanged {
                    text: "y".into(),
                    origin: Origin::External
                },
            ]
        );
    }

    #[test]
    fn test_selection_only_transaction_does_not_notify() {
        let mut editor = editor("SELECT 1");
        let events = record_events(&mut editor);
        let update = editor.dispatch(Transaction::select(Selection::new(3)));
        assert!(!update.doc_changed);
        assert!(update.selection_changed);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_remove_listener() {
        let mut editor = editor("");
        let events = record_events(&mut editor);
        let id = editor.add_listener(|_| {});
        assert!(editor.remove_listener(id));
        assert!(!editor.remove_listener(id));
        assert_eq!(editor.listener_count(), 1);
        type_str(&mut editor, "a");
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_emit_binding_swallows_key() {
        let mut editor = editor("SELECT 1");
        editor.set_selection(Selection::new(8));
        editor.add_keymap(
            Precedence::Highest,
            Keymap::new().bind_exclusive("Mod-Enter", KeyAction::Emit("execute".into())),
        );
        let events = record_events(&mut editor);

        let chord = KeyChord::new(Key::Enter, Modifiers::primary());
        assert_eq!(editor.handle_key(chord), KeyOutcome::Handled);
        assert_eq!(editor.text(), "SELECT 1");
        assert_eq!(*events.borrow(), vec![EditorEvent::Intent("execute".into())]);
    }

    #[test]
    fn test_unbound_shortcut_is_ignored() {
        let mut editor = editor("");
        assert_eq!(press(&mut editor, "Ctrl-q"), KeyOutcome::Ignored);
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_reconfigure_font_size_keeps_state() {
        let mut editor = editor("");
        type_str(&mut editor, "SELECT 1");
        editor.set_selection(Selection::new(3));
        let depth = editor.undo_depth();
        let events = record_events(&mut editor);

        editor
            .reconfigure(Compartment::FONT_SIZE, Setting::FontSize(16.0))
            .unwrap();

        assert_eq!(editor.configuration().font_size(), 16.0);
        assert_eq!(editor.text(), "SELECT 1");
        assert_eq!(editor.cursor_char_index(), 3);
        assert_eq!(editor.undo_depth(), depth);
        assert!(matches!(
            events.borrow()[0],
            EditorEvent::Reconfigured { compartment: Compartment::FONT_SIZE, .. }
        ));
    }

    #[test]
    fn test_reconfigure_errors_leave_config_untouched() {
        let mut editor = editor("");
        let err = editor
            .reconfigure(Compartment::FONT_SIZE, Setting::FontSize(-1.0))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidFontSize(-1.0));
        assert_eq!(editor.configuration().font_size(), 13.0);
    }

    #[test]
    fn test_destroy_drops_listeners() {
        let mut editor = editor("");
        let events = record_events(&mut editor);
        editor.destroy();
        assert!(editor.is_destroyed());
        assert_eq!(editor.listener_count(), 0);

        editor.dispatch(Transaction::new(
            ChangeSet::single(Change::insert(0, "x")),
            Origin::Input,
        ));
        assert_eq!(editor.text(), "");
        assert!(events.borrow().is_empty());
        assert_eq!(editor.handle_key(KeyChord::ch('a')), KeyOutcome::Ignored);
    }

    #[test]
    fn test_bracket_match() {
        let mut editor = editor("count(a)");
        editor.set_selection(Selection::new(8));
        let m = editor.bracket_match().unwrap();
        assert_eq!((m.bracket, m.partner), (7, Some(5)));

        editor
            .reconfigure(Compartment::BRACKET_MATCHING, Setting::Flag(false))
            .unwrap();
        assert_eq!(editor.bracket_match(), None);
    }

    #[test]
    fn test_syntax_follows_edits() {
        let mut editor = editor("");
        type_str(&mut editor, "SELECT 1");
        assert_eq!(
            editor.highlighter().style_at(0, 0),
            crate::syntax::TokenStyle::Keyword
        );
    }
}
