//! Cursor and selection handling.

use crate::buffer::TextBuffer;
use crate::change::{Assoc, ChangeSet};

/// Represents a position in the buffer as (line, column).
/// Both are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// A text selection with an anchor and a cursor position.
/// When anchor == cursor, there is no active selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// The anchor point (where selection started).
    pub anchor: usize,
    /// The cursor position (where selection ends / caret is).
    pub cursor: usize,
}

impl Selection {
    /// Creates a collapsed selection at the given position.
    pub fn new(pos: usize) -> Self {
        Self {
            anchor: pos,
            cursor: pos,
        }
    }

    /// Creates a selection from anchor to cursor.
    pub fn with_range(anchor: usize, cursor: usize) -> Self {
        Self { anchor, cursor }
    }

    /// Returns true if there's an active selection (anchor != cursor).
    pub fn has_selection(&self) -> bool {
        self.anchor != self.cursor
    }

    /// Returns the start and end of the selection (ordered).
    pub fn range(&self) -> (usize, usize) {
        if self.anchor <= self.cursor {
            (self.anchor, self.cursor)
        } else {
            (self.cursor, self.anchor)
        }
    }

    /// Returns the selected range, or None if no selection.
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        if self.has_selection() {
            Some(self.range())
        } else {
            None
        }
    }

    /// Sets the cursor position, optionally extending the selection.
    pub fn set_cursor(&mut self, pos: usize, extend: bool) {
        self.cursor = pos;
        if !extend {
            self.anchor = pos;
        }
    }

    /// Maps both ends of the selection through a change set.
    ///
    /// A collapsed selection sticks to the text after it, so typing at the
    /// caret pushes it forward. A caret at the start of a replaced range
    /// stays at the start. Ranged selections keep inserted text at their
    /// edges outside.
    pub fn map(&self, changes: &ChangeSet) -> Selection {
        if !self.has_selection() {
            let replaced_here = changes
                .changes()
                .iter()
                .any(|c| c.from == self.cursor && c.from < c.to);
            let assoc = if replaced_here { Assoc::Before } else { Assoc::After };
            return Selection::new(changes.map_pos(self.cursor, assoc));
        }
        let (start, end) = self.range();
        let start = changes.map_pos(start, Assoc::After);
        let end = changes.map_pos(end, Assoc::Before).max(start);
        if self.anchor <= self.cursor {
            Selection::with_range(start, end)
        } else {
            Selection::with_range(end, start)
        }
    }
}

/// Cursor that handles movement relative to a buffer.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    /// Current selection (includes cursor position).
    pub selection: Selection,
    /// Preferred column for vertical movement.
    /// This preserves the column when moving through lines of varying length.
    preferred_col: Option<usize>,
}

impl Cursor {
    /// Creates a new cursor at position 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cursor holding the given selection.
    pub fn with_selection(selection: Selection) -> Self {
        Self {
            selection,
            preferred_col: None,
        }
    }

    /// Returns the current cursor position (character index).
    pub fn position(&self) -> usize {
        self.selection.cursor
    }

    /// Sets the cursor position, optionally extending the selection.
    pub fn set_position(&mut self, pos: usize, extend: bool) {
        self.selection.set_cursor(pos, extend);
        self.preferred_col = None;
    }

    /// Replaces the whole selection.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.preferred_col = None;
    }

    /// Returns true if there's an active selection.
    pub fn has_selection(&self) -> bool {
        self.selection.has_selection()
    }

    /// Returns the selected range, or None if no selection.
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        self.selection.selected_range()
    }

    /// Moves cursor left by one character.
    /// Without `extend`, a ranged selection collapses to its start.
    pub fn move_left(&mut self, extend: bool) {
        let pos = match self.selection.selected_range() {
            Some((start, _)) if !extend => start,
            _ => self.selection.cursor.saturating_sub(1),
        };
        self.set_position(pos, extend);
    }

    /// Moves cursor right by one character.
    pub fn move_right(&mut self, buffer: &TextBuffer, extend: bool) {
        let pos = match self.selection.selected_range() {
            Some((_, end)) if !extend => end,
            _ => (self.selection.cursor + 1).min(buffer.len_chars()),
        };
        self.set_position(pos, extend);
    }

    /// Moves cursor left by one word.
    pub fn move_word_left(&mut self, buffer: &TextBuffer, extend: bool) {
        let pos = buffer.find_word_boundary_left(self.selection.cursor);
        self.set_position(pos, extend);
    }

    /// Moves cursor right by one word.
    pub fn move_word_right(&mut self, buffer: &TextBuffer, extend: bool) {
        let pos = buffer.find_word_boundary_right(self.selection.cursor);
        self.set_position(pos, extend);
    }

    /// Moves cursor up by `lines` lines, keeping the preferred column.
    /// On the first line the cursor goes to the document start.
    pub fn move_up(&mut self, buffer: &TextBuffer, lines: usize, extend: bool) {
        let (line, col) = buffer.char_to_line_col(self.selection.cursor);
        let target_col = *self.preferred_col.get_or_insert(col);

        if line > 0 {
            let target = line.saturating_sub(lines);
            let new_pos = buffer.line_col_to_char(target, target_col);
            self.selection.set_cursor(new_pos, extend);
        } else {
            self.selection.set_cursor(0, extend);
            self.preferred_col = None;
        }
    }

    /// Moves cursor down by `lines` lines, keeping the preferred column.
    /// On the last line the cursor goes to the document end.
    pub fn move_down(&mut self, buffer: &TextBuffer, lines: usize, extend: bool) {
        let (line, col) = buffer.char_to_line_col(self.selection.cursor);
        let target_col = *self.preferred_col.get_or_insert(col);
        let last = buffer.len_lines().saturating_sub(1);

        if line < last {
            let target = (line + lines).min(last);
            let new_pos = buffer.line_col_to_char(target, target_col);
            self.selection.set_cursor(new_pos, extend);
        } else {
            self.selection.set_cursor(buffer.len_chars(), extend);
            self.preferred_col = None;
        }
    }

    /// Smart Home: toggles between the first non-whitespace character and
    /// the line start.
    pub fn move_to_line_start(&mut self, buffer: &TextBuffer, extend: bool) {
        let (line, col) = buffer.char_to_line_col(self.selection.cursor);
        let line_start = buffer.line_start(line);
        let indent = buffer.first_non_whitespace_col(line);

        let new_pos = if indent == buffer.line_len_chars(line) || col == indent {
            line_start
        } else {
            line_start + indent
        };
        self.set_position(new_pos, extend);
    }

    /// Moves cursor to the end of the current line.
    pub fn move_to_line_end(&mut self, buffer: &TextBuffer, extend: bool) {
        let (line, _) = buffer.char_to_line_col(self.selection.cursor);
        self.set_position(buffer.line_end(line), extend);
    }

    /// Moves cursor to the start of the buffer.
    pub fn move_to_buffer_start(&mut self, extend: bool) {
        self.set_position(0, extend);
    }

    /// Moves cursor to the end of the buffer.
    pub fn move_to_buffer_end(&mut self, buffer: &TextBuffer, extend: bool) {
        self.set_position(buffer.len_chars(), extend);
    }

    /// Selects the whole buffer, caret at the end.
    pub fn select_all(&mut self, buffer: &TextBuffer) {
        self.set_selection(Selection::with_range(0, buffer.len_chars()));
    }

    /// Clamps the cursor position to valid buffer bounds.
    pub fn clamp_to_buffer(&mut self, buffer: &TextBuffer) {
        let max = buffer.len_chars();
        self.selection.cursor = self.selection.cursor.min(max);
        self.selection.anchor = self.selection.anchor.min(max);
    }

    /// Returns the caret as a (line, column) position.
    pub fn line_col(&self, buffer: &TextBuffer) -> Position {
        let (line, col) = buffer.char_to_line_col(self.selection.cursor);
        Position::new(line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;

    #[test]
    fn test_selection_range() {
        let sel = Selection::with_range(10, 5);
        assert_eq!(sel.range(), (5, 10));
        assert!(sel.has_selection());
        assert_eq!(Selection::new(3).selected_range(), None);
    }

    #[test]
    fn test_cursor_movement() {
        let buffer = TextBuffer::from_str("SELECT\nFROM");
        let mut cursor = Cursor::new();

        cursor.move_right(&buffer, false);
        assert_eq!(cursor.position(), 1);

        cursor.move_down(&buffer, 1, false);
        assert_eq!(cursor.position(), 8); // line 1, col 1

        cursor.move_left(false);
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn test_preferred_column() {
        let buffer = TextBuffer::from_str("SELECT name\nFROM\nWHERE id = 1");
        let mut cursor = Cursor::new();
        cursor.set_position(9, false); // line 0, col 9

        cursor.move_down(&buffer, 1, false);
        assert_eq!(cursor.line_col(&buffer), Position::new(1, 4));

        cursor.move_down(&buffer, 1, false);
        assert_eq!(cursor.line_col(&buffer), Position::new(2, 9));
    }

    #[test]
    fn test_vertical_motion_at_edges() {
        let buffer = TextBuffer::from_str("ab\ncd");
        let mut cursor = Cursor::new();
        cursor.set_position(1, false);
        cursor.move_up(&buffer, 1, false);
        assert_eq!(cursor.position(), 0);

        cursor.set_position(4, false);
        cursor.move_down(&buffer, 1, false);
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn test_smart_home() {
        let buffer = TextBuffer::from_str("    WHERE x");
        let mut cursor = Cursor::new();
        cursor.set_position(10, false);

        cursor.move_to_line_start(&buffer, false);
        assert_eq!(cursor.position(), 4);

        cursor.move_to_line_start(&buffer, false);
        assert_eq!(cursor.position(), 0);

        cursor.move_to_line_start(&buffer, false);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_selection_extend() {
        let buffer = TextBuffer::from_str("SELECT 1");
        let mut cursor = Cursor::new();

        cursor.move_right(&buffer, true);
        cursor.move_right(&buffer, true);
        assert_eq!(cursor.selected_range(), Some((0, 2)));

        cursor.move_right(&buffer, false);
        assert_eq!(cursor.position(), 2);
        assert!(!cursor.has_selection());
    }

    #[test]
    fn test_map_collapsed_selection_through_insert() {
        let changes = ChangeSet::new(vec![Change::insert(2, "xy")]);
        assert_eq!(Selection::new(2).map(&changes), Selection::new(4));
        assert_eq!(Selection::new(1).map(&changes), Selection::new(1));
    }

    #[test]
    fn test_map_caret_at_start_of_replace() {
        let changes = ChangeSet::new(vec![Change::replace(0, 8, "SELECT 2")]);
        assert_eq!(Selection::new(0).map(&changes), Selection::new(0));
        assert_eq!(Selection::new(8).map(&changes), Selection::new(8));

        let changes = ChangeSet::new(vec![Change::replace(3, 5, "abc")]);
        assert_eq!(Selection::new(3).map(&changes), Selection::new(3));
        assert_eq!(Selection::new(4).map(&changes), Selection::new(6));
    }

    #[test]
    fn test_map_ranged_selection_keeps_direction() {
        let changes = ChangeSet::new(vec![Change::delete(0, 2)]);
        let mapped = Selection::with_range(6, 3).map(&changes);
        assert_eq!(mapped, Selection::with_range(4, 1));
    }
}
