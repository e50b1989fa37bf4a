//! Text buffer implementation using ropey.

use ropey::Rope;

/// A text buffer backed by a rope data structure.
/// All offsets are character indices unless the method name says bytes.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self::from_str(text)
    }
}

impl TextBuffer {
    /// Creates a new empty text buffer.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Creates a text buffer from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Returns the total number of characters in the buffer.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the total number of bytes in the buffer.
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Returns the total number of lines in the buffer.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Compares the buffer contents with `text` without allocating.
    pub fn eq_str(&self, text: &str) -> bool {
        self.rope == text
    }

    /// Inserts a string at the given character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) {
        let idx = char_idx.min(self.len_chars());
        self.rope.insert(idx, text);
    }

    /// Removes text in the given character range.
    pub fn remove(&mut self, start: usize, end: usize) {
        let start = start.min(self.len_chars());
        let end = end.min(self.len_chars());
        if start < end {
            self.rope.remove(start..end);
        }
    }

    /// Returns the character at the given index, if it exists.
    pub fn char_at(&self, char_idx: usize) -> Option<char> {
        if char_idx < self.len_chars() {
            Some(self.rope.char(char_idx))
        } else {
            None
        }
    }

    /// Returns the text in the given character range, clamped to the buffer.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.len_chars());
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    /// Converts a character index to a byte offset.
    pub fn char_to_byte(&self, char_idx: usize) -> usize {
        self.rope.char_to_byte(char_idx.min(self.len_chars()))
    }

    /// Converts a character index to a (row, byte column) point, the
    /// coordinate system tree-sitter works in.
    pub fn byte_point(&self, char_idx: usize) -> (usize, usize) {
        let char_idx = char_idx.min(self.len_chars());
        let line = self.rope.char_to_line(char_idx);
        let byte = self.rope.char_to_byte(char_idx);
        (line, byte - self.rope.line_to_byte(line))
    }

    /// Converts a character index to a (line, column) position.
    /// Both line and column are 0-indexed.
    pub fn char_to_line_col(&self, char_idx: usize) -> (usize, usize) {
        let char_idx = char_idx.min(self.len_chars());
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        (line, char_idx - line_start)
    }

    /// Converts a (line, column) position to a character index.
    /// Columns past the end of the line clamp to the line end.
    pub fn line_col_to_char(&self, line: usize, col: usize) -> usize {
        if line >= self.len_lines() {
            return self.len_chars();
        }
        self.rope.line_to_char(line) + col.min(self.line_len_chars(line))
    }

    /// Returns the length of a line in characters (excluding newline).
    pub fn line_len_chars(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Returns the character index of the start of a line.
    pub fn line_start(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            self.len_chars()
        } else {
            self.rope.line_to_char(line)
        }
    }

    /// Returns the character index of the end of a line (before newline).
    pub fn line_end(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            self.len_chars()
        } else {
            self.rope.line_to_char(line) + self.line_len_chars(line)
        }
    }

    /// Returns the line at the given index, without its newline.
    pub fn line(&self, line: usize) -> Option<String> {
        if line >= self.len_lines() {
            return None;
        }
        let mut s = self.rope.line(line).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        Some(s)
    }

    /// Returns the leading whitespace of a line.
    pub fn leading_whitespace(&self, line: usize) -> String {
        self.line(line)
            .map(|text| {
                text.chars()
                    .take_while(|c| *c == ' ' || *c == '\t')
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the column of the first non-whitespace character of a line,
    /// or the line length if the line is blank.
    pub fn first_non_whitespace_col(&self, line: usize) -> usize {
        self.leading_whitespace(line).chars().count()
    }

    /// Finds the start of the word to the left of `char_idx`.
    /// Whitespace is skipped first, then a run of word characters or a run
    /// of punctuation.
    pub fn find_word_boundary_left(&self, char_idx: usize) -> usize {
        let mut pos = char_idx.min(self.len_chars());
        while pos > 0 && self.char_at(pos - 1).is_some_and(|c| c.is_whitespace()) {
            pos -= 1;
        }
        let Some(kind) = pos.checked_sub(1).and_then(|p| self.char_at(p)).map(char_class) else {
            return pos;
        };
        while pos > 0 && self.char_at(pos - 1).map(char_class) == Some(kind) {
            pos -= 1;
        }
        pos
    }

    /// Finds the end of the word to the right of `char_idx`.
    pub fn find_word_boundary_right(&self, char_idx: usize) -> usize {
        let len = self.len_chars();
        let mut pos = char_idx.min(len);
        while pos < len && self.char_at(pos).is_some_and(|c| c.is_whitespace()) {
            pos += 1;
        }
        let Some(kind) = self.char_at(pos).map(char_class) else {
            return pos;
        };
        while pos < len && self.char_at(pos).map(char_class) == Some(kind) {
            pos += 1;
        }
        pos
    }

    /// Returns the entire buffer as a string.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Punctuation,
    Space,
}

fn char_class(ch: char) -> CharClass {
    if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else if ch.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Punctuation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer() {
        let buf = TextBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len_chars(), 0);
        assert_eq!(buf.len_lines(), 1); // Empty buffer has 1 line
    }

    #[test]
    fn test_insert_and_remove() {
        let mut buf = TextBuffer::new();
        buf.insert(0, "SELECT");
        buf.insert(6, " 1");
        assert_eq!(buf.text(), "SELECT 1");
        buf.remove(6, 8);
        assert_eq!(buf.text(), "SELECT");
    }

    #[test]
    fn test_eq_str() {
        let buf = TextBuffer::from_str("SELECT 1");
        assert!(buf.eq_str("SELECT 1"));
        assert!(!buf.eq_str("SELECT 2"));
        assert!(TextBuffer::new().eq_str(""));
    }

    #[test]
    fn test_line_operations() {
        let buf = TextBuffer::from_str("SELECT *\nFROM t\nWHERE x = 1");
        assert_eq!(buf.len_lines(), 3);
        assert_eq!(buf.line(0), Some("SELECT *".to_string()));
        assert_eq!(buf.line(2), Some("WHERE x = 1".to_string()));
        assert_eq!(buf.line(3), None);
        assert_eq!(buf.line_len_chars(1), 6);
        assert_eq!(buf.line_start(1), 9);
        assert_eq!(buf.line_end(1), 15);
    }

    #[test]
    fn test_char_to_line_col_round_trip_points() {
        let buf = TextBuffer::from_str("abc\ndefgh");
        assert_eq!(buf.char_to_line_col(3), (0, 3)); // newline char
        assert_eq!(buf.char_to_line_col(4), (1, 0));
        assert_eq!(buf.line_col_to_char(1, 2), 6);
        assert_eq!(buf.line_col_to_char(0, 99), 3);
    }

    #[test]
    fn test_byte_point_counts_multibyte_columns() {
        let buf = TextBuffer::from_str("é\n'ü'");
        assert_eq!(buf.byte_point(1), (0, 2));
        assert_eq!(buf.byte_point(4), (1, 3));
        assert_eq!(buf.char_to_byte(2), 3);
    }

    #[test]
    fn test_word_boundaries() {
        let buf = TextBuffer::from_str("SELECT user_id, name");
        assert_eq!(buf.find_word_boundary_right(0), 6);
        assert_eq!(buf.find_word_boundary_right(6), 14);
        assert_eq!(buf.find_word_boundary_right(14), 15);
        assert_eq!(buf.find_word_boundary_left(20), 16);
        assert_eq!(buf.find_word_boundary_left(16), 14);
        assert_eq!(buf.find_word_boundary_left(14), 7);
    }

    #[test]
    fn test_leading_whitespace() {
        let buf = TextBuffer::from_str("SELECT\n    a,\n\t b");
        assert_eq!(buf.leading_whitespace(0), "");
        assert_eq!(buf.leading_whitespace(1), "    ");
        assert_eq!(buf.first_non_whitespace_col(2), 2);
    }
}
