//! Soft-wrap layout.
//!
//! Splits a logical line into screen rows by display width. Breaks go
//! after the last whitespace that fits; a word longer than the row is cut
//! where the row ends.

use unicode_width::UnicodeWidthChar;

/// Chars `[start, end)` of a logical line shown on one screen row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Cells a character occupies. Tabs take `tab_size` cells; other control
/// characters are drawn as a one-cell replacement glyph.
pub fn char_width(ch: char, tab_size: usize) -> usize {
    match ch {
        '\t' => tab_size.max(1),
        c if c.is_control() => 1,
        c => c.width().unwrap_or(0),
    }
}

/// Total cells of a run of characters.
pub fn display_width(chars: &[char], tab_size: usize) -> usize {
    chars.iter().map(|&c| char_width(c, tab_size)).sum()
}

/// Wraps one line (without its newline) into rows at most `width` cells
/// wide. Always returns at least one segment.
pub fn wrap_line(chars: &[char], width: usize, tab_size: usize) -> Vec<Segment> {
    let width = width.max(1);
    let mut segments = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut used = 0;
        let mut end = start;
        let mut last_break = None;

        while end < chars.len() {
            let w = char_width(chars[end], tab_size);
            if used + w > width && end > start {
                break;
            }
            used += w;
            if chars[end].is_whitespace() {
                last_break = Some(end + 1);
            }
            end += 1;
        }

        if end < chars.len() {
            if let Some(brk) = last_break {
                end = brk;
            }
        }
        segments.push(Segment::new(start, end));
        start = end;
    }

    if segments.is_empty() {
        segments.push(Segment::new(0, 0));
    }
    segments
}

/// Index of the segment that shows column `col`. A column on a row
/// boundary belongs to the following row, except past the line end.
pub fn segment_for_col(segments: &[Segment], col: usize) -> usize {
    segments
        .iter()
        .position(|s| col < s.end)
        .unwrap_or(segments.len().saturating_sub(1))
}
