//! Bracket matching and auto-closing helpers.

use crate::buffer::TextBuffer;

/// How far to scan for a partner bracket before giving up.
const MAX_SCAN_DISTANCE: usize = 10_000;

/// Returns the closer for an opening bracket or quote.
pub fn closer_for(opener: char) -> Option<char> {
    match opener {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '\'' => Some('\''),
        '"' => Some('"'),
        _ => None,
    }
}

fn opener_for(closer: char) -> Option<char> {
    match closer {
        ')' => Some('('),
        ']' => Some('['),
        '}' => Some('{'),
        _ => None,
    }
}

/// True when the character at `pos` allows inserting a closer: whitespace,
/// end of document, a closing bracket or a separator. Auto-closing before
/// a word would wrap an existing identifier.
pub fn is_safe_auto_close_position(buffer: &TextBuffer, pos: usize) -> bool {
    match buffer.char_at(pos) {
        None => true,
        Some(c) => matches!(
            c,
            ' ' | '\t' | '\n' | '\r' | ')' | ']' | '}' | '\'' | '"' | ',' | ';'
        ),
    }
}

/// True when the cursor sits between an empty auto-closed pair like `(|)`.
pub fn is_inside_empty_pair(buffer: &TextBuffer, pos: usize) -> bool {
    let (Some(before), Some(after)) = (
        pos.checked_sub(1).and_then(|p| buffer.char_at(p)),
        buffer.char_at(pos),
    ) else {
        return false;
    };
    closer_for(before) == Some(after)
}

/// A bracket next to the cursor and where its partner is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketMatch {
    /// Char index of the bracket adjacent to the cursor.
    pub bracket: usize,
    /// Char index of the matching bracket, `None` when unmatched.
    pub partner: Option<usize>,
}

impl BracketMatch {
    pub fn is_matched(&self) -> bool {
        self.partner.is_some()
    }
}

/// Finds the bracket touching `pos`, preferring the one before the cursor.
pub fn match_at(buffer: &TextBuffer, pos: usize) -> Option<BracketMatch> {
    let candidates = [pos.checked_sub(1), Some(pos)];
    candidates.into_iter().flatten().find_map(|idx| {
        let ch = buffer.char_at(idx)?;
        if let Some(close) = closer_for(ch).filter(|c| *c != ch) {
            Some(BracketMatch {
                bracket: idx,
                partner: scan_forward(buffer, idx, ch, close),
            })
        } else {
            opener_for(ch).map(|open| BracketMatch {
                bracket: idx,
                partner: scan_backward(buffer, idx, open, ch),
            })
        }
    })
}

fn scan_forward(buffer: &TextBuffer, from: usize, open: char, close: char) -> Option<usize> {
    let end = buffer.len_chars().min(from + MAX_SCAN_DISTANCE);
    let mut depth = 0usize;
    for idx in from + 1..end {
        match buffer.char_at(idx) {
            Some(c) if c == open => depth += 1,
            Some(c) if c == close => {
                if depth == 0 {
                    return Some(idx);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

fn scan_backward(buffer: &TextBuffer, from: usize, open: char, close: char) -> Option<usize> {
    let start = from.saturating_sub(MAX_SCAN_DISTANCE);
    let mut depth = 0usize;
    for idx in (start..from).rev() {
        match buffer.char_at(idx) {
            Some(c) if c == close => depth += 1,
            Some(c) if c == open => {
                if depth == 0 {
                    return Some(idx);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}
