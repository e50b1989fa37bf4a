//! Change sets and transactions.
//!
//! Every document mutation goes through a [`Transaction`]: a set of
//! replacements expressed in the coordinates of the document before the
//! change, plus an [`Origin`] telling listeners who caused it.

use crate::buffer::TextBuffer;
use crate::cursor::Selection;

/// A single replacement of the char range `from..to` with `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl Change {
    pub fn replace(from: usize, to: usize, insert: impl Into<String>) -> Self {
        Self {
            from: from.min(to),
            to: from.max(to),
            insert: insert.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self::replace(from, to, String::new())
    }

    /// Number of chars inserted.
    pub fn inserted_len(&self) -> usize {
        self.insert.chars().count()
    }

    fn is_noop(&self) -> bool {
        self.from == self.to && self.insert.is_empty()
    }
}

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// An ordered list of non-overlapping changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Builds a change set. Changes are sorted by position; no-op changes
    /// are dropped. Overlapping changes are a caller bug.
    pub fn new(mut changes: Vec<Change>) -> Self {
        changes.retain(|c| !c.is_noop());
        changes.sort_by_key(|c| (c.from, c.to));
        debug_assert!(
            changes.windows(2).all(|w| w[0].to <= w[1].from),
            "overlapping changes"
        );
        Self { changes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(change: Change) -> Self {
        Self::new(vec![change])
    }

    /// A change set replacing the whole document with `text`.
    pub fn replace_all(buffer: &TextBuffer, text: &str) -> Self {
        Self::single(Change::replace(0, buffer.len_chars(), text))
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Applies the changes to `buffer` and returns the inverse change set,
    /// expressed in the coordinates of the changed document.
    pub fn apply(&self, buffer: &mut TextBuffer) -> ChangeSet {
        let len = buffer.len_chars();
        let mut inverse = Vec::with_capacity(self.changes.len());
        let mut delta: isize = 0;

        for change in &self.changes {
            let from = change.from.min(len);
            let to = change.to.min(len);
            let removed = buffer.slice(from, to);
            let new_from = (from as isize + delta) as usize;
            let inserted = change.inserted_len();
            inverse.push(Change::replace(new_from, new_from + inserted, removed));
            delta += inserted as isize - (to - from) as isize;
        }

        // Back to front so earlier offsets stay valid.
        for change in self.changes.iter().rev() {
            buffer.remove(change.from, change.to);
            buffer.insert(change.from, &change.insert);
        }

        ChangeSet::new(inverse)
    }

    /// Maps a position in the old document to the new document.
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        let mut delta: isize = 0;
        for change in &self.changes {
            if pos < change.from || (pos == change.from && change.from == change.to && assoc == Assoc::Before) {
                break;
            }
            let inserted = change.inserted_len() as isize;
            if pos > change.to {
                delta += inserted - (change.to - change.from) as isize;
                continue;
            }
            let start = change.from as isize + delta;
            let mapped = if pos == change.from && pos < change.to && assoc == Assoc::Before {
                start
            } else {
                start + inserted
            };
            return mapped.max(0) as usize;
        }
        (pos as isize + delta).max(0) as usize
    }
}

/// Who caused a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Typed text.
    Input,
    Paste,
    /// Backspace / delete keys.
    Delete,
    /// Any other editing command (newline, indent, comment toggle, ...).
    Command,
    Undo,
    Redo,
    /// A host replacing the document from outside the editor.
    External,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Input => "input",
            Origin::Paste => "paste",
            Origin::Delete => "delete",
            Origin::Command => "command",
            Origin::Undo => "undo",
            Origin::Redo => "redo",
            Origin::External => "external",
        }
    }

    /// True for single keystroke edits that may merge into the previous
    /// history group.
    pub fn coalesces(&self) -> bool {
        matches!(self, Origin::Input | Origin::Delete)
    }
}

/// A change set plus the metadata the editor needs to apply it.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub changes: ChangeSet,
    /// Selection after the transaction. When `None`, the current selection
    /// is mapped through the changes.
    pub selection: Option<Selection>,
    pub origin: Origin,
    pub add_to_history: bool,
}

impl Transaction {
    pub fn new(changes: ChangeSet, origin: Origin) -> Self {
        Self {
            changes,
            selection: None,
            origin,
            add_to_history: true,
        }
    }

    /// A transaction that only moves the selection.
    pub fn select(selection: Selection) -> Self {
        Self {
            changes: ChangeSet::empty(),
            selection: Some(selection),
            origin: Origin::Command,
            add_to_history: false,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn changes_document(&self) -> bool {
        !self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_returns_inverse() {
        let mut buf = TextBuffer::from_str("SELECT 1 FROM t");
        let changes = ChangeSet::new(vec![
            Change::replace(7, 8, "*"),
            Change::insert(15, " WHERE x"),
        ]);
        let inverse = changes.apply(&mut buf);
        assert_eq!(buf.text(), "SELECT * FROM t WHERE x");

        inverse.apply(&mut buf);
        assert_eq!(buf.text(), "SELECT 1 FROM t");
    }

    #[test]
    fn test_inverse_with_length_changes() {
        let mut buf = TextBuffer::from_str("abcdef");
        let changes = ChangeSet::new(vec![Change::delete(0, 2), Change::replace(4, 5, "XYZ")]);
        let inverse = changes.apply(&mut buf);
        assert_eq!(buf.text(), "cdXYZf");
        assert_eq!(inverse.changes()[1], Change::replace(2, 5, "e"));

        inverse.apply(&mut buf);
        assert_eq!(buf.text(), "abcdef");
    }

    #[test]
    fn test_replace_all() {
        let mut buf = TextBuffer::from_str("SELECT 1");
        ChangeSet::replace_all(&buf, "SELECT 2").apply(&mut buf);
        assert_eq!(buf.text(), "SELECT 2");
    }

    #[test]
    fn test_noop_changes_dropped() {
        assert!(ChangeSet::new(vec![Change::insert(3, "")]).is_empty());
    }

    #[test]
    fn test_map_pos() {
        let changes = ChangeSet::new(vec![Change::insert(2, "ab"), Change::delete(5, 7)]);
        assert_eq!(changes.map_pos(0, Assoc::After), 0);
        assert_eq!(changes.map_pos(2, Assoc::Before), 2);
        assert_eq!(changes.map_pos(2, Assoc::After), 4);
        assert_eq!(changes.map_pos(4, Assoc::After), 6);
        assert_eq!(changes.map_pos(6, Assoc::After), 7); // inside deletion
        assert_eq!(changes.map_pos(9, Assoc::After), 9);
    }

    #[test]
    fn test_map_pos_whole_replace_end_stays_at_end() {
        let buf = TextBuffer::from_str("SELECT 1");
        let changes = ChangeSet::replace_all(&buf, "SELECT 12");
        assert_eq!(changes.map_pos(8, Assoc::After), 9);
        assert_eq!(changes.map_pos(0, Assoc::Before), 0);
    }

    #[test]
    fn test_origin_coalescing() {
        assert!(Origin::Input.coalesces());
        assert!(Origin::Delete.coalesces());
        assert!(!Origin::External.coalesces());
        assert_eq!(Origin::External.as_str(), "external");
    }
}
