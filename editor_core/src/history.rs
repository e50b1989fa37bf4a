//! Undo/Redo history system.

use crate::change::{ChangeSet, Origin};
use crate::cursor::Selection;
use std::time::{Duration, Instant};

/// Default time window for coalescing edits (in milliseconds).
const COALESCE_WINDOW_MS: u64 = 300;

/// One applied change set together with the change set that reverts it.
#[derive(Debug, Clone)]
pub struct HistoryStep {
    pub changes: ChangeSet,
    pub inverse: ChangeSet,
}

impl HistoryStep {
    pub fn new(changes: ChangeSet, inverse: ChangeSet) -> Self {
        Self { changes, inverse }
    }

    /// Position right after a single-char insertion, if that is what this
    /// step is.
    fn typed_char_end(&self) -> Option<usize> {
        let [change] = self.changes.changes() else {
            return None;
        };
        let mut chars = change.insert.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if change.from == change.to && ch != '\n' => Some(change.from + 1),
            _ => None,
        }
    }

    /// Range of a single-char deletion, if that is what this step is.
    fn deleted_char(&self) -> Option<(usize, usize)> {
        let [change] = self.changes.changes() else {
            return None;
        };
        (change.insert.is_empty() && change.to == change.from + 1).then_some((change.from, change.to))
    }
}

/// A group of steps that are undone/redone together.
#[derive(Debug, Clone)]
struct HistoryGroup {
    steps: Vec<HistoryStep>,
    origin: Origin,
    selection_before: Selection,
    selection_after: Selection,
    last_edit_time: Instant,
}

impl HistoryGroup {
    /// Returns true if `step` continues this group: same keystroke kind,
    /// inside the time window, and adjacent to the previous keystroke.
    fn can_coalesce(&self, step: &HistoryStep, origin: Origin, window: Duration) -> bool {
        if origin != self.origin || !origin.coalesces() {
            return false;
        }
        if self.last_edit_time.elapsed() > window {
            return false;
        }
        let Some(last) = self.steps.last() else {
            return false;
        };
        match origin {
            Origin::Input => match (last.typed_char_end(), step.changes.changes()) {
                (Some(end), [next]) => step.typed_char_end().is_some() && next.from == end,
                _ => false,
            },
            Origin::Delete => match (last.deleted_char(), step.deleted_char()) {
                // Backspace walks left, forward delete stays put.
                (Some((from, _)), Some((next_from, next_to))) => next_to == from || next_from == from,
                _ => false,
            },
            _ => false,
        }
    }
}

/// Manages undo/redo history.
#[derive(Debug)]
pub struct History {
    /// Stack of groups that can be undone.
    undo_stack: Vec<HistoryGroup>,
    /// Stack of groups that can be redone.
    redo_stack: Vec<HistoryGroup>,
    /// Maximum number of undo levels.
    max_size: usize,
    /// Time window for coalescing edits.
    coalesce_window: Duration,
    /// Whether coalescing is enabled.
    coalesce_enabled: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl History {
    /// Creates a new history with the given maximum size.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
            coalesce_window: Duration::from_millis(COALESCE_WINDOW_MS),
            coalesce_enabled: true,
        }
    }

    /// Sets the coalesce window duration.
    pub fn set_coalesce_window(&mut self, window: Duration) {
        self.coalesce_window = window;
    }

    /// Enables or disables coalescing.
    pub fn set_coalesce_enabled(&mut self, enabled: bool) {
        self.coalesce_enabled = enabled;
    }

    /// Records an applied step. Merges it into the previous group when it
    /// continues a run of typing or deleting.
    pub fn record(
        &mut self,
        step: HistoryStep,
        origin: Origin,
        selection_before: Selection,
        selection_after: Selection,
    ) {
        self.redo_stack.clear();

        if self.coalesce_enabled {
            if let Some(last) = self.undo_stack.last_mut() {
                if last.can_coalesce(&step, origin, self.coalesce_window) {
                    last.steps.push(step);
                    last.selection_after = selection_after;
                    last.last_edit_time = Instant::now();
                    return;
                }
            }
        }

        self.undo_stack.push(HistoryGroup {
            steps: vec![step],
            origin,
            selection_before,
            selection_after,
            last_edit_time: Instant::now(),
        });
        if self.undo_stack.len() > self.max_size {
            let overflow = self.undo_stack.len() - self.max_size;
            self.undo_stack.drain(..overflow);
        }
    }

    /// Returns true if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of groups that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of groups that can be redone.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Pops the last group for undo.
    /// Returns the change sets to apply, in order, and the selection to restore.
    pub fn undo(&mut self) -> Option<(Vec<ChangeSet>, Selection)> {
        let group = self.undo_stack.pop()?;
        let changes = group.steps.iter().rev().map(|s| s.inverse.clone()).collect();
        let selection = group.selection_before;
        self.redo_stack.push(group);
        Some((changes, selection))
    }

    /// Pops the last undone group for redo.
    pub fn redo(&mut self) -> Option<(Vec<ChangeSet>, Selection)> {
        let mut group = self.redo_stack.pop()?;
        let changes = group.steps.iter().map(|s| s.changes.clone()).collect();
        let selection = group.selection_after;
        // A redone group never merges with later typing.
        group.origin = Origin::Redo;
        self.undo_stack.push(group);
        Some((changes, selection))
    }

    /// Clears all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::change::Change;

    fn apply(buf: &mut TextBuffer, change: Change) -> HistoryStep {
        let changes = ChangeSet::single(change);
        let inverse = changes.apply(buf);
        HistoryStep::new(changes, inverse)
    }

    fn type_chars(history: &mut History, buf: &mut TextBuffer, at: usize, text: &str) {
        for (i, ch) in text.chars().enumerate() {
            let step = apply(buf, Change::insert(at + i, ch.to_string()));
            history.record(
                step,
                Origin::Input,
                Selection::new(at + i),
                Selection::new(at + i + 1),
            );
        }
    }

    #[test]
    fn test_undo_redo() {
        let mut history = History::new(100);
        let mut buf = TextBuffer::new();

        let step = apply(&mut buf, Change::insert(0, "SELECT"));
        history.record(step, Origin::Paste, Selection::new(0), Selection::new(6));

        assert!(history.can_undo());
        assert!(!history.can_redo());

        let (changes, sel) = history.undo().unwrap();
        for c in &changes {
            c.apply(&mut buf);
        }
        assert_eq!(buf.text(), "");
        assert_eq!(sel, Selection::new(0));
        assert!(history.can_redo());

        let (changes, sel) = history.redo().unwrap();
        for c in &changes {
            c.apply(&mut buf);
        }
        assert_eq!(buf.text(), "SELECT");
        assert_eq!(sel, Selection::new(6));
    }

    #[test]
    fn test_redo_cleared_on_new_edit() {
        let mut history = History::new(100);
        let mut buf = TextBuffer::new();

        let step = apply(&mut buf, Change::insert(0, "a"));
        history.record(step, Origin::Paste, Selection::new(0), Selection::new(1));
        history.undo();
        assert_eq!(history.redo_depth(), 1);

        let step = apply(&mut buf, Change::insert(0, "b"));
        history.record(step, Origin::Paste, Selection::new(0), Selection::new(1));
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_coalescing_consecutive_inserts() {
        let mut history = History::new(100);
        history.set_coalesce_window(Duration::from_millis(1000));
        let mut buf = TextBuffer::new();

        type_chars(&mut history, &mut buf, 0, "abc");
        assert_eq!(history.undo_depth(), 1);

        let (changes, _) = history.undo().unwrap();
        assert_eq!(changes.len(), 3);
        for c in &changes {
            c.apply(&mut buf);
        }
        assert_eq!(buf.text(), "");
    }

    #[test]
    fn test_coalescing_breaks_on_newline() {
        let mut history = History::new(100);
        history.set_coalesce_window(Duration::from_millis(1000));
        let mut buf = TextBuffer::new();

        type_chars(&mut history, &mut buf, 0, "a\nb");
        // The newline does not extend the run of "a", and "b" starts fresh.
        assert_eq!(history.undo_depth(), 3);
    }

    #[test]
    fn test_coalescing_backspaces() {
        let mut history = History::new(100);
        history.set_coalesce_window(Duration::from_millis(1000));
        let mut buf = TextBuffer::from_str("abc");

        for pos in (1..=3).rev() {
            let step = apply(&mut buf, Change::delete(pos - 1, pos));
            history.record(step, Origin::Delete, Selection::new(pos), Selection::new(pos - 1));
        }
        assert_eq!(buf.text(), "");
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_coalescing_disabled() {
        let mut history = History::new(100);
        history.set_coalesce_enabled(false);
        let mut buf = TextBuffer::new();

        type_chars(&mut history, &mut buf, 0, "ab");
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_external_edits_never_coalesce() {
        let mut history = History::new(100);
        history.set_coalesce_window(Duration::from_millis(1000));
        let mut buf = TextBuffer::new();

        for i in 0..2 {
            let step = apply(&mut buf, Change::insert(i, "x"));
            history.record(step, Origin::External, Selection::new(i), Selection::new(i + 1));
        }
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_max_size() {
        let mut history = History::new(2);
        history.set_coalesce_enabled(false);
        let mut buf = TextBuffer::new();

        type_chars(&mut history, &mut buf, 0, "abc");
        assert_eq!(history.undo_depth(), 2);
    }
}
