//! QueryPad Core - Pure text editor logic.
//!
//! This crate contains all editor state and behavior without any
//! dependencies on windowing, terminal or rendering systems. Hosts talk
//! to an [`Editor`] through transactions, key chords and listeners.

pub mod brackets;
pub mod buffer;
pub mod change;
pub mod compartment;
pub mod cursor;
pub mod editor;
pub mod history;
pub mod keymap;
pub mod syntax;

pub use brackets::BracketMatch;
pub use buffer::TextBuffer;
pub use change::{Assoc, Change, ChangeSet, Origin, Transaction};
pub use compartment::{
    Compartment, ConfigError, Configuration, Setting, SettingKind, DEFAULT_FONT_SIZE,
};
pub use cursor::{Cursor, Position, Selection};
pub use editor::{Editor, EditorEvent, KeyOutcome, ListenerId, Update};
pub use history::{History, HistoryStep};
pub use keymap::{
    Binding, EditCommand, Key, KeyAction, KeyChord, Keymap, KeymapStack, Modifiers, Motion,
    Precedence,
};
pub use syntax::{Chrome, Color, Language, SyntaxHighlighter, Theme, ThemeKind, TokenStyle};
