//! QueryPad UI - The SQL editor adapter and its terminal surface.
//!
//! [`SqlEditor`] owns one engine instance from `querypad-core` and bridges
//! it to a host that controls the document text: engine edits flow out
//! through the change callback, host values flow in through
//! [`SqlEditor::sync_external_value`]. Drawing uses ratatui, key input
//! arrives as crossterm events.

pub mod adapter;
pub mod clipboard;
pub mod input;
pub mod view;
pub mod wrap;

pub use adapter::{Container, EditorHandle, EditorProps, MountState, SqlEditor, EXECUTE_INTENT};
pub use clipboard::Clipboard;
pub use input::{chord_from_key_event, scroll_delta};
