//! Syntax highlighting module.
//!
//! Provides incremental SQL highlighting using tree-sitter.

mod highlighter;
mod language;
mod theme;

pub use highlighter::{LineHighlights, SyntaxHighlighter};
pub use language::Language;
pub use theme::{Chrome, Color, Theme, ThemeKind, TokenStyle};
