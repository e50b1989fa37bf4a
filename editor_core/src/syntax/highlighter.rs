//! Syntax highlighter using tree-sitter.
//!
//! Provides incremental syntax highlighting with tree-sitter parsing.

use super::language::Language;
use super::theme::{Color, Theme, TokenStyle};
use tree_sitter::{Node, Parser, Tree};

/// Line-based highlight cache for efficient rendering.
#[derive(Debug, Clone, Default)]
pub struct LineHighlights {
    /// Character spans with their styles for this line.
    /// Each entry is (start_col, end_col, style).
    spans: Vec<(usize, usize, TokenStyle)>,
}

impl LineHighlights {
    /// Creates empty line highlights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a span to the line.
    pub fn add_span(&mut self, start_col: usize, end_col: usize, style: TokenStyle) {
        self.spans.push((start_col, end_col, style));
    }

    /// Returns the style for a given column, or None if no highlight.
    pub fn style_at(&self, col: usize) -> Option<TokenStyle> {
        self.spans
            .iter()
            .find(|(start, end, _)| col >= *start && col < *end)
            .map(|(_, _, style)| *style)
    }

    /// Returns all spans for this line.
    pub fn spans(&self) -> &[(usize, usize, TokenStyle)] {
        &self.spans
    }
}

/// Syntax highlighter using tree-sitter for incremental parsing.
pub struct SyntaxHighlighter {
    /// Tree-sitter parser.
    parser: Parser,
    /// Current parse tree.
    tree: Option<Tree>,
    /// Current language.
    language: Language,
    /// Syntax theme.
    theme: Theme,
    /// Cached line highlights.
    line_cache: Vec<LineHighlights>,
}

impl std::fmt::Debug for SyntaxHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxHighlighter")
            .field("language", &self.language)
            .field("theme", &self.theme.kind)
            .field("has_tree", &self.tree.is_some())
            .finish()
    }
}

impl SyntaxHighlighter {
    /// Creates a new syntax highlighter.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            tree: None,
            language: Language::PlainText,
            theme: Theme::dark(),
            line_cache: Vec::new(),
        }
    }

    /// Sets the syntax theme.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Returns a reference to the current theme.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Sets the language and configures the parser.
    /// The caller must reparse afterwards.
    pub fn set_language(&mut self, language: Language) {
        if self.language == language {
            return;
        }

        self.language = language;
        self.tree = None;
        self.line_cache.clear();

        if let Some(ts_lang) = language.tree_sitter_language() {
            if let Err(err) = self.parser.set_language(&ts_lang) {
                log::error!("Failed to load {} grammar: {err}", language.name());
                self.language = Language::PlainText;
            }
        }
    }

    /// Returns the current language.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Parses the source code and rebuilds the line cache.
    /// This performs a full parse.
    pub fn parse(&mut self, source: &str, line_count: usize) {
        self.tree = if self.language.has_highlighting() {
            self.parser.parse(source, None)
        } else {
            None
        };
        self.build_line_cache(source, line_count);
    }

    /// Incrementally updates the parse tree after a single edit and
    /// rebuilds the line cache.
    #[allow(clippy::too_many_arguments)]
    pub fn edit(
        &mut self,
        source: &str,
        line_count: usize,
        start_byte: usize,
        old_end_byte: usize,
        new_end_byte: usize,
        start_position: (usize, usize),
        old_end_position: (usize, usize),
        new_end_position: (usize, usize),
    ) {
        if !self.language.has_highlighting() {
            self.build_line_cache(source, line_count);
            return;
        }

        if let Some(tree) = &mut self.tree {
            let edit = tree_sitter::InputEdit {
                start_byte,
                old_end_byte,
                new_end_byte,
                start_position: point(start_position),
                old_end_position: point(old_end_position),
                new_end_position: point(new_end_position),
            };
            tree.edit(&edit);

            // Re-parse with the old tree for incremental parsing
            self.tree = self.parser.parse(source, Some(tree));
        } else {
            self.tree = self.parser.parse(source, None);
        }

        self.build_line_cache(source, line_count);
    }

    /// Builds the line cache for efficient rendering.
    fn build_line_cache(&mut self, source: &str, line_count: usize) {
        self.line_cache.clear();
        self.line_cache.resize_with(line_count, LineHighlights::new);

        let Some(tree) = &self.tree else {
            return;
        };

        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        let mut highlights = Vec::new();
        collect_highlights(tree.root_node(), source, &mut highlights);

        for (node_start, node_end, start_row, end_row, style) in highlights {
            for row in start_row..=end_row.min(line_count.saturating_sub(1)) {
                let line_start = line_starts.get(row).copied().unwrap_or(source.len());
                let line_end = line_starts
                    .get(row + 1)
                    .map(|&s| s.saturating_sub(1))
                    .unwrap_or(source.len());

                let span_start = node_start.max(line_start);
                let span_end = node_end.min(line_end);
                if span_start >= span_end {
                    continue;
                }

                let line_text = source.get(line_start..line_end).unwrap_or("");
                let col = |byte: usize| {
                    line_text
                        .get(..byte - line_start)
                        .map(|s| s.chars().count())
                        .unwrap_or(0)
                };
                self.line_cache[row].add_span(col(span_start), col(span_end), style);
            }
        }
    }

    /// Returns the cached highlights of a line.
    pub fn line_highlights(&self, line: usize) -> Option<&LineHighlights> {
        self.line_cache.get(line)
    }

    /// Returns the style at a (line, column) position.
    pub fn style_at(&self, line: usize, col: usize) -> TokenStyle {
        self.line_cache
            .get(line)
            .and_then(|hl| hl.style_at(col))
            .unwrap_or(TokenStyle::Default)
    }

    /// Returns the color at a (line, column) position.
    pub fn color_at(&self, line: usize, col: usize) -> Color {
        self.theme.color(self.style_at(line, col))
    }

    pub fn has_highlighting(&self) -> bool {
        self.language.has_highlighting() && self.tree.is_some()
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn point((row, column): (usize, usize)) -> tree_sitter::Point {
    tree_sitter::Point { row, column }
}

/// Walks the tree and records (start_byte, end_byte, start_row, end_row,
/// style) for every classified node. Children of a classified node are not
/// visited so spans never overlap.
fn collect_highlights(
    node: Node,
    source: &str,
    highlights: &mut Vec<(usize, usize, usize, usize, TokenStyle)>,
) {
    if let Some(style) = node_style(&node, source) {
        highlights.push((
            node.start_byte(),
            node.end_byte(),
            node.start_position().row,
            node.end_position().row,
            style,
        ));
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_highlights(child, source, highlights);
    }
}

/// Classifies a tree-sitter-sequel node.
fn node_style(node: &Node, source: &str) -> Option<TokenStyle> {
    let kind = node.kind();
    match kind {
        "comment" | "marginalia" => return Some(TokenStyle::Comment),
        "keyword_true" | "keyword_false" => return Some(TokenStyle::Boolean),
        "keyword_null" => return Some(TokenStyle::Constant),
        "parameter" => return Some(TokenStyle::Variable),
        "literal" => {
            let text = source.get(node.start_byte()..node.end_byte())?;
            return match text.chars().next() {
                Some('\'' | '"' | '`') => Some(TokenStyle::String),
                Some(c) if c.is_ascii_digit() || c == '.' || c == '-' => Some(TokenStyle::Number),
                // TRUE / FALSE / NULL literals: style their keyword child.
                _ => None,
            };
        }
        "identifier" => return is_function_name(node).then_some(TokenStyle::Function),
        _ => {}
    }

    if kind.starts_with("keyword_") {
        let in_type = node.parent().is_some_and(|p| is_type_node(p.kind()));
        return Some(if in_type {
            TokenStyle::Type
        } else {
            TokenStyle::Keyword
        });
    }

    if !node.is_named() && node.child_count() == 0 {
        return match kind {
            "=" | "!=" | "<>" | "<" | "<=" | ">" | ">=" | "+" | "-" | "*" | "/" | "%" | "^"
            | "||" | "&" | "|" | "~" | "::" => Some(TokenStyle::Operator),
            "(" | ")" | "," | ";" | "." | "[" | "]" => Some(TokenStyle::Punctuation),
            _ => None,
        };
    }

    None
}

/// `count` in `count(*)`: an identifier inside the object reference that
/// names an invocation.
fn is_function_name(node: &Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "invocation" => true,
        "object_reference" => parent
            .parent()
            .is_some_and(|grand| grand.kind() == "invocation"),
        _ => false,
    }
}

fn is_type_node(kind: &str) -> bool {
    matches!(
        kind,
        "int"
            | "integer"
            | "bigint"
            | "smallint"
            | "tinyint"
            | "decimal"
            | "numeric"
            | "double"
            | "float"
            | "char"
            | "varchar"
            | "nvarchar"
            | "text"
            | "timestamp"
            | "datetime"
            | "time"
            | "date"
            | "boolean"
            | "bit"
            | "binary"
            | "varbinary"
    )
}
