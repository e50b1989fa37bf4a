//! Theme system for syntax highlighting.
//!
//! Defines token styles, the editor chrome palette and the two built-in
//! color schemes.

use std::collections::HashMap;

/// Token style categories for syntax highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStyle {
    /// Keywords (SELECT, FROM, WHERE, ...)
    Keyword,
    /// String literals
    String,
    /// Numeric literals
    Number,
    /// TRUE / FALSE
    Boolean,
    /// NULL
    Constant,
    /// Line and block comments
    Comment,
    /// Function invocations
    Function,
    /// Column and cast types
    Type,
    /// Bind parameters (?, $1, :name)
    Variable,
    /// Operators (=, <>, ||, ...)
    Operator,
    /// Punctuation (parentheses, commas, semicolons)
    Punctuation,
    /// Default text (no special highlighting)
    Default,
}

/// RGB color.
pub type Color = [u8; 3];

/// Which built-in palette a theme is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemeKind {
    #[default]
    Dark,
    Light,
}

impl ThemeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ThemeKind::Dark => "dark",
            ThemeKind::Light => "light",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dark" => Some(ThemeKind::Dark),
            "light" => Some(ThemeKind::Light),
            _ => None,
        }
    }
}

/// Colors for everything that is not a syntax token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chrome {
    pub gutter_background: Color,
    pub gutter_foreground: Color,
    pub gutter_active: Color,
    pub active_line: Color,
    pub selection: Color,
    pub cursor: Color,
    pub bracket_match: Color,
    pub bracket_mismatch: Color,
    pub error_background: Color,
    pub error_foreground: Color,
}

/// A syntax highlighting theme.
#[derive(Debug, Clone)]
pub struct Theme {
    pub kind: ThemeKind,
    /// Background color.
    pub background: Color,
    /// Default text color.
    pub foreground: Color,
    pub chrome: Chrome,
    /// Colors for each token style.
    colors: HashMap<TokenStyle, Color>,
}

impl Theme {
    /// Returns the built-in theme for `kind`.
    pub fn for_kind(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Dark => Self::dark(),
            ThemeKind::Light => Self::light(),
        }
    }

    /// Sets the color for a token style.
    pub fn set_color(&mut self, style: TokenStyle, color: Color) {
        self.colors.insert(style, color);
    }

    /// Gets the color for a token style, falling back to foreground.
    pub fn color(&self, style: TokenStyle) -> Color {
        self.colors.get(&style).copied().unwrap_or(self.foreground)
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Creates the default dark theme (One Dark inspired).
    pub fn dark() -> Self {
        let mut theme = Self {
            kind: ThemeKind::Dark,
            background: [0x1A, 0x1A, 0x1F],
            foreground: [0xAB, 0xB2, 0xBF],
            chrome: Chrome {
                gutter_background: [0x1A, 0x1A, 0x1F],
                gutter_foreground: [0x5C, 0x63, 0x70],
                gutter_active: [0xAB, 0xB2, 0xBF],
                active_line: [0x24, 0x27, 0x2E],
                selection: [0x3E, 0x44, 0x51],
                cursor: [0x52, 0x8B, 0xFF],
                bracket_match: [0x3A, 0x5A, 0x40],
                bracket_mismatch: [0x7A, 0x2E, 0x2E],
                error_background: [0x4B, 0x1C, 0x1C],
                error_foreground: [0xFF, 0xB4, 0xB4],
            },
            colors: HashMap::new(),
        };

        theme.set_color(TokenStyle::Keyword, [0xC4, 0x77, 0xD6]);
        theme.set_color(TokenStyle::String, [0x98, 0xC3, 0x79]);
        theme.set_color(TokenStyle::Number, [0xD2, 0x9B, 0x77]);
        theme.set_color(TokenStyle::Boolean, [0xD2, 0x9B, 0x77]);
        theme.set_color(TokenStyle::Constant, [0xD2, 0x9B, 0x77]);
        theme.set_color(TokenStyle::Comment, [0x74, 0x81, 0x8E]);
        theme.set_color(TokenStyle::Function, [0x61, 0xAF, 0xEF]);
        theme.set_color(TokenStyle::Type, [0xE3, 0xC7, 0x7A]);
        theme.set_color(TokenStyle::Variable, [0xE0, 0x70, 0x70]);
        theme.set_color(TokenStyle::Operator, [0x56, 0xB6, 0xC2]);
        theme.set_color(TokenStyle::Punctuation, [0x99, 0xA0, 0xAA]);
        theme.set_color(TokenStyle::Default, theme.foreground);

        theme
    }

    /// Creates a light theme.
    pub fn light() -> Self {
        let mut theme = Self {
            kind: ThemeKind::Light,
            background: [0xFB, 0xFB, 0xFB],
            foreground: [0x3B, 0x42, 0x52],
            chrome: Chrome {
                gutter_background: [0xF0, 0xF0, 0xF0],
                gutter_foreground: [0x9A, 0xA0, 0xA6],
                gutter_active: [0x3B, 0x42, 0x52],
                active_line: [0xEE, 0xF2, 0xF8],
                selection: [0xCC, 0xDD, 0xF5],
                cursor: [0x52, 0x6F, 0xFF],
                bracket_match: [0xC8, 0xE6, 0xC9],
                bracket_mismatch: [0xF5, 0xC2, 0xC2],
                error_background: [0xFD, 0xEC, 0xEC],
                error_foreground: [0xA9, 0x1B, 0x1B],
            },
            colors: HashMap::new(),
        };

        theme.set_color(TokenStyle::Keyword, [0xA0, 0x50, 0xB4]);
        theme.set_color(TokenStyle::String, [0x4E, 0x9A, 0x06]);
        theme.set_color(TokenStyle::Number, [0x1D, 0x67, 0xCD]);
        theme.set_color(TokenStyle::Boolean, [0x1D, 0x67, 0xCD]);
        theme.set_color(TokenStyle::Constant, [0x1D, 0x67, 0xCD]);
        theme.set_color(TokenStyle::Comment, [0x80, 0x8C, 0x98]);
        theme.set_color(TokenStyle::Function, [0x12, 0x58, 0xAA]);
        theme.set_color(TokenStyle::Type, [0x04, 0x7D, 0x7D]);
        theme.set_color(TokenStyle::Variable, [0xC0, 0x34, 0x34]);
        theme.set_color(TokenStyle::Default, theme.foreground);

        theme
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_theme() {
        let theme = Theme::dark();
        assert_eq!(theme.name(), "dark");
        assert_ne!(theme.color(TokenStyle::Keyword), theme.color(TokenStyle::Default));
    }

    #[test]
    fn test_light_theme_falls_back_to_foreground() {
        let theme = Theme::light();
        assert_eq!(theme.kind, ThemeKind::Light);
        // No operator color in the light palette.
        assert_eq!(theme.color(TokenStyle::Operator), theme.foreground);
    }

    #[test]
    fn test_theme_kind_names() {
        assert_eq!(ThemeKind::from_name("Light"), Some(ThemeKind::Light));
        assert_eq!(ThemeKind::from_name("solarized"), None);
        assert_eq!(Theme::for_kind(ThemeKind::Dark).kind, ThemeKind::Dark);
    }
}
