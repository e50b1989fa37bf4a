//! Language detection and configuration.

use std::path::Path;

/// Supported document languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Sql,
    #[default]
    PlainText,
}

impl Language {
    /// Detects language from a file path based on extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::PlainText)
    }

    /// Detects language from a file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "sql" | "ddl" | "dml" | "pgsql" | "psql" | "mysql" | "sqlite" => Self::Sql,
            _ => Self::PlainText,
        }
    }

    /// Returns the display name of the language.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sql => "SQL",
            Self::PlainText => "Plain Text",
        }
    }

    /// Line comment token, if the language has one.
    pub fn line_comment(&self) -> Option<&'static str> {
        match self {
            Self::Sql => Some("--"),
            Self::PlainText => None,
        }
    }

    /// Returns whether this language supports syntax highlighting.
    pub fn has_highlighting(&self) -> bool {
        !matches!(self, Self::PlainText)
    }

    /// Returns the tree-sitter language for this language, if available.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Self::Sql => Some(tree_sitter_sequel::LANGUAGE.into()),
            Self::PlainText => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("sql"), Language::Sql);
        assert_eq!(Language::from_extension("SQL"), Language::Sql);
        assert_eq!(Language::from_extension("sqlite"), Language::Sql);
        assert_eq!(Language::from_extension("txt"), Language::PlainText);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path(Path::new("queries/report.sql")), Language::Sql);
        assert_eq!(Language::from_path(Path::new("README.md")), Language::PlainText);
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::PlainText);
    }

    #[test]
    fn test_tree_sitter_language() {
        assert!(Language::Sql.tree_sitter_language().is_some());
        assert!(Language::PlainText.tree_sitter_language().is_none());
        assert_eq!(Language::Sql.line_comment(), Some("--"));
    }
}
