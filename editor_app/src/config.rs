use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use querypad_core::{ThemeKind, DEFAULT_FONT_SIZE};
use querypad_exec::DEFAULT_MAX_ROWS;
use serde::Deserialize;

const APP_DIR: &str = "querypad";
const CONFIG_FILE: &str = "config.json";

#[derive(clap::ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    Dark,
    Light,
}

impl From<ThemeName> for ThemeKind {
    fn from(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => ThemeKind::Dark,
            ThemeName::Light => ThemeKind::Light,
        }
    }
}

/// Options that may come from the config file or the command line. Unset
/// fields fall through to the next layer.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub font_size: Option<f32>,
    pub theme: Option<ThemeName>,
    pub line_wrapping: Option<bool>,
    pub database: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub max_rows: Option<usize>,
}

impl ConfigFile {
    /// Layers `other` on top of `self`; set fields in `other` win.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            font_size: other.font_size.or(self.font_size),
            theme: other.theme.or(self.theme),
            line_wrapping: other.line_wrapping.or(self.line_wrapping),
            database: other.database.clone().or_else(|| self.database.clone()),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
            max_rows: other.max_rows.or(self.max_rows),
        }
    }

    pub fn into_settings(self) -> Settings {
        let defaults = Settings::default();
        Settings {
            font_size: self.font_size.unwrap_or(defaults.font_size),
            theme: self.theme.map_or(defaults.theme, ThemeKind::from),
            line_wrapping: self.line_wrapping.unwrap_or(defaults.line_wrapping),
            database: self.database,
            log_file: self.log_file.unwrap_or(defaults.log_file),
            max_rows: self.max_rows.unwrap_or(defaults.max_rows),
        }
    }
}

/// Effective settings after merging defaults, file and command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub font_size: f32,
    pub theme: ThemeKind,
    pub line_wrapping: bool,
    /// In-memory database when unset.
    pub database: Option<PathBuf>,
    pub log_file: PathBuf,
    pub max_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            theme: ThemeKind::Dark,
            line_wrapping: true,
            database: None,
            log_file: default_log_path(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join(CONFIG_FILE);
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join(CONFIG_FILE);
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE);
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join(APP_DIR)
                .join(CONFIG_FILE);
        }
    }

    PathBuf::from(".querypad.json")
}

/// The terminal belongs to the UI, so logs go to a file.
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("querypad.log")
}

/// Reads a config file. A missing file is an empty config.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}
