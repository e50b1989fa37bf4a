//! Configuration compartments.
//!
//! The editor configuration is a keyed map of independently replaceable
//! slices. Reconfiguring one compartment never touches the others and
//! never rebuilds the editor, so document, selection and history survive.

use crate::syntax::{Language, ThemeKind};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Font size the editor starts with when the host does not pick one.
pub const DEFAULT_FONT_SIZE: f32 = 13.0;

/// Name of a configuration slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Compartment(&'static str);

impl Compartment {
    pub const FONT_SIZE: Compartment = Compartment("font-size");
    pub const THEME: Compartment = Compartment("theme");
    pub const LANGUAGE: Compartment = Compartment("language");
    pub const LINE_WRAPPING: Compartment = Compartment("line-wrapping");
    pub const LINE_NUMBERS: Compartment = Compartment("line-numbers");
    pub const ACTIVE_LINE: Compartment = Compartment("active-line");
    pub const BRACKET_MATCHING: Compartment = Compartment("bracket-matching");
    pub const CLOSE_BRACKETS: Compartment = Compartment("close-brackets");
    pub const TAB_SIZE: Compartment = Compartment("tab-size");

    /// A compartment outside the built-in set. It must be defined on the
    /// configuration before it can be reconfigured.
    pub const fn custom(name: &'static str) -> Self {
        Compartment(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Value held by a compartment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setting {
    FontSize(f32),
    Theme(ThemeKind),
    Language(Language),
    Flag(bool),
    Count(usize),
}

impl Setting {
    pub fn kind(&self) -> SettingKind {
        match self {
            Setting::FontSize(_) => SettingKind::FontSize,
            Setting::Theme(_) => SettingKind::Theme,
            Setting::Language(_) => SettingKind::Language,
            Setting::Flag(_) => SettingKind::Flag,
            Setting::Count(_) => SettingKind::Count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    FontSize,
    Theme,
    Language,
    Flag,
    Count,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingKind::FontSize => "font size",
            SettingKind::Theme => "theme",
            SettingKind::Language => "language",
            SettingKind::Flag => "flag",
            SettingKind::Count => "count",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown compartment `{0}`")]
    UnknownCompartment(Compartment),
    #[error("compartment `{compartment}` holds a {expected}, got a {found}")]
    KindMismatch {
        compartment: Compartment,
        expected: SettingKind,
        found: SettingKind,
    },
    #[error("invalid font size {0}")]
    InvalidFontSize(f32),
}

/// The active editor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    slots: BTreeMap<Compartment, Setting>,
}

impl Default for Configuration {
    fn default() -> Self {
        let mut slots = BTreeMap::new();
        slots.insert(Compartment::FONT_SIZE, Setting::FontSize(DEFAULT_FONT_SIZE));
        slots.insert(Compartment::THEME, Setting::Theme(ThemeKind::Dark));
        slots.insert(Compartment::LANGUAGE, Setting::Language(Language::Sql));
        slots.insert(Compartment::LINE_WRAPPING, Setting::Flag(true));
        slots.insert(Compartment::LINE_NUMBERS, Setting::Flag(true));
        slots.insert(Compartment::ACTIVE_LINE, Setting::Flag(true));
        slots.insert(Compartment::BRACKET_MATCHING, Setting::Flag(true));
        slots.insert(Compartment::CLOSE_BRACKETS, Setting::Flag(true));
        slots.insert(Compartment::TAB_SIZE, Setting::Count(4));
        Self { slots }
    }
}

impl Configuration {
    /// Builder-style override of a built-in or custom compartment.
    pub fn with(mut self, compartment: Compartment, setting: Setting) -> Self {
        self.slots.insert(compartment, setting);
        self
    }

    pub fn get(&self, compartment: Compartment) -> Option<Setting> {
        self.slots.get(&compartment).copied()
    }

    /// Replaces the value of one compartment. The new value must have the
    /// same kind as the current one. Returns the previous value.
    pub fn reconfigure(
        &mut self,
        compartment: Compartment,
        setting: Setting,
    ) -> Result<Setting, ConfigError> {
        let slot = self
            .slots
            .get_mut(&compartment)
            .ok_or(ConfigError::UnknownCompartment(compartment))?;
        if slot.kind() != setting.kind() {
            return Err(ConfigError::KindMismatch {
                compartment,
                expected: slot.kind(),
                found: setting.kind(),
            });
        }
        if let Setting::FontSize(size) = setting {
            if !size.is_finite() || size <= 0.0 {
                return Err(ConfigError::InvalidFontSize(size));
            }
        }
        Ok(std::mem::replace(slot, setting))
    }

    pub fn font_size(&self) -> f32 {
        match self.get(Compartment::FONT_SIZE) {
            Some(Setting::FontSize(size)) => size,
            _ => DEFAULT_FONT_SIZE,
        }
    }

    pub fn theme(&self) -> ThemeKind {
        match self.get(Compartment::THEME) {
            Some(Setting::Theme(kind)) => kind,
            _ => ThemeKind::Dark,
        }
    }

    pub fn language(&self) -> Language {
        match self.get(Compartment::LANGUAGE) {
            Some(Setting::Language(language)) => language,
            _ => Language::PlainText,
        }
    }

    /// Value of a flag compartment; false when missing.
    pub fn flag(&self, compartment: Compartment) -> bool {
        matches!(self.get(compartment), Some(Setting::Flag(true)))
    }

    pub fn tab_size(&self) -> usize {
        match self.get(Compartment::TAB_SIZE) {
            Some(Setting::Count(n)) if n > 0 => n,
            _ => 4,
        }
    }

    /// Iterates over all compartments in name order.
    pub fn iter(&self) -> impl Iterator<Item = (Compartment, Setting)> + '_ {
        self.slots.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.font_size(), 13.0);
        assert_eq!(config.language(), Language::Sql);
        assert!(config.flag(Compartment::LINE_WRAPPING));
        assert_eq!(config.tab_size(), 4);
    }

    #[test]
    fn test_reconfigure_replaces_one_key() {
        let mut config = Configuration::default();
        let before = config.clone();

        let previous = config
            .reconfigure(Compartment::FONT_SIZE, Setting::FontSize(16.0))
            .unwrap();
        assert_eq!(previous, Setting::FontSize(13.0));
        assert_eq!(config.font_size(), 16.0);

        let changed: Vec<_> = config
            .iter()
            .zip(before.iter())
            .filter(|(a, b)| a != b)
            .map(|(a, _)| a.0)
            .collect();
        assert_eq!(changed, vec![Compartment::FONT_SIZE]);
    }

    #[test]
    fn test_reconfigure_rejects_kind_mismatch() {
        let mut config = Configuration::default();
        let err = config
            .reconfigure(Compartment::FONT_SIZE, Setting::Flag(true))
            .unwrap_err();
        assert!(matches!(err, ConfigError::KindMismatch { .. }));
        assert_eq!(config.font_size(), 13.0);
    }

    #[test]
    fn test_reconfigure_rejects_bad_font_sizes() {
        let mut config = Configuration::default();
        for size in [0.0, -3.0, f32::NAN, f32::INFINITY] {
            assert!(config
                .reconfigure(Compartment::FONT_SIZE, Setting::FontSize(size))
                .is_err());
        }
        assert_eq!(config.font_size(), 13.0);
    }

    #[test]
    fn test_custom_compartment() {
        const READ_ONLY: Compartment = Compartment::custom("read-only");
        let mut config = Configuration::default();
        assert_eq!(
            config.reconfigure(READ_ONLY, Setting::Flag(true)),
            Err(ConfigError::UnknownCompartment(READ_ONLY))
        );

        let mut config = config.with(READ_ONLY, Setting::Flag(false));
        config.reconfigure(READ_ONLY, Setting::Flag(true)).unwrap();
        assert!(config.flag(READ_ONLY));
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::UnknownCompartment(Compartment::custom("zoom"));
        assert_eq!(err.to_string(), "unknown compartment `zoom`");
    }
}
