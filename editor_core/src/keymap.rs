//! Key chords, editing commands and keymaps.
//!
//! Chords are written in the familiar `Mod-Shift-z` notation where `Mod`
//! is the platform primary modifier (Cmd on macOS, Ctrl elsewhere).

/// A physical key, independent of modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Self::NONE
    };
    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Self::NONE
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Self::NONE
    };
    pub const META: Modifiers = Modifiers {
        meta: true,
        ..Self::NONE
    };

    /// The platform primary modifier.
    pub fn primary() -> Modifiers {
        #[cfg(target_os = "macos")]
        {
            Self::META
        }
        #[cfg(not(target_os = "macos"))]
        {
            Self::CTRL
        }
    }

    pub fn is_primary(&self) -> bool {
        #[cfg(target_os = "macos")]
        {
            self.meta
        }
        #[cfg(not(target_os = "macos"))]
        {
            self.ctrl
        }
    }

    pub fn union(self, other: Modifiers) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            shift: self.shift || other.shift,
            meta: self.meta || other.meta,
        }
    }

    /// True when a chord with these modifiers produces text rather than a
    /// shortcut.
    pub fn is_text_entry(&self) -> bool {
        !self.ctrl && !self.alt && !self.meta
    }
}

/// A key plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    pub fn ch(ch: char) -> Self {
        Self::plain(Key::Char(ch))
    }

    /// Parses `Mod-Enter`, `Ctrl-Shift-z`, `Mod--` style notation.
    pub fn parse(notation: &str) -> Option<KeyChord> {
        let (mods, key) = if notation == "-" {
            ("", "-")
        } else if let Some(mods) = notation.strip_suffix("--") {
            (mods, "-")
        } else {
            notation.rsplit_once('-').unwrap_or(("", notation))
        };

        let mut modifiers = Modifiers::NONE;
        for name in mods.split('-').filter(|m| !m.is_empty()) {
            let m = match name {
                "Mod" => Modifiers::primary(),
                "Ctrl" | "Control" => Modifiers::CTRL,
                "Alt" | "Option" => Modifiers::ALT,
                "Shift" => Modifiers::SHIFT,
                "Meta" | "Cmd" | "Super" => Modifiers::META,
                _ => return None,
            };
            modifiers = modifiers.union(m);
        }

        let key = match key {
            "Enter" | "Return" => Key::Enter,
            "Tab" => Key::Tab,
            "Backspace" => Key::Backspace,
            "Delete" => Key::Delete,
            "ArrowLeft" | "Left" => Key::Left,
            "ArrowRight" | "Right" => Key::Right,
            "ArrowUp" | "Up" => Key::Up,
            "ArrowDown" | "Down" => Key::Down,
            "Home" => Key::Home,
            "End" => Key::End,
            "PageUp" => Key::PageUp,
            "PageDown" => Key::PageDown,
            "Escape" | "Esc" => Key::Escape,
            "Space" => Key::Char(' '),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Key::Char(ch),
                    _ => return None,
                }
            }
        };
        Some(KeyChord::new(key, modifiers).normalized())
    }

    /// Canonical form used for lookups: letters are lowercase with the
    /// shift flag carrying the case, and shift is ignored for other
    /// characters since the character already reflects it. Letters whose
    /// case does not map one-to-one (`İ`, `ẞ`) are kept as typed.
    pub fn normalized(self) -> KeyChord {
        match self.key {
            Key::Char(ch) if ch.is_uppercase() => match simple_lowercase(ch) {
                Some(lower) => KeyChord::new(
                    Key::Char(lower),
                    self.modifiers.union(Modifiers::SHIFT),
                ),
                None => self,
            },
            Key::Char(ch) if !ch.is_alphabetic() => KeyChord::new(
                Key::Char(ch),
                Modifiers {
                    shift: false,
                    ..self.modifiers
                },
            ),
            _ => self,
        }
    }

    /// The text this chord types, if it is a plain character. Shift on a
    /// normalized letter gives the uppercase form back.
    pub fn text(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) if self.modifiers.is_text_entry() && !ch.is_control() => {
                if self.modifiers.shift {
                    ch.to_uppercase().next()
                } else {
                    Some(ch)
                }
            }
            _ => None,
        }
    }
}

/// The lowercase form of `ch` when it is one char and uppercases back to
/// `ch`.
fn simple_lowercase(ch: char) -> Option<char> {
    let mut lower = ch.to_lowercase();
    let (Some(l), None) = (lower.next(), lower.next()) else {
        return None;
    };
    let mut upper = l.to_uppercase();
    matches!((upper.next(), upper.next()), (Some(u), None) if u == ch).then_some(l)
}

/// Cursor motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    CharLeft,
    CharRight,
    WordLeft,
    WordRight,
    LineUp,
    LineDown,
    LineStart,
    LineEnd,
    PageUp,
    PageDown,
    DocStart,
    DocEnd,
}

/// Editing commands the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCommand {
    /// Move the caret, collapsing the selection.
    Move(Motion),
    /// Move the caret, extending the selection.
    Select(Motion),
    SelectAll,
    InsertNewline,
    InsertTab,
    DeleteBackward,
    DeleteForward,
    DeleteWordBackward,
    DeleteWordForward,
    ToggleComment,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Command(EditCommand),
    /// Notify listeners with a named intent, e.g. `execute`.
    Emit(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub chord: KeyChord,
    pub action: KeyAction,
    /// Swallow the key even when the action reports it did nothing.
    pub prevent_default: bool,
}

/// An ordered list of bindings.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<Binding>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding. Unparseable notation is logged and skipped.
    pub fn bind(mut self, notation: &str, action: KeyAction) -> Self {
        self.push(notation, action, false);
        self
    }

    /// Adds a binding that always consumes its key.
    pub fn bind_exclusive(mut self, notation: &str, action: KeyAction) -> Self {
        self.push(notation, action, true);
        self
    }

    fn push(&mut self, notation: &str, action: KeyAction, prevent_default: bool) {
        match KeyChord::parse(notation) {
            Some(chord) => self.bindings.push(Binding {
                chord,
                action,
                prevent_default,
            }),
            None => log::warn!("Ignoring unparseable key binding {notation:?}"),
        }
    }

    pub fn lookup(&self, chord: KeyChord) -> impl Iterator<Item = &Binding> {
        let chord = chord.normalized();
        self.bindings.iter().filter(move |b| b.chord == chord)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Standard text editing bindings.
    pub fn default_keymap() -> Self {
        use EditCommand::*;
        use Motion::*;

        let word = if cfg!(target_os = "macos") { "Alt" } else { "Ctrl" };
        let cmd = |c: EditCommand| KeyAction::Command(c);

        let mut keymap = Keymap::new();
        let motions = [
            ("ArrowLeft", CharLeft),
            ("ArrowRight", CharRight),
            ("ArrowUp", LineUp),
            ("ArrowDown", LineDown),
            ("Home", LineStart),
            ("End", LineEnd),
            ("PageUp", PageUp),
            ("PageDown", PageDown),
            ("Mod-Home", DocStart),
            ("Mod-End", DocEnd),
        ];
        for (key, motion) in motions {
            keymap = keymap.bind(key, cmd(Move(motion)));
            keymap = keymap.bind(&shifted(key), cmd(Select(motion)));
        }
        for (key, motion) in [("ArrowLeft", WordLeft), ("ArrowRight", WordRight)] {
            keymap = keymap.bind(&format!("{word}-{key}"), cmd(Move(motion)));
            keymap = keymap.bind(&format!("{word}-Shift-{key}"), cmd(Select(motion)));
        }

        keymap
            .bind("Mod-a", cmd(SelectAll))
            .bind("Enter", cmd(InsertNewline))
            .bind("Tab", cmd(InsertTab))
            .bind("Backspace", cmd(DeleteBackward))
            .bind("Shift-Backspace", cmd(DeleteBackward))
            .bind("Delete", cmd(DeleteForward))
            .bind(&format!("{word}-Backspace"), cmd(DeleteWordBackward))
            .bind(&format!("{word}-Delete"), cmd(DeleteWordForward))
            .bind("Mod-/", cmd(ToggleComment))
            .bind("Mod-z", cmd(Undo))
            .bind("Mod-y", cmd(Redo))
            .bind("Mod-Shift-z", cmd(Redo))
    }
}

fn shifted(notation: &str) -> String {
    match notation.rsplit_once('-') {
        Some((mods, key)) => format!("{mods}-Shift-{key}"),
        None => format!("Shift-{notation}"),
    }
}

/// Keymap priority. Higher precedence keymaps are consulted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Low,
    Default,
    High,
    Highest,
}

/// Keymaps ordered by precedence, most recently added first within a level.
#[derive(Debug, Clone, Default)]
pub struct KeymapStack {
    layers: Vec<(Precedence, Keymap)>,
}

impl KeymapStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, precedence: Precedence, keymap: Keymap) {
        let index = self
            .layers
            .iter()
            .position(|(p, _)| *p <= precedence)
            .unwrap_or(self.layers.len());
        self.layers.insert(index, (precedence, keymap));
    }

    /// All bindings for `chord`, highest precedence first.
    pub fn lookup(&self, chord: KeyChord) -> impl Iterator<Item = &Binding> {
        self.layers.iter().flat_map(move |(_, km)| km.lookup(chord))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
