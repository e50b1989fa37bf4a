//! Input handling and key mapping.
//!
//! Translates crossterm events into the engine's [`KeyChord`]s. Which
//! chord does what is decided by the engine's keymaps, not here.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use querypad_core::{Key, KeyChord, Modifiers};

/// Lines moved per mouse wheel notch.
const SCROLL_LINES: isize = 3;

/// Converts a terminal key event into a chord. Releases and keys the
/// engine has no name for return `None`.
pub fn chord_from_key_event(event: &KeyEvent) -> Option<KeyChord> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let mut modifiers = modifiers_from(event.modifiers);
    let key = match event.code {
        KeyCode::Char(ch) => Key::Char(ch),
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => {
            modifiers.shift = true;
            Key::Tab
        }
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Esc => Key::Escape,
        _ => return None,
    };
    Some(KeyChord::new(key, modifiers).normalized())
}

fn modifiers_from(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        // Terminals report Option/Alt as either flag.
        alt: mods.intersects(KeyModifiers::ALT | KeyModifiers::META),
        shift: mods.contains(KeyModifiers::SHIFT),
        meta: mods.contains(KeyModifiers::SUPER),
    }
}

/// Lines to scroll for a wheel event; negative scrolls up.
pub fn scroll_delta(event: &MouseEvent) -> Option<isize> {
    match event.kind {
        MouseEventKind::ScrollUp => Some(-SCROLL_LINES),
        MouseEventKind::ScrollDown => Some(SCROLL_LINES),
        _ => None,
    }
}
