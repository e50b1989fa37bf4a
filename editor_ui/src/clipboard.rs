//! Clipboard bridge.
//!
//! Uses the system clipboard through arboard when one is reachable (it is
//! not over SSH or on a bare console) and falls back to an in-process
//! register so copy and paste keep working inside the editor.

use std::fmt;

pub struct Clipboard {
    system: Option<arboard::Clipboard>,
    register: String,
}

impl fmt::Debug for Clipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clipboard")
            .field("system", &self.system.is_some())
            .field("register_len", &self.register.len())
            .finish()
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard {
    /// Connects to the system clipboard, or uses the register alone.
    pub fn new() -> Self {
        let system = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                log::info!("System clipboard unavailable, using internal register: {err}");
                None
            }
        };
        Self {
            system,
            register: String::new(),
        }
    }

    /// A clipboard that never touches the system one.
    pub fn register_only() -> Self {
        Self {
            system: None,
            register: String::new(),
        }
    }

    pub fn has_system_clipboard(&self) -> bool {
        self.system.is_some()
    }

    pub fn set_text(&mut self, text: &str) {
        self.register = text.to_string();
        if let Some(system) = self.system.as_mut() {
            if let Err(err) = system.set_text(text) {
                log::warn!("Failed to write system clipboard: {err}");
            }
        }
    }

    /// Reads the system clipboard, falling back to the last text set here.
    pub fn get_text(&mut self) -> Option<String> {
        if let Some(system) = self.system.as_mut() {
            match system.get_text() {
                Ok(text) => return Some(text),
                Err(err) => log::debug!("System clipboard read failed: {err}"),
            }
        }
        (!self.register.is_empty()).then(|| self.register.clone())
    }
}
