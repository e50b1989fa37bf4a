//! QueryPad - A terminal SQL scratchpad.
//!
//! The binary owns the controlled value and the SQLite connection; the
//! editor itself lives in `querypad-ui`.

pub mod app;
pub mod config;
