//! QueryPad Exec - runs editor contents against an embedded SQLite
//! database.

mod runner;

pub use runner::{ExecError, QueryOutcome, ResultSet, SqliteRunner, Value, DEFAULT_MAX_ROWS};
