//! SQLite statement runner.

use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Rows kept from a single result set before truncating.
pub const DEFAULT_MAX_ROWS: usize = 1000;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("nothing to execute")]
    EmptyQuery,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// A single SQLite cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Columns and rows returned by a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// More rows existed than were kept.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(ResultSet),
    Affected(usize),
}

impl QueryOutcome {
    /// One-line description for a status bar.
    pub fn summary(&self) -> String {
        match self {
            QueryOutcome::Rows(set) => {
                let plural = if set.rows.len() == 1 { "" } else { "s" };
                let more = if set.truncated { "+" } else { "" };
                format!("{}{more} row{plural}", set.rows.len())
            }
            QueryOutcome::Affected(n) => {
                let plural = if *n == 1 { "" } else { "s" };
                format!("{n} row{plural} affected")
            }
        }
    }
}

/// Runs SQL text against one SQLite connection.
pub struct SqliteRunner {
    conn: Connection,
    max_rows: usize,
}

impl fmt::Debug for SqliteRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteRunner")
            .field("path", &self.conn.path())
            .field("max_rows", &self.max_rows)
            .finish()
    }
}

impl SqliteRunner {
    pub fn open_in_memory() -> Result<Self, ExecError> {
        log::info!("Opening in-memory SQLite database");
        Ok(Self::with_connection(Connection::open_in_memory()?))
    }

    /// Opens (creating if needed) a database file.
    pub fn open(path: &Path) -> Result<Self, ExecError> {
        log::info!("Opening SQLite database {}", path.display());
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self::with_connection(conn))
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    pub fn set_max_rows(&mut self, max_rows: usize) {
        self.max_rows = max_rows.max(1);
    }

    /// Runs every statement in `sql` in order and returns the outcome of
    /// the last one. Stops at the first failing statement; earlier
    /// statements stay applied.
    pub fn execute(&self, sql: &str) -> Result<QueryOutcome, ExecError> {
        if sql.trim().is_empty() {
            return Err(ExecError::EmptyQuery);
        }

        let start = std::time::Instant::now();
        let mut batch = Batch::new(&self.conn, sql);
        let mut last = None;
        let mut count = 0usize;

        while let Some(mut stmt) = batch.next()? {
            count += 1;
            let outcome = if stmt.column_count() > 0 {
                let columns = stmt.column_names().iter().map(|c| c.to_string()).collect();
                let width = stmt.column_count();
                let mut set = ResultSet {
                    columns,
                    ..ResultSet::default()
                };
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    if set.rows.len() == self.max_rows {
                        set.truncated = true;
                        break;
                    }
                    let values = (0..width)
                        .map(|i| row.get_ref(i).map(Value::from))
                        .collect::<Result<Vec<_>, _>>()?;
                    set.rows.push(values);
                }
                QueryOutcome::Rows(set)
            } else {
                QueryOutcome::Affected(stmt.execute([])?)
            };
            last = Some(outcome);
        }

        let outcome = last.ok_or(ExecError::EmptyQuery)?;
        log::debug!(
            "Executed {count} statement(s) in {}ms: {}",
            start.elapsed().as_millis(),
            outcome.summary()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(outcome: QueryOutcome) -> ResultSet {
        match outcome {
            QueryOutcome::Rows(set) => set,
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn test_select_one() {
        let runner = SqliteRunner::open_in_memory().unwrap();
        let set = rows(runner.execute("SELECT 1").unwrap());
        assert_eq!(set.columns, vec!["1".to_string()]);
        assert_eq!(set.rows, vec![vec![Value::Integer(1)]]);
        assert!(!set.truncated);
    }

    #[test]
    fn test_batch_returns_last_outcome() {
        let runner = SqliteRunner::open_in_memory().unwrap();
        let outcome = runner
            .execute(
                "CREATE TABLE t (id INTEGER, name TEXT);
                 INSERT INTO t VALUES (1, 'a'), (2, NULL);
                 SELECT name, id FROM t ORDER BY id;",
            )
            .unwrap();
        let set = rows(outcome);
        assert_eq!(set.columns, vec!["name", "id"]);
        assert_eq!(
            set.rows,
            vec![
                vec![Value::Text("a".into()), Value::Integer(1)],
                vec![Value::Null, Value::Integer(2)],
            ]
        );
    }

    #[test]
    fn test_affected_rows() {
        let runner = SqliteRunner::open_in_memory().unwrap();
        runner.execute("CREATE TABLE t (x)").unwrap();
        let outcome = runner.execute("INSERT INTO t VALUES (1), (2), (3)").unwrap();
        assert_eq!(outcome, QueryOutcome::Affected(3));
        assert_eq!(outcome.summary(), "3 rows affected");
    }

    #[test]
    fn test_empty_query() {
        let runner = SqliteRunner::open_in_memory().unwrap();
        assert!(matches!(runner.execute("  \n "), Err(ExecError::EmptyQuery)));
    }

    #[test]
    fn test_syntax_error_message() {
        let runner = SqliteRunner::open_in_memory().unwrap();
        let err = runner.execute("SELEC 1").unwrap_err();
        assert!(matches!(err, ExecError::Sqlite(_)));
        assert!(err.to_string().contains("syntax error"), "{err}");
    }

    #[test]
    fn test_truncation() {
        let mut runner = SqliteRunner::open_in_memory().unwrap();
        runner.set_max_rows(2);
        let set = rows(
            runner
                .execute("WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 5) SELECT x FROM n")
                .unwrap(),
        );
        assert_eq!(set.rows.len(), 2);
        assert!(set.truncated);
        assert_eq!(QueryOutcome::Rows(set).summary(), "2+ rows");
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pad.db");
        {
            let runner = SqliteRunner::open(&path).unwrap();
            runner.execute("CREATE TABLE t (x); INSERT INTO t VALUES (42)").unwrap();
        }
        let runner = SqliteRunner::open(&path).unwrap();
        let set = rows(runner.execute("SELECT x FROM t").unwrap());
        assert_eq!(set.rows, vec![vec![Value::Integer(42)]]);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Real(1.5).to_string(), "1.5");
        assert_eq!(Value::Blob(vec![0, 1]).to_string(), "<2 bytes>");
    }
}
