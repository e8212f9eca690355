/*!
 * SQLite transport.
 *
 * This module provides a [`Connector`] backed by rusqlite. The host part of
 * a data source is a database file path (`:memory:` for an in-memory
 * database); the keyspace part is accepted for compatibility and ignored.
 */

use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::driver::{Connector, Database, DbHandle, Row, SqlValue};
use crate::errors::DriverError;

/// Path that selects an in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// Opens [`SqliteDatabase`] connections
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl SqliteConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for SqliteConnector {
    fn open(&self, host: &str, target: &str, timeout: Duration) -> Result<DbHandle, DriverError> {
        debug!("Opening SQLite database {} (target {})", host, target);
        let db = SqliteDatabase::open(host, timeout)?;
        Ok(Arc::new(db))
    }
}

/// SQLite connection with recorded pool limits.
///
/// A single connection sits behind a mutex, so the pool limits are
/// bookkeeping only: they are stored and reported but never exceed one
/// physical connection.
pub struct SqliteDatabase {
    /// Path to the database file
    db_path: PathBuf,
    /// `None` once closed
    connection: Mutex<Option<Connection>>,
    max_idle_conns: AtomicUsize,
    max_open_conns: AtomicUsize,
}

impl SqliteDatabase {
    /// Open the database at `path`, waiting up to `timeout` on a locked file
    pub fn open<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self, DriverError> {
        let db_path = path.as_ref().to_path_buf();
        let open_error = |e: rusqlite::Error| DriverError::Open {
            target: db_path.display().to_string(),
            message: e.to_string(),
        };

        let conn = if db_path.as_os_str() == MEMORY_PATH {
            Connection::open_in_memory().map_err(open_error)?
        } else {
            Connection::open(&db_path).map_err(open_error)?
        };
        conn.busy_timeout(timeout).map_err(open_error)?;

        Ok(Self {
            db_path,
            connection: Mutex::new(Some(conn)),
            max_idle_conns: AtomicUsize::new(0),
            max_open_conns: AtomicUsize::new(0),
        })
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self, DriverError> {
        Self::open(MEMORY_PATH, Duration::from_secs(0))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Current `(max_idle_conns, max_open_conns)`
    pub fn pool_limits(&self) -> (usize, usize) {
        (
            self.max_idle_conns.load(Ordering::Relaxed),
            self.max_open_conns.load(Ordering::Relaxed),
        )
    }

    pub fn is_closed(&self) -> bool {
        self.connection.lock().map(|c| c.is_none()).unwrap_or(true)
    }

    /// Execute an operation with the open connection
    fn with_connection<F, T>(&self, f: F) -> Result<T, DriverError>
    where
        F: FnOnce(&Connection) -> Result<T, DriverError>,
    {
        let guard = self
            .connection
            .lock()
            .map_err(|e| DriverError::Query(format!("Failed to acquire database lock: {}", e)))?;

        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(DriverError::Closed),
        }
    }
}

impl Database for SqliteDatabase {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize, DriverError> {
        self.with_connection(|conn| {
            let affected = conn.execute(sql, params_from_iter(params.iter().map(to_sqlite)))?;
            Ok(affected)
        })
    }

    fn query_row(&self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>, DriverError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns = stmt.column_count();
            let mut rows = stmt.query(params_from_iter(params.iter().map(to_sqlite)))?;

            match rows.next()? {
                Some(row) => {
                    let mut values = Vec::with_capacity(columns);
                    for idx in 0..columns {
                        values.push(from_sqlite(row.get::<_, Value>(idx)?));
                    }
                    Ok(Some(Row::new(values)))
                }
                None => Ok(None),
            }
        })
    }

    fn set_max_idle_conns(&self, n: usize) {
        self.max_idle_conns.store(n, Ordering::Relaxed);
    }

    fn set_max_open_conns(&self, n: usize) {
        self.max_open_conns.store(n, Ordering::Relaxed);
    }

    fn close(&self) -> Result<(), DriverError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|e| DriverError::Query(format!("Failed to acquire database lock: {}", e)))?;

        if let Some(conn) = guard.take() {
            debug!("Closing SQLite database {:?}", self.db_path);
            conn.close().map_err(|(_, e)| DriverError::Sqlite(e))?;
        }
        Ok(())
    }
}

fn to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Integer(*i),
        SqlValue::Real(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Blob(b) => Value::Blob(b.clone()),
    }
}

fn from_sqlite(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(i),
        Value::Real(f) => SqlValue::Real(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    }
}
