/*!
 * SQL transport abstraction.
 *
 * The alias registry and the session provider never talk to a concrete
 * database library. They open connections through a [`Connector`] and use
 * the resulting [`Database`] handle to execute statements, query single
 * rows, tune pool limits and close the connection.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::DriverError;

/// A single SQL parameter or column value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

/// One result row, columns in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub values: Vec<SqlValue>,
}

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    /// Column as text. Integers and reals are formatted, NULL is `None`.
    pub fn get_text(&self, idx: usize) -> Option<String> {
        match self.values.get(idx)? {
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Integer(i) => Some(i.to_string()),
            SqlValue::Real(f) => Some(f.to_string()),
            SqlValue::Blob(b) => String::from_utf8(b.clone()).ok(),
            SqlValue::Null => None,
        }
    }

    /// Column as an integer, parsing text when needed
    pub fn get_i64(&self, idx: usize) -> Option<i64> {
        match self.values.get(idx)? {
            SqlValue::Integer(i) => Some(*i),
            SqlValue::Real(f) => Some(*f as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Column as raw bytes. NULL yields an empty buffer.
    pub fn get_bytes(&self, idx: usize) -> Option<Vec<u8>> {
        match self.values.get(idx)? {
            SqlValue::Blob(b) => Some(b.clone()),
            SqlValue::Text(s) => Some(s.as_bytes().to_vec()),
            SqlValue::Null => Some(Vec::new()),
            _ => None,
        }
    }
}

/// An open database connection.
///
/// Pool-limit changes must be safe while the connection is in use; they
/// apply to future checkouts and never drain in-flight work.
pub trait Database: Send + Sync {
    /// Execute a statement, returning the number of affected rows
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize, DriverError>;

    /// Run a query and return its first row, `None` when it returned no rows
    fn query_row(&self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>, DriverError>;

    /// Change the maximum number of idle connections
    fn set_max_idle_conns(&self, n: usize);

    /// Change the maximum number of open connections
    fn set_max_open_conns(&self, n: usize);

    /// Close the connection. Closing twice is a no-op.
    fn close(&self) -> Result<(), DriverError>;
}

/// Shared handle to an open connection
pub type DbHandle = Arc<dyn Database>;

/// Capability to open new connections
pub trait Connector: Send + Sync {
    /// Open a connection to `host`, selecting `target` (`@keyspace`), giving
    /// up after `timeout`.
    fn open(&self, host: &str, target: &str, timeout: Duration) -> Result<DbHandle, DriverError>;
}

/// A data source of the form `<host-and-port>@<keyspace>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub host: String,
    pub keyspace: String,
}

impl DataSource {
    /// Split on the first `@`. Returns `None` when there is no `@`.
    pub fn parse(data_source: &str) -> Option<Self> {
        let (host, keyspace) = data_source.split_once('@')?;
        Some(Self {
            host: host.to_string(),
            keyspace: keyspace.to_string(),
        })
    }

    /// Target string handed to the connector
    pub fn target(&self) -> String {
        format!("@{}", self.keyspace)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.host, self.keyspace)
    }
}
