/*!
 * Database transport layer.
 *
 * This module provides:
 * - The opaque transport capability (`Connector`, `Database`)
 * - A SQLite implementation of that capability
 * - The session table definition
 */

pub mod connection;
pub mod driver;
pub mod schema;

// Re-export main types
pub use connection::{SqliteConnector, SqliteDatabase};
pub use driver::{Connector, DataSource, Database, DbHandle, Row, SqlValue};
