/*!
 * Error types for the vitessorm crate.
 *
 * This module contains custom error types for the alias registry, the
 * session store and the underlying SQL transport, using the thiserror
 * crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised by a SQL transport (connector or open connection)
#[derive(Error, Debug)]
pub enum DriverError {
    /// Opening a connection failed
    #[error("Failed to open connection to {target}: {message}")]
    Open {
        /// Host part of the data source
        target: String,
        /// Transport-specific message
        message: String,
    },

    /// A statement or query failed
    #[error("Query failed: {0}")]
    Query(String),

    /// The connection was already closed
    #[error("Connection is closed")]
    Closed,

    /// Error from the SQLite transport
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors that can occur when registering or looking up database aliases
#[derive(Error, Debug)]
pub enum OrmError {
    /// Driver name already registered with another driver type
    #[error("driverName `{0}` db driver already registered and is other type")]
    DriverConflict(String),

    /// Alias registration referenced a driver name that was never registered
    #[error("driver name `{0}` have not registered")]
    UnknownDriver(String),

    /// Alias name is already taken
    #[error("DataBase alias name `{0}` already registered, cannot reuse")]
    DuplicateAlias(String),

    /// Opening the connection for an alias failed
    #[error("register db `{alias}`, {source}")]
    ConnectionOpenFailure {
        /// Alias being registered
        alias: String,
        /// Underlying transport error
        #[source]
        source: DriverError,
    },

    /// Lookup or mutation on an alias that is not registered
    #[error("DataBase of alias name `{0}` not found")]
    AliasNotFound(String),

    /// Data source string is not of the form `host@keyspace`
    #[error("invalid data source `{0}`, expected `<host>@<keyspace>`")]
    InvalidDataSource(String),
}

/// Errors that can occur in the session provider and session stores
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session blob could not be encoded or decoded
    #[error("Session serialization failed: {0}")]
    SerializationFailure(String),

    /// Opening the backing store connection failed
    #[error("Session store connection failed: {0}")]
    Connection(#[source] DriverError),

    /// A statement against the session table failed
    #[error("Session store query failed: {0}")]
    Database(#[from] DriverError),

    /// Save path or table name is unusable
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    /// The provider was used before `init`
    #[error("Session provider `{0}` is not initialized")]
    NotInitialized(String),

    /// A provider with this name is already registered
    #[error("Session provider `{0}` already registered")]
    DuplicateProvider(String),

    /// No provider registered under this name
    #[error("Unknown session provider `{0}`")]
    UnknownProvider(String),
}

impl From<rmp_serde::encode::Error> for SessionError {
    fn from(error: rmp_serde::encode::Error) -> Self {
        Self::SerializationFailure(error.to_string())
    }
}

impl From<rmp_serde::decode::Error> for SessionError {
    fn from(error: rmp_serde::decode::Error) -> Self {
        Self::SerializationFailure(error.to_string())
    }
}
