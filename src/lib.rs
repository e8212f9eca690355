/*!
 * # vitessorm - database aliases and SQL-backed sessions
 *
 * A Rust library giving a server process two cooperating facilities.
 *
 * ## Features
 *
 * - Register named database connections ("aliases") once at startup
 * - Add-once alias registration, safe under concurrent callers
 * - Timezone and storage engine detection right after a connection opens
 * - Runtime tuning of pool limits and timezone per alias
 * - Server-side sessions persisted in a SQL table:
 *   - read-or-create, regenerate, destroy
 *   - garbage collection of expired rows
 *   - MessagePack-encoded session values
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `database`: Transport abstraction and the SQLite implementation:
 *   - `database::driver`: `Connector` / `Database` capabilities
 *   - `database::connection`: rusqlite-backed connections
 *   - `database::schema`: Session table definition
 * - `orm`: Alias registry:
 *   - `orm::driver`: Driver name to driver type mapping
 *   - `orm::alias`: Connection records and the alias cache
 *   - `orm::manager`: Registration and runtime tuning
 * - `session`: Session provider, stores and provider registry
 * - `app_config`: Configuration management
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the Apache License 2.0
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod orm;
pub mod session;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{Connector, Database, DbHandle, SqliteConnector};
pub use errors::{DriverError, OrmError, SessionError};
pub use orm::{DbTimeZone, DriverType, Orm};
pub use session::{Provider, ProviderRegistry, Store, VitessProvider};
