/*!
 * Session table definition.
 *
 * The session provider only needs one table. This module creates it on
 * demand; there is no versioning and no migration.
 */

use log::info;

use super::driver::Database;
use crate::errors::DriverError;

/// Default name of the session table
pub const DEFAULT_SESSION_TABLE: &str = "session";

/// True when `name` can be spliced into SQL as a bare identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Create the session table and its expiry index if they do not exist
pub fn ensure_session_table(db: &dyn Database, table: &str) -> Result<(), DriverError> {
    if !is_valid_identifier(table) {
        return Err(DriverError::Query(format!("invalid table name `{}`", table)));
    }

    db.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                session_key VARCHAR(64) NOT NULL PRIMARY KEY,
                session_data BLOB,
                session_expiry BIGINT NOT NULL
            )"
        ),
        &[],
    )?;
    db.execute(
        &format!("CREATE INDEX IF NOT EXISTS idx_{table}_expiry ON {table}(session_expiry)"),
        &[],
    )?;

    info!("Session table `{}` is ready", table);
    Ok(())
}
