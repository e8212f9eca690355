/*!
 * SQL-backed session provider.
 *
 * Every operation opens its own connection from the configured save path.
 * `read` and `regenerate` hand that connection to the returned store; all
 * other operations close it before returning.
 */

use log::{debug, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use super::codec::{self, SessionValues};
use super::store::{SessionStore, Store};
use crate::database::schema::{self, DEFAULT_SESSION_TABLE};
use crate::database::{Connector, DataSource, Database, DbHandle, SqlValue};
use crate::errors::SessionError;

/// Name the provider registers under
pub const PROVIDER_NAME: &str = "vitess";

/// Timeout for each connection the provider opens
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Server-side session storage, as consumed by a session manager
pub trait Provider: Send + Sync {
    /// Configure the GC lifetime (seconds) and the data source to store in
    fn init(&self, max_lifetime: i64, save_path: &str) -> Result<(), SessionError>;

    /// Load a session, creating its row when missing
    fn read(&self, sid: &str) -> Result<Box<dyn Store>, SessionError>;

    /// Whether a row exists for `sid`
    fn exist(&self, sid: &str) -> Result<bool, SessionError>;

    /// Move a session from `old_sid` to `sid`
    fn regenerate(&self, old_sid: &str, sid: &str) -> Result<Box<dyn Store>, SessionError>;

    /// Delete the row for `sid`
    fn destroy(&self, sid: &str) -> Result<(), SessionError>;

    /// Delete expired rows, returning how many were removed
    fn gc(&self) -> Result<usize, SessionError>;

    /// Number of stored sessions
    fn count(&self) -> Result<i64, SessionError>;
}

#[derive(Debug, Clone)]
struct ProviderSettings {
    max_lifetime: i64,
    save_path: DataSource,
}

/// Session provider storing rows in a `session_key`/`session_data`/
/// `session_expiry` table
pub struct VitessProvider {
    connector: Arc<dyn Connector>,
    table: String,
    settings: RwLock<Option<ProviderSettings>>,
}

impl VitessProvider {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            table: DEFAULT_SESSION_TABLE.to_string(),
            settings: RwLock::new(None),
        }
    }

    /// Use `table` instead of the default `session` table
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// GC lifetime in seconds, once initialized
    pub fn max_lifetime(&self) -> Option<i64> {
        self.settings.read().as_ref().map(|s| s.max_lifetime)
    }

    /// Create the session table if it does not exist
    pub fn ensure_table(&self) -> Result<(), SessionError> {
        self.with_connection(|db| Ok(schema::ensure_session_table(db, &self.table)?))
    }

    fn connect(&self) -> Result<DbHandle, SessionError> {
        let save_path = self
            .settings
            .read()
            .as_ref()
            .map(|s| s.save_path.clone())
            .ok_or_else(|| SessionError::NotInitialized(PROVIDER_NAME.to_string()))?;

        self.connector
            .open(&save_path.host, &save_path.target(), CONNECT_TIMEOUT)
            .map_err(SessionError::Connection)
    }

    /// Run `f` on a fresh connection and close it afterwards
    fn with_connection<T, F>(&self, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&dyn Database) -> Result<T, SessionError>,
    {
        let db = self.connect()?;
        let result = f(db.as_ref());
        close_quietly(&db);
        result
    }

    /// Build a store around `db`, closing it when `load` fails
    fn open_store<F>(&self, sid: &str, load: F) -> Result<Box<dyn Store>, SessionError>
    where
        F: FnOnce(&dyn Database) -> Result<SessionValues, SessionError>,
    {
        let db = self.connect()?;
        match load(db.as_ref()) {
            Ok(values) => Ok(Box::new(SessionStore::new(db, sid, &self.table, values))),
            Err(e) => {
                close_quietly(&db);
                Err(e)
            }
        }
    }

    fn select_data(&self, db: &dyn Database, sid: &str) -> Result<Option<Vec<u8>>, SessionError> {
        let row = db.query_row(
            &format!("SELECT session_data FROM {} WHERE session_key = ?", self.table),
            &[sid.into()],
        )?;
        Ok(row.map(|r| r.get_bytes(0).unwrap_or_default()))
    }

    fn insert_empty(&self, db: &dyn Database, sid: &str) -> Result<(), SessionError> {
        db.execute(
            &format!(
                "INSERT INTO {} (session_key, session_data, session_expiry) VALUES (?, ?, ?)",
                self.table
            ),
            &[
                sid.into(),
                SqlValue::Blob(Vec::new()),
                chrono::Utc::now().timestamp().into(),
            ],
        )?;
        Ok(())
    }

    /// Blob stored for `sid`, inserting an empty row when there is none.
    ///
    /// The flag is true when this call created the row. A failed insert is
    /// retried as a select, since a concurrent request may have created the
    /// row between our select and insert.
    fn select_or_insert(&self, db: &dyn Database, sid: &str) -> Result<(Vec<u8>, bool), SessionError> {
        if let Some(data) = self.select_data(db, sid)? {
            return Ok((data, false));
        }

        debug!("Creating session {}", sid);
        match self.insert_empty(db, sid) {
            Ok(()) => Ok((Vec::new(), true)),
            Err(e) => match self.select_data(db, sid)? {
                Some(data) => {
                    debug!("Session {} was created concurrently", sid);
                    Ok((data, false))
                }
                None => Err(e),
            },
        }
    }

    fn delete_row(&self, db: &dyn Database, sid: &str) -> Result<usize, SessionError> {
        Ok(db.execute(
            &format!("DELETE FROM {} WHERE session_key = ?", self.table),
            &[sid.into()],
        )?)
    }
}

impl Provider for VitessProvider {
    fn init(&self, max_lifetime: i64, save_path: &str) -> Result<(), SessionError> {
        let save_path = DataSource::parse(save_path).ok_or_else(|| {
            SessionError::InvalidConfig(format!(
                "save path `{}` must look like `<host>@<keyspace>`",
                save_path
            ))
        })?;
        if !schema::is_valid_identifier(&self.table) {
            return Err(SessionError::InvalidConfig(format!(
                "invalid session table name `{}`",
                self.table
            )));
        }

        info!(
            "Session provider storing in `{}` on {} (max lifetime {}s)",
            self.table, save_path, max_lifetime
        );
        *self.settings.write() = Some(ProviderSettings {
            max_lifetime,
            save_path,
        });
        Ok(())
    }

    fn read(&self, sid: &str) -> Result<Box<dyn Store>, SessionError> {
        self.open_store(sid, |db| {
            let (data, _) = self.select_or_insert(db, sid)?;
            codec::decode(&data)
        })
    }

    fn exist(&self, sid: &str) -> Result<bool, SessionError> {
        self.with_connection(|db| Ok(self.select_data(db, sid)?.is_some()))
    }

    fn regenerate(&self, old_sid: &str, sid: &str) -> Result<Box<dyn Store>, SessionError> {
        self.open_store(sid, |db| {
            let (data, created) = self.select_or_insert(db, old_sid)?;
            let values = codec::decode(&data)?;

            let renamed = db.execute(
                &format!("UPDATE {} SET session_key = ? WHERE session_key = ?", self.table),
                &[sid.into(), old_sid.into()],
            );
            if let Err(e) = renamed {
                // drop the placeholder row this call inserted
                if created {
                    if let Err(cleanup) = self.delete_row(db, old_sid) {
                        warn!("Removing placeholder session {} failed: {}", old_sid, cleanup);
                    }
                }
                return Err(e.into());
            }

            debug!("Session {} regenerated as {}", old_sid, sid);
            Ok(values)
        })
    }

    fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.with_connection(|db| {
            self.delete_row(db, sid)?;
            Ok(())
        })
    }

    fn gc(&self) -> Result<usize, SessionError> {
        let max_lifetime = self
            .max_lifetime()
            .ok_or_else(|| SessionError::NotInitialized(PROVIDER_NAME.to_string()))?;
        let cutoff = chrono::Utc::now().timestamp() - max_lifetime;

        self.with_connection(|db| {
            let removed = db.execute(
                &format!("DELETE FROM {} WHERE session_expiry < ?", self.table),
                &[cutoff.into()],
            )?;
            if removed > 0 {
                info!("Session GC removed {} expired sessions", removed);
            }
            Ok(removed)
        })
    }

    fn count(&self) -> Result<i64, SessionError> {
        self.with_connection(|db| {
            let row = db.query_row(&format!("SELECT COUNT(*) FROM {}", self.table), &[])?;
            Ok(row.and_then(|r| r.get_i64(0)).unwrap_or(0))
        })
    }
}

fn close_quietly(db: &DbHandle) {
    if let Err(e) = db.close() {
        warn!("Closing session connection failed: {}", e);
    }
}
