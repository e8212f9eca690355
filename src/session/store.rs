/*!
 * Session store instances.
 *
 * A [`SessionStore`] mirrors one session's values in memory between
 * `read` and `release`. It owns the connection it was read with and closes
 * it when released or dropped.
 */

use log::{debug, warn};
use parking_lot::RwLock;
use serde_json::Value;

use super::codec::{self, SessionValues};
use crate::database::DbHandle;
use crate::errors::SessionError;

/// Per-request view of a session, as handed out by a provider
pub trait Store: Send + Sync {
    /// Set a value
    fn set(&self, key: &str, value: Value);

    /// Get a value, `None` when the key is absent
    fn get(&self, key: &str) -> Option<Value>;

    /// Delete a value
    fn delete(&self, key: &str);

    /// Remove every value
    fn flush(&self);

    /// Identifier of this session
    fn session_id(&self) -> &str;

    /// Persist the values and give the connection back
    fn release(self: Box<Self>) -> Result<(), SessionError>;
}

/// Session values backed by a row in a SQL session table
pub struct SessionStore {
    db: Option<DbHandle>,
    sid: String,
    table: String,
    values: RwLock<SessionValues>,
}

impl SessionStore {
    pub(crate) fn new(db: DbHandle, sid: &str, table: &str, values: SessionValues) -> Self {
        Self {
            db: Some(db),
            sid: sid.to_string(),
            table: table.to_string(),
            values: RwLock::new(values),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn delete(&self, key: &str) {
        self.values.write().remove(key);
    }

    pub fn flush(&self) {
        *self.values.write() = SessionValues::new();
    }

    pub fn session_id(&self) -> &str {
        &self.sid
    }

    /// Write the values and the current time to this session's row, then
    /// close the connection.
    ///
    /// Values that cannot be encoded are dropped with a warning; the row
    /// keeps its previous contents.
    pub fn release(mut self) -> Result<(), SessionError> {
        let Some(db) = self.db.take() else {
            return Ok(());
        };

        let result = self.persist(&db);
        if let Err(e) = db.close() {
            warn!("Closing session connection for {} failed: {}", self.sid, e);
        }
        result
    }

    fn persist(&self, db: &DbHandle) -> Result<(), SessionError> {
        let blob = match codec::encode(&self.values.read()) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Dropping save of session {}: {}", self.sid, e);
                return Ok(());
            }
        };

        db.execute(
            &format!(
                "UPDATE {} SET session_data = ?, session_expiry = ? WHERE session_key = ?",
                self.table
            ),
            &[
                blob.into(),
                chrono::Utc::now().timestamp().into(),
                self.sid.as_str().into(),
            ],
        )?;
        debug!("Session {} saved", self.sid);
        Ok(())
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            debug!("Session {} dropped without release, discarding changes", self.sid);
            if let Err(e) = db.close() {
                warn!("Closing session connection for {} failed: {}", self.sid, e);
            }
        }
    }
}

impl Store for SessionStore {
    fn set(&self, key: &str, value: Value) {
        SessionStore::set(self, key, value);
    }

    fn get(&self, key: &str) -> Option<Value> {
        SessionStore::get(self, key)
    }

    fn delete(&self, key: &str) {
        SessionStore::delete(self, key);
    }

    fn flush(&self) {
        SessionStore::flush(self);
    }

    fn session_id(&self) -> &str {
        SessionStore::session_id(self)
    }

    fn release(self: Box<Self>) -> Result<(), SessionError> {
        SessionStore::release(*self)
    }
}
