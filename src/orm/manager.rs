/*!
 * Connection alias manager.
 *
 * [`Orm`] owns the driver registry, the alias cache and the connector used
 * to open new connections. Build one at startup and share it by reference
 * (or `Arc`) with everything that needs a database.
 */

use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use super::alias::{Alias, AliasCache, DEFAULT_ALIAS};
use super::detect;
use super::driver::{DriverRegistry, DriverType};
use super::timezone::DbTimeZone;
use crate::database::{Connector, DataSource, DbHandle, SqliteConnector};
use crate::errors::OrmError;

/// Connect timeout used when `register_database` gets no parameters
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Closes a freshly opened connection unless registration completes
struct CloseOnError {
    db: Option<DbHandle>,
    alias: String,
}

impl CloseOnError {
    fn new(alias: &str, db: DbHandle) -> Self {
        Self {
            db: Some(db),
            alias: alias.to_string(),
        }
    }

    fn disarm(mut self) {
        self.db = None;
    }
}

impl Drop for CloseOnError {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            if let Err(e) = db.close() {
                warn!("Closing connection for `{}` failed: {}", self.alias, e);
            }
        }
    }
}

/// Registry of named database connections
pub struct Orm {
    drivers: DriverRegistry,
    aliases: AliasCache,
    connector: Arc<dyn Connector>,
}

impl Orm {
    /// Create a manager that opens connections through `connector`
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            drivers: DriverRegistry::new(),
            aliases: AliasCache::new(),
            connector,
        }
    }

    /// Create a manager backed by SQLite files
    pub fn with_sqlite() -> Self {
        Self::new(Arc::new(SqliteConnector::new()))
    }

    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    pub fn aliases(&self) -> &AliasCache {
        &self.aliases
    }

    /// Register a driver name under a driver type
    pub fn register_driver(&self, driver_name: &str, typ: DriverType) -> Result<(), OrmError> {
        self.drivers
            .register(driver_name, typ)
            .inspect_err(|e| error!("{}", e))
    }

    /// Open a connection for `data_source` and register it as `alias_name`.
    ///
    /// `params[0]` is both the connect timeout in seconds and the max idle
    /// connections. The last parameter after it sets the max open
    /// connections, so `[5, 100]` and `[5, 10, 100]` both mean 100.
    pub fn register_database(
        &self,
        alias_name: &str,
        driver_name: &str,
        data_source: &str,
        params: &[usize],
    ) -> Result<(), OrmError> {
        self.try_register_database(alias_name, driver_name, data_source, params)
            .inspect_err(|e| error!("{}", e))
    }

    fn try_register_database(
        &self,
        alias_name: &str,
        driver_name: &str,
        data_source: &str,
        params: &[usize],
    ) -> Result<(), OrmError> {
        let ds = DataSource::parse(data_source)
            .ok_or_else(|| OrmError::InvalidDataSource(data_source.to_string()))?;
        let timeout = params
            .first()
            .map(|secs| Duration::from_secs(*secs as u64))
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);

        let db = self
            .connector
            .open(&ds.host, &ds.target(), timeout)
            .map_err(|source| OrmError::ConnectionOpenFailure {
                alias: alias_name.to_string(),
                source,
            })?;
        let guard = CloseOnError::new(alias_name, Arc::clone(&db));

        let alias = self.add_alias(alias_name, driver_name, data_source, db)?;
        guard.disarm();

        detect::detect(&alias);

        if let Some((idle, rest)) = params.split_first() {
            alias.set_max_idle_conns(*idle);
            if let Some(open) = rest.last() {
                alias.set_max_open_conns(*open);
            }
        }

        info!(
            "Registered database alias `{}` ({} via {})",
            alias_name, alias.driver_type(), ds.host
        );
        Ok(())
    }

    /// Register an already opened connection as `alias_name`.
    ///
    /// On failure the connection is left open; the caller still owns it.
    pub fn add_alias_with_db(
        &self,
        alias_name: &str,
        driver_name: &str,
        db: DbHandle,
    ) -> Result<(), OrmError> {
        self.add_alias(alias_name, driver_name, "", db)
            .map(|_| ())
            .inspect_err(|e| error!("{}", e))
    }

    fn add_alias(
        &self,
        alias_name: &str,
        driver_name: &str,
        data_source: &str,
        db: DbHandle,
    ) -> Result<Arc<Alias>, OrmError> {
        let (driver_type, baser) = self
            .drivers
            .lookup(driver_name)
            .ok_or_else(|| OrmError::UnknownDriver(driver_name.to_string()))?;

        let alias = Arc::new(Alias::new(
            alias_name,
            driver_name,
            driver_type,
            baser,
            data_source,
            db,
        ));

        if !self.aliases.add(alias_name, Arc::clone(&alias)) {
            return Err(OrmError::DuplicateAlias(alias_name.to_string()));
        }
        Ok(alias)
    }

    /// Full connection record for `alias_name`
    pub fn alias(&self, alias_name: &str) -> Result<Arc<Alias>, OrmError> {
        self.aliases
            .get(alias_name)
            .ok_or_else(|| OrmError::AliasNotFound(alias_name.to_string()))
    }

    /// Live connection for `alias_name`, or for `default` when `None`
    pub fn get_db(&self, alias_name: Option<&str>) -> Result<DbHandle, OrmError> {
        let alias = self.alias(alias_name.unwrap_or(DEFAULT_ALIAS))?;
        Ok(Arc::clone(alias.db()))
    }

    /// Driver type behind a registered alias
    pub fn driver_type_of(&self, alias_name: &str) -> Result<DriverType, OrmError> {
        Ok(self.alias(alias_name)?.driver_type())
    }

    /// Change the max idle connections of a registered alias
    pub fn set_max_idle_conns(&self, alias_name: &str, n: usize) -> Result<(), OrmError> {
        self.alias(alias_name)?.set_max_idle_conns(n);
        Ok(())
    }

    /// Change the max open connections of a registered alias
    pub fn set_max_open_conns(&self, alias_name: &str, n: usize) -> Result<(), OrmError> {
        self.alias(alias_name)?.set_max_open_conns(n);
        Ok(())
    }

    /// Change the timezone used for a registered alias
    pub fn set_database_tz(&self, alias_name: &str, tz: DbTimeZone) -> Result<(), OrmError> {
        self.alias(alias_name)?.set_timezone(tz);
        Ok(())
    }

    /// Registered alias names, sorted
    pub fn alias_names(&self) -> Vec<String> {
        self.aliases.names()
    }
}

impl Default for Orm {
    fn default() -> Self {
        Self::with_sqlite()
    }
}
