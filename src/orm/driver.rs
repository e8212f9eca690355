/*!
 * Driver registry.
 *
 * Maps driver names to a [`DriverType`] and each driver type to the
 * driver-specific base capability ([`DbBaser`]) used for post-open
 * detection.
 */

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::timezone::DbTimeZone;
use crate::errors::OrmError;

/// Database backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverType {
    /// Vitess (MySQL protocol)
    Vitess,
    /// Embedded SQLite
    Sqlite,
}

impl fmt::Display for DriverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverType::Vitess => write!(f, "vitess"),
            DriverType::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for DriverType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vitess" => Ok(DriverType::Vitess),
            "sqlite" => Ok(DriverType::Sqlite),
            _ => Err(anyhow::anyhow!("Invalid driver type: {}", s)),
        }
    }
}

/// Driver-specific SQL used right after a connection is opened
pub trait DbBaser: Send + Sync {
    /// Query returning the server's offset from UTC as `[-]HH:MM:SS`
    fn timezone_query(&self) -> Option<&'static str>;

    /// Query whose first column is the default storage engine
    fn engine_query(&self) -> Option<&'static str>;

    /// Engine label used when detection yields nothing
    fn default_engine(&self) -> &'static str;

    /// Timezone assumed when the driver has no timezone query
    fn default_timezone(&self) -> DbTimeZone {
        DbTimeZone::Local
    }
}

/// Base for Vitess (and plain MySQL) servers
#[derive(Debug, Default)]
pub struct VitessBase;

impl DbBaser for VitessBase {
    fn timezone_query(&self) -> Option<&'static str> {
        Some("SELECT TIMEDIFF(NOW(), UTC_TIMESTAMP)")
    }

    fn engine_query(&self) -> Option<&'static str> {
        Some("SELECT ENGINE, TRANSACTIONS FROM information_schema.engines WHERE SUPPORT = 'DEFAULT'")
    }

    fn default_engine(&self) -> &'static str {
        "INNODB"
    }
}

/// Base for SQLite files, which always store UTC
#[derive(Debug, Default)]
pub struct SqliteBase;

impl DbBaser for SqliteBase {
    fn timezone_query(&self) -> Option<&'static str> {
        None
    }

    fn engine_query(&self) -> Option<&'static str> {
        None
    }

    fn default_engine(&self) -> &'static str {
        "sqlite"
    }

    fn default_timezone(&self) -> DbTimeZone {
        DbTimeZone::utc()
    }
}

/// Registry of driver names.
///
/// Registration is idempotent but type-immutable: a name keeps the type it
/// was first registered with.
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, DriverType>>,
    bases: HashMap<DriverType, Arc<dyn DbBaser>>,
}

impl DriverRegistry {
    /// Registry pre-populated with the `vitess` and `sqlite` drivers
    pub fn new() -> Self {
        let mut drivers = HashMap::new();
        drivers.insert("vitess".to_string(), DriverType::Vitess);
        drivers.insert("sqlite".to_string(), DriverType::Sqlite);

        let mut bases: HashMap<DriverType, Arc<dyn DbBaser>> = HashMap::new();
        bases.insert(DriverType::Vitess, Arc::new(VitessBase));
        bases.insert(DriverType::Sqlite, Arc::new(SqliteBase));

        Self {
            drivers: RwLock::new(drivers),
            bases,
        }
    }

    /// Associate `name` with `typ`
    pub fn register(&self, name: &str, typ: DriverType) -> Result<(), OrmError> {
        let mut drivers = self.drivers.write();
        match drivers.get(name) {
            Some(existing) if *existing != typ => Err(OrmError::DriverConflict(name.to_string())),
            Some(_) => Ok(()),
            None => {
                debug!("Registered driver `{}` as {}", name, typ);
                drivers.insert(name.to_string(), typ);
                Ok(())
            }
        }
    }

    /// Driver type registered under `name`
    pub fn driver_type(&self, name: &str) -> Option<DriverType> {
        self.drivers.read().get(name).copied()
    }

    /// Driver type and base capability for `name`
    pub fn lookup(&self, name: &str) -> Option<(DriverType, Arc<dyn DbBaser>)> {
        let typ = self.driver_type(name)?;
        let base = self.bases.get(&typ)?;
        Some((typ, Arc::clone(base)))
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
