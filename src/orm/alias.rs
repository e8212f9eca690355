/*!
 * Connection records and the alias cache.
 */

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::driver::{DbBaser, DriverType};
use super::timezone::DbTimeZone;
use crate::database::DbHandle;

/// Alias used when callers do not name one
pub const DEFAULT_ALIAS: &str = "default";

/// One named, live database connection.
///
/// Identity fields are fixed at creation. Pool sizes, timezone and engine
/// can change later; concurrent setters on the same alias are
/// last-write-wins.
pub struct Alias {
    name: String,
    driver_type: DriverType,
    driver_name: String,
    data_source: String,
    db: DbHandle,
    baser: Arc<dyn DbBaser>,
    max_idle_conns: AtomicUsize,
    max_open_conns: AtomicUsize,
    timezone: RwLock<DbTimeZone>,
    engine: RwLock<String>,
}

impl Alias {
    pub fn new(
        name: &str,
        driver_name: &str,
        driver_type: DriverType,
        baser: Arc<dyn DbBaser>,
        data_source: &str,
        db: DbHandle,
    ) -> Self {
        Self {
            name: name.to_string(),
            driver_type,
            driver_name: driver_name.to_string(),
            data_source: data_source.to_string(),
            db,
            baser,
            max_idle_conns: AtomicUsize::new(0),
            max_open_conns: AtomicUsize::new(0),
            timezone: RwLock::new(DbTimeZone::Local),
            engine: RwLock::new(String::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver_type(&self) -> DriverType {
        self.driver_type
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    /// The live connection handle
    pub fn db(&self) -> &DbHandle {
        &self.db
    }

    pub fn baser(&self) -> &Arc<dyn DbBaser> {
        &self.baser
    }

    pub fn max_idle_conns(&self) -> usize {
        self.max_idle_conns.load(Ordering::Relaxed)
    }

    pub fn max_open_conns(&self) -> usize {
        self.max_open_conns.load(Ordering::Relaxed)
    }

    pub fn timezone(&self) -> DbTimeZone {
        *self.timezone.read()
    }

    pub fn engine(&self) -> String {
        self.engine.read().clone()
    }

    /// Record and apply a new idle-connection limit
    pub fn set_max_idle_conns(&self, n: usize) {
        self.max_idle_conns.store(n, Ordering::Relaxed);
        self.db.set_max_idle_conns(n);
    }

    /// Record and apply a new open-connection limit
    pub fn set_max_open_conns(&self, n: usize) {
        self.max_open_conns.store(n, Ordering::Relaxed);
        self.db.set_max_open_conns(n);
    }

    pub fn set_timezone(&self, tz: DbTimeZone) {
        *self.timezone.write() = tz;
    }

    pub fn set_engine(&self, engine: &str) {
        *self.engine.write() = engine.to_string();
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alias")
            .field("name", &self.name)
            .field("driver_type", &self.driver_type)
            .field("driver_name", &self.driver_name)
            .field("data_source", &self.data_source)
            .field("max_idle_conns", &self.max_idle_conns())
            .field("max_open_conns", &self.max_open_conns())
            .field("timezone", &self.timezone())
            .field("engine", &self.engine())
            .finish()
    }
}

/// Alias name to connection record, guarded by one lock for the whole table
#[derive(Default)]
pub struct AliasCache {
    cache: RwLock<HashMap<String, Arc<Alias>>>,
}

impl AliasCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `alias` under `name` unless the name is taken.
    ///
    /// Returns whether the insertion happened. Never overwrites.
    pub fn add(&self, name: &str, alias: Arc<Alias>) -> bool {
        let mut cache = self.cache.write();
        if cache.contains_key(name) {
            return false;
        }
        cache.insert(name.to_string(), alias);
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<Alias>> {
        self.cache.read().get(name).cloned()
    }

    pub fn get_default(&self) -> Option<Arc<Alias>> {
        self.get(DEFAULT_ALIAS)
    }

    /// Registered alias names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
