use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::database::schema::{is_valid_identifier, DEFAULT_SESSION_TABLE};
use crate::database::DataSource;
use crate::errors::OrmError;
use crate::orm::Orm;

/// Application configuration module
/// This module handles loading, validating and saving the database aliases
/// and session store settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Database aliases to register at startup
    #[serde(default = "default_databases")]
    pub databases: Vec<DatabaseConfig>,

    /// Session store settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// One database alias
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    // @field: Alias name
    #[serde(default = "default_alias")]
    pub alias: String,

    // @field: Registered driver name
    #[serde(default = "default_driver")]
    pub driver: String,

    // @field: `<host>@<keyspace>`
    pub data_source: String,

    // @field: Timeout seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: usize,

    // @field: Pool idle limit
    #[serde(default)]
    pub max_idle_conns: Option<usize>,

    // @field: Pool open limit
    #[serde(default)]
    pub max_open_conns: Option<usize>,
}

impl DatabaseConfig {
    // @param alias: Alias name
    // @param data_source: `<host>@<keyspace>`
    // @returns: Alias config with defaults
    pub fn new(alias: &str, data_source: &str) -> Self {
        Self {
            alias: alias.to_string(),
            driver: default_driver(),
            data_source: data_source.to_string(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_idle_conns: None,
            max_open_conns: None,
        }
    }

    /// Positional parameters for `Orm::register_database`.
    ///
    /// The first parameter doubles as the idle limit there, so only the
    /// timeout and the open limit travel positionally.
    pub fn pool_params(&self) -> Vec<usize> {
        let mut params = vec![self.connect_timeout_secs];
        params.extend(self.max_open_conns);
        params
    }

    /// Register this alias on `orm`, then apply `max_idle_conns` when set
    pub fn register(&self, orm: &Orm) -> Result<(), OrmError> {
        orm.register_database(&self.alias, &self.driver, &self.data_source, &self.pool_params())?;
        if let Some(idle) = self.max_idle_conns {
            orm.set_max_idle_conns(&self.alias, idle)?;
        }
        Ok(())
    }
}

/// Session store configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    /// Registered provider name
    #[serde(default = "default_session_provider")]
    pub provider: String,

    /// Data source the provider opens connections to
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Seconds after the last write before a session is collected
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: i64,

    /// Session table name
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Seconds between GC runs in `gc --interval` mode
    #[serde(default = "default_gc_interval_secs")]
    pub gc_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            provider: default_session_provider(),
            save_path: default_save_path(),
            max_lifetime_secs: default_max_lifetime_secs(),
            table_name: default_table_name(),
            gc_interval_secs: default_gc_interval_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_alias() -> String {
    crate::orm::DEFAULT_ALIAS.to_string()
}

fn default_driver() -> String {
    "vitess".to_string()
}

fn default_connect_timeout_secs() -> usize {
    10
}

fn default_databases() -> Vec<DatabaseConfig> {
    vec![DatabaseConfig::new(&default_alias(), "app.db@main")]
}

fn default_session_provider() -> String {
    crate::session::PROVIDER_NAME.to_string()
}

fn default_save_path() -> String {
    "sessions.db@main".to_string()
}

fn default_max_lifetime_secs() -> i64 {
    3600
}

fn default_table_name() -> String {
    DEFAULT_SESSION_TABLE.to_string()
}

fn default_gc_interval_secs() -> u64 {
    60
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.databases.is_empty() {
            return Err(anyhow!("At least one database alias must be configured"));
        }

        let mut seen = HashSet::new();
        for db in &self.databases {
            if !seen.insert(db.alias.as_str()) {
                return Err(anyhow!("Database alias `{}` is configured twice", db.alias));
            }
            if DataSource::parse(&db.data_source).is_none() {
                return Err(anyhow!(
                    "Data source `{}` of alias `{}` must look like `<host>@<keyspace>`",
                    db.data_source,
                    db.alias
                ));
            }
        }

        if DataSource::parse(&self.session.save_path).is_none() {
            return Err(anyhow!(
                "Session save path `{}` must look like `<host>@<keyspace>`",
                self.session.save_path
            ));
        }
        if self.session.max_lifetime_secs <= 0 {
            return Err(anyhow!("Session max lifetime must be positive"));
        }
        if !is_valid_identifier(&self.session.table_name) {
            return Err(anyhow!("Invalid session table name `{}`", self.session.table_name));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            databases: default_databases(),
            session: SessionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
