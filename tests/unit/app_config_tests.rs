/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use vitessorm::app_config::{Config, DatabaseConfig, LogLevel};
use vitessorm::orm::Orm;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.databases.len(), 1);
    assert_eq!(config.databases[0].alias, "default");
    assert_eq!(config.databases[0].driver, "vitess");
    assert_eq!(config.databases[0].connect_timeout_secs, 10);

    assert_eq!(config.session.provider, "vitess");
    assert_eq!(config.session.table_name, "session");
    assert_eq!(config.session.max_lifetime_secs, 3600);
    assert_eq!(config.session.gc_interval_secs, 60);

    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.databases.push(DatabaseConfig::new("default", "other.db@main"));
    assert!(config.validate().is_err(), "duplicate alias must be rejected");
    config.databases.pop();

    config.databases[0].data_source = "no-keyspace".to_string();
    assert!(config.validate().is_err());
    config.databases[0].data_source = "app.db@main".to_string();

    config.session.max_lifetime_secs = 0;
    assert!(config.validate().is_err());
    config.session.max_lifetime_secs = 60;

    config.session.table_name = "session; DROP TABLE x".to_string();
    assert!(config.validate().is_err());
    config.session.table_name = "web_session".to_string();

    config.databases.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_poolParams_withLimits_shouldCarryTimeoutThenOpenLimit() {
    let mut db = DatabaseConfig::new("default", "app.db@main");
    assert_eq!(db.pool_params(), vec![10]);

    db.max_idle_conns = Some(5);
    assert_eq!(db.pool_params(), vec![10]);

    db.max_open_conns = Some(50);
    assert_eq!(db.pool_params(), vec![10, 50]);
}

#[test]
fn test_register_withIdleLimit_shouldOverrideTimeoutDerivedIdle() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let orm = Orm::with_sqlite();

    let mut db = DatabaseConfig::new("default", &common::data_source_in(dir.path(), "app.db"));
    db.max_open_conns = Some(20);
    db.register(&orm)?;
    assert_eq!(orm.alias("default")?.max_idle_conns(), 10);

    let mut db = DatabaseConfig::new("reports", &common::data_source_in(dir.path(), "r.db"));
    db.max_idle_conns = Some(3);
    db.max_open_conns = Some(20);
    db.register(&orm)?;
    let alias = orm.alias("reports")?;
    assert_eq!((alias.max_idle_conns(), alias.max_open_conns()), (3, 20));
    Ok(())
}

#[test]
fn test_config_saveThenLoad_shouldKeepValues() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.session.table_name = "web_session".to_string();
    config.log_level = LogLevel::Debug;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.session.table_name, "web_session");
    assert_eq!(loaded.log_level, LogLevel::Debug);
    assert_eq!(loaded.databases[0].data_source, config.databases[0].data_source);
    Ok(())
}

#[test]
fn test_config_fromPartialJson_shouldFillDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{ "databases": [ { "alias": "default", "data_source": "main.db@commerce" } ] }"#,
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.databases[0].driver, "vitess");
    assert_eq!(config.databases[0].max_open_conns, None);
    assert_eq!(config.session.save_path, "sessions.db@main");
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_config_fromMissingFile_shouldFail() {
    assert!(Config::from_file("/definitely/not/here/conf.json").is_err());
}
