/*!
 * Integration tests for alias registration against SQLite files
 */

use anyhow::Result;
use vitessorm::app_config::{Config, DatabaseConfig};
use vitessorm::orm::{DbTimeZone, DriverType, Orm};

use crate::common;

/// Register every alias of a config file, the way the CLI `check` does
#[test]
fn test_config_registerAllAliases_shouldExposeEachConnection() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;

    let mut config = Config::default();
    config.databases = vec![
        DatabaseConfig::new("default", &common::data_source_in(dir.path(), "app.db")),
        DatabaseConfig {
            driver: "sqlite".to_string(),
            max_idle_conns: Some(2),
            max_open_conns: Some(8),
            ..DatabaseConfig::new("reports", &common::data_source_in(dir.path(), "reports.db"))
        },
    ];
    config.validate()?;

    let orm = Orm::with_sqlite();
    for db in &config.databases {
        db.register(&orm)?;
    }

    assert_eq!(orm.alias_names(), vec!["default", "reports"]);
    assert_eq!(orm.driver_type_of("default")?, DriverType::Vitess);

    let reports = orm.alias("reports")?;
    assert_eq!(reports.driver_type(), DriverType::Sqlite);
    assert_eq!(reports.timezone(), DbTimeZone::utc());
    assert_eq!((reports.max_idle_conns(), reports.max_open_conns()), (2, 8));
    Ok(())
}

#[test]
fn test_getDb_shouldReturnUsableConnection() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let orm = Orm::with_sqlite();
    orm.register_database("default", "sqlite", &common::data_source_in(dir.path(), "app.db"), &[1])?;

    let db = orm.get_db(None)?;
    db.execute("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT)", &[])?;
    db.execute("INSERT INTO items (name) VALUES (?1)", &["widget".into()])?;

    let row = orm
        .get_db(Some("default"))?
        .query_row("SELECT COUNT(*) FROM items", &[])?
        .expect("count row");
    assert_eq!(row.get_i64(0), Some(1));
    Ok(())
}

#[test]
fn test_duplicateRegistration_shouldKeepFirstDatabase() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let orm = Orm::with_sqlite();
    let first = common::data_source_in(dir.path(), "first.db");
    let second = common::data_source_in(dir.path(), "second.db");

    orm.register_database("default", "sqlite", &first, &[1])?;
    assert!(orm.register_database("default", "sqlite", &second, &[1]).is_err());

    assert_eq!(orm.alias("default")?.data_source(), first);
    orm.get_db(None)?.query_row("SELECT 1", &[])?;
    Ok(())
}
