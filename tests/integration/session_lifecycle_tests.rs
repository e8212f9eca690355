/*!
 * Integration tests for the session provider on a SQLite file
 */

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use vitessorm::database::{Database, SqliteDatabase};
use vitessorm::session::{new_session_id, Provider, ProviderRegistry};

use crate::common;

/// Move every session's expiry into the past
fn age_sessions(dir: &std::path::Path, seconds: i64) -> Result<()> {
    let db = SqliteDatabase::open(dir.join("sessions.db"), Duration::from_secs(1))?;
    db.execute(
        "UPDATE session SET session_expiry = session_expiry - ?1",
        &[seconds.into()],
    )?;
    db.close()?;
    Ok(())
}

#[test]
fn test_sessionLifecycle_readWriteRegenerateDestroy_shouldPersistEachStep() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let provider = common::sqlite_provider(dir.path(), 3600)?;

    let sid = new_session_id();
    let store = provider.read(&sid)?;
    store.set("user_id", json!(7));
    store.set("roles", json!(["admin", "editor"]));
    store.release()?;

    let fresh = new_session_id();
    let store = provider.regenerate(&sid, &fresh)?;
    assert_eq!(store.get("user_id"), Some(json!(7)));
    store.set("user_id", json!(8));
    store.release()?;

    assert!(!provider.exist(&sid)?);
    let store = provider.read(&fresh)?;
    assert_eq!(store.get("user_id"), Some(json!(8)));
    assert_eq!(store.get("roles"), Some(json!(["admin", "editor"])));
    store.release()?;

    provider.destroy(&fresh)?;
    assert!(!provider.exist(&fresh)?);
    assert_eq!(provider.count()?, 0);
    Ok(())
}

#[test]
fn test_read_twiceWithoutRelease_shouldSeeInsertedRow() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let provider = common::sqlite_provider(dir.path(), 3600)?;

    let first = provider.read("n")?;
    let second = provider.read("n")?;
    assert!(provider.exist("n")?);
    assert_eq!(provider.count()?, 1);
    assert_eq!(second.session_id(), "n");

    first.release()?;
    second.release()?;
    Ok(())
}

#[test]
fn test_droppedStore_shouldNotPersistChanges() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let provider = common::sqlite_provider(dir.path(), 3600)?;

    let store = provider.read("sid")?;
    store.set("kept", json!(true));
    store.release()?;

    let store = provider.read("sid")?;
    store.set("lost", json!(true));
    drop(store);

    let store = provider.read("sid")?;
    assert_eq!(store.get("kept"), Some(json!(true)));
    assert_eq!(store.get("lost"), None);
    Ok(())
}

#[test]
fn test_gc_shouldRemoveOnlyExpiredSessions() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let provider = common::sqlite_provider(dir.path(), 60)?;

    provider.read("old-1")?.release()?;
    provider.read("old-2")?.release()?;
    age_sessions(dir.path(), 3600)?;
    provider.read("recent")?.release()?;

    assert_eq!(provider.count()?, 3);
    assert_eq!(provider.gc()?, 2);
    assert_eq!(provider.count()?, 1);
    assert!(provider.exist("recent")?);
    assert_eq!(provider.gc()?, 0);
    Ok(())
}

#[test]
fn test_release_shouldRefreshExpiry() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let provider = common::sqlite_provider(dir.path(), 60)?;

    provider.read("busy")?.release()?;
    age_sessions(dir.path(), 3600)?;

    // touching the session again moves it out of the GC window
    provider.read("busy")?.release()?;
    assert_eq!(provider.gc()?, 0);
    assert!(provider.exist("busy")?);
    Ok(())
}

#[test]
fn test_concurrentStores_sameSid_lastReleaseWins() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let provider = common::sqlite_provider(dir.path(), 3600)?;
    provider.read("shared")?.release()?;

    let a = provider.read("shared")?;
    let b = provider.read("shared")?;
    a.set("writer", json!("a"));
    b.set("writer", json!("b"));
    a.release()?;
    b.release()?;

    assert_eq!(provider.read("shared")?.get("writer"), Some(json!("b")));
    Ok(())
}

#[test]
fn test_registry_withConfiguredProvider_shouldShareSessions() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let registry = ProviderRegistry::new();
    registry.register("vitess", Arc::new(common::sqlite_provider(dir.path(), 3600)?))?;

    let provider = registry.get("vitess")?;
    let store = provider.read("via-registry")?;
    store.set("n", json!(1));
    store.release()?;

    assert_eq!(registry.get("vitess")?.count()?, 1);
    Ok(())
}

#[test]
fn test_customTable_shouldKeepDefaultTableUntouched() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let provider = vitessorm::session::VitessProvider::new(Arc::new(
        vitessorm::database::SqliteConnector::new(),
    ))
    .with_table("web_session");
    provider.init(3600, &common::data_source_in(dir.path(), "sessions.db"))?;
    provider.ensure_table()?;
    provider.read("sid")?.release()?;

    let db = SqliteDatabase::open(dir.path().join("sessions.db"), Duration::from_secs(1))?;
    let row = db
        .query_row("SELECT COUNT(*) FROM web_session", &[])?
        .expect("count row");
    assert_eq!(row.get_i64(0), Some(1));
    assert!(db.query_row("SELECT COUNT(*) FROM session", &[]).is_err());
    Ok(())
}
