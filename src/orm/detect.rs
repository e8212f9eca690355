/*!
 * Post-open detection of a connection's timezone and storage engine.
 *
 * Detection never fails: every problem is logged and the alias keeps a
 * usable default.
 */

use log::{debug, warn};

use super::alias::Alias;
use super::timezone::{parse_utc_offset, DbTimeZone};

/// Resolve the timezone and engine of `alias` and store them on the record
pub fn detect(alias: &Alias) {
    alias.set_timezone(detect_timezone(alias));
    alias.set_engine(&detect_engine(alias));
    debug!(
        "Alias `{}` uses timezone {} and engine {}",
        alias.name(),
        alias.timezone(),
        alias.engine()
    );
}

fn detect_timezone(alias: &Alias) -> DbTimeZone {
    let Some(sql) = alias.baser().timezone_query() else {
        return alias.baser().default_timezone();
    };

    let raw = match alias.db().query_row(sql, &[]) {
        Ok(Some(row)) => row.get_text(0).unwrap_or_default(),
        Ok(None) => String::new(),
        Err(e) => {
            warn!("Detect DB timezone for `{}` failed: {}", alias.name(), e);
            return DbTimeZone::Local;
        }
    };

    match parse_utc_offset(&raw) {
        Ok(offset) => DbTimeZone::Fixed(offset),
        Err(e) => {
            debug!("Detect DB timezone: {} {}", raw, e);
            DbTimeZone::Local
        }
    }
}

fn detect_engine(alias: &Alias) -> String {
    let default = alias.baser().default_engine().to_string();
    let Some(sql) = alias.baser().engine_query() else {
        return default;
    };

    match alias.db().query_row(sql, &[]) {
        Ok(Some(row)) => row
            .get_text(0)
            .filter(|engine| !engine.is_empty())
            .unwrap_or(default),
        Ok(None) => default,
        Err(e) => {
            warn!("Detect DB engine for `{}` failed: {}", alias.name(), e);
            default
        }
    }
}
