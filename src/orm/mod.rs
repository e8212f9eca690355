/*!
 * Database alias registry.
 *
 * This module provides:
 * - Driver name to driver type mapping
 * - The add-once alias cache
 * - Registration of named connections with timezone/engine detection
 * - Runtime tuning of pool sizes and timezone
 */

pub mod alias;
pub mod detect;
pub mod driver;
pub mod manager;
pub mod timezone;

// Re-export main types
pub use alias::{Alias, AliasCache, DEFAULT_ALIAS};
pub use driver::{DbBaser, DriverRegistry, DriverType, SqliteBase, VitessBase};
pub use manager::{Orm, DEFAULT_CONNECT_TIMEOUT};
pub use timezone::{parse_utc_offset, DbTimeZone};
