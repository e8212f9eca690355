/*!
 * Database timezone handling.
 */

use chrono::{FixedOffset, Local, Offset, Utc};
use std::fmt;

/// Timezone a database stores its timestamps in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DbTimeZone {
    /// The process's local timezone
    #[default]
    Local,
    /// A fixed offset from UTC
    Fixed(FixedOffset),
}

impl DbTimeZone {
    pub fn utc() -> Self {
        DbTimeZone::Fixed(Utc.fix())
    }

    /// Offset from UTC in effect right now
    pub fn offset(&self) -> FixedOffset {
        match self {
            DbTimeZone::Local => Local::now().offset().fix(),
            DbTimeZone::Fixed(offset) => *offset,
        }
    }
}

impl fmt::Display for DbTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbTimeZone::Local => write!(f, "Local"),
            DbTimeZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Parse a server UTC offset such as `08:00:00`, `-05:30:00` or
/// `+01:00:00.000000`.
///
/// Values shorter than `HH:MM:SS` are rejected.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, String> {
    let raw = raw.trim();
    if raw.len() < 8 {
        return Err(format!("offset `{}` is too short", raw));
    }

    let (sign, rest) = match raw.as_bytes()[0] {
        b'-' => (-1, &raw[1..]),
        b'+' => (1, &raw[1..]),
        _ => (1, raw),
    };

    let mut parts = rest.split(':');
    let mut next = |name: &str| -> Result<i32, String> {
        let part = parts
            .next()
            .ok_or_else(|| format!("offset `{}` has no {}", raw, name))?;
        // fractional seconds are dropped
        let whole = part.split('.').next().unwrap_or(part);
        whole
            .parse::<i32>()
            .map_err(|e| format!("offset `{}` has invalid {}: {}", raw, name, e))
    };

    let hours = next("hours")?;
    let minutes = next("minutes")?;
    let seconds = next("seconds")?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return Err(format!("offset `{}` is out of range", raw));
    }

    let total = sign * (hours * 3600 + minutes * 60 + seconds);
    FixedOffset::east_opt(total).ok_or_else(|| format!("offset `{}` is out of range", raw))
}
