//! Wall-clock time zone used for repeat arithmetic and notification text.

use std::fmt;

use chrono::{Duration, Local, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::error::{RemindmeError, Result};
use crate::types::Timestamp;

/// Either the host's local zone or a named IANA zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    #[default]
    Local,
    Named(Tz),
}

impl Zone {
    /// Parse a configured zone name. Empty or `"local"` selects the host zone.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        name.parse::<Tz>()
            .map(Zone::Named)
            .map_err(|e| RemindmeError::Config(format!("Invalid timezone '{}': {}", name, e)))
    }

    /// Wall-clock time of an instant in this zone.
    pub fn to_local(&self, ts: Timestamp) -> NaiveDateTime {
        let utc = ts.to_datetime();
        match self {
            Zone::Local => utc.with_timezone(&Local).naive_local(),
            Zone::Named(tz) => utc.with_timezone(tz).naive_local(),
        }
    }

    /// Instant of a wall-clock time in this zone.
    ///
    /// A time inside a spring-forward gap moves forward past the gap; an
    /// ambiguous fall-back time resolves to the earlier instant.
    pub fn from_local(&self, naive: NaiveDateTime) -> Timestamp {
        match self {
            Zone::Local => resolve(&Local, naive),
            Zone::Named(tz) => resolve(tz, naive),
        }
    }

    /// `HH:MM` rendering of an instant.
    pub fn format_time(&self, ts: Timestamp) -> String {
        self.to_local(ts).format("%H:%M").to_string()
    }

    /// Long date-and-time rendering, e.g. `March 7, 2026 09:00`.
    pub fn format_date_time(&self, ts: Timestamp) -> String {
        self.to_local(ts).format("%B %-d, %Y %H:%M").to_string()
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => write!(f, "local"),
            Zone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

fn resolve<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> Timestamp {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Timestamp::from_datetime(&dt),
        LocalResult::Ambiguous(earlier, _) => Timestamp::from_datetime(&earlier),
        LocalResult::None => {
            // Inside a gap: read the wall clock with the offset in force just before it.
            let mut cursor = naive;
            for _ in 0..(4 * 24) {
                cursor -= Duration::minutes(15);
                if let Some(before) = tz.from_local_datetime(&cursor).latest() {
                    let offset = before.offset().fix().local_minus_utc();
                    let utc = naive - Duration::seconds(i64::from(offset));
                    return Timestamp(utc.and_utc().timestamp_millis());
                }
            }
            Timestamp(naive.and_utc().timestamp_millis())
        }
    }
}
