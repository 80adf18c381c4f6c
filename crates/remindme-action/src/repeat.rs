//! Repeat rollover arithmetic.
//!
//! Steps are calendar steps on the wall clock of the configured zone, not
//! fixed durations: a daily reminder at 09:00 stays at 09:00 across DST
//! changes. Monthly steps overflow the way a day-of-month counter does, so
//! Jan 31 + 1 month lands on Mar 3 (Mar 2 in a leap year).

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use remindme_core::types::{RepeatKind, Timestamp};
use remindme_core::zone::Zone;

/// Next occurrence after `ts`, or `None` for non-repeating reminders and
/// for steps past the representable calendar.
pub fn next_occurrence(ts: Timestamp, kind: RepeatKind, zone: &Zone) -> Option<Timestamp> {
    let local = zone.to_local(ts);
    let next = match kind {
        RepeatKind::None => return None,
        RepeatKind::Daily => local.checked_add_signed(Duration::days(1))?,
        RepeatKind::Weekly => local.checked_add_signed(Duration::days(7))?,
        RepeatKind::Monthly => add_month_with_overflow(local)?,
    };
    Some(zone.from_local(next))
}

fn add_month_with_overflow(local: NaiveDateTime) -> Option<NaiveDateTime> {
    let date = local.date();
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let rolled = first.checked_add_signed(Duration::days(i64::from(date.day()) - 1))?;
    Some(rolled.and_time(local.time()))
}
