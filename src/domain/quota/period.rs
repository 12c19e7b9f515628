//! Billing period boundaries
//!
//! A billing period is one calendar month; it starts at 00:00:00 UTC on the
//! first day of the month.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// Start of the billing period that contains `now`
pub fn current_period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    month_start(now.year(), now.month())
}

/// First period boundary strictly after `now`.
///
/// An instant exactly on a boundary yields the following month's boundary.
pub fn next_period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };

    month_start(year, month)
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    // Day 1 of a month in 1..=12 is always a valid date
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}
