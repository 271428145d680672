//! Business timezone helpers
//!
//! The `finalizado` bucket is bounded to the establishment's current
//! calendar day, which is a local-time notion.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

/// Local calendar date of `now` in `tz`
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Start of the local day containing `now`, as UTC
///
/// When local midnight falls in a DST gap, the first valid local instant
/// after it is used.
pub fn start_of_day(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let midnight = local_date(now, tz).and_time(NaiveTime::MIN);
    (0..=GAP_SEARCH_STEPS)
        .map(|step| midnight + TimeDelta::minutes(GAP_STEP_MINUTES * step))
        .find_map(|naive| naive.and_local_timezone(tz).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// DST gaps are searched in 15 minute steps, up to 3 hours past midnight
const GAP_STEP_MINUTES: i64 = 15;
const GAP_SEARCH_STEPS: i64 = 12;

/// Receipt timestamp `dd/mm/YYYY HH:MM` in `tz`
pub fn format_local(ts: DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz).format("%d/%m/%Y %H:%M").to_string()
}
