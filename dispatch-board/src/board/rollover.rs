use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::utils::time::{local_date, start_of_day};

/// Tracks the establishment's calendar day
///
/// The `finalizado` bucket is bounded to the current day, so the tab must
/// be re-opened with a new lower bound when the local date changes.
#[derive(Debug, Clone)]
pub struct DayWatcher {
    tz: Tz,
    current: NaiveDate,
}

impl DayWatcher {
    pub fn new(tz: Tz, now: DateTime<Utc>) -> Self {
        Self {
            tz,
            current: local_date(now, tz),
        }
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    /// Start of the new day if the local date changed since the last check
    pub fn check(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = local_date(now, self.tz);
        if today == self.current {
            return None;
        }
        self.current = today;
        Some(start_of_day(now, self.tz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rolls_at_local_midnight() {
        let tz = chrono_tz::America::Sao_Paulo;
        // 23:50 local (UTC-3)
        let before = Utc.with_ymd_and_hms(2026, 10, 19, 2, 50, 0).unwrap();
        let mut watcher = DayWatcher::new(tz, before);
        assert_eq!(watcher.check(before), None);

        // 00:05 local, next day
        let after = Utc.with_ymd_and_hms(2026, 10, 19, 3, 5, 0).unwrap();
        let start = watcher.check(after).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 19, 3, 0, 0).unwrap());
        assert_eq!(watcher.check(after), None);
    }

    #[test]
    fn test_utc_midnight_is_not_local_midnight() {
        let tz = chrono_tz::America::Sao_Paulo;
        let evening = Utc.with_ymd_and_hms(2026, 10, 18, 23, 0, 0).unwrap();
        let mut watcher = DayWatcher::new(tz, evening);
        let past_utc_midnight = Utc.with_ymd_and_hms(2026, 10, 19, 0, 30, 0).unwrap();
        assert_eq!(watcher.check(past_utc_midnight), None);
    }
}
