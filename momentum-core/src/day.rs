//! Local-day resolution.
//!
//! Every log entry is bucketed by the calendar date it happened on in the
//! caller's timezone, not by UTC date or elapsed time. The bucket has two
//! forms: a canonical `YYYY-MM-DD` key used as the storage key, and the
//! instant of 00:00:00 wall-clock on that date. Two instants on the same
//! wall-clock date always resolve to the same bucket, daylight-saving
//! transitions included.
//!
//! An unrecognized timezone name is not an error: the caller already passed
//! user-supplied input (typically a browser string), so the resolver logs a
//! warning and substitutes the host-local timezone.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

fn resolve_tz(tz: Option<&str>) -> Option<Tz> {
    let name = tz?;
    match Tz::from_str(name) {
        Ok(zone) => Some(zone),
        Err(_) => {
            tracing::warn!(timezone = name, "unrecognized timezone, using host-local");
            None
        }
    }
}

/// The calendar date of `instant` in the given timezone (host-local when
/// omitted or unrecognized).
pub fn local_date(instant: DateTime<Utc>, tz: Option<&str>) -> NaiveDate {
    match resolve_tz(tz) {
        Some(zone) => instant.with_timezone(&zone).date_naive(),
        None => instant.with_timezone(&chrono::Local).date_naive(),
    }
}

/// Canonical `YYYY-MM-DD` key for the local day containing `instant`.
pub fn day_key(instant: DateTime<Utc>, tz: Option<&str>) -> String {
    format_day(local_date(instant, tz))
}

/// Format a date as a day key.
pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The instant of 00:00:00 wall-clock time on `instant`'s local calendar
/// date, expressed in UTC.
pub fn start_of_local_day(instant: DateTime<Utc>, tz: Option<&str>) -> DateTime<Utc> {
    match resolve_tz(tz) {
        Some(zone) => midnight_utc(&zone, instant.with_timezone(&zone).date_naive()),
        None => midnight_utc(
            &chrono::Local,
            instant.with_timezone(&chrono::Local).date_naive(),
        ),
    }
}

fn midnight_utc<Z: TimeZone>(zone: &Z, date: NaiveDate) -> DateTime<Utc> {
    let mut wall = NaiveDateTime::new(date, NaiveTime::MIN);
    // A spring-forward transition can make midnight nonexistent; take the
    // earliest wall time of the date that exists. An ambiguous midnight
    // (fall-back) resolves to its earlier occurrence.
    for _ in 0..48 {
        match zone.from_local_datetime(&wall) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => wall += Duration::minutes(30),
        }
    }
    // No real zone skips an entire day
    Utc.from_utc_datetime(&NaiveDateTime::new(date, NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_same_wall_clock_date_same_bucket() {
        let tz = Some("America/New_York");
        // 05:00Z and 23:00Z are both 2025-06-10 in New York
        let early = utc(2025, 6, 10, 5, 0, 0);
        let late = utc(2025, 6, 10, 23, 0, 0);
        assert_eq!(day_key(early, tz), "2025-06-10");
        assert_eq!(day_key(late, tz), "2025-06-10");
        assert_eq!(start_of_local_day(early, tz), start_of_local_day(late, tz));
    }

    #[test]
    fn test_utc_date_differs_from_local_date() {
        // 2025-03-08 23:30Z is already 2025-03-09 in Tokyo, still 03-08 in New York
        let t = utc(2025, 3, 8, 23, 30, 0);
        assert_eq!(day_key(t, Some("Asia/Tokyo")), "2025-03-09");
        assert_eq!(day_key(t, Some("America/New_York")), "2025-03-08");
    }

    #[test]
    fn test_start_of_day_idempotent() {
        let tz = Some("Europe/Paris");
        let t = utc(2025, 11, 2, 14, 45, 3);
        let start = start_of_local_day(t, tz);
        assert_eq!(start_of_local_day(start, tz), start);
        assert_eq!(day_key(start, tz), day_key(t, tz));
    }

    #[test]
    fn test_dst_transition_does_not_split_the_day() {
        // Paris springs forward 2025-03-30 at 02:00 local; instants on
        // either side of the jump share the bucket
        let tz = Some("Europe/Paris");
        let before_jump = utc(2025, 3, 30, 0, 30, 0); // 01:30 CET
        let after_jump = utc(2025, 3, 30, 10, 0, 0); // 12:00 CEST
        assert_eq!(day_key(before_jump, tz), "2025-03-30");
        assert_eq!(day_key(after_jump, tz), "2025-03-30");
        let start = start_of_local_day(after_jump, tz);
        assert_eq!(start, utc(2025, 3, 29, 23, 0, 0));
        assert_eq!(start_of_local_day(before_jump, tz), start);
    }

    #[test]
    fn test_unrecognized_timezone_falls_back_to_host_local() {
        let t = utc(2025, 7, 1, 12, 0, 0);
        assert_eq!(day_key(t, Some("Not/AZone")), day_key(t, None));
        assert_eq!(
            start_of_local_day(t, Some("Not/AZone")),
            start_of_local_day(t, None)
        );
    }
}
