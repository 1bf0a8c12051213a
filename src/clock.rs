//! Slot/hour timestamp math (spec §4.1, §9 "String timestamps").
//!
//! Every key in the store is a "YYYY-MM-DDTHH:MM" string in the
//! operator's configured IANA zone. Parsing these strings back out is
//! done by slicing fixed-width fields, never by re-parsing through a
//! `DateTime`, so a host timezone or UTC-offset change can never perturb
//! an existing key. The only place a zone database is consulted is
//! [`local_now_string`], which renders a UTC instant to the local string.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Renders `instant` as a "YYYY-MM-DDTHH:MM" string in `tz`. This is the
/// only function in the system that converts a universal instant into a
/// timezone-aware local string.
pub fn local_now_string(instant: DateTime<Utc>, tz: Tz) -> String {
    let local = instant.with_timezone(&tz);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}",
        local.year(),
        local.month(),
        local.day(),
        local.hour(),
        local.minute()
    )
}

/// Rounds a local "YYYY-MM-DDTHH:MM" string down to the start of its
/// current 15-minute slot.
pub fn slot_start(local_ts: &str) -> String {
    let (date, time) = split(local_ts);
    let (hour, minute) = time;
    let floored = (minute / 15) * 15;
    format!("{date}T{hour:02}:{floored:02}")
}

/// Rounds a local "YYYY-MM-DDTHH:MM" string down to the start of its hour.
pub fn hour_start(local_ts: &str) -> String {
    let (date, time) = split(local_ts);
    format!("{date}T{:02}:00", time.0)
}

/// Extracts (year, month, day) from a "YYYY-MM-DDTHH:MM" string, purely
/// by field slicing, for use as correction-matrix keys.
pub fn year_month_day(local_ts: &str) -> (i32, u32, u32) {
    let year: i32 = local_ts[0..4].parse().expect("well-formed timestamp");
    let month: u32 = local_ts[5..7].parse().expect("well-formed timestamp");
    let day: u32 = local_ts[8..10].parse().expect("well-formed timestamp");
    (year, month, day)
}

pub fn hour_of_day(local_ts: &str) -> u32 {
    local_ts[11..13].parse().expect("well-formed timestamp")
}

pub fn minute_of_hour(local_ts: &str) -> u32 {
    local_ts[14..16].parse().expect("well-formed timestamp")
}

fn split(local_ts: &str) -> (&str, (u32, u32)) {
    let date = &local_ts[0..10];
    let hour = hour_of_day(local_ts);
    let minute = minute_of_hour(local_ts);
    (date, (hour, minute))
}

/// Day-of-year in [1, 366] for a "YYYY-MM-DDTHH:MM" string, computed via
/// `chrono::NaiveDate` purely for calendar arithmetic (no timezone
/// involved — this never touches a zone database).
pub fn day_of_year(local_ts: &str) -> u32 {
    let (year, month, day) = year_month_day(local_ts);
    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .expect("well-formed date")
        .ordinal()
}

/// Adds `days` calendar days to a local date-only "YYYY-MM-DD" string,
/// returning a "YYYY-MM-DD" string. Used by the smoother's day-of-year
/// wraparound and by "yesterday"/"tomorrow" lookups.
pub fn add_days(date: &str, days: i64) -> String {
    let y: i32 = date[0..4].parse().unwrap();
    let m: u32 = date[5..7].parse().unwrap();
    let d: u32 = date[8..10].parse().unwrap();
    let nd = chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap() + chrono::Duration::days(days);
    format!("{:04}-{:02}-{:02}", nd.year(), nd.month(), nd.day())
}

/// Returns the UTC instant representing `local_ts` interpreted in `tz`,
/// used only at the boundary where we must compare/sort against "now".
pub fn parse_in_zone(local_ts: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let (y, mo, d) = year_month_day(local_ts);
    let h = hour_of_day(local_ts);
    let mi = minute_of_hour(local_ts);
    tz.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_start_rounds_down_to_quarter_hour() {
        assert_eq!(slot_start("2026-06-01T10:07"), "2026-06-01T10:00");
        assert_eq!(slot_start("2026-06-01T10:14"), "2026-06-01T10:00");
        assert_eq!(slot_start("2026-06-01T10:15"), "2026-06-01T10:15");
        assert_eq!(slot_start("2026-06-01T10:59"), "2026-06-01T10:45");
    }

    #[test]
    fn hour_start_rounds_down_to_zero_minutes() {
        assert_eq!(hour_start("2026-06-01T10:47"), "2026-06-01T10:00");
    }

    #[test]
    fn field_extraction_is_pure_string_slicing() {
        assert_eq!(year_month_day("2026-02-29T03:00"), (2026, 2, 29));
        assert_eq!(hour_of_day("2026-02-29T03:00"), 3);
        assert_eq!(minute_of_hour("2026-02-29T03:45"), 45);
    }

    #[test]
    fn day_of_year_handles_leap_day() {
        assert_eq!(day_of_year("2024-02-29T00:00"), 60);
        assert_eq!(day_of_year("2024-01-01T00:00"), 1);
        assert_eq!(day_of_year("2024-12-31T00:00"), 366);
    }

    #[test]
    fn add_days_crosses_month_and_year_boundaries() {
        assert_eq!(add_days("2026-01-31", 1), "2026-02-01");
        assert_eq!(add_days("2026-12-31", 1), "2027-01-01");
        assert_eq!(add_days("2026-03-01", -1), "2026-02-28");
    }
}
