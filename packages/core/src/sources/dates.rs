//! Date and time parsing idioms shared by the source adapters.
//!
//! All naive (offset-less) values are interpreted in the venue timezone and
//! converted to UTC, so every record carries one consistent representation.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::error::{SourceError, SourceResult};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Midnight of `now`'s calendar day in `tz`, as a UTC instant.
///
/// In zones that spring forward at midnight the day starts at the first
/// local hour that exists.
pub fn start_of_day(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let midnight = now.with_timezone(&tz).date_naive().and_time(NaiveTime::MIN);
    (0..=3)
        .find_map(|hours| {
            tz.from_local_datetime(&(midnight + Duration::hours(hours)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Converts a local wall-clock time in `tz` to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times that
/// do not exist (DST spring-forward gap) are rejected.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> SourceResult<DateTime<Utc>> {
    let local = date.and_time(time);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| SourceError::format(format!("{} does not exist in {}", local, tz)))
}

/// Parses an RFC 3339 timestamp, or a naive date/date-time interpreted in `tz`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> SourceResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return local_to_utc(naive.date(), naive.time(), tz);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return local_to_utc(date, NaiveTime::MIN, tz);
    }

    Err(SourceError::format(format!("Invalid timestamp '{}'", raw)))
}

/// Parses day-first date fragments such as `25.02.24.`, `1.3.24` or `01.03.2024.`.
///
/// Two-digit years are taken to be in the 2000s.
pub fn parse_short_date(raw: &str) -> SourceResult<NaiveDate> {
    let invalid = || SourceError::format(format!("Invalid date '{}'", raw.trim()));

    let parts: Vec<&str> = raw
        .trim()
        .trim_end_matches('.')
        .split('.')
        .map(str::trim)
        .collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(invalid());
    };

    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = match year.len() {
        1 | 2 => 2000 + year.parse::<i32>().map_err(|_| invalid())?,
        4 => year.parse().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parses local hour strings: `19`, `19h`, `19 h`, `19:30`, `19.30 h`.
pub fn parse_hour(raw: &str) -> SourceResult<NaiveTime> {
    let invalid = || SourceError::format(format!("Invalid hour '{}'", raw.trim()));

    let cleaned = raw.trim().trim_end_matches(['h', 'H']).trim();
    let (hour, minute) = match cleaned.split_once([':', '.']) {
        Some((h, m)) => (h, m),
        None => (cleaned, "0"),
    };

    let hour: u32 = hour.trim().parse().map_err(|_| invalid())?;
    let minute: u32 = minute.trim().parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}
