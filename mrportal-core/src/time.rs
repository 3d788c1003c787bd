//! Calendar-day helpers. Schedule dates travel as `YYYY-MM-DD` strings.

use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum DateError {
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("invalid date '{input}' (expected YYYY-MM-DD): {source}")]
    InvalidDate {
        input: String,
        source: chrono::ParseError,
    },
    #[error("date out of range: {0} shifted by {1} days")]
    OutOfRange(String, i64),
}

/// Parse an IANA zone like "Asia/Kolkata". Blank means "system local".
pub fn parse_timezone(name: &str) -> Result<Option<Tz>, DateError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    name.parse::<Tz>()
        .map(Some)
        .map_err(|_| DateError::InvalidTimezone(name.to_string()))
}

/// The viewer's calendar day at `now`.
pub fn today(tz: Option<Tz>, now: DateTime<Utc>) -> NaiveDate {
    match tz {
        Some(tz) => now.with_timezone(&tz).date_naive(),
        None => now.with_timezone(&Local).date_naive(),
    }
}

pub fn today_string(tz: Option<Tz>, now: DateTime<Utc>) -> String {
    format_date(today(tz, now))
}

/// Whether a schedule for `viewed` is editable: plain string equality against the
/// viewer's current day.
pub fn is_today(viewed: &str, tz: Option<Tz>, now: DateTime<Utc>) -> bool {
    viewed == today_string(tz, now)
}

pub fn parse_date(input: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|source| DateError::InvalidDate {
        input: input.to_string(),
        source,
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Previous/next-day navigation.
pub fn shift_days(date: &str, delta: i64) -> Result<String, DateError> {
    let d = parse_date(date)?;
    let shifted = if delta >= 0 {
        d.checked_add_days(Days::new(delta.unsigned_abs()))
    } else {
        d.checked_sub_days(Days::new(delta.unsigned_abs()))
    };
    shifted
        .map(format_date)
        .ok_or_else(|| DateError::OutOfRange(date.to_string(), delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn today_respects_timezone() {
        // 20:00 UTC is already the next day in India (UTC+5:30).
        let now = Utc.with_ymd_and_hms(2026, 2, 19, 20, 0, 0).unwrap();
        let kolkata = parse_timezone("Asia/Kolkata").unwrap();
        assert_eq!(today_string(kolkata, now), "2026-02-20");
        let chicago = parse_timezone("America/Chicago").unwrap();
        assert_eq!(today_string(chicago, now), "2026-02-19");
    }

    #[test]
    fn is_today_is_exact_string_match() {
        let now = Utc.with_ymd_and_hms(2026, 2, 19, 6, 0, 0).unwrap();
        let tz = parse_timezone("Asia/Kolkata").unwrap();
        assert!(is_today("2026-02-19", tz, now));
        assert!(!is_today("2026-02-18", tz, now));
        assert!(!is_today("2026-2-19", tz, now));
    }

    #[test]
    fn blank_timezone_is_local() {
        assert!(parse_timezone("  ").unwrap().is_none());
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn shifts_across_month_end() {
        assert_eq!(shift_days("2026-02-28", 1).unwrap(), "2026-03-01");
        assert_eq!(shift_days("2026-03-01", -1).unwrap(), "2026-02-28");
        assert!(shift_days("2026-02-30", 1).is_err());
    }
}
