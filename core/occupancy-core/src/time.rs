//! Timestamp normalization.
//!
//! The data source stores naive UTC date-times (SQLite `CURRENT_TIMESTAMP`
//! style, no zone marker). Everything downstream works on instants expressed
//! at the fixed display offset (+09:00), so every raw timestamp goes through
//! [`normalize`] and the wall clock goes through [`to_display`]. Mixing the two
//! representations skews day-bucketing by nine hours.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::error::{OccupancyError, Result};

/// Display timezone offset (JST).
pub const DISPLAY_OFFSET_SECS: i32 = 9 * 3600;

/// An absolute instant expressed in the display timezone.
pub type DisplayInstant = DateTime<FixedOffset>;

const SOURCE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Parses a source timestamp as UTC and returns it at the display offset.
///
/// Strings that do carry an explicit offset (RFC 3339) keep their instant.
pub fn normalize(raw: &str) -> Result<DisplayInstant> {
    let value = raw.trim();

    if let Ok(explicit) = DateTime::parse_from_rfc3339(value) {
        return Ok(explicit.with_timezone(&display_offset()));
    }

    let parsed = SOURCE_FORMATS.iter().skip(1).fold(
        NaiveDateTime::parse_from_str(value, SOURCE_FORMATS[0]),
        |acc, format| acc.or_else(|_| NaiveDateTime::parse_from_str(value, format)),
    );

    parsed
        .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&display_offset()))
        .map_err(|source| OccupancyError::MalformedTimestamp {
            value: raw.to_string(),
            source,
        })
}

/// Expresses a wall-clock instant at the display offset.
pub fn to_display(now: DateTime<Utc>) -> DisplayInstant {
    now.with_timezone(&display_offset())
}

/// Calendar date of an instant in the display timezone.
pub fn display_date(instant: &DisplayInstant) -> NaiveDate {
    instant.with_timezone(&display_offset()).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn shifts_sqlite_timestamp_into_display_offset() {
        let instant = normalize("2024-01-10 23:50:00").expect("timestamp");
        assert_eq!(instant.to_rfc3339(), "2024-01-11T08:50:00+09:00");
        assert_eq!(
            display_date(&instant),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
    }

    #[test]
    fn accepts_t_separator_and_fractional_seconds() {
        let plain = normalize("2024-01-10T23:50:00").expect("plain");
        let fractional = normalize("2024-01-10 23:50:00.250").expect("fractional");
        assert_eq!(plain.hour(), 8);
        assert_eq!(fractional.nanosecond(), 250_000_000);
        assert_eq!(plain.with_nanosecond(0), fractional.with_nanosecond(0));
    }

    #[test]
    fn accepts_minute_precision_and_whitespace() {
        let instant = normalize("  2024-03-01 15:04 ").expect("minutes");
        assert_eq!(instant.to_rfc3339(), "2024-03-02T00:04:00+09:00");
    }

    #[test]
    fn honours_explicit_offsets() {
        let utc = normalize("2024-02-01T01:00:00Z").expect("utc");
        let naive = normalize("2024-02-01 01:00:00").expect("naive");
        assert_eq!(utc, naive);
        assert_eq!(utc.offset().local_minus_utc(), DISPLAY_OFFSET_SECS);
    }

    #[test]
    fn rejects_garbage() {
        let err = normalize("yesterday-ish").unwrap_err();
        match err {
            OccupancyError::MalformedTimestamp { value, .. } => assert_eq!(value, "yesterday-ish"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(normalize("").is_err());
        assert!(normalize("2024-13-40 25:00:00").is_err());
    }

    #[test]
    fn wall_clock_uses_same_offset() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 16, 0, 0).unwrap();
        let display = to_display(now);
        assert_eq!(display, now);
        assert_eq!(display.hour(), 1);
        assert_eq!(
            display_date(&display),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
    }
}
