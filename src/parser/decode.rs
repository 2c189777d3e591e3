//! Text fragment → typed value. Pure functions, no markup involved.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::Timestamp;

static DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})([+-]\d{2}):?(\d{2})$").unwrap()
});
static COUNTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9,]+) \(([0-9,]+) today\)$").unwrap());
static BYTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([0-9,]+) bytes\)").unwrap());
static RANK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9,]+)\s+of\s+([0-9,]+)$").unwrap());
static TRAILING_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)$").unwrap());

/// `2021-03-04T12:30:00+01:00`, the same without the offset colon, or a bare
/// `2021-03-04` (midnight UTC).
pub fn parse_timestamp(text: &str) -> Result<Timestamp> {
    let text = text.trim();
    if let Some(caps) = DATETIME_RE.captures(text) {
        let normalized = format!("{}{}:{}", &caps[1], &caps[2], &caps[3]);
        return DateTime::parse_from_rfc3339(&normalized)
            .map_err(|_| Error::MalformedTimestamp(text.to_string()));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| Error::MalformedTimestamp(text.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::MalformedTimestamp(text.to_string()))?;
    Ok(Utc.from_utc_datetime(&midnight).into())
}

/// `1,234,567` → 1234567.
pub fn parse_grouped_int(text: &str) -> Result<u64> {
    let digits: String = text.trim().chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::MalformedInteger(text.to_string()));
    }
    digits
        .parse()
        .map_err(|_| Error::MalformedInteger(text.to_string()))
}

/// `1,234 (56 today)` → (1234, 56).
pub fn parse_counted_views(text: &str) -> Result<(u64, u64)> {
    let text = text.trim();
    let malformed = || Error::MalformedCounter(text.to_string());
    let caps = COUNTED_RE.captures(text).ok_or_else(malformed)?;
    let total = parse_grouped_int(&caps[1]).map_err(|_| malformed())?;
    let today = parse_grouped_int(&caps[2]).map_err(|_| malformed())?;
    Ok((total, today))
}

/// `1.2mb (1,258,291 bytes)` → 1258291. The rounded lead value is ignored.
pub fn parse_byte_size(text: &str) -> Result<u64> {
    let caps = BYTES_RE
        .captures(text)
        .ok_or_else(|| Error::MalformedInteger(text.to_string()))?;
    parse_grouped_int(&caps[1])
}

/// `m:ss` or `h:mm:ss` → seconds.
pub fn parse_duration(text: &str) -> Result<u32> {
    let text = text.trim();
    let parts = text
        .split(':')
        .map(|p| p.parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| Error::MalformedInteger(text.to_string()))?;
    let seconds = match parts.as_slice() {
        [m, s] => m.checked_mul(60).and_then(|m| m.checked_add(*s)),
        [h, m, s] => h
            .checked_mul(3600)
            .zip(m.checked_mul(60))
            .and_then(|(h, m)| h.checked_add(m))
            .and_then(|hm| hm.checked_add(*s)),
        _ => None,
    };
    seconds.ok_or_else(|| Error::MalformedInteger(text.to_string()))
}

/// `12 of 3,456` → (12, 3456).
pub fn parse_rank(text: &str) -> Result<(u64, u64)> {
    let text = text.trim();
    let caps = RANK_RE
        .captures(text)
        .ok_or_else(|| Error::MalformedInteger(text.to_string()))?;
    Ok((parse_grouped_int(&caps[1])?, parse_grouped_int(&caps[2])?))
}

/// Numeric id at the end of a browse link, e.g. `/games?genre=14` → 14.
pub fn trailing_id(href: &str) -> Result<u32> {
    TRAILING_ID_RE
        .captures(href.trim())
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| Error::MalformedInteger(href.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn timestamp_with_and_without_colon() {
        let a = parse_timestamp("2020-05-17T14:03:22+02:00").unwrap();
        let b = parse_timestamp("2020-05-17T14:03:22+0200").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.offset().local_minus_utc(), 7200);
        assert_eq!(a.with_timezone(&Utc).hour(), 12);

        let neg = parse_timestamp("2019-12-31T23:59:59-0530").unwrap();
        assert_eq!(neg.offset().local_minus_utc(), -(5 * 3600 + 30 * 60));
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        let d = parse_timestamp("2008-02-29").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2008, 2, 29));
        assert_eq!(d.hour(), 0);
        assert_eq!(d.offset().local_minus_utc(), 0);
    }

    #[test]
    fn bad_timestamps() {
        for bad in ["", "yesterday", "2020-13-01", "2020-05-17 14:03:22", "2020-05-17T14:03:22Z", "2021-02-30"] {
            assert!(
                matches!(parse_timestamp(bad), Err(Error::MalformedTimestamp(_))),
                "{bad:?} should fail"
            );
        }
    }

    #[test]
    fn counted_views() {
        assert_eq!(parse_counted_views("1,234 (56 today)").unwrap(), (1234, 56));
        assert_eq!(parse_counted_views("0 (0 today)").unwrap(), (0, 0));
        assert_eq!(
            parse_counted_views(" 12,345,678 (1,001 today) ").unwrap(),
            (12_345_678, 1001)
        );
    }

    #[test]
    fn bad_counters() {
        for bad in ["1,234", "1,234 (56)", "abc (5 today)", "1,234 (x today)", ", (5 today)"] {
            assert!(
                matches!(parse_counted_views(bad), Err(Error::MalformedCounter(_))),
                "{bad:?} should fail"
            );
        }
    }

    #[test]
    fn grouped_ints() {
        assert_eq!(parse_grouped_int("1,000,000").unwrap(), 1_000_000);
        assert_eq!(parse_grouped_int(" 42 ").unwrap(), 42);
        assert!(matches!(parse_grouped_int("12a"), Err(Error::MalformedInteger(_))));
        assert!(matches!(parse_grouped_int("-5"), Err(Error::MalformedInteger(_))));
        assert!(parse_grouped_int("").is_err());
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(parse_byte_size("1.2mb (1,258,291 bytes)").unwrap(), 1_258_291);
        assert_eq!(parse_byte_size("512 bytes (512 bytes)").unwrap(), 512);
        assert!(parse_byte_size("1.2mb").is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("3:25").unwrap(), 205);
        assert_eq!(parse_duration("1:02:03").unwrap(), 3723);
        assert!(parse_duration("3m25s").is_err());
        assert!(parse_duration("3").is_err());
    }

    #[test]
    fn oversized_durations() {
        for bad in ["99999999:00", "4294967295:00:01", "1:4294967295", "1193047:00:00"] {
            assert!(
                matches!(parse_duration(bad), Err(Error::MalformedInteger(_))),
                "{bad:?} should fail"
            );
        }
        assert_eq!(parse_duration("1193046:28:15").unwrap(), u32::MAX);
    }

    #[test]
    fn ranks_and_ids() {
        assert_eq!(parse_rank("12 of 3,456").unwrap(), (12, 3456));
        assert!(parse_rank("unranked").is_err());
        assert_eq!(trailing_id("/games?sort=visitstotal-desc&genre=14").unwrap(), 14);
        assert!(trailing_id("/games?genre=").is_err());
    }
}
