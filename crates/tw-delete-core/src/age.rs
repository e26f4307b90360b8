//! Age threshold parsing and the "old enough to delete" predicate
//!
//! Durations use Go's syntax: a sequence of decimal numbers, each with an
//! optional fraction and a unit suffix, such as "120h", "1h30m" or "2.5h".
//! Days ("d") and weeks ("w") are accepted as well.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::{Error, Result};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => NANOS_PER_MICRO,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 60 * 60 * NANOS_PER_SEC,
        "d" => 24 * 60 * 60 * NANOS_PER_SEC,
        "w" => 7 * 24 * 60 * 60 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

/// Parse a duration string such as "120h" or "1h30m"
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = |reason: &str| Error::InvalidDuration(format!("{:?}: {}", input, reason));

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid("empty duration"));
    }

    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    } else if rest.starts_with('-') {
        return Err(invalid("negative durations are not allowed"));
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }
        let scale = unit_nanos(unit).ok_or_else(|| invalid(&format!("unknown unit {:?}", unit)))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid("number out of range"))?
        };

        let mut value = whole.checked_mul(scale).ok_or_else(|| invalid("overflow"))?;

        // Fractional digits beyond nanosecond precision are dropped
        let mut place = scale;
        for digit in frac_part.bytes() {
            place /= 10;
            if place == 0 {
                break;
            }
            value = value
                .checked_add(u128::from(digit - b'0') * place)
                .ok_or_else(|| invalid("overflow"))?;
        }

        total = total.checked_add(value).ok_or_else(|| invalid("overflow"))?;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid("overflow"))?;
    let nanos = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, nanos))
}

/// Convert a parsed threshold into a chrono duration for timestamp math
pub fn to_chrono(threshold: Duration) -> Result<chrono::Duration> {
    chrono::Duration::from_std(threshold)
        .map_err(|_| Error::InvalidDuration(format!("{:?} is too large", threshold)))
}

/// True when a post created at `created_at` is strictly older than `threshold`
/// as seen from `now`.
pub fn is_expired(created_at: DateTime<Utc>, threshold: chrono::Duration, now: DateTime<Utc>) -> bool {
    match created_at.checked_add_signed(threshold) {
        Some(expires_at) => expires_at < now,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("120h").unwrap(), Duration::from_secs(120 * 3600));
        assert_eq!(parse_duration("45m").unwrap(), Duration::from_secs(45 * 60));
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("3us").unwrap(), Duration::from_micros(3));
        assert_eq!(parse_duration("3µs").unwrap(), Duration::from_micros(3));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("2.5h").unwrap(), Duration::from_secs(9000));
        assert_eq!(parse_duration(".5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1.5s250ms").unwrap(), Duration::from_millis(1750));
        assert_eq!(parse_duration("+5m").unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn test_parse_days_and_weeks() {
        assert_eq!(parse_duration("30d").unwrap(), Duration::from_secs(30 * 86400));
        assert_eq!(parse_duration("1w2d").unwrap(), Duration::from_secs(9 * 86400));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "   ", "120", "h", "5x", "-1h", "1h-5m", ".h", "1..5h"] {
            let err = parse_duration(input).unwrap_err();
            assert!(
                matches!(err, Error::InvalidDuration(_)),
                "expected InvalidDuration for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(parse_duration("99999999999999999999999999999999999999999h").is_err());

        // Whole part fits, fraction pushes it one past u128::MAX nanoseconds
        let err = parse_duration("340282366920938463463374607431.768211456s").unwrap_err();
        assert!(matches!(err, Error::InvalidDuration(_)));
    }

    #[test]
    fn test_is_expired_is_strict() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let threshold = chrono::Duration::hours(120);

        let old = now - chrono::Duration::hours(121);
        let exact = now - chrono::Duration::hours(120);
        let recent = now - chrono::Duration::hours(1);

        assert!(is_expired(old, threshold, now));
        assert!(!is_expired(exact, threshold, now));
        assert!(!is_expired(recent, threshold, now));
    }

    #[test]
    fn test_zero_threshold_expires_everything_in_the_past() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let threshold = to_chrono(parse_duration("0").unwrap()).unwrap();

        assert!(is_expired(now - chrono::Duration::seconds(1), threshold, now));
        assert!(!is_expired(now, threshold, now));
    }

    #[test]
    fn test_is_expired_overflow_is_not_expired() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        assert!(!is_expired(DateTime::<Utc>::MAX_UTC, chrono::Duration::days(1), now));
    }
}
