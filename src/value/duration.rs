//! Duration literal parsing.
//!
//! Accepts the compact literal form used throughout the store, e.g. `5s`,
//! `300ms`, `1h30m`, `1.5h` or `-2m`. The result is a signed count of
//! nanoseconds so that integer fields can hold negative intervals too.

use thiserror::Error;

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// Magnitude of `i64::MIN`, the largest value a negative literal may reach.
const MAX_MAGNITUDE: u64 = 1 << 63;

/// Errors produced while parsing a duration literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} overflows 64-bit nanoseconds")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Consume leading ASCII digits. Returns the value, the rest, and whether
/// any digit was consumed. `None` on overflow.
fn leading_int(s: &str) -> Option<(u64, &str, bool)> {
    let end = s.bytes().take_while(u8::is_ascii_digit).count();
    let mut value: u64 = 0;
    for digit in s[..end].bytes() {
        value = value
            .checked_mul(10)?
            .checked_add(u64::from(digit - b'0'))?;
        if value > MAX_MAGNITUDE {
            return None;
        }
    }
    Some((value, &s[end..], end > 0))
}

/// Consume a fractional digit run. Digits past the point where the
/// accumulator would overflow are dropped; they cannot affect the result.
fn leading_fraction(s: &str) -> (u64, f64, &str, bool) {
    let end = s.bytes().take_while(u8::is_ascii_digit).count();
    let mut value: u64 = 0;
    let mut scale = 1.0_f64;
    let mut overflowed = false;
    for digit in s[..end].bytes() {
        if overflowed {
            continue;
        }
        match value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(digit - b'0')))
        {
            Some(next) if next <= MAX_MAGNITUDE => {
                value = next;
                scale *= 10.0;
            }
            _ => overflowed = true,
        }
    }
    (value, scale, &s[end..], end > 0)
}

/// Parse a duration literal into signed nanoseconds.
///
/// The bare literal `0` is accepted without a unit; every other number
/// needs one of `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`.
pub fn parse_duration(input: &str) -> Result<i64, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let mut s = input;
    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }

    if s == "0" {
        return Ok(0);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !s.is_empty() {
        if !s.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
            return Err(invalid());
        }

        let (mut value, rest, has_int) = leading_int(s).ok_or_else(invalid)?;
        s = rest;

        let mut fraction = 0_u64;
        let mut scale = 1.0_f64;
        let mut has_fraction = false;
        if let Some(rest) = s.strip_prefix('.') {
            let (f, sc, rest, consumed) = leading_fraction(rest);
            fraction = f;
            scale = sc;
            has_fraction = consumed;
            s = rest;
        }
        if !has_int && !has_fraction {
            return Err(invalid());
        }

        let unit_end = s
            .char_indices()
            .find(|(_, c)| *c == '.' || c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        if unit_end == 0 {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let unit = &s[..unit_end];
        s = &s[unit_end..];

        let nanos = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || DurationError::Overflow(input.to_string());
        if value > MAX_MAGNITUDE / nanos {
            return Err(overflow());
        }
        value *= nanos;
        if fraction > 0 {
            value = value
                .checked_add((fraction as f64 * (nanos as f64 / scale)) as u64)
                .filter(|v| *v <= MAX_MAGNITUDE)
                .ok_or_else(overflow)?;
        }
        total = total
            .checked_add(value)
            .filter(|v| *v <= MAX_MAGNITUDE)
            .ok_or_else(overflow)?;
    }

    if negative {
        // MAX_MAGNITUDE maps exactly onto i64::MIN.
        Ok((total as i64).wrapping_neg())
    } else if total > i64::MAX as u64 {
        Err(DurationError::Overflow(input.to_string()))
    } else {
        Ok(total as i64)
    }
}

/// Render a duration in the largest unit that represents it exactly.
///
/// The output always parses back with [`parse_duration`].
pub fn format_duration(duration: std::time::Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        "0s".to_string()
    } else if nanos % u128::from(HOUR) == 0 {
        format!("{}h", nanos / u128::from(HOUR))
    } else if nanos % u128::from(MINUTE) == 0 {
        format!("{}m", nanos / u128::from(MINUTE))
    } else if nanos % u128::from(SECOND) == 0 {
        format!("{}s", nanos / u128::from(SECOND))
    } else if nanos % u128::from(MILLISECOND) == 0 {
        format!("{}ms", nanos / u128::from(MILLISECOND))
    } else if nanos % u128::from(MICROSECOND) == 0 {
        format!("{}us", nanos / u128::from(MICROSECOND))
    } else {
        format!("{}ns", nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_units() {
        assert_eq!(parse_duration("5s").unwrap(), 5_000_000_000);
        assert_eq!(parse_duration("300ms").unwrap(), 300_000_000);
        assert_eq!(parse_duration("7us").unwrap(), 7_000);
        assert_eq!(parse_duration("7µs").unwrap(), 7_000);
        assert_eq!(parse_duration("12ns").unwrap(), 12);
        assert_eq!(parse_duration("2h").unwrap(), 7_200_000_000_000);
    }

    #[test]
    fn test_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m").unwrap(), 5_400_000_000_000);
        assert_eq!(parse_duration("1.5h").unwrap(), 5_400_000_000_000);
        assert_eq!(parse_duration(".5s").unwrap(), 500_000_000);
        assert_eq!(parse_duration("1.s").unwrap(), 1_000_000_000);
        assert_eq!(parse_duration("2m3.25s").unwrap(), 123_250_000_000);
    }

    #[test]
    fn test_signs_and_zero() {
        assert_eq!(parse_duration("0").unwrap(), 0);
        assert_eq!(parse_duration("-0").unwrap(), 0);
        assert_eq!(parse_duration("+10s").unwrap(), 10_000_000_000);
        assert_eq!(parse_duration("-2m").unwrap(), -120_000_000_000);
    }

    #[test]
    fn test_rejects_bare_numbers() {
        assert_eq!(
            parse_duration("5"),
            Err(DurationError::MissingUnit("5".to_string()))
        );
        assert!(matches!(
            parse_duration("1h5"),
            Err(DurationError::MissingUnit(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(parse_duration(""), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("-"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("s"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("."), Err(DurationError::Invalid(_))));
        assert!(matches!(
            parse_duration("notanumber"),
            Err(DurationError::Invalid(_))
        ));
        assert!(matches!(
            parse_duration("3days"),
            Err(DurationError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn test_format_duration() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(7)), "7ns");
        assert_eq!(parse_duration(&format_duration(Duration::from_secs(7200))).unwrap(), 7_200_000_000_000);
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            parse_duration("9223372036854775808ns"),
            Err(DurationError::Overflow(_))
        ));
        assert_eq!(parse_duration("-9223372036854775808ns").unwrap(), i64::MIN);
        assert!(matches!(
            parse_duration("3000000h"),
            Err(DurationError::Overflow(_))
        ));
    }
}
