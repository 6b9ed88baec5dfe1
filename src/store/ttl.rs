//! Time-to-live expressions.
//!
//! A TTL is a sequence of decimal numbers, each with an optional fraction
//! and a unit suffix: `"90s"`, `"1h30m"`, `"1.5h"`, `"7d"`.
//!
//! Units: `ns`, `us` (`µs`), `ms`, `s`, `m`, `h`, `d`.
//! A bare `"0"` is accepted. Negative durations are rejected.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Upper bound on a TTL, in nanoseconds (roughly 292 years).
const MAX_TTL_NANOS: u128 = i64::MAX as u128;

/// Fraction digits beyond this precision cannot change the result.
const MAX_FRACTION_DIGITS: usize = 18;

/// Why a TTL expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TtlError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} is too large")]
    Overflow(String),

    #[error("duration {0:?} is negative")]
    Negative(String),
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        "d" => 86_400 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

/// Splits off the leading run of ASCII digits.
fn take_digits(s: &str) -> (&str, &str) {
    let end = s.bytes().position(|b| !b.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parses a TTL expression into a [`Duration`].
///
/// # Errors
///
/// Returns a [`TtlError`] naming the offending input when it is empty,
/// malformed, uses an unknown unit, exceeds the supported range, or is
/// negative.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tempdrop::store::parse_ttl;
///
/// assert_eq!(parse_ttl("24h").unwrap(), Duration::from_secs(86_400));
/// assert_eq!(parse_ttl("1h30m").unwrap(), Duration::from_secs(5_400));
/// assert!(parse_ttl("soon").is_err());
/// ```
pub fn parse_ttl(input: &str) -> Result<Duration, TtlError> {
    if input.is_empty() {
        return Err(TtlError::Empty);
    }

    let invalid = || TtlError::Invalid(input.to_string());
    let overflow = || TtlError::Overflow(input.to_string());

    let (negative, mut rest) = match input.as_bytes()[0] {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, after) = take_digits(rest);
        rest = after;

        let mut fraction = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let (digits, after) = take_digits(after_dot);
            fraction = digits;
            rest = after;
        }
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_end = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, after) = rest.split_at(unit_end);
        rest = after;
        if unit.is_empty() {
            return Err(TtlError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| TtlError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;

        let mut numerator: u128 = 0;
        let mut denominator: u128 = 1;
        for digit in fraction.bytes().take(MAX_FRACTION_DIGITS) {
            numerator = numerator * 10 + u128::from(digit - b'0');
            denominator *= 10;
        }
        value = value
            .checked_add(numerator * scale / denominator)
            .ok_or_else(overflow)?;

        total = total.checked_add(value).ok_or_else(overflow)?;
        if total > MAX_TTL_NANOS {
            return Err(overflow());
        }
    }

    if negative && total > 0 {
        return Err(TtlError::Negative(input.to_string()));
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| overflow())?;
    let nanos = u32::try_from(total % NANOS_PER_SEC).map_err(|_| overflow())?;
    Ok(Duration::new(secs, nanos))
}
