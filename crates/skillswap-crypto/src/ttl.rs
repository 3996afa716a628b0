//! # Token Lifetime Parsing
//!
//! Accepts `<n>s`, `<n>m`, `<n>h`, `<n>d`, or a bare integer number of
//! seconds. The default lifetime is seven days.

use chrono::Duration;

use crate::error::TokenError;

/// Default token lifetime.
pub const DEFAULT_TTL: &str = "7d";

/// Parse a lifetime string into a positive duration.
///
/// # Errors
///
/// Returns [`TokenError::InvalidTtl`] for empty input, an unknown unit, a
/// non-numeric amount, zero, or a value too large to represent.
pub fn parse_ttl(value: &str) -> Result<Duration, TokenError> {
    let invalid = |reason: &str| TokenError::InvalidTtl {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let s = value.trim();
    if s.is_empty() {
        return Err(invalid("empty"));
    }

    let (digits, unit_secs) = match s.chars().last() {
        Some('s') => (&s[..s.len() - 1], 1i64),
        Some('m') => (&s[..s.len() - 1], 60),
        Some('h') => (&s[..s.len() - 1], 3_600),
        Some('d') => (&s[..s.len() - 1], 86_400),
        Some(c) if c.is_ascii_digit() => (s, 1),
        _ => return Err(invalid("unit must be one of s, m, h, d")),
    };

    let amount: i64 = digits
        .parse()
        .map_err(|_| invalid("amount must be a whole number"))?;
    if amount <= 0 {
        return Err(invalid("must be greater than zero"));
    }

    let secs = amount
        .checked_mul(unit_secs)
        .ok_or_else(|| invalid("too large"))?;
    Duration::try_seconds(secs).ok_or_else(|| invalid("too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_seven_days() {
        assert_eq!(parse_ttl(DEFAULT_TTL).unwrap(), Duration::days(7));
    }

    #[test]
    fn units() {
        assert_eq!(parse_ttl("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_ttl("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_ttl("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_ttl("3600").unwrap(), Duration::hours(1));
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert!(parse_ttl("0d").is_err());
        assert!(parse_ttl("-1h").is_err());
    }

    #[test]
    fn rejects_unknown_unit() {
        let err = parse_ttl("2w").unwrap_err();
        assert!(err.to_string().contains("unit"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_ttl("").is_err());
        assert!(parse_ttl("d").is_err());
        assert!(parse_ttl("seven days").is_err());
    }

    #[test]
    fn rejects_overflow() {
        assert!(parse_ttl(&format!("{}d", i64::MAX)).is_err());
    }
}
