//! Text ↔ value conversions for the fields shown on the attendance page.
//!
//! The page renders every figure as loosely formatted text. Parsing is
//! lenient in the same way the page's own scripts are: integer tokens are
//! read like JavaScript's `parseInt` (leading whitespace, optional sign,
//! leading digits, trailing junk ignored). Anything that cannot be read is
//! `None`, never an error.

use chrono::TimeDelta;

use crate::attendance::{ClockTime, SignedDuration};

/// Placeholder the page (and the panel) shows for an unset time.
pub const PLACEHOLDER: &str = "--:--";

/// Placeholder for an unset or negative elapsed duration.
pub const ELAPSED_PLACEHOLDER: &str = "--:--:--";

/// Parses `H:MM` (extra `:` parts ignored) into a time of day.
#[must_use]
pub fn parse_clock_time(text: &str) -> Option<ClockTime> {
    let text = text.trim();
    if text.is_empty() || text == PLACEHOLDER {
        return None;
    }

    let mut parts = text.split(':');
    let hour = parse_int_prefix(parts.next()?)?;
    let minute = parse_int_prefix(parts.next()?)?;

    ClockTime::new(u32::try_from(hour).ok()?, u32::try_from(minute).ok()?)
}

/// Parses `[-]H+:MM` into signed minutes.
///
/// The value is negative only when the text *starts* with `-`; the first `-`
/// anywhere in the text is then dropped before splitting, so stray signs
/// elsewhere are tolerated rather than rejected.
#[must_use]
pub fn parse_signed_duration(text: &str) -> Option<SignedDuration> {
    if text.is_empty() || text == PLACEHOLDER {
        return None;
    }

    let negative = text.starts_with('-');
    let cleaned = text.replacen('-', "", 1);
    let mut parts = cleaned.split(':');
    let hours = parse_int_prefix(parts.next()?)?;
    let minutes = parse_int_prefix(parts.next()?)?;

    let total = hours.checked_mul(60)?.checked_add(minutes)?;
    Some(SignedDuration::from_minutes(if negative {
        -total
    } else {
        total
    }))
}

/// Parses a day count such as `20` or `20日`.
#[must_use]
pub fn parse_day_count(text: &str) -> Option<i64> {
    parse_int_prefix(text)
}

#[must_use]
pub fn format_clock_time(time: Option<ClockTime>) -> String {
    time.map_or_else(|| PLACEHOLDER.to_string(), |t| t.to_string())
}

/// Renders `H:MM` with un-padded hours and a `-` for negative values.
///
/// Never emits `+`; callers that want an explicit sign add it themselves.
#[must_use]
pub fn format_signed_duration(duration: Option<SignedDuration>) -> String {
    let Some(duration) = duration else {
        return PLACEHOLDER.to_string();
    };

    let abs = duration.minutes().unsigned_abs();
    let text = format!("{}:{:02}", abs / 60, abs % 60);
    if duration.is_negative() {
        format!("-{text}")
    } else {
        text
    }
}

/// Renders `HH:MM:SS` from whole seconds; hours keep counting past 24.
#[must_use]
pub fn format_elapsed(elapsed: Option<TimeDelta>) -> String {
    match elapsed {
        Some(delta) if delta >= TimeDelta::zero() => {
            let total = delta.num_seconds();
            format!(
                "{:02}:{:02}:{:02}",
                total / 3600,
                (total % 3600) / 60,
                total % 60
            )
        }
        _ => ELAPSED_PLACEHOLDER.to_string(),
    }
}

/// `parseInt(s, 10)` semantics: `None` when no leading digits are present.
pub(crate) fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(m: i64) -> Option<SignedDuration> {
        Some(SignedDuration::from_minutes(m))
    }

    // -----------------------------------------------------------------------
    // parse_clock_time
    // -----------------------------------------------------------------------

    #[test]
    fn clock_time_basic() {
        assert_eq!(parse_clock_time("09:15"), ClockTime::new(9, 15));
        assert_eq!(parse_clock_time("9:05"), ClockTime::new(9, 5));
    }

    #[test]
    fn clock_time_ignores_extra_parts() {
        assert_eq!(parse_clock_time("18:30:59"), ClockTime::new(18, 30));
    }

    #[test]
    fn clock_time_placeholder_and_empty_are_unset() {
        assert!(parse_clock_time("").is_none());
        assert!(parse_clock_time("--:--").is_none());
        assert!(parse_clock_time("   ").is_none());
    }

    #[test]
    fn clock_time_requires_two_parts() {
        assert!(parse_clock_time("0915").is_none());
    }

    #[test]
    fn clock_time_rejects_non_numeric() {
        assert!(parse_clock_time("ab:cd").is_none());
        assert!(parse_clock_time("09:xx").is_none());
    }

    #[test]
    fn clock_time_rejects_out_of_range() {
        assert!(parse_clock_time("24:00").is_none());
        assert!(parse_clock_time("12:60").is_none());
        assert!(parse_clock_time("-1:00").is_none());
    }

    // -----------------------------------------------------------------------
    // parse_signed_duration
    // -----------------------------------------------------------------------

    #[test]
    fn duration_positive() {
        assert_eq!(parse_signed_duration("160:00"), minutes(9600));
        assert_eq!(parse_signed_duration("7:45"), minutes(465));
    }

    #[test]
    fn duration_sign_applies_to_whole_value() {
        assert_eq!(parse_signed_duration("-1:30"), minutes(-90));
        assert_eq!(parse_signed_duration("-0:30"), minutes(-30));
    }

    #[test]
    fn duration_stray_minus_is_dropped_not_negated() {
        // Not a leading sign, so the value stays positive.
        assert_eq!(parse_signed_duration("1:-30"), minutes(90));
    }

    #[test]
    fn duration_unset_inputs() {
        assert!(parse_signed_duration("").is_none());
        assert!(parse_signed_duration("--:--").is_none());
        assert!(parse_signed_duration("90").is_none());
        assert!(parse_signed_duration("x:30").is_none());
        assert!(parse_signed_duration("-").is_none());
    }

    #[test]
    fn parse_is_left_inverse_of_format() {
        for m in -3000..=3000 {
            let text = format_signed_duration(minutes(m));
            assert_eq!(parse_signed_duration(&text), minutes(m), "round trip of {text}");
        }
    }

    // -----------------------------------------------------------------------
    // parse_day_count
    // -----------------------------------------------------------------------

    #[test]
    fn day_count_reads_leading_integer() {
        assert_eq!(parse_day_count("20"), Some(20));
        assert_eq!(parse_day_count(" 18日"), Some(18));
        assert_eq!(parse_day_count("日"), None);
        assert_eq!(parse_day_count(""), None);
    }

    // -----------------------------------------------------------------------
    // formatting
    // -----------------------------------------------------------------------

    #[test]
    fn format_clock_time_pads() {
        assert_eq!(format_clock_time(ClockTime::new(7, 3)), "07:03");
        assert_eq!(format_clock_time(None), "--:--");
    }

    #[test]
    fn format_signed_duration_shapes() {
        assert_eq!(format_signed_duration(minutes(0)), "0:00");
        assert_eq!(format_signed_duration(minutes(-60)), "-1:00");
        assert_eq!(format_signed_duration(minutes(605)), "10:05");
        assert_eq!(format_signed_duration(None), "--:--");
    }

    #[test]
    fn format_elapsed_shapes() {
        assert_eq!(format_elapsed(Some(TimeDelta::seconds(3725))), "01:02:05");
        assert_eq!(format_elapsed(Some(TimeDelta::milliseconds(999))), "00:00:00");
        assert_eq!(format_elapsed(Some(TimeDelta::seconds(-1))), "--:--:--");
        assert_eq!(format_elapsed(None), "--:--:--");
    }

    #[test]
    fn format_elapsed_does_not_wrap_at_24_hours() {
        assert_eq!(
            format_elapsed(Some(TimeDelta::hours(27) + TimeDelta::minutes(4))),
            "27:04:00"
        );
    }

    #[test]
    fn format_elapsed_between_clock_times() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let start = ClockTime::new(8, 50).unwrap().on(date);
        let end = ClockTime::new(17, 55).unwrap().on(date);
        assert_eq!(format_elapsed(Some(end - start)), "09:05:00");
    }

    #[test]
    fn int_prefix_matches_parse_int() {
        assert_eq!(parse_int_prefix("  42abc"), Some(42));
        assert_eq!(parse_int_prefix("-7"), Some(-7));
        assert_eq!(parse_int_prefix("+3"), Some(3));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix("-"), None);
    }
}
