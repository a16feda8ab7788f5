//! Subtitle timestamp formatting and parsing.
//!
//! Both formats round to their own resolution (centiseconds for ASS,
//! milliseconds for SRT), so `parse(format(x))` is `x` rounded and
//! `format(parse(s))` gives back `s`.

use reelsmith_common::{ReelError, ReelResult};

/// Format seconds as an ASS timestamp: `H:MM:SS.CC`.
pub fn format_ass_time(secs: f64) -> String {
    let total_cs = to_units(secs, 100.0);
    let hours = total_cs / 360_000;
    let minutes = (total_cs % 360_000) / 6_000;
    let seconds = (total_cs % 6_000) / 100;
    let centis = total_cs % 100;
    format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
}

/// Format seconds as an SRT timestamp: `HH:MM:SS,mmm`.
pub fn format_srt_time(secs: f64) -> String {
    let total_ms = to_units(secs, 1000.0);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Parse `H:MM:SS.CC` into seconds.
pub fn parse_ass_time(value: &str) -> ReelResult<f64> {
    parse_clock(value, '.', 2)
}

/// Parse `HH:MM:SS,mmm` into seconds.
pub fn parse_srt_time(value: &str) -> ReelResult<f64> {
    parse_clock(value, ',', 3)
}

fn to_units(secs: f64, per_second: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * per_second).round() as u64
}

fn parse_clock(value: &str, fraction_sep: char, fraction_digits: usize) -> ReelResult<f64> {
    let bad = || ReelError::caption(format!("malformed timestamp: {value:?}"));

    let mut parts = value.trim().split(':');
    let (Some(h), Some(m), Some(rest), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad());
    };
    let (s, frac) = rest.split_once(fraction_sep).ok_or_else(bad)?;
    if m.len() != 2 || s.len() != 2 || frac.len() != fraction_digits {
        return Err(bad());
    }

    let number = |digits: &str| -> ReelResult<u64> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        digits.parse::<u64>().map_err(|_| bad())
    };
    let (hours, minutes, seconds, fraction) = (number(h)?, number(m)?, number(s)?, number(frac)?);
    if minutes >= 60 || seconds >= 60 {
        return Err(bad());
    }

    let scale = 10u64.pow(fraction_digits as u32);
    let units = hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| s.checked_mul(scale))
        .and_then(|u| u.checked_add(fraction))
        .ok_or_else(bad)?;
    Ok(units as f64 / scale as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ass_reference_values() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(125.5), "0:02:05.50");
        assert_eq!(format_ass_time(3661.239), "1:01:01.24");
        assert_eq!(format_ass_time(-2.0), "0:00:00.00");
    }

    #[test]
    fn test_srt_reference_values() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3661.5), "01:01:01,500");
        assert_eq!(format_srt_time(0.9999), "00:00:01,000");
    }

    #[test]
    fn test_parse_rejects_hours_that_overflow() {
        assert!(parse_ass_time("99999999999999999:00:00.00").is_err());
        assert!(parse_srt_time("99999999999999999:00:00,000").is_err());
        assert!(parse_ass_time("999999:00:00.00").is_ok());
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(parse_ass_time("0:02:05.50").unwrap(), 125.5);
        assert_eq!(parse_srt_time("01:01:01,500").unwrap(), 3661.5);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "0:00", "0:0:00.00", "0:00:00.0", "0:61:00.00", "a:00:00.00", "0:00:00,00"] {
            assert!(parse_ass_time(bad).is_err(), "{bad}");
        }
        assert!(parse_srt_time("00:00:00.000").is_err());
    }

    proptest! {
        #[test]
        fn prop_ass_roundtrip(cs in 0u64..36_000_000) {
            let secs = cs as f64 / 100.0;
            let text = format_ass_time(secs);
            let parsed = parse_ass_time(&text).unwrap();
            prop_assert_eq!(format_ass_time(parsed), text);
            prop_assert!((parsed - secs).abs() < 0.005);
        }

        #[test]
        fn prop_srt_roundtrip(ms in 0u64..360_000_000) {
            let secs = ms as f64 / 1000.0;
            let text = format_srt_time(secs);
            let parsed = parse_srt_time(&text).unwrap();
            prop_assert_eq!(format_srt_time(parsed), text);
            prop_assert!((parsed - secs).abs() < 0.0005);
        }
    }
}
