use serde::Deserialize;

/// What to do with duration text that is not `H:MM:SS`, `MM:SS` or bare seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitFallback {
    /// Strip everything but digits and read the rest as seconds.
    #[default]
    Lenient,
    /// Treat it as unparseable.
    Strict,
}

/// Read a loosely formatted duration as a number of seconds.
///
/// `:`-separated tokens are read right to left as seconds, minutes and hours. Anything that
/// does not fit yields `None`.
pub fn parse_duration(text: &str, fallback: DigitFallback) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let tokens = text
        .split(':')
        .filter(|token| !token.is_empty())
        .map(|token| token.trim().parse::<u64>())
        .collect::<Result<Vec<_>, _>>();

    let Ok(tokens) = tokens else {
        return match fallback {
            DigitFallback::Lenient => digits_only(text),
            DigitFallback::Strict => None,
        };
    };

    match tokens.as_slice() {
        [seconds] => Some(*seconds),
        [minutes, seconds] => minutes.checked_mul(60)?.checked_add(*seconds),
        [hours, minutes, seconds] => hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_add(*seconds),
        _ => None,
    }
}

fn digits_only(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    use DigitFallback::*;

    #[test]
    fn hours_minutes_seconds() {
        assert_eq!(parse_duration("1:30:00", Lenient), Some(5400));
        assert_eq!(parse_duration("0:02:05", Strict), Some(125));
    }

    #[test]
    fn minutes_seconds() {
        assert_eq!(parse_duration("45:10", Lenient), Some(2710));
    }

    #[test]
    fn bare_seconds_with_surrounding_noise() {
        assert_eq!(parse_duration("  42 \n", Strict), Some(42));
    }

    #[test]
    fn too_many_tokens() {
        assert_eq!(parse_duration("1:2:3:4", Lenient), None);
    }

    #[test]
    fn empty_and_separator_only() {
        assert_eq!(parse_duration("", Lenient), None);
        assert_eq!(parse_duration(" ", Lenient), None);
        assert_eq!(parse_duration(":", Lenient), None);
    }

    #[test]
    fn digit_fallback_follows_mode() {
        assert_eq!(parse_duration("about5400ish", Lenient), Some(5400));
        assert_eq!(parse_duration("about5400ish", Strict), None);
        assert_eq!(parse_duration("soon", Lenient), None);
    }

    #[test]
    fn space_inside_clock_falls_back_to_digits() {
        // "1: :30" has a blank token, so the clock reading fails and the digits are glued
        assert_eq!(parse_duration("1: :30", Lenient), Some(130));
    }

    #[test]
    fn overflow_is_unparseable() {
        assert_eq!(parse_duration("99999999999999999999", Lenient), None);
        assert_eq!(parse_duration("18446744073709551615:0:0", Lenient), None);
    }
}
