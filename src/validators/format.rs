//! The `format` keyword.
//!
//! Formats are annotations by default; they assert only when the
//! format-assertion vocabulary is enabled or the options request it.
//! Unknown formats are accepted.
use std::{net::Ipv4Addr, net::Ipv6Addr, str::FromStr, sync::Arc};

use ahash::AHashMap;
use email_address::EmailAddress;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use url::Url;
use uuid_simd::{parse_hyphenated, Out};

use crate::{error::ValidationError, paths::JsonPointer, uri};

/// A named format checker registered through the options.
pub trait Format: Send + Sync {
    /// Whether the string conforms to the format.
    fn is_valid(&self, value: &str) -> bool;
}

impl<F> Format for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &str) -> bool {
        self(value)
    }
}

/// A format resolved at compile time, ready to be checked.
pub(crate) struct CompiledFormat {
    name: String,
    check: FormatCheck,
}

enum FormatCheck {
    Builtin(fn(&str) -> bool),
    Custom(Arc<dyn Format>),
}

impl CompiledFormat {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_valid(&self, value: &str) -> bool {
        match &self.check {
            FormatCheck::Builtin(check) => check(value),
            FormatCheck::Custom(format) => format.is_valid(value),
        }
    }
}

/// Resolve the `format` keyword to a checker. Custom registrations shadow
/// the built-ins; unknown formats yield `None` and are thereby accepted.
pub(crate) fn compile(
    location: &JsonPointer,
    parent: &Map<String, Value>,
    custom: &AHashMap<String, Arc<dyn Format>>,
) -> Result<Option<CompiledFormat>, ValidationError<'static>> {
    let Some(value) = parent.get("format") else {
        return Ok(None);
    };
    let Some(name) = value.as_str() else {
        return Err(ValidationError::invalid_schema(
            location.join("format"),
            "\"format\" must be a string",
        ));
    };
    if let Some(format) = custom.get(name) {
        return Ok(Some(CompiledFormat {
            name: name.to_string(),
            check: FormatCheck::Custom(Arc::clone(format)),
        }));
    }
    Ok(BUILTIN_FORMATS.get(name).map(|check| CompiledFormat {
        name: name.to_string(),
        check: FormatCheck::Builtin(*check),
    }))
}

static BUILTIN_FORMATS: Lazy<AHashMap<&'static str, fn(&str) -> bool>> = Lazy::new(|| {
    let mut formats: AHashMap<&'static str, fn(&str) -> bool> = AHashMap::with_capacity(16);
    formats.insert("date", is_valid_date);
    formats.insert("time", is_valid_time);
    formats.insert("date-time", is_valid_datetime);
    formats.insert("duration", is_valid_duration);
    formats.insert("email", is_valid_email);
    formats.insert("hostname", is_valid_hostname);
    formats.insert("ipv4", is_valid_ipv4);
    formats.insert("ipv6", is_valid_ipv6);
    formats.insert("uuid", is_valid_uuid);
    formats.insert("uri", is_valid_uri);
    formats.insert("uri-reference", is_valid_uri_reference);
    formats.insert("json-pointer", is_valid_json_pointer);
    formats.insert("relative-json-pointer", is_valid_relative_json_pointer);
    formats.insert("regex", is_valid_regex);
    formats
});

fn is_valid_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        let mut result = 0;
        for index in range {
            let byte = bytes[index];
            if !byte.is_ascii_digit() {
                return None;
            }
            result = result * 10 + u32::from(byte - b'0');
        }
        Some(result)
    };
    let (Some(year), Some(month), Some(day)) = (digits(0..4), digits(5..7), digits(8..10)) else {
        return false;
    };
    if !(1..=12).contains(&month) || day == 0 {
        return false;
    }
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if leap {
                29
            } else {
                28
            }
        }
    };
    day <= days_in_month
}

fn is_valid_time(value: &str) -> bool {
    let bytes = value.as_bytes();
    // Minimum is "HH:MM:SSZ".
    if bytes.len() < 9 || bytes[2] != b':' || bytes[5] != b':' {
        return false;
    }
    let pair = |first: u8, second: u8| -> Option<u32> {
        if first.is_ascii_digit() && second.is_ascii_digit() {
            Some(u32::from(first - b'0') * 10 + u32::from(second - b'0'))
        } else {
            None
        }
    };
    let (Some(hour), Some(minute), Some(second)) = (
        pair(bytes[0], bytes[1]),
        pair(bytes[3], bytes[4]),
        pair(bytes[6], bytes[7]),
    ) else {
        return false;
    };
    if hour > 23 || minute > 59 || second > 60 {
        return false;
    }
    let mut rest = &value[8..];
    if let Some(stripped) = rest.strip_prefix('.') {
        let fraction_len = stripped.bytes().take_while(u8::is_ascii_digit).count();
        if fraction_len == 0 {
            return false;
        }
        rest = &stripped[fraction_len..];
    }
    let offset_bytes = rest.as_bytes();
    let offset_minutes: i32 = match offset_bytes {
        [b'Z' | b'z'] => 0,
        [b'+' | b'-', _, _, b':', _, _] => {
            let (Some(hours), Some(minutes)) = (
                pair(offset_bytes[1], offset_bytes[2]),
                pair(offset_bytes[4], offset_bytes[5]),
            ) else {
                return false;
            };
            if hours > 23 || minutes > 59 {
                return false;
            }
            let total = (hours * 60 + minutes) as i32;
            if offset_bytes[0] == b'-' {
                -total
            } else {
                total
            }
        }
        _ => return false,
    };
    // Leap seconds are only valid when the time is 23:59:60 in UTC.
    if second == 60 {
        let utc_minutes =
            ((hour * 60 + minute) as i32 - offset_minutes).rem_euclid(24 * 60);
        return utc_minutes == 23 * 60 + 59;
    }
    true
}

fn is_valid_datetime(value: &str) -> bool {
    if value.len() < 11 {
        return false;
    }
    let separator = value.as_bytes()[10];
    if separator != b'T' && separator != b't' {
        return false;
    }
    is_valid_date(&value[..10]) && is_valid_time(&value[11..])
}

fn is_valid_duration(value: &str) -> bool {
    // ISO 8601 durations: P[nY][nM][nD][T[nH][nM][nS]] or PnW.
    let Some(rest) = value.strip_prefix('P') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    fn components(part: &str, units: &[char]) -> Option<usize> {
        let mut seen = 0;
        let mut unit_cursor = 0;
        let mut digits = 0;
        for ch in part.chars() {
            if ch.is_ascii_digit() {
                digits += 1;
            } else {
                if digits == 0 {
                    return None;
                }
                let position = units[unit_cursor..].iter().position(|unit| *unit == ch)?;
                unit_cursor += position + 1;
                digits = 0;
                seen += 1;
            }
        }
        if digits != 0 {
            return None;
        }
        Some(seen)
    }
    if date_part.ends_with('W') {
        return time_part.is_none() && components(date_part, &['W']) == Some(1);
    }
    let date_components = match components(date_part, &['Y', 'M', 'D']) {
        Some(count) => count,
        None => return false,
    };
    match time_part {
        Some(time) => matches!(components(time, &['H', 'M', 'S']), Some(count) if count > 0),
        None => date_components > 0,
    }
}

fn is_valid_email(value: &str) -> bool {
    let Ok(parsed) = EmailAddress::from_str(value) else {
        return false;
    };
    let domain = parsed.domain();
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        match literal.strip_prefix("IPv6:") {
            Some(address) => address.parse::<Ipv6Addr>().is_ok(),
            None => literal.parse::<Ipv4Addr>().is_ok(),
        }
    } else {
        is_valid_hostname(domain)
    }
}

fn is_valid_hostname(value: &str) -> bool {
    !(value.is_empty()
        || value.len() > 255
        || value.starts_with('-')
        || value.ends_with('-')
        || value.split('.').any(|label| {
            label.is_empty()
                || label.len() > 63
                || label.starts_with('-')
                || label.ends_with('-')
                || !label.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
        }))
}

fn is_valid_ipv4(value: &str) -> bool {
    // `Ipv4Addr` accepts leading zeros; RFC 2673 dotted quads do not.
    if value
        .split('.')
        .any(|octet| octet.len() > 1 && octet.starts_with('0'))
    {
        return false;
    }
    value.parse::<Ipv4Addr>().is_ok()
}

fn is_valid_ipv6(value: &str) -> bool {
    value.parse::<Ipv6Addr>().is_ok()
}

fn is_valid_uuid(value: &str) -> bool {
    let mut out = [0; 16];
    parse_hyphenated(value.as_bytes(), Out::from_mut(&mut out)).is_ok()
}

fn is_valid_uri(value: &str) -> bool {
    Url::parse(value).is_ok()
}

fn is_valid_uri_reference(value: &str) -> bool {
    uri::resolve_against("https://example.com/", value).is_some()
        && !value.contains(' ')
}

fn is_valid_json_pointer(value: &str) -> bool {
    uri::is_json_pointer(value)
}

fn is_valid_relative_json_pointer(value: &str) -> bool {
    let offset_len = value.bytes().take_while(u8::is_ascii_digit).count();
    if offset_len == 0 || (offset_len > 1 && value.starts_with('0')) {
        return false;
    }
    let rest = &value[offset_len..];
    rest.is_empty() || rest == "#" || is_valid_json_pointer(rest)
}

fn is_valid_regex(value: &str) -> bool {
    crate::ecma::to_rust_regex(value)
        .map(|pattern| fancy_regex::Regex::new(&pattern).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("2024-02-29", true; "leap day")]
    #[test_case("2023-02-29", false; "not a leap year")]
    #[test_case("2024-13-01", false; "month out of range")]
    #[test_case("2024-00-10", false; "zero month")]
    #[test_case("2024-1-10", false; "missing padding")]
    fn date(value: &str, expected: bool) {
        assert_eq!(is_valid_date(value), expected);
    }

    #[test_case("23:59:59Z", true)]
    #[test_case("23:59:60Z", true; "leap second utc")]
    #[test_case("12:00:60Z", false; "leap second not at midnight utc")]
    #[test_case("10:30:00+05:30", true)]
    #[test_case("10:30:00", false; "missing offset")]
    #[test_case("24:00:00Z", false; "hour out of range")]
    #[test_case("12:00:00.5Z", true; "fraction")]
    #[test_case("12:00:00.Z", false; "empty fraction")]
    fn time(value: &str, expected: bool) {
        assert_eq!(is_valid_time(value), expected);
    }

    #[test_case("2024-06-01T12:00:00Z", true)]
    #[test_case("2024-06-01t12:00:00z", true; "lowercase separators")]
    #[test_case("2024-06-01 12:00:00Z", false; "space separator")]
    fn datetime(value: &str, expected: bool) {
        assert_eq!(is_valid_datetime(value), expected);
    }

    #[test_case("P1Y2M3DT4H5M6S", true)]
    #[test_case("P3W", true)]
    #[test_case("PT1M", true)]
    #[test_case("P", false; "empty")]
    #[test_case("P1S", false; "seconds outside time part")]
    #[test_case("PT", false; "empty time part")]
    #[test_case("P1M2Y", false; "units out of order")]
    fn duration(value: &str, expected: bool) {
        assert_eq!(is_valid_duration(value), expected);
    }

    #[test_case("user@example.com", true)]
    #[test_case("user@[192.168.0.1]", true)]
    #[test_case("not-an-email", false)]
    fn email(value: &str, expected: bool) {
        assert_eq!(is_valid_email(value), expected);
    }

    #[test_case("example.com", true)]
    #[test_case("a-.com", false; "label ends with dash")]
    #[test_case("ex_ample.com", false; "underscore")]
    fn hostname(value: &str, expected: bool) {
        assert_eq!(is_valid_hostname(value), expected);
    }

    #[test_case("192.168.0.1", true)]
    #[test_case("192.168.0.01", false; "leading zero")]
    #[test_case("256.0.0.1", false; "octet out of range")]
    fn ipv4(value: &str, expected: bool) {
        assert_eq!(is_valid_ipv4(value), expected);
    }

    #[test_case("f81d4fae-7dec-11d0-a765-00a0c91e6bf6", true)]
    #[test_case("f81d4fae7dec11d0a76500a0c91e6bf6", false; "missing hyphens")]
    fn uuid(value: &str, expected: bool) {
        assert_eq!(is_valid_uuid(value), expected);
    }

    #[test_case("", true; "empty pointer")]
    #[test_case("/a/b", true)]
    #[test_case("/a~0b/~1", true; "escapes")]
    #[test_case("/a~2", false; "bad escape")]
    #[test_case("a", false; "missing leading slash")]
    fn json_pointer(value: &str, expected: bool) {
        assert_eq!(is_valid_json_pointer(value), expected);
    }

    #[test_case("0", true; "zero offset")]
    #[test_case("1/a", true)]
    #[test_case("0#", true)]
    #[test_case("01", false; "leading zero offset")]
    #[test_case("-1", false; "negative offset")]
    fn relative_json_pointer(value: &str, expected: bool) {
        assert_eq!(is_valid_relative_json_pointer(value), expected);
    }
}
