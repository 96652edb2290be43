//! Built-in `format` validators.
//!
//! Each validator takes the string form of the instance; non-string instances
//! and unknown format names always pass, which is handled by the keyword, not
//! here. The date/time family follows RFC 3339 strictly (leap seconds only at
//! 23:59 UTC); `email` follows RFC 5321 shapes including quoted local parts
//! and IP-literal domains; hostnames follow RFC 1123 with the extra A-label
//! checks IDNA requires.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use schemata_referencing::{Iri, IriRef, Uri, UriRef};

use crate::regex::ecma;

pub(crate) type FormatFn = fn(&str) -> bool;

/// Look up a built-in format validator.
pub(crate) fn builtin(name: &str) -> Option<FormatFn> {
    Some(match name {
        "date" => is_date,
        "time" => is_time,
        "date-time" => is_date_time,
        "duration" => is_duration,
        "email" => is_email,
        "idn-email" => is_idn_email,
        "hostname" => is_hostname,
        "idn-hostname" => is_idn_hostname,
        "ipv4" => is_ipv4,
        "ipv6" => is_ipv6,
        "uri" => is_uri,
        "uri-reference" => is_uri_reference,
        "iri" => is_iri,
        "iri-reference" => is_iri_reference,
        "uri-template" => is_uri_template,
        "uuid" => is_uuid,
        "json-pointer" => is_json_pointer,
        "relative-json-pointer" => is_relative_json_pointer,
        "regex" => is_regex,
        _ => return None,
    })
}

fn two_digits(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some(u32::from((a - b'0') * 10 + (b - b'0')))
        }
        _ => None,
    }
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

pub(crate) fn is_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    if !bytes[..4].iter().all(u8::is_ascii_digit) {
        return false;
    }
    let year = value[..4].parse::<u32>().unwrap_or(0);
    let Some(month) = two_digits(&bytes[5..7]) else {
        return false;
    };
    let Some(day) = two_digits(&bytes[8..10]) else {
        return false;
    };
    (1..=12).contains(&month) && day >= 1 && day <= days_in_month(year, month)
}

struct ParsedTime {
    hour: u32,
    minute: u32,
    second: u32,
    /// Offset in minutes east of UTC.
    offset: i32,
}

fn parse_time(value: &str) -> Option<ParsedTime> {
    let bytes = value.as_bytes();
    if bytes.len() < 9 || bytes[2] != b':' || bytes[5] != b':' {
        return None;
    }
    let hour = two_digits(&bytes[..2])?;
    let minute = two_digits(&bytes[3..5])?;
    let second = two_digits(&bytes[6..8])?;
    if hour > 23 || minute > 59 || second > 60 {
        return None;
    }
    let mut rest = &value[8..];
    if rest.starts_with('.') {
        let fraction: &str = &rest[1..];
        let digits = fraction
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return None;
        }
        rest = &fraction[digits..];
    }
    let offset = match rest.as_bytes() {
        [b'Z' | b'z'] => 0,
        [sign @ (b'+' | b'-'), rest @ ..] if rest.len() == 5 && rest[2] == b':' => {
            let hours = two_digits(&rest[..2])?;
            let minutes = two_digits(&rest[3..5])?;
            if hours > 23 || minutes > 59 {
                return None;
            }
            let offset = (hours * 60 + minutes) as i32;
            if *sign == b'-' {
                -offset
            } else {
                offset
            }
        }
        _ => return None,
    };
    Some(ParsedTime {
        hour,
        minute,
        second,
        offset,
    })
}

pub(crate) fn is_time(value: &str) -> bool {
    let Some(time) = parse_time(value) else {
        return false;
    };
    if time.second == 60 {
        // Leap seconds exist only at 23:59:60 UTC.
        let minutes_utc = (time.hour as i32 * 60 + time.minute as i32 - time.offset)
            .rem_euclid(24 * 60);
        return minutes_utc == 23 * 60 + 59;
    }
    true
}

pub(crate) fn is_date_time(value: &str) -> bool {
    let Some(split) = value
        .bytes()
        .position(|b| b == b'T' || b == b't' || b == b' ')
    else {
        return false;
    };
    is_date(&value[..split]) && is_time(&value[split + 1..])
}

/// ISO 8601 duration: `P[nY][nM][nD][T[nH][nM][nS]]` or `PnW`; weeks do not
/// combine with any other unit, and at least one unit must be present.
pub(crate) fn is_duration(value: &str) -> bool {
    let Some(mut rest) = value.strip_prefix('P') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    fn take_number(rest: &mut &str, fractional: bool) -> Option<()> {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        *rest = &rest[digits..];
        if fractional && rest.starts_with('.') {
            let fraction = &rest[1..];
            let decimals = fraction.bytes().take_while(u8::is_ascii_digit).count();
            if decimals == 0 {
                return None;
            }
            *rest = &fraction[decimals..];
        }
        Some(())
    }
    fn units(rest: &mut &str, allowed: &[char], fractional_last: bool) -> Option<usize> {
        let mut seen = 0;
        let mut position = 0;
        while !rest.is_empty() {
            let mut probe = *rest;
            if take_number(&mut probe, fractional_last).is_none() {
                break;
            }
            let Some(unit) = probe.chars().next() else {
                return None;
            };
            let Some(found) = allowed[position..].iter().position(|&u| u == unit) else {
                return None;
            };
            position += found + 1;
            *rest = &probe[unit.len_utf8()..];
            seen += 1;
        }
        Some(seen)
    }
    // Weeks are exclusive: `P3W` and nothing else.
    if rest.bytes().any(|b| b == b'W') {
        let mut probe = rest;
        if take_number(&mut probe, false).is_none() {
            return false;
        }
        return probe == "W";
    }
    let Some(date_units) = units(&mut rest, &['Y', 'M', 'D'], false) else {
        return false;
    };
    if rest.is_empty() {
        return date_units > 0;
    }
    let Some(time) = rest.strip_prefix('T') else {
        return false;
    };
    let mut time = time;
    match units(&mut time, &['H', 'M', 'S'], true) {
        Some(time_units) => time.is_empty() && time_units > 0,
        None => false,
    }
}

const ATEXT: &str = "!#$%&'*+-/=?^_`{|}~";

fn is_atext(c: char, unicode: bool) -> bool {
    c.is_ascii_alphanumeric() || ATEXT.contains(c) || (unicode && !c.is_ascii())
}

fn valid_local_part(local: &str, unicode: bool) -> bool {
    if local.is_empty() {
        return false;
    }
    if let Some(quoted) = local.strip_prefix('"') {
        let Some(inner) = quoted.strip_suffix('"') else {
            return false;
        };
        let mut escaped = false;
        for c in inner.chars() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                return false;
            } else if c.is_ascii() && !(' '..='~').contains(&c) {
                return false;
            }
        }
        return !escaped;
    }
    // Dot-atom: no leading/trailing dot, no doubled dots.
    !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local.chars().all(|c| c == '.' || is_atext(c, unicode))
}

fn valid_email_domain(domain: &str, unicode: bool) -> bool {
    if let Some(literal) = domain.strip_prefix('[') {
        let Some(inner) = literal.strip_suffix(']') else {
            return false;
        };
        return if let Some(v6) = inner.strip_prefix("IPv6:") {
            is_ipv6(v6)
        } else {
            is_ipv4(inner)
        };
    }
    if unicode {
        is_idn_hostname(domain)
    } else {
        is_hostname(domain)
    }
}

fn valid_email(value: &str, unicode: bool) -> bool {
    // The separator is the last `@` outside the quoted local part.
    let Some(at) = value.rfind('@') else {
        return false;
    };
    let (local, domain) = (&value[..at], &value[at + 1..]);
    if !unicode && !local.is_ascii() {
        return false;
    }
    valid_local_part(local, unicode) && valid_email_domain(domain, unicode)
}

pub(crate) fn is_email(value: &str) -> bool {
    valid_email(value, false)
}

pub(crate) fn is_idn_email(value: &str) -> bool {
    valid_email(value, true)
}

fn valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return false;
    }
    // A-labels must decode, and the decoded U-label must not itself carry the
    // `--` marker in positions 3-4.
    if let Some(encoded) = label
        .strip_prefix("xn--")
        .or_else(|| label.strip_prefix("XN--"))
    {
        let Some(decoded) = idna::punycode::decode_to_string(encoded) else {
            return false;
        };
        let chars: Vec<char> = decoded.chars().collect();
        if chars.len() >= 4 && chars[2] == '-' && chars[3] == '-' {
            return false;
        }
    }
    true
}

pub(crate) fn is_hostname(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    if value.starts_with('.') || value.ends_with('.') {
        return false;
    }
    value.split('.').all(valid_label)
}

pub(crate) fn is_idn_hostname(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    match idna::domain_to_ascii(value) {
        Ok(ascii) => is_hostname(&ascii),
        Err(_) => false,
    }
}

pub(crate) fn is_ipv4(value: &str) -> bool {
    // The std parser already rejects leading zeros and non-dotted-quad forms.
    Ipv4Addr::from_str(value).is_ok()
}

pub(crate) fn is_ipv6(value: &str) -> bool {
    Ipv6Addr::from_str(value).is_ok()
}

pub(crate) fn is_uri(value: &str) -> bool {
    Uri::parse(value).is_ok()
}

pub(crate) fn is_uri_reference(value: &str) -> bool {
    UriRef::parse(value).is_ok()
}

pub(crate) fn is_iri(value: &str) -> bool {
    Iri::parse(value).is_ok()
}

pub(crate) fn is_iri_reference(value: &str) -> bool {
    IriRef::parse(value).is_ok()
}

/// RFC 6570 URI templates: literals plus `{operator? varspec(,varspec)*}`.
pub(crate) fn is_uri_template(value: &str) -> bool {
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut expression = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return false,
                        Some(inner) => expression.push(inner),
                    }
                }
                let rest = expression
                    .strip_prefix(['+', '#', '.', '/', ';', '?', '&', '=', ',', '!', '@', '|'])
                    .unwrap_or(&expression);
                if rest.is_empty() {
                    return false;
                }
                for varspec in rest.split(',') {
                    let name = varspec
                        .strip_suffix('*')
                        .unwrap_or_else(|| varspec.split(':').next().unwrap_or(varspec));
                    if varspec.contains(':') {
                        let Some((_, length)) = varspec.split_once(':') else {
                            return false;
                        };
                        if length.is_empty()
                            || length.len() > 4
                            || !length.bytes().all(|b| b.is_ascii_digit())
                        {
                            return false;
                        }
                    }
                    if name.is_empty()
                        || !name
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '%'))
                    {
                        return false;
                    }
                }
            }
            '}' => return false,
            _ => {}
        }
    }
    true
}

pub(crate) fn is_uuid(value: &str) -> bool {
    // Only the hyphenated 8-4-4-4-12 form; the uuid crate is laxer.
    let bytes = value.as_bytes();
    bytes.len() == 36
        && bytes[8] == b'-'
        && bytes[13] == b'-'
        && bytes[18] == b'-'
        && bytes[23] == b'-'
        && uuid::Uuid::try_parse(value).is_ok()
}

pub(crate) fn is_json_pointer(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if !value.starts_with('/') {
        return false;
    }
    valid_pointer_tokens(value)
}

fn valid_pointer_tokens(value: &str) -> bool {
    let mut bytes = value.bytes().peekable();
    while let Some(b) = bytes.next() {
        if b == b'~' && !matches!(bytes.peek(), Some(b'0' | b'1')) {
            return false;
        }
    }
    true
}

pub(crate) fn is_relative_json_pointer(value: &str) -> bool {
    let digits = value.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    if digits > 1 && value.starts_with('0') {
        return false;
    }
    let rest = &value[digits..];
    rest == "#" || is_json_pointer(rest)
}

pub(crate) fn is_regex(value: &str) -> bool {
    ecma::translate(value)
        .map(|translated| {
            regex::Regex::new(&translated).is_ok() || fancy_regex::Regex::new(&translated).is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("2023-02-28", true)]
    #[test_case("2024-02-29", true; "leap year")]
    #[test_case("2023-02-29", false; "not a leap year")]
    #[test_case("2023-13-01", false)]
    #[test_case("2023-00-10", false)]
    #[test_case("23-01-10", false)]
    #[test_case("2023/01/10", false)]
    fn date(value: &str, expected: bool) {
        assert_eq!(is_date(value), expected);
    }

    #[test_case("23:59:59Z", true)]
    #[test_case("23:59:60Z", true; "leap second utc")]
    #[test_case("23:59:60+01:00", false; "leap second wrong utc time")]
    #[test_case("22:59:60-01:00", true; "leap second shifted to utc")]
    #[test_case("12:00:00.123z", true)]
    #[test_case("12:00:00.Z", false; "empty fraction")]
    #[test_case("12:00:00", false; "missing offset")]
    #[test_case("24:00:00Z", false)]
    fn time(value: &str, expected: bool) {
        assert_eq!(is_time(value), expected);
    }

    #[test_case("2023-01-10T12:00:00Z", true)]
    #[test_case("2023-01-10t12:00:00+05:30", true)]
    #[test_case("2023-01-10 12:00:00Z", true; "space separator")]
    #[test_case("2023-01-10", false)]
    fn date_time(value: &str, expected: bool) {
        assert_eq!(is_date_time(value), expected);
    }

    #[test_case("P1Y2M3DT4H5M6S", true)]
    #[test_case("PT0.5S", true)]
    #[test_case("P3W", true)]
    #[test_case("P3W1D", false; "weeks are exclusive")]
    #[test_case("P", false)]
    #[test_case("PT", false)]
    #[test_case("P1M2Y", false; "units out of order")]
    #[test_case("P1D2M", false; "date units out of order")]
    fn duration(value: &str, expected: bool) {
        assert_eq!(is_duration(value), expected);
    }

    #[test_case("joe@example.com", true)]
    #[test_case("\"quoted @ part\"@example.com", true)]
    #[test_case("joe@[127.0.0.1]", true)]
    #[test_case("joe@[IPv6:::1]", true)]
    #[test_case(".joe@example.com", false; "leading dot")]
    #[test_case("jo..e@example.com", false; "double dot")]
    #[test_case("joe@", false)]
    #[test_case("example.com", false)]
    #[test_case("jöe@example.com", false; "unicode needs idn email")]
    fn email(value: &str, expected: bool) {
        assert_eq!(is_email(value), expected);
    }

    #[test]
    fn idn_email() {
        assert!(is_idn_email("jöe@bücher.example"));
        assert!(!is_idn_email("jöe@-bad-.example"));
    }

    #[test_case("example.com", true)]
    #[test_case("a.b-c.d9", true)]
    #[test_case("xn--nxasmq6b.example", true; "valid a label")]
    #[test_case("xn--ab--c-.example", false; "decoded u label has hyphens in positions 3 and 4")]
    #[test_case("-leading.example", false)]
    #[test_case("trailing-.example", false)]
    #[test_case("under_score.example", false)]
    #[test_case(".leading.dot", false)]
    #[test_case("trailing.dot.", false)]
    fn hostname(value: &str, expected: bool) {
        assert_eq!(is_hostname(value), expected);
    }

    #[test]
    fn hostname_length_limits() {
        assert!(!is_hostname(&"a".repeat(64)));
        let segment = "a".repeat(63);
        let long = [segment.as_str(); 4].join(".");
        assert!(!is_hostname(&long), "254 octets total");
    }

    #[test]
    fn idn_hostname() {
        assert!(is_idn_hostname("bücher.example"));
        assert!(!is_idn_hostname(""));
    }

    #[test_case("192.168.0.1", true)]
    #[test_case("192.168.0.01", false; "leading zero")]
    #[test_case("256.0.0.1", false)]
    #[test_case("1.2.3", false)]
    fn ipv4(value: &str, expected: bool) {
        assert_eq!(is_ipv4(value), expected);
    }

    #[test_case("::1", true)]
    #[test_case("2001:db8::8a2e:370:7334", true)]
    #[test_case("::ffff:192.0.2.1", true)]
    #[test_case("12345::", false)]
    fn ipv6(value: &str, expected: bool) {
        assert_eq!(is_ipv6(value), expected);
    }

    #[test_case("https://example.com/a?b#c", true)]
    #[test_case("/relative", false; "uri must be absolute")]
    #[test_case("höttps://example.com", false; "uri must be ascii")]
    fn uri(value: &str, expected: bool) {
        assert_eq!(is_uri(value), expected);
    }

    #[test]
    fn references_and_iris() {
        assert!(is_uri_reference("/relative?x=1"));
        assert!(is_iri("https://bücher.example/päth"));
        assert!(is_iri_reference("/päth"));
    }

    #[test_case("http://example.com/{id}", true)]
    #[test_case("{/path*}{?q,lang:2}", true)]
    #[test_case("{unclosed", false)]
    #[test_case("{}", false; "empty expression")]
    #[test_case("unopened}", false)]
    fn uri_template(value: &str, expected: bool) {
        assert_eq!(is_uri_template(value), expected);
    }

    #[test_case("2eb8aa08-aa98-11ea-b4aa-73b441d16380", true)]
    #[test_case("2EB8AA08-AA98-11EA-B4AA-73B441D16380", true; "uppercase")]
    #[test_case("2eb8aa08aa9811eab4aa73b441d16380", false; "unhyphenated")]
    #[test_case("not-a-uuid", false)]
    fn uuid_format(value: &str, expected: bool) {
        assert_eq!(is_uuid(value), expected);
    }

    #[test_case("", true)]
    #[test_case("/a/b~0c/~1d", true)]
    #[test_case("/a/~2", false; "bad escape")]
    #[test_case("a/b", false; "missing leading slash")]
    fn json_pointer(value: &str, expected: bool) {
        assert_eq!(is_json_pointer(value), expected);
    }

    #[test_case("0", true)]
    #[test_case("1/a", true)]
    #[test_case("0#", true; "with fragment")]
    #[test_case("01", false; "leading zero")]
    #[test_case("-1/a", false)]
    fn relative_json_pointer(value: &str, expected: bool) {
        assert_eq!(is_relative_json_pointer(value), expected);
    }

    #[test]
    fn regex_format() {
        assert!(is_regex("^a[bc]+$"));
        assert!(!is_regex(r"\a"));
    }
}
