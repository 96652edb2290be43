//! RFC 6901 JSON Pointers.

use std::borrow::Cow;

use serde_json::Value;

/// Decode `~1` and `~0` in a single pointer token.
#[must_use]
pub fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Encode `~` and `/` in a token so it can be embedded in a pointer.
#[must_use]
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Parse an array index token. Leading zeros are rejected per RFC 6901.
#[must_use]
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    segment.parse().ok()
}

/// Apply a JSON Pointer to `document`.
///
/// The empty pointer returns the document itself; a missing key, an invalid
/// index, or a pointer not starting with `/` returns `None`.
#[must_use]
pub fn lookup<'v>(document: &'v Value, pointer: &str) -> Option<&'v Value> {
    if pointer.is_empty() {
        return Some(document);
    }
    if !pointer.starts_with('/') {
        return None;
    }
    let mut target = document;
    for segment in pointer.split('/').skip(1) {
        let segment = unescape_segment(segment);
        target = match target {
            Value::Object(map) => map.get(segment.as_ref())?,
            Value::Array(items) => items.get(parse_index(&segment)?)?,
            _ => return None,
        };
    }
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("", Some(json!({"a/b": {"c~d": 1}, "list": [10, 20]})))]
    #[test_case("/a~1b/c~0d", Some(json!(1)))]
    #[test_case("/list/0", Some(json!(10)))]
    #[test_case("/list/01", None; "leading zero index")]
    #[test_case("/list/2", None; "out of range")]
    #[test_case("/missing", None)]
    #[test_case("no-slash", None)]
    fn lookups(pointer: &str, expected: Option<Value>) {
        let document = json!({"a/b": {"c~d": 1}, "list": [10, 20]});
        assert_eq!(lookup(&document, pointer), expected.as_ref());
    }

    #[test_case("plain", "plain")]
    #[test_case("a/b", "a~1b")]
    #[test_case("a~b", "a~0b")]
    #[test_case("~/", "~0~1")]
    fn escaping_round_trips(raw: &str, escaped: &str) {
        assert_eq!(escape_segment(raw), escaped);
        assert_eq!(unescape_segment(escaped), raw);
    }
}
