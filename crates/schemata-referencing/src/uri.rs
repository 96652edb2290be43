//! RFC 3986 reference resolution on top of `fluent-uri`.

use fluent_uri::UriRef;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::{UriError, UriString};

/// Characters that must be percent-encoded inside a fragment.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'%')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^')
    .add(b'[')
    .add(b']');

/// Parse an absolute URI.
pub fn parse(value: &str) -> Result<UriString, UriError> {
    UriString::parse(value.to_string()).map_err(|error| UriError::new(value, error))
}

/// Resolve `reference` against `base` per RFC 3986 section 5.
///
/// A fragment-only reference is handled before delegating to the generic
/// transformation so that opaque bases (e.g. `urn:`) work: the result is the
/// base with its fragment replaced.
pub fn resolve_against(base: &UriString, reference: &str) -> Result<UriString, UriError> {
    if reference.is_empty() {
        return with_fragment(base, None);
    }
    if let Some(fragment) = reference.strip_prefix('#') {
        let decoded = percent_encoding::percent_decode_str(fragment)
            .decode_utf8()
            .map_err(|error| UriError::new(reference, error))?;
        return with_fragment(base, Some(&decoded));
    }
    let reference_ref =
        UriRef::parse(reference.to_string()).map_err(|error| UriError::new(reference, error))?;
    if reference_ref.scheme().is_some() {
        return parse(reference);
    }
    // The RFC transformation ignores the base fragment, but `fluent-uri`
    // requires a base without one.
    let base = if base.fragment().is_some() {
        with_fragment(base, None)?
    } else {
        base.clone()
    };
    let resolved = reference_ref
        .resolve_against(&base)
        .map_err(|error| UriError::new(reference, error))?;
    parse(resolved.as_str())
}

/// Strip the fragment, if any.
pub fn fragmentless(uri: &UriString) -> Result<UriString, UriError> {
    if uri.fragment().is_none() {
        Ok(uri.clone())
    } else {
        with_fragment(uri, None)
    }
}

/// Replace the fragment. `None` removes it entirely.
pub fn with_fragment(uri: &UriString, fragment: Option<&str>) -> Result<UriString, UriError> {
    let full = uri.as_str();
    let without = full.split('#').next().unwrap_or(full);
    match fragment {
        Some(fragment) => {
            let encoded = utf8_percent_encode(fragment, FRAGMENT);
            parse(&format!("{without}#{encoded}"))
        }
        None => parse(without),
    }
}

/// The decoded fragment of `uri`, or `None` when absent.
#[must_use]
pub fn decoded_fragment(uri: &UriString) -> Option<String> {
    uri.fragment()
        .map(|fragment| fragment.decode().into_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://example.com/a/b", "c", "https://example.com/a/c")]
    #[test_case("https://example.com/a/b", "/c", "https://example.com/c"; "absolute path reference")]
    #[test_case("https://example.com/a/b", "../c", "https://example.com/c"; "parent relative reference")]
    #[test_case("https://example.com/a/b", "//other.com/c", "https://other.com/c")]
    #[test_case("https://example.com/a/b", "https://absolute.com/x", "https://absolute.com/x")]
    #[test_case("https://example.com/a/b#frag", "c", "https://example.com/a/c")]
    #[test_case("https://example.com/a/b", "#frag", "https://example.com/a/b#frag")]
    #[test_case("https://example.com/a/b#old", "#new", "https://example.com/a/b#new")]
    #[test_case("urn:isbn:0451450523", "#inner", "urn:isbn:0451450523#inner"; "opaque base keeps its body")]
    fn resolution(base: &str, reference: &str, expected: &str) {
        let base = parse(base).expect("valid base");
        let resolved = resolve_against(&base, reference).expect("resolvable");
        assert_eq!(resolved.as_str(), expected);
    }

    #[test]
    fn opaque_fragment_only() {
        let base = parse("urn:example:schema").expect("valid base");
        let resolved = resolve_against(&base, "#anchor").expect("resolvable");
        assert_eq!(resolved.as_str(), "urn:example:schema#anchor");
    }

    #[test]
    fn fragment_stripping() {
        let uri = parse("https://example.com/s#/definitions/a").expect("valid");
        assert_eq!(
            fragmentless(&uri).expect("valid").as_str(),
            "https://example.com/s"
        );
        assert_eq!(decoded_fragment(&uri).as_deref(), Some("/definitions/a"));
    }

    #[test]
    fn fragment_encoding_round_trip() {
        let base = parse("https://example.com/s").expect("valid");
        let with = with_fragment(&base, Some("/a b/~c")).expect("valid");
        assert_eq!(decoded_fragment(&with).as_deref(), Some("/a b/~c"));
    }
}
