//! Content-encoding and media-type registries.

use std::sync::Arc;

use base64::Engine as _;
use serde_json::Value;

/// Decodes an encoded string; `None` withholds the annotation.
pub type ContentDecoder = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Parses a decoded string into a JSON value; `None` withholds the
/// annotation.
pub type ContentParser = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

pub(crate) fn builtin_decoder(name: &str) -> Option<ContentDecoder> {
    match name.to_ascii_lowercase().as_str() {
        "base64" => Some(Arc::new(|value: &str| {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(value)
                .ok()?;
            String::from_utf8(bytes).ok()
        })),
        _ => None,
    }
}

pub(crate) fn builtin_parser(name: &str) -> Option<ContentParser> {
    match name.to_ascii_lowercase().as_str() {
        "application/json" => Some(Arc::new(|value: &str| serde_json::from_str(value).ok())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base64_decoding() {
        let decoder = builtin_decoder("base64").expect("bundled");
        assert_eq!(decoder("aGVsbG8="), Some("hello".to_string()));
        assert_eq!(decoder("not base64!"), None);
        assert!(builtin_decoder("rot13").is_none());
    }

    #[test]
    fn json_parsing() {
        let parser = builtin_parser("application/json").expect("bundled");
        assert_eq!(parser("{\"a\":1}"), Some(json!({"a": 1})));
        assert_eq!(parser("{"), None);
    }
}
