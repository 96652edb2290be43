use serde_json::Value;

use crate::VocabularySet;

/// The schema dialect a resource is written in.
///
/// Only Draft 2020-12 and its OpenAPI 3.1 extension are supported; `$schema`
/// values naming other dialects fall back to custom-meta-schema handling in
/// the compiler (the meta-schema's own `$vocabulary` decides the keyword set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Draft202012,
    OpenApi31,
}

impl Dialect {
    pub const DRAFT2020_12_URI: &'static str = "https://json-schema.org/draft/2020-12/schema";
    pub const OPENAPI31_URI: &'static str = "https://spec.openapis.org/oas/3.1/dialect/base";

    /// The meta-schema URI identifying this dialect.
    #[must_use]
    pub fn uri(self) -> &'static str {
        match self {
            Dialect::Draft202012 => Dialect::DRAFT2020_12_URI,
            Dialect::OpenApi31 => Dialect::OPENAPI31_URI,
        }
    }

    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Dialect> {
        // An empty fragment is equivalent to none.
        let uri = uri.strip_suffix('#').unwrap_or(uri);
        match uri {
            Dialect::DRAFT2020_12_URI => Some(Dialect::Draft202012),
            Dialect::OPENAPI31_URI => Some(Dialect::OpenApi31),
            _ => None,
        }
    }

    /// Detect the dialect of a schema document from its `$schema`, keeping
    /// `default` when absent or unrecognized.
    #[must_use]
    pub fn detect(contents: &Value, default: Dialect) -> Dialect {
        contents
            .as_object()
            .and_then(|object| object.get("$schema"))
            .and_then(Value::as_str)
            .and_then(Dialect::from_uri)
            .unwrap_or(default)
    }

    /// The vocabulary set this dialect activates by default.
    #[must_use]
    pub fn default_vocabularies(self) -> VocabularySet {
        match self {
            Dialect::Draft202012 => VocabularySet::draft2020_12(),
            Dialect::OpenApi31 => VocabularySet::openapi3_1(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detection() {
        let schema = json!({"$schema": "https://json-schema.org/draft/2020-12/schema"});
        assert_eq!(
            Dialect::detect(&schema, Dialect::OpenApi31),
            Dialect::Draft202012
        );
        let unmarked = json!({"type": "object"});
        assert_eq!(
            Dialect::detect(&unmarked, Dialect::OpenApi31),
            Dialect::OpenApi31
        );
        assert_eq!(
            Dialect::from_uri("https://json-schema.org/draft/2020-12/schema#"),
            Some(Dialect::Draft202012)
        );
    }
}
