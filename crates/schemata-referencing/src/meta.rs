//! Bundled meta-schemas: Draft 2020-12, its vocabulary metas, and the
//! OpenAPI 3.1 dialect and document schemas.

use std::sync::LazyLock;

use serde_json::Value;

macro_rules! embedded {
    ($name:ident, $path:literal) => {
        pub static $name: LazyLock<Value> = LazyLock::new(|| {
            serde_json::from_str(include_str!($path)).expect("bundled meta-schema is valid JSON")
        });
    };
}

embedded!(DRAFT2020_12, "../metas/draft2020-12/schema.json");
embedded!(DRAFT2020_12_CORE, "../metas/draft2020-12/core.json");
embedded!(DRAFT2020_12_APPLICATOR, "../metas/draft2020-12/applicator.json");
embedded!(DRAFT2020_12_UNEVALUATED, "../metas/draft2020-12/unevaluated.json");
embedded!(DRAFT2020_12_VALIDATION, "../metas/draft2020-12/validation.json");
embedded!(DRAFT2020_12_META_DATA, "../metas/draft2020-12/meta-data.json");
embedded!(
    DRAFT2020_12_FORMAT_ANNOTATION,
    "../metas/draft2020-12/format-annotation.json"
);
embedded!(DRAFT2020_12_CONTENT, "../metas/draft2020-12/content.json");
embedded!(OAS31_DIALECT_BASE, "../metas/oas3.1/dialect-base.json");
embedded!(OAS31_META_BASE, "../metas/oas3.1/meta-base.json");
embedded!(OAS31_SCHEMA_BASE, "../metas/oas3.1/schema-base.json");

/// URI of the bundled OpenAPI 3.1 document schema.
pub const OAS31_SCHEMA_BASE_URI: &str = "https://spec.openapis.org/oas/3.1/schema/2022-10-07";

/// Look up a bundled meta-schema by its canonical URI.
///
/// Trailing empty fragments are tolerated, matching `$schema` usage in the
/// wild.
#[must_use]
pub fn document(uri: &str) -> Option<&'static Value> {
    let uri = uri.strip_suffix('#').unwrap_or(uri);
    match uri {
        "https://json-schema.org/draft/2020-12/schema" => Some(&DRAFT2020_12),
        "https://json-schema.org/draft/2020-12/meta/core" => Some(&DRAFT2020_12_CORE),
        "https://json-schema.org/draft/2020-12/meta/applicator" => Some(&DRAFT2020_12_APPLICATOR),
        "https://json-schema.org/draft/2020-12/meta/unevaluated" => Some(&DRAFT2020_12_UNEVALUATED),
        "https://json-schema.org/draft/2020-12/meta/validation" => Some(&DRAFT2020_12_VALIDATION),
        "https://json-schema.org/draft/2020-12/meta/meta-data" => Some(&DRAFT2020_12_META_DATA),
        "https://json-schema.org/draft/2020-12/meta/format-annotation" => {
            Some(&DRAFT2020_12_FORMAT_ANNOTATION)
        }
        "https://json-schema.org/draft/2020-12/meta/content" => Some(&DRAFT2020_12_CONTENT),
        "https://spec.openapis.org/oas/3.1/dialect/base" => Some(&OAS31_DIALECT_BASE),
        "https://spec.openapis.org/oas/3.1/meta/base" => Some(&OAS31_META_BASE),
        OAS31_SCHEMA_BASE_URI | "https://spec.openapis.org/oas/3.1/schema" => {
            Some(&OAS31_SCHEMA_BASE)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_bundled_documents_parse() {
        for uri in [
            "https://json-schema.org/draft/2020-12/schema",
            "https://json-schema.org/draft/2020-12/meta/core",
            "https://json-schema.org/draft/2020-12/meta/applicator",
            "https://json-schema.org/draft/2020-12/meta/unevaluated",
            "https://json-schema.org/draft/2020-12/meta/validation",
            "https://json-schema.org/draft/2020-12/meta/meta-data",
            "https://json-schema.org/draft/2020-12/meta/format-annotation",
            "https://json-schema.org/draft/2020-12/meta/content",
            "https://spec.openapis.org/oas/3.1/dialect/base",
            "https://spec.openapis.org/oas/3.1/meta/base",
            OAS31_SCHEMA_BASE_URI,
        ] {
            let contents = document(uri).expect("bundled");
            assert_eq!(
                contents.get("$id").and_then(Value::as_str),
                Some(uri),
                "`$id` must match the lookup URI for {uri}"
            );
        }
    }

    #[test]
    fn fragment_suffix_is_tolerated() {
        assert!(document("https://json-schema.org/draft/2020-12/schema#").is_some());
        assert!(document("https://example.com/unknown").is_none());
    }
}
