//! Meta-schema validation: the engine hosting its own meta-schema.

use std::sync::LazyLock;

use serde_json::Value;

use schemata_referencing::{meta, Dialect};

use crate::{OutputFormat, Validator};

static META_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    crate::options()
        .with_base_uri(Dialect::DRAFT2020_12_URI)
        .build(&meta::DRAFT2020_12)
        .expect("the bundled Draft 2020-12 meta-schema compiles")
});

/// Whether `schema` is a well-formed Draft 2020-12 schema.
#[must_use]
pub fn is_valid(schema: &Value) -> bool {
    META_VALIDATOR.is_valid(schema)
}

/// Validate `schema` against the Draft 2020-12 meta-schema.
#[must_use]
pub fn validate(schema: &Value, format: OutputFormat) -> Value {
    META_VALIDATOR.validate_as(schema, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_schemas() {
        assert!(is_valid(&json!(true)));
        assert!(is_valid(&json!({})));
        assert!(is_valid(&json!({
            "type": "object",
            "properties": {"a": {"$ref": "#/$defs/b"}},
            "$defs": {"b": {"type": ["integer", "null"]}}
        })));
    }

    #[test]
    fn rejects_malformed_schemas() {
        assert!(!is_valid(&json!({"type": 42})));
        assert!(!is_valid(&json!({"properties": {"a": []}})));
        assert!(!is_valid(&json!({"required": "name"})));
    }

    #[test]
    fn reports_in_requested_format() {
        let report = validate(&json!({"type": "nope"}), OutputFormat::Flag);
        assert_eq!(report, json!({"valid": false}));
        let classic = validate(&json!({"type": "nope"}), OutputFormat::Classic);
        assert_eq!(classic["valid"], json!(false));
        assert!(!classic["errors"].as_array().expect("errors").is_empty());
    }
}
