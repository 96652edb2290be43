//! Option plumbing: formats, regex dialects, access modes, hooks, and the
//! `x-error` overlay.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use test_case::test_case;

use schemata::{AccessMode, OutputFormat, PatternEngine};

#[test_case("date", "2023-02-28", "2023-02-29")]
#[test_case("time", "12:30:00Z", "25:00:00Z")]
#[test_case("date-time", "2023-01-10T12:00:00Z", "2023-01-10")]
#[test_case("duration", "P3DT4H", "P")]
#[test_case("email", "a@example.com", "not-an-email")]
#[test_case("hostname", "example.com", "-bad.example")]
#[test_case("idn-hostname", "bücher.example", "-bad-.example")]
#[test_case("ipv4", "10.0.0.1", "10.0.0.256")]
#[test_case("ipv6", "::1", "10.0.0.1:80")]
#[test_case("uri", "https://example.com/x", "/relative")]
#[test_case("uri-reference", "/relative", "%zz")]
#[test_case("uri-template", "/users/{id}", "/users/{id")]
#[test_case("uuid", "2eb8aa08-aa98-11ea-b4aa-73b441d16380", "nope")]
#[test_case("json-pointer", "/a/b", "a/b")]
#[test_case("relative-json-pointer", "1/a", "01/a")]
#[test_case("regex", "^a+$", "(unclosed")]
fn format_assertions(name: &str, valid: &str, invalid: &str) {
    let schema = json!({"format": name});
    let asserting = schemata::options()
        .with_format_assertion(true)
        .build(&schema)
        .expect("schema compiles");
    assert!(asserting.is_valid(&json!(valid)), "{valid} should satisfy {name}");
    assert!(
        !asserting.is_valid(&json!(invalid)),
        "{invalid} should not satisfy {name}"
    );
    // Non-strings always pass.
    assert!(asserting.is_valid(&json!(42)));

    // Annotation-only mode never changes validity.
    let annotating = schemata::validator_for(&schema).expect("schema compiles");
    assert!(annotating.is_valid(&json!(invalid)));
}

#[test]
fn unknown_formats_never_fail() {
    let validator = schemata::options()
        .with_format_assertion(true)
        .build(&json!({"format": "genus-species"}))
        .expect("schema compiles");
    assert!(validator.is_valid(&json!("anything")));
}

#[test]
fn custom_formats_participate_in_assertion() {
    let validator = schemata::options()
        .with_format_assertion(true)
        .with_format("even-length", |value| value.len() % 2 == 0)
        .build(&json!({"format": "even-length"}))
        .expect("schema compiles");
    assert!(validator.is_valid(&json!("abcd")));
    assert!(!validator.is_valid(&json!("abc")));
}

#[test]
fn ecma_dialect_narrows_digit_classes() {
    let schema = json!({"pattern": "^\\d+$"});
    let native = schemata::validator_for(&schema).expect("schema compiles");
    let ecma = schemata::options()
        .with_pattern_engine(PatternEngine::Ecma)
        .build(&schema)
        .expect("schema compiles");
    // The host engine's `\d` is Unicode-aware; ECMA-262's is ASCII-only.
    let arabic_digits = json!("١٢٣");
    assert!(native.is_valid(&arabic_digits));
    assert!(!ecma.is_valid(&arabic_digits));
    assert!(ecma.is_valid(&json!("123")));
}

#[test]
fn invalid_ecma_escapes_fail_compilation() {
    let error = schemata::options()
        .with_pattern_engine(PatternEngine::Ecma)
        .build(&json!({"pattern": "\\a"}))
        .expect_err("ECMA-invalid escape");
    assert!(matches!(error, schemata::SchemaError::InvalidEcmaRegexp { .. }));
}

#[test]
fn broken_native_patterns_fail_compilation() {
    let error = schemata::validator_for(&json!({"pattern": "(unclosed"}))
        .expect_err("invalid pattern");
    assert!(matches!(
        error,
        schemata::SchemaError::InvalidRegexpResolution { .. }
    ));
}

#[test]
fn access_modes_relax_required() {
    let schema = json!({
        "required": ["id", "password"],
        "properties": {
            "id": {"readOnly": true},
            "password": {"writeOnly": true}
        }
    });
    let default = schemata::validator_for(&schema).expect("schema compiles");
    assert!(!default.is_valid(&json!({"id": 1})));

    let read = schemata::options()
        .with_access_mode(AccessMode::Read)
        .build(&schema)
        .expect("schema compiles");
    // Reading: the write-only password is never reported missing.
    assert!(read.is_valid(&json!({"id": 1})));
    assert!(!read.is_valid(&json!({})));

    let write = schemata::options()
        .with_access_mode(AccessMode::Write)
        .build(&schema)
        .expect("schema compiles");
    assert!(write.is_valid(&json!({"password": "hunter2"})));
}

#[test]
fn x_error_string_overrides_every_message() {
    let schema = json!({
        "type": "integer",
        "minimum": 3,
        "x-error": "give me a number like %{keywordValue}, not %{instance}"
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    let errors = validator.classic_errors(&json!(1));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error, "give me a number like 3, not 1");
}

#[test]
fn x_error_map_selects_by_keyword() {
    let schema = json!({
        "type": "integer",
        "minimum": 3,
        "x-error": {
            "minimum": "too small: %{instance}",
            "*": "bad value at %{formattedInstanceLocation}"
        }
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    assert_eq!(
        validator.classic_errors(&json!(1))[0].error,
        "too small: 1"
    );
    assert_eq!(
        validator.classic_errors(&json!("x"))[0].error,
        "bad value at root"
    );
}

#[test]
fn x_error_reaches_boolean_subschemas() {
    let schema = json!({
        "properties": {"a": true},
        "additionalProperties": false,
        "x-error": {"additionalProperties": "unexpected property"}
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    let errors = validator.classic_errors(&json!({"b": 1}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error, "unexpected property");
}

#[test]
fn property_hooks_observe_each_property() {
    let before = Arc::new(AtomicUsize::new(0));
    let after = Arc::new(AtomicUsize::new(0));
    let before_count = Arc::clone(&before);
    let after_count = Arc::clone(&after);
    let validator = schemata::options()
        .with_before_property_validation(move |_, _, _| {
            before_count.fetch_add(1, Ordering::Relaxed);
        })
        .with_after_property_validation(move |_, _, _| {
            after_count.fetch_add(1, Ordering::Relaxed);
        })
        .build(&json!({"properties": {"a": true, "b": true}}))
        .expect("schema compiles");
    let instance = json!({"a": 1, "b": 2, "c": 3});
    let report = validator.validate(&instance);
    assert_eq!(report["valid"], json!(true));
    assert_eq!(before.load(Ordering::Relaxed), 2);
    assert_eq!(after.load(Ordering::Relaxed), 2);
}

#[test]
fn insert_property_defaults_never_mutates() {
    let validator = schemata::options()
        .with_insert_property_defaults(true)
        .build(&json!({"properties": {"a": {"default": 1}}}))
        .expect("schema compiles");
    let instance = json!({});
    assert!(validator.is_valid(&instance));
    assert_eq!(instance, json!({}));
}

#[test]
fn configured_output_format_is_the_default() {
    let validator = schemata::options()
        .with_output_format(OutputFormat::Flag)
        .build(&json!({"type": "string"}))
        .expect("schema compiles");
    assert_eq!(validator.validate(&json!(1)), json!({"valid": false}));
}

#[test]
fn content_keywords_annotate_the_decoded_chain() {
    let schema = json!({
        "contentEncoding": "base64",
        "contentMediaType": "application/json",
        "contentSchema": {"type": "object"}
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    // `eyJhIjoxfQ==` is `{"a":1}`.
    let output = validator.validate_as(&json!("eyJhIjoxfQ=="), OutputFormat::Basic);
    assert_eq!(output["valid"], json!(true));
    let annotations = output["annotations"].as_array().expect("annotations");
    assert!(annotations.iter().any(|unit| {
        unit["keywordLocation"] == json!("/contentEncoding")
            && unit["annotation"] == json!("{\"a\":1}")
    }));
    assert!(annotations.iter().any(|unit| {
        unit["keywordLocation"] == json!("/contentMediaType")
            && unit["annotation"] == json!({"a": 1})
    }));
    // Content keywords never assert, even over garbage.
    assert!(validator.is_valid(&json!("not base64!")));
}

#[test]
fn custom_content_registrations_take_precedence() {
    let validator = schemata::options()
        .with_content_encoding("rot13", |value| {
            Some(value.chars().rev().collect())
        })
        .build(&json!({"contentEncoding": "rot13"}))
        .expect("schema compiles");
    let output = validator.validate_as(&json!("cba"), OutputFormat::Basic);
    let annotations = output["annotations"].as_array().expect("annotations");
    assert!(annotations
        .iter()
        .any(|unit| unit["annotation"] == json!("abc")));
}
