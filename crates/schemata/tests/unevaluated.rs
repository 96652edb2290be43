//! `unevaluatedItems` / `unevaluatedProperties` across applicators.

use serde_json::{json, Value};
use test_case::test_case;

#[test_case(&json!({"a": 1}), true; "declared property is evaluated")]
#[test_case(&json!({"a": 1, "b": 2}), false; "undeclared property is unevaluated")]
#[test_case(&json!({}), true; "empty object")]
fn sees_through_all_of(instance: &Value, expected: bool) {
    let schema = json!({
        "allOf": [
            {"properties": {"a": true}}
        ],
        "unevaluatedProperties": false
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    assert_eq!(validator.is_valid(instance), expected);
}

#[test]
fn respects_pattern_and_additional_properties() {
    let schema = json!({
        "properties": {"name": true},
        "patternProperties": {"^x-": true},
        "unevaluatedProperties": false
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    assert!(validator.is_valid(&json!({"name": 1, "x-tag": 2})));
    assert!(!validator.is_valid(&json!({"other": 3})));
}

#[test]
fn conditional_branches_contribute_coverage() {
    let schema = json!({
        "if": {"required": ["kind"], "properties": {"kind": {"const": "point"}}},
        "then": {"properties": {"x": true, "y": true}},
        "properties": {"kind": true},
        "unevaluatedProperties": false
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    // `then` applied, so x and y are evaluated.
    assert!(validator.is_valid(&json!({"kind": "point", "x": 1, "y": 2})));
    // `then` not applied: x is unevaluated.
    assert!(!validator.is_valid(&json!({"kind": "line", "x": 1})));
}

#[test]
fn failed_branches_contribute_nothing() {
    let schema = json!({
        "anyOf": [
            {"required": ["a"], "properties": {"a": true, "extra": true}},
            {"required": ["b"]}
        ],
        "unevaluatedProperties": false
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    // First branch fails (`a` missing), so its `extra` coverage is ignored.
    assert!(!validator.is_valid(&json!({"b": 1, "extra": 2})));
    assert!(validator.is_valid(&json!({"a": 1, "extra": 2})));
}

#[test]
fn items_and_prefix_items_cover_indices() {
    let schema = json!({
        "prefixItems": [true],
        "items": {"type": "integer"},
        "unevaluatedItems": false
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    // `items` covers everything after the prefix, so nothing is unevaluated.
    assert!(validator.is_valid(&json!(["anything", 1, 2])));
    assert!(!validator.is_valid(&json!(["anything", "not an integer"])));
}

#[test]
fn contains_covers_matched_indices_only() {
    let schema = json!({
        "contains": {"type": "integer"},
        "unevaluatedItems": {"type": "string"}
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    assert!(validator.is_valid(&json!([1, "a", 2])));
    assert!(!validator.is_valid(&json!([1, true])));
}

#[test]
fn unevaluated_subschemas_apply_to_the_remainder() {
    let schema = json!({
        "prefixItems": [{"type": "integer"}],
        "unevaluatedItems": {"type": "string"}
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    assert!(validator.is_valid(&json!([1, "a", "b"])));
    assert!(!validator.is_valid(&json!([1, 2])));
    let errors = validator.classic_errors(&json!([1, 2]));
    assert_eq!(errors[0].data_pointer, "/1");
    assert_eq!(errors[0].kind, "string");
}

#[test]
fn nested_unevaluated_properties_with_refs() {
    let schema = json!({
        "$defs": {
            "base": {"properties": {"id": {"type": "integer"}}}
        },
        "$ref": "#/$defs/base",
        "properties": {"label": {"type": "string"}},
        "unevaluatedProperties": false
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    // Coverage flows out of the `$ref` target and the sibling `properties`.
    assert!(validator.is_valid(&json!({"id": 1, "label": "x"})));
    assert!(!validator.is_valid(&json!({"id": 1, "other": true})));
}

#[test]
fn min_contains_zero_still_produces_coverage() {
    let schema = json!({
        "contains": {"type": "integer"},
        "minContains": 0,
        "unevaluatedItems": false
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    // No integers is fine (minContains 0), but any non-integer is
    // unevaluated and rejected.
    assert!(validator.is_valid(&json!([])));
    assert!(validator.is_valid(&json!([1, 2])));
    assert!(!validator.is_valid(&json!(["a"])));
}
