//! End-to-end validation scenarios.

use serde_json::{json, Value};
use test_case::test_case;

use schemata::OutputFormat;

#[test_case(&json!({"type": "integer", "minimum": 0, "maximum": 100}), &json!(50), true)]
#[test_case(&json!({"type": "integer", "minimum": 0, "maximum": 100}), &json!(150), false)]
#[test_case(&json!({}), &json!({"anything": [1, 2, 3]}), true; "empty schema accepts everything")]
#[test_case(&json!(true), &json!(null), true; "true schema accepts everything")]
#[test_case(&json!(false), &json!(null), false; "false schema rejects everything")]
#[test_case(&json!({"type": "integer"}), &json!(1.0), true; "integer valued float")]
#[test_case(&json!({"type": "integer"}), &json!(1.5), false)]
#[test_case(&json!({"enum": [1, "two"]}), &json!(1.0), true; "enum compares numerically")]
#[test_case(&json!({"multipleOf": 0.01}), &json!(8.61), true; "decimal exact multiple")]
#[test_case(&json!({"maxLength": 1, "minLength": 1}), &json!("😀"), true; "length counts code points")]
#[test_case(&json!({"pattern": "b+"}), &json!("abc"), true; "patterns are unanchored")]
fn validity(schema: &Value, instance: &Value, expected: bool) {
    let validator = schemata::validator_for(schema).expect("schema compiles");
    assert_eq!(validator.is_valid(instance), expected);
    // is_valid, flag output, and the classic error list always agree.
    assert_eq!(
        validator.validate_as(instance, OutputFormat::Flag),
        json!({ "valid": expected })
    );
    assert_eq!(validator.classic_errors(instance).is_empty(), expected);
    // Every schema in the suite is itself a valid Draft 2020-12 schema.
    assert!(schemata::meta::is_valid(schema));
}

#[test]
fn maximum_error_shape() {
    let validator =
        schemata::validator_for(&json!({"type": "integer", "minimum": 0, "maximum": 100}))
            .expect("schema compiles");
    let errors = validator.classic_errors(&json!(150));
    assert_eq!(errors.len(), 1);
    let error = &errors[0];
    assert_eq!(error.kind, "maximum");
    assert_eq!(error.data, json!(150));
    assert_eq!(error.data_pointer, "");
    assert_eq!(error.schema_pointer, "");
    assert_eq!(error.error, "number at root is greater than 100");
}

#[test]
fn required_and_nested_type_errors() {
    let schema = json!({
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": {"type": "string"},
            "age": {"type": "integer"}
        }
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    let errors = validator.classic_errors(&json!({"age": "x"}));
    assert_eq!(errors.len(), 2);

    let required = errors
        .iter()
        .find(|error| error.kind == "required")
        .expect("required error");
    assert_eq!(required.data_pointer, "");
    assert_eq!(required.schema_pointer, "");
    assert_eq!(
        required.details,
        Some(json!({"missing_keys": ["name"]}))
    );
    assert_eq!(
        required.error,
        "object at root is missing required properties: name"
    );

    let age = errors
        .iter()
        .find(|error| error.kind == "integer")
        .expect("type error");
    assert_eq!(age.data_pointer, "/age");
    assert_eq!(age.schema_pointer, "/properties/age");
    assert_eq!(age.data, json!("x"));
    assert_eq!(age.error, "value at `/age` is not an integer");
}

#[test]
fn one_of_with_two_matches_reports_a_single_error() {
    let schema = json!({
        "oneOf": [
            {"type": "integer", "minimum": 0},
            {"type": "integer", "maximum": 0}
        ]
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    assert!(validator.is_valid(&json!(5)));
    assert!(validator.is_valid(&json!(-5)));

    let errors = validator.classic_errors(&json!(0));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, "oneof");
    assert_eq!(errors[0].data_pointer, "");
}

#[test]
fn local_refs_report_the_target_schema() {
    let schema = json!({
        "$defs": {"p": {"type": "integer", "minimum": 1}},
        "properties": {"count": {"$ref": "#/$defs/p"}}
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    assert!(validator.is_valid(&json!({"count": 3})));

    let errors = validator.classic_errors(&json!({"count": 0}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, "minimum");
    assert_eq!(errors[0].schema_pointer, "/$defs/p");
    assert_eq!(errors[0].data_pointer, "/count");
    assert_eq!(errors[0].root_schema, schema);
}

#[test]
fn self_referential_schemas_recurse() {
    let schema = json!({
        "$id": "https://ex/tree",
        "type": "object",
        "properties": {
            "value": {"type": "integer"},
            "children": {"type": "array", "items": {"$ref": "#"}}
        }
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    assert!(validator.is_valid(&json!({"value": 1, "children": [{"value": 2}]})));

    let instance = json!({"value": 1, "children": [{"value": 2}, {"value": "x"}]});
    let errors = validator.classic_errors(&instance);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].data_pointer, "/children/1/value");
    assert_eq!(errors[0].kind, "integer");
}

#[test]
fn unevaluated_items_error_points_at_the_keyword() {
    let schema = json!({
        "prefixItems": [{"type": "integer"}],
        "unevaluatedItems": false
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    assert!(validator.is_valid(&json!([1])));

    let errors = validator.classic_errors(&json!([1, "extra"]));
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0].schema_pointer.starts_with("/unevaluatedItems"),
        "got schema_pointer {}",
        errors[0].schema_pointer
    );
    assert_eq!(errors[0].data_pointer, "/1");
}

#[test]
fn validation_is_deterministic() {
    let schema = json!({
        "type": "object",
        "properties": {"a": {"type": "string"}},
        "required": ["a", "b"]
    });
    let validator = schemata::validator_for(&schema).expect("schema compiles");
    let instance = json!({"a": 1});
    assert_eq!(
        validator.validate_as(&instance, OutputFormat::Verbose),
        validator.validate_as(&instance, OutputFormat::Verbose)
    );
    assert_eq!(
        validator.classic_errors(&instance),
        validator.classic_errors(&instance)
    );
}

#[test]
fn compilation_is_idempotent() {
    let schema = json!({
        "$id": "https://example.com/root",
        "$defs": {
            "named": {"$anchor": "named", "type": "string"},
            "inner": {"$id": "inner", "$dynamicAnchor": "node", "type": "object"}
        }
    });
    let first = schemata::validator_for(&schema).expect("schema compiles");
    let second = schemata::validator_for(&schema).expect("schema compiles");
    assert_eq!(first.resources(), second.resources());
    assert_eq!(first.anchors(), second.anchors());
    assert!(first
        .anchors()
        .iter()
        .any(|(_, name, dynamic)| name == "node" && *dynamic));
}

#[test]
fn validators_are_shareable_across_threads() {
    let validator = std::sync::Arc::new(
        schemata::validator_for(&json!({"type": "integer"})).expect("schema compiles"),
    );
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let validator = std::sync::Arc::clone(&validator);
            std::thread::spawn(move || validator.is_valid(&json!(i)))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().expect("no panic"));
    }
}
