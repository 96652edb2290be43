//! Output format shapes.

use serde_json::{json, Value};
use test_case::test_case;

use schemata::OutputFormat;

fn validate(schema: &Value, instance: &Value, format: OutputFormat) -> Value {
    schemata::validator_for(schema)
        .expect("schema compiles")
        .validate_as(instance, format)
}

#[test_case(&json!({"type": "string"}), &json!("ok"), &json!({"valid": true}))]
#[test_case(&json!({"type": "string"}), &json!(1), &json!({"valid": false}))]
fn flag(schema: &Value, instance: &Value, expected: &Value) {
    assert_eq!(&validate(schema, instance, OutputFormat::Flag), expected);
}

#[test]
fn basic_errors_are_the_deepest_units() {
    let schema = json!({
        "allOf": [
            {"type": "array"},
            {"maxLength": 4}
        ]
    });
    let output = validate(&schema, &json!("some string"), OutputFormat::Basic);
    assert_eq!(output["valid"], json!(false));
    let errors = output["errors"].as_array().expect("errors");
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["keywordLocation"], json!("/allOf/0/type"));
    assert_eq!(errors[0]["instanceLocation"], json!(""));
    assert_eq!(
        errors[0]["error"],
        json!("value at root is not an array")
    );
    assert_eq!(errors[1]["keywordLocation"], json!("/allOf/1/maxLength"));
    assert_eq!(
        errors[1]["error"],
        json!("string at root is longer than 4 characters")
    );
}

#[test]
fn basic_annotations_surface_metadata() {
    let schema = json!({
        "title": "A string",
        "type": "string",
        "format": "email"
    });
    let output = validate(&schema, &json!("joe@example.com"), OutputFormat::Basic);
    assert_eq!(output["valid"], json!(true));
    let annotations = output["annotations"].as_array().expect("annotations");
    assert!(annotations.iter().any(|unit| {
        unit["keywordLocation"] == json!("/title") && unit["annotation"] == json!("A string")
    }));
    assert!(annotations.iter().any(|unit| {
        unit["keywordLocation"] == json!("/format") && unit["annotation"] == json!("email")
    }));
}

#[test]
fn detailed_collapses_single_chains() {
    let schema = json!({"properties": {"a": {"type": "integer"}}});
    let output = validate(&schema, &json!({"a": "x"}), OutputFormat::Detailed);
    assert_eq!(output["valid"], json!(false));
    assert_eq!(output["keywordLocation"], json!("/properties/a/type"));
    assert_eq!(output["instanceLocation"], json!("/a"));
    assert_eq!(output["error"], json!("value at `/a` is not an integer"));
}

#[test]
fn detailed_keeps_sibling_branches() {
    let schema = json!({
        "properties": {
            "a": {"type": "integer"},
            "b": {"type": "integer"}
        }
    });
    let output = validate(&schema, &json!({"a": "x", "b": "y"}), OutputFormat::Detailed);
    assert_eq!(output["valid"], json!(false));
    let errors = output["errors"].as_array().expect("two branches");
    assert_eq!(errors.len(), 2);
}

#[test]
fn verbose_mirrors_the_result_tree() {
    let schema = json!({"properties": {"a": {"type": "integer"}}});
    let output = validate(&schema, &json!({"a": "x"}), OutputFormat::Verbose);
    assert_eq!(output["valid"], json!(false));
    assert_eq!(output["keywordLocation"], json!(""));
    assert_eq!(output["instanceLocation"], json!(""));
    let properties = &output["errors"][0];
    assert_eq!(properties["keywordLocation"], json!("/properties"));
    let subschema = &properties["errors"][0];
    assert_eq!(subschema["keywordLocation"], json!("/properties/a"));
    assert_eq!(subschema["instanceLocation"], json!("/a"));
    let type_unit = &subschema["errors"][0];
    assert_eq!(type_unit["keywordLocation"], json!("/properties/a/type"));
    assert_eq!(type_unit["error"], json!("value at `/a` is not an integer"));
}

#[test]
fn classic_output_value_shape() {
    let schema = json!({"type": "object"});
    let output = validate(&schema, &json!(3), OutputFormat::Classic);
    assert_eq!(
        output,
        json!({
            "valid": false,
            "errors": [{
                "data": 3,
                "data_pointer": "",
                "schema": {"type": "object"},
                "schema_pointer": "",
                "root_schema": {"type": "object"},
                "type": "object",
                "error": "value at root is not an object"
            }]
        })
    );
}

#[test]
fn unknown_output_format_is_rejected() {
    let error = "pretty".parse::<OutputFormat>().expect_err("unknown");
    assert!(matches!(
        error,
        schemata::SchemaError::UnknownOutputFormat { .. }
    ));
    assert_eq!("classic".parse::<OutputFormat>().ok(), Some(OutputFormat::Classic));
}

#[test]
fn annotations_include_evaluated_property_keys() {
    let schema = json!({
        "properties": {"a": true, "b": true},
        "additionalProperties": true
    });
    let output = validate(&schema, &json!({"a": 1, "c": 2}), OutputFormat::Basic);
    let annotations = output["annotations"].as_array().expect("annotations");
    assert!(annotations.iter().any(|unit| {
        unit["keywordLocation"] == json!("/properties") && unit["annotation"] == json!(["a"])
    }));
    assert!(annotations.iter().any(|unit| {
        unit["keywordLocation"] == json!("/additionalProperties")
            && unit["annotation"] == json!(["c"])
    }));
}

#[test]
fn absolute_keyword_locations_follow_the_base_uri() {
    let schema = json!({
        "$id": "https://example.com/schema",
        "properties": {"a": {"type": "integer"}}
    });
    let output = validate(&schema, &json!({"a": "x"}), OutputFormat::Basic);
    let errors = output["errors"].as_array().expect("errors");
    assert_eq!(
        errors[0]["absoluteKeywordLocation"],
        json!("https://example.com/schema#/properties/a/type")
    );
}
