//! OpenAPI 3.1 document handling and the discriminator keyword.

use serde_json::{json, Value};

use schemata::{OpenApi31, SchemaError};

fn petstore() -> Value {
    json!({
        "openapi": "3.1.0",
        "info": {"title": "Pets", "version": "1.0.0"},
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["petType"],
                    "properties": {"petType": {"type": "string"}},
                    "discriminator": {
                        "propertyName": "petType",
                        "mapping": {"dog": "#/components/schemas/Dog"}
                    }
                },
                "Dog": {
                    "allOf": [
                        {"$ref": "#/components/schemas/Pet"},
                        {
                            "type": "object",
                            "properties": {"bark": {"type": "boolean"}}
                        }
                    ]
                },
                "Cat": {
                    "allOf": [
                        {"$ref": "#/components/schemas/Pet"},
                        {
                            "type": "object",
                            "required": ["lives"],
                            "properties": {"lives": {"type": "integer"}}
                        }
                    ]
                }
            }
        }
    })
}

#[test]
fn version_gate() {
    assert!(matches!(
        OpenApi31::new(json!({"openapi": "3.0.3", "info": {}})),
        Err(SchemaError::UnsupportedOpenApiVersion { .. })
    ));
    assert!(matches!(
        OpenApi31::new(json!({"info": {}})),
        Err(SchemaError::UnsupportedOpenApiVersion { .. })
    ));
    assert!(OpenApi31::new(petstore()).is_ok());
}

#[test]
fn document_validation() {
    let document = OpenApi31::new(petstore()).expect("3.1 document");
    assert!(document.is_valid());
    let report = document.validate();
    assert_eq!(report["valid"], json!(true));

    let broken = OpenApi31::new(json!({
        "openapi": "3.1.0",
        "info": {"title": "missing version"},
        "components": {}
    }))
    .expect("version is fine");
    assert!(!broken.is_valid());
}

#[test]
fn component_schemas_compile() {
    let document = OpenApi31::new(petstore()).expect("3.1 document");
    let dog = document.schema("Dog").expect("component compiles");
    assert!(dog.is_valid(&json!({"petType": "dog", "bark": true})));
    assert!(!dog.is_valid(&json!({"bark": true})));

    assert!(matches!(
        document.schema("Turtle"),
        Err(SchemaError::UnknownComponentSchema { .. })
    ));
}

#[test]
fn discriminator_dispatches_by_mapping_and_name() {
    let document = OpenApi31::new(petstore()).expect("3.1 document");
    let pet = document.schema("Pet").expect("component compiles");

    // Mapped value.
    assert!(pet.is_valid(&json!({"petType": "dog", "bark": true})));
    assert!(!pet.is_valid(&json!({"petType": "dog", "bark": "loud"})));
    // Implicit component-name lookup.
    assert!(pet.is_valid(&json!({"petType": "Cat", "lives": 9})));
    assert!(!pet.is_valid(&json!({"petType": "Cat", "lives": "nine"})));
}

#[test]
fn discriminator_rejects_unknown_and_missing_tags() {
    let document = OpenApi31::new(petstore()).expect("3.1 document");
    let pet = document.schema("Pet").expect("component compiles");

    let errors = pet.classic_errors(&json!({"petType": "turtle"}));
    assert!(errors.iter().any(|error| error.kind == "discriminator"));
    assert!(!pet.is_valid(&json!({})));
}

#[test]
fn discriminator_survives_back_references() {
    // Dog's allOf points back at Pet, which holds the discriminator; the
    // single-skip guard keeps this from recursing.
    let document = OpenApi31::new(petstore()).expect("3.1 document");
    let pet = document.schema("Pet").expect("component compiles");
    for _ in 0..3 {
        assert!(pet.is_valid(&json!({"petType": "dog"})));
    }
}

#[test]
fn component_cross_references_resolve() {
    let document = OpenApi31::new(json!({
        "openapi": "3.1.0",
        "info": {"title": "t", "version": "1"},
        "components": {
            "schemas": {
                "Id": {"type": "integer", "minimum": 1},
                "User": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {"id": {"$ref": "#/components/schemas/Id"}}
                }
            }
        }
    }))
    .expect("3.1 document");
    let user = document.schema("User").expect("component compiles");
    assert!(user.is_valid(&json!({"id": 7})));
    let errors = user.classic_errors(&json!({"id": 0}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, "minimum");
    assert_eq!(errors[0].schema_pointer, "/components/schemas/Id");
}
