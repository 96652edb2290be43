use serde_json::Value;

use crate::{pointer::escape_segment, Dialect};

/// A schema document paired with the dialect it is written in.
#[derive(Debug, Clone)]
pub struct Resource {
    contents: Value,
    dialect: Dialect,
}

impl Resource {
    /// Wrap a document, detecting the dialect from `$schema`.
    #[must_use]
    pub fn from_contents(contents: Value) -> Resource {
        let dialect = Dialect::detect(&contents, Dialect::default());
        Resource { contents, dialect }
    }

    #[must_use]
    pub fn with_dialect(contents: Value, dialect: Dialect) -> Resource {
        Resource { contents, dialect }
    }

    #[must_use]
    pub fn contents(&self) -> &Value {
        &self.contents
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn into_parts(self) -> (Value, Dialect) {
        (self.contents, self.dialect)
    }
}

impl From<Value> for Resource {
    fn from(contents: Value) -> Resource {
        Resource::from_contents(contents)
    }
}

/// Keywords whose value is a single subschema.
const IN_VALUE: &[&str] = &[
    "additionalProperties",
    "contains",
    "contentSchema",
    "else",
    "if",
    "items",
    "not",
    "propertyNames",
    "then",
    "unevaluatedItems",
    "unevaluatedProperties",
];

/// Keywords whose value is an object of subschemas.
const IN_CHILD_VALUES: &[&str] = &[
    "$defs",
    "definitions",
    "dependentSchemas",
    "patternProperties",
    "properties",
];

/// Keywords whose value is an array of subschemas.
const IN_CHILD_ARRAYS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Yield `(escaped pointer suffix, subschema)` for every subschema position
/// directly below `schema`.
pub(crate) fn subschemas_of(schema: &Value) -> Vec<(String, &Value)> {
    let Some(object) = schema.as_object() else {
        return Vec::new();
    };
    let mut output = Vec::new();
    for keyword in IN_VALUE {
        if let Some(subschema) = object.get(*keyword) {
            output.push((format!("/{keyword}"), subschema));
        }
    }
    for keyword in IN_CHILD_VALUES {
        if let Some(Value::Object(children)) = object.get(*keyword) {
            for (name, subschema) in children {
                output.push((format!("/{keyword}/{}", escape_segment(name)), subschema));
            }
        }
    }
    for keyword in IN_CHILD_ARRAYS {
        if let Some(Value::Array(children)) = object.get(*keyword) {
            for (index, subschema) in children.iter().enumerate() {
                output.push((format!("/{keyword}/{index}"), subschema));
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subschema_positions() {
        let schema = json!({
            "items": {"type": "string"},
            "properties": {"a/b": {"type": "null"}},
            "allOf": [true, false],
            "enum": [{"not": "a subschema position"}],
        });
        let found: Vec<String> = subschemas_of(&schema)
            .into_iter()
            .map(|(pointer, _)| pointer)
            .collect();
        assert_eq!(
            found,
            ["/items", "/properties/a~1b", "/allOf/0", "/allOf/1"]
        );
    }
}
