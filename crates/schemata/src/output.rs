//! Output shaping: one result tree, four structured renderings plus the
//! boolean flag.

use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::SchemaError;
use crate::evaluation::Evaluation;

/// The shape `validate` renders the result tree into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `{"valid": bool}`, computed with early termination.
    Flag,
    /// Flat list of the deepest same-validity units.
    Basic,
    /// Nested units with single-child chains collapsed.
    Detailed,
    /// The full result tree.
    Verbose,
    /// Flat error list with schema/data pointers.
    #[default]
    Classic,
}

impl FromStr for OutputFormat {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<OutputFormat, SchemaError> {
        match value {
            "flag" => Ok(OutputFormat::Flag),
            "basic" => Ok(OutputFormat::Basic),
            "detailed" => Ok(OutputFormat::Detailed),
            "verbose" => Ok(OutputFormat::Verbose),
            "classic" => Ok(OutputFormat::Classic),
            other => Err(SchemaError::UnknownOutputFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// One entry of the classic error list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassicError {
    pub data: Value,
    pub data_pointer: String,
    pub schema: Value,
    pub schema_pointer: String,
    pub root_schema: Value,
    #[serde(rename = "type")]
    pub kind: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

pub(crate) fn classic(root: &Evaluation) -> Vec<ClassicError> {
    let mut errors = Vec::new();
    collect_classic(root, &mut errors);
    errors
}

fn collect_classic(node: &Evaluation, errors: &mut Vec<ClassicError>) {
    if node.valid {
        return;
    }
    if !node.ignore_nested {
        let before = errors.len();
        for child in &node.nested {
            collect_classic(child, errors);
        }
        // Descent explained the failure; the container adds nothing.
        if errors.len() > before {
            return;
        }
    }
    if let Some(detail) = &node.error {
        errors.push(ClassicError {
            data: detail.data.clone(),
            data_pointer: node.instance_location.to_string(),
            schema: detail.schema.as_ref().clone(),
            schema_pointer: detail.schema_pointer.to_string(),
            root_schema: detail.root_schema.as_ref().clone(),
            kind: detail.tag.to_string(),
            error: detail.message.clone(),
            details: detail.details.clone(),
        });
    }
}

pub(crate) fn classic_value(root: &Evaluation) -> Value {
    let errors = classic(root);
    json!({
        "valid": root.valid,
        "errors": errors,
    })
}

fn unit(node: &Evaluation) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    map.insert("valid".to_string(), Value::Bool(node.valid));
    map.insert(
        "keywordLocation".to_string(),
        Value::String(node.keyword_location.to_string()),
    );
    map.insert(
        "absoluteKeywordLocation".to_string(),
        Value::String(node.absolute_keyword_location.to_string()),
    );
    map.insert(
        "instanceLocation".to_string(),
        Value::String(node.instance_location.to_string()),
    );
    map
}

fn error_text(node: &Evaluation) -> String {
    node.error.as_ref().map_or_else(
        || {
            format!(
                "value at {} does not match schema",
                node.instance_location.formatted()
            )
        },
        |detail| detail.message.clone(),
    )
}

pub(crate) fn basic(root: &Evaluation) -> Value {
    if root.valid {
        let mut units = Vec::new();
        collect_annotation_units(root, &mut units);
        json!({"valid": true, "annotations": units})
    } else {
        let mut units = Vec::new();
        collect_error_units(root, &mut units);
        json!({"valid": false, "errors": units})
    }
}

fn collect_error_units(node: &Evaluation, units: &mut Vec<Value>) {
    if node.valid {
        return;
    }
    let failing_children: Vec<&Evaluation> = if node.ignore_nested {
        Vec::new()
    } else {
        node.nested.iter().filter(|child| !child.valid).collect()
    };
    if failing_children.is_empty() {
        let mut entry = unit(node);
        entry.insert("error".to_string(), Value::String(error_text(node)));
        units.push(Value::Object(entry));
    } else {
        for child in failing_children {
            collect_error_units(child, units);
        }
    }
}

fn collect_annotation_units(node: &Evaluation, units: &mut Vec<Value>) {
    if !node.valid {
        return;
    }
    if let Some(annotation) = &node.annotation {
        let mut entry = unit(node);
        entry.insert("annotation".to_string(), annotation.clone());
        units.push(Value::Object(entry));
    }
    for child in &node.nested {
        collect_annotation_units(child, units);
    }
}

pub(crate) fn detailed(root: &Evaluation) -> Value {
    detailed_unit(root).unwrap_or_else(|| {
        let mut entry = unit(root);
        if !root.valid {
            entry.insert("error".to_string(), Value::String(error_text(root)));
        }
        Value::Object(entry)
    })
}

fn detailed_unit(node: &Evaluation) -> Option<Value> {
    let relevant: Vec<Value> = if node.valid {
        node.nested
            .iter()
            .filter(|child| child.valid)
            .filter_map(detailed_unit)
            .collect()
    } else if node.ignore_nested {
        Vec::new()
    } else {
        node.nested
            .iter()
            .filter(|child| !child.valid)
            .filter_map(detailed_unit)
            .collect()
    };
    match relevant.len() {
        0 => {
            if node.valid {
                node.annotation.as_ref().map(|annotation| {
                    let mut entry = unit(node);
                    entry.insert("annotation".to_string(), annotation.clone());
                    Value::Object(entry)
                })
            } else {
                let mut entry = unit(node);
                entry.insert("error".to_string(), Value::String(error_text(node)));
                Some(Value::Object(entry))
            }
        }
        // A single surviving child collapses into its parent's position.
        1 => relevant.into_iter().next(),
        _ => {
            let mut entry = unit(node);
            let key = if node.valid { "annotations" } else { "errors" };
            entry.insert(key.to_string(), Value::Array(relevant));
            Some(Value::Object(entry))
        }
    }
}

pub(crate) fn verbose(root: &Evaluation) -> Value {
    let mut entry = unit(root);
    if let Some(annotation) = &root.annotation {
        entry.insert("annotation".to_string(), annotation.clone());
    }
    if !root.valid && root.nested.iter().all(|child| child.valid) {
        entry.insert("error".to_string(), Value::String(error_text(root)));
    }
    if !root.nested.is_empty() {
        let key = if root.valid { "annotations" } else { "errors" };
        let children: Vec<Value> = root.nested.iter().map(verbose).collect();
        entry.insert(key.to_string(), Value::Array(children));
    }
    Value::Object(entry)
}
