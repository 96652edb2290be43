//! `required` and `dependentRequired`.

use serde_json::{json, Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AccessMode, AdjacentResults, Evaluation, EvaluationContext};
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::KeywordCore;

pub(crate) struct RequiredProperty {
    name: String,
    read_only: bool,
    write_only: bool,
}

impl RequiredProperty {
    /// In read mode write-only properties are exempt; in write mode
    /// read-only ones are.
    fn applies(&self, mode: Option<AccessMode>) -> bool {
        match mode {
            Some(AccessMode::Read) => !self.write_only,
            Some(AccessMode::Write) => !self.read_only,
            None => true,
        }
    }
}

fn property_flags(parent: &Map<String, Value>, name: &str) -> (bool, bool) {
    let subschema = parent
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|properties| properties.get(name))
        .and_then(Value::as_object);
    match subschema {
        Some(subschema) => (
            subschema.get("readOnly") == Some(&Value::Bool(true)),
            subschema.get("writeOnly") == Some(&Value::Bool(true)),
        ),
        None => (false, false),
    }
}

fn missing_message(formatted_location: &str, missing: &[&str]) -> String {
    format!(
        "object at {formatted_location} is missing required properties: {}",
        missing.join(", ")
    )
}

pub(crate) struct RequiredEvaluator {
    core: KeywordCore,
    properties: Vec<RequiredProperty>,
}

impl RequiredEvaluator {
    fn missing<'s>(&'s self, object: &Map<String, Value>, mode: Option<AccessMode>) -> Vec<&'s str> {
        self.properties
            .iter()
            .filter(|property| property.applies(mode) && !object.contains_key(&property.name))
            .map(|property| property.name.as_str())
            .collect()
    }
}

impl Evaluate for RequiredEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let Value::Object(object) = instance else {
            return Some(self.core.pass(iloc, &kloc, None, Vec::new()));
        };
        let missing = self.missing(object, ctx.access_mode);
        Some(if missing.is_empty() {
            self.core.pass(iloc, &kloc, None, Vec::new())
        } else {
            let message = missing_message(&iloc.resolve().formatted(), &missing);
            let details = json!({ "missing_keys": missing });
            self.core.fail(
                instance,
                iloc,
                &kloc,
                "required",
                message,
                Some(details),
                Vec::new(),
            )
        })
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        match instance {
            Value::Object(object) => self
                .properties
                .iter()
                .all(|property| !property.applies(ctx.access_mode) || object.contains_key(&property.name)),
            _ => true,
        }
    }
}

pub(crate) fn compile_required(
    _ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Array(names) = value else {
        return Ok(None);
    };
    let properties = names
        .iter()
        .filter_map(Value::as_str)
        .map(|name| {
            let (read_only, write_only) = property_flags(parent, name);
            RequiredProperty {
                name: name.to_string(),
                read_only,
                write_only,
            }
        })
        .collect();
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(RequiredEvaluator { core, properties }),
    }))
}

pub(crate) struct DependentRequiredEvaluator {
    core: KeywordCore,
    entries: Vec<(String, Vec<String>)>,
}

impl DependentRequiredEvaluator {
    fn missing<'s>(&'s self, object: &Map<String, Value>) -> Vec<&'s str> {
        let mut missing = Vec::new();
        for (trigger, dependencies) in &self.entries {
            if !object.contains_key(trigger) {
                continue;
            }
            for dependency in dependencies {
                if !object.contains_key(dependency) {
                    missing.push(dependency.as_str());
                }
            }
        }
        missing
    }
}

impl Evaluate for DependentRequiredEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let Value::Object(object) = instance else {
            return Some(self.core.pass(iloc, &kloc, None, Vec::new()));
        };
        let missing = self.missing(object);
        Some(if missing.is_empty() {
            self.core.pass(iloc, &kloc, None, Vec::new())
        } else {
            let message = missing_message(&iloc.resolve().formatted(), &missing);
            let details = json!({ "missing_keys": missing });
            self.core.fail(
                instance,
                iloc,
                &kloc,
                "dependentRequired",
                message,
                Some(details),
                Vec::new(),
            )
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        match instance {
            Value::Object(object) => self.missing(object).is_empty(),
            _ => true,
        }
    }
}

pub(crate) fn compile_dependent_required(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(map) = value else {
        return Ok(None);
    };
    let entries = map
        .iter()
        .filter_map(|(trigger, dependencies)| {
            dependencies.as_array().map(|dependencies| {
                (
                    trigger.clone(),
                    dependencies
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                )
            })
        })
        .collect();
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(DependentRequiredEvaluator { core, entries }),
    }))
}
