//! The `type` keyword.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::helpers::{is_integer, with_article};
use super::KeywordCore;

pub(crate) struct TypeEvaluator {
    core: KeywordCore,
    types: Vec<Box<str>>,
}

fn matches_type(instance: &Value, name: &str) -> bool {
    match name {
        "null" => instance.is_null(),
        "boolean" => instance.is_boolean(),
        "string" => instance.is_string(),
        "array" => instance.is_array(),
        "object" => instance.is_object(),
        "number" => instance.is_number(),
        "integer" => instance.as_number().map_or(false, is_integer),
        _ => false,
    }
}

impl TypeEvaluator {
    fn check(&self, instance: &Value) -> bool {
        self.types.iter().any(|name| matches_type(instance, name))
    }
}

impl Evaluate for TypeEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        if self.check(instance) {
            return Some(self.core.pass(iloc, &kloc, None, Vec::new()));
        }
        let (tag, message): (Cow<'static, str>, String) = if let [only] = self.types.as_slice() {
            (
                Cow::Owned(only.to_string()),
                format!(
                    "value at {} is not {}",
                    iloc.resolve().formatted(),
                    with_article(only)
                ),
            )
        } else {
            (
                Cow::Borrowed("type"),
                format!(
                    "value at {} is not one of the types: {}",
                    iloc.resolve().formatted(),
                    self.types.join(", ")
                ),
            )
        };
        Some(self.core.fail(instance, iloc, &kloc, tag, message, None, Vec::new()))
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        self.check(instance)
    }
}

pub(crate) fn compile_type(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let types: Vec<Box<str>> = match value {
        Value::String(name) => vec![name.as_str().into()],
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .map(Into::into)
            .collect(),
        _ => return Ok(None),
    };
    if types.is_empty() {
        return Ok(None);
    }
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(TypeEvaluator { core, types }),
    }))
}
