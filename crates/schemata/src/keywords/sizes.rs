//! Array and object size keywords, plus `uniqueItems`.

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::helpers::{as_u64, equal};
use super::KeywordCore;

#[derive(Clone, Copy)]
enum Size {
    MaxItems,
    MinItems,
    MaxProperties,
    MinProperties,
}

impl Size {
    fn measure(self, instance: &Value) -> Option<u64> {
        match self {
            Size::MaxItems | Size::MinItems => instance.as_array().map(|a| a.len() as u64),
            Size::MaxProperties | Size::MinProperties => {
                instance.as_object().map(|o| o.len() as u64)
            }
        }
    }

    fn holds(self, count: u64, limit: u64) -> bool {
        match self {
            Size::MaxItems | Size::MaxProperties => count <= limit,
            Size::MinItems | Size::MinProperties => count >= limit,
        }
    }

    fn message(self, formatted_location: &str, limit: u64) -> String {
        match self {
            Size::MaxItems => format!("array at {formatted_location} has more than {limit} items"),
            Size::MinItems => format!("array at {formatted_location} has fewer than {limit} items"),
            Size::MaxProperties => {
                format!("object at {formatted_location} has more than {limit} properties")
            }
            Size::MinProperties => {
                format!("object at {formatted_location} has fewer than {limit} properties")
            }
        }
    }
}

pub(crate) struct SizeEvaluator {
    core: KeywordCore,
    size: Size,
    limit: u64,
}

impl Evaluate for SizeEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        Some(match self.size.measure(instance) {
            Some(count) if !self.size.holds(count, self.limit) => {
                let message = self.size.message(&iloc.resolve().formatted(), self.limit);
                let tag = self.core.name.to_string();
                self.core
                    .fail(instance, iloc, &kloc, tag, message, None, Vec::new())
            }
            _ => self.core.pass(iloc, &kloc, None, Vec::new()),
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        match self.size.measure(instance) {
            Some(count) => self.size.holds(count, self.limit),
            None => true,
        }
    }
}

fn compile_size(value: &Value, core: KeywordCore, size: Size) -> Option<Keyword> {
    as_u64(value).map(|limit| Keyword {
        kind: core.kind,
        evaluator: Box::new(SizeEvaluator { core, size, limit }),
    })
}

pub(crate) fn compile_max_items(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(compile_size(value, core, Size::MaxItems))
}

pub(crate) fn compile_min_items(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(compile_size(value, core, Size::MinItems))
}

pub(crate) fn compile_max_properties(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(compile_size(value, core, Size::MaxProperties))
}

pub(crate) fn compile_min_properties(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(compile_size(value, core, Size::MinProperties))
}

pub(crate) struct UniqueItemsEvaluator {
    core: KeywordCore,
}

fn all_unique(items: &[Value]) -> bool {
    // Deep equality; quadratic is fine for the array sizes `uniqueItems`
    // realistically sees.
    for (index, left) in items.iter().enumerate() {
        for right in &items[index + 1..] {
            if equal(left, right) {
                return false;
            }
        }
    }
    true
}

impl Evaluate for UniqueItemsEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        Some(match instance {
            Value::Array(items) if !all_unique(items) => {
                let message = format!(
                    "array at {} contains duplicate items",
                    iloc.resolve().formatted()
                );
                self.core
                    .fail(instance, iloc, &kloc, "uniqueItems", message, None, Vec::new())
            }
            _ => self.core.pass(iloc, &kloc, None, Vec::new()),
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        match instance {
            Value::Array(items) => all_unique(items),
            _ => true,
        }
    }
}

pub(crate) fn compile_unique_items(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    if value != &Value::Bool(true) {
        return Ok(None);
    }
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(UniqueItemsEvaluator { core }),
    }))
}
