//! `enum` and `const`.

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::helpers::equal;
use super::KeywordCore;

pub(crate) struct EnumEvaluator {
    core: KeywordCore,
    values: Vec<Value>,
}

impl Evaluate for EnumEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        Some(if self.is_valid_value(instance) {
            self.core.pass(iloc, &kloc, None, Vec::new())
        } else {
            let message = format!(
                "value at {} is not one of: {}",
                iloc.resolve().formatted(),
                serde_json::to_string(&self.values).unwrap_or_default()
            );
            self.core
                .fail(instance, iloc, &kloc, "enum", message, None, Vec::new())
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        self.is_valid_value(instance)
    }
}

impl EnumEvaluator {
    fn is_valid_value(&self, instance: &Value) -> bool {
        self.values.iter().any(|value| equal(value, instance))
    }
}

pub(crate) struct ConstEvaluator {
    core: KeywordCore,
    value: Value,
}

impl Evaluate for ConstEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        Some(if equal(&self.value, instance) {
            self.core.pass(iloc, &kloc, None, Vec::new())
        } else {
            let message = format!(
                "value at {} is not: {}",
                iloc.resolve().formatted(),
                serde_json::to_string(&self.value).unwrap_or_default()
            );
            self.core
                .fail(instance, iloc, &kloc, "const", message, None, Vec::new())
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        equal(&self.value, instance)
    }
}

pub(crate) fn compile_enum(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Array(values) = value else {
        return Ok(None);
    };
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(EnumEvaluator {
            core,
            values: values.clone(),
        }),
    }))
}

pub(crate) fn compile_const(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(ConstEvaluator {
            core,
            value: value.clone(),
        }),
    }))
}
