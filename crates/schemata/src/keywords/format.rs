//! The `format` keyword, in annotation and assertion flavors.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::formats::{self, FormatFn};
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::KeywordCore;

pub(crate) enum FormatCheck {
    Builtin(FormatFn),
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl FormatCheck {
    fn check(&self, value: &str) -> bool {
        match self {
            FormatCheck::Builtin(check) => check(value),
            FormatCheck::Custom(check) => check(value),
        }
    }
}

pub(crate) struct FormatEvaluator {
    core: KeywordCore,
    format: Box<str>,
    /// `None` for unknown format names, which never fail.
    check: Option<FormatCheck>,
    assert: bool,
}

impl FormatEvaluator {
    fn check(&self, instance: &Value) -> bool {
        if !self.assert {
            return true;
        }
        let Value::String(value) = instance else {
            return true;
        };
        match &self.check {
            Some(check) => check.check(value),
            None => true,
        }
    }
}

impl Evaluate for FormatEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let annotation = Some(Value::String(self.format.to_string()));
        Some(if self.check(instance) {
            self.core.pass(iloc, &kloc, annotation, Vec::new())
        } else {
            let message = format!(
                "value at {} does not match format `{}`",
                iloc.resolve().formatted(),
                self.format
            );
            self.core
                .fail(instance, iloc, &kloc, "format", message, None, Vec::new())
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        self.check(instance)
    }
}

fn compile(
    ctx: &mut Ctx<'_>,
    value: &Value,
    core: KeywordCore,
    assert: bool,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::String(name) = value else {
        return Ok(None);
    };
    let check = match ctx.options().formats.get(name) {
        Some(custom) => Some(FormatCheck::Custom(Arc::clone(custom))),
        None => formats::builtin(name).map(FormatCheck::Builtin),
    };
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(FormatEvaluator {
            core,
            format: name.as_str().into(),
            check,
            assert,
        }),
    }))
}

pub(crate) fn compile_annotation_format(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    compile(ctx, value, core, false)
}

pub(crate) fn compile_assertion_format(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    compile(ctx, value, core, true)
}
