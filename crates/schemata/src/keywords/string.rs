//! String length and pattern keywords.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;
use crate::regex::CompiledPattern;

use super::helpers::{as_u64, unicode_length};
use super::KeywordCore;

pub(crate) struct MaxLengthEvaluator {
    core: KeywordCore,
    limit: u64,
}

impl Evaluate for MaxLengthEvaluator {
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
            Value::String(value) if unicode_length(value) as u64 > self.limit => {
                let message = format!(
                    "string at {} is longer than {} characters",
                    iloc.resolve().formatted(),
                    self.limit
                );
                self.core
                    .fail(instance, iloc, &kloc, "maxLength", message, None, Vec::new())
            }
            _ => self.core.pass(iloc, &kloc, None, Vec::new()),
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        match instance {
            Value::String(value) => unicode_length(value) as u64 <= self.limit,
            _ => true,
        }
    }
}

pub(crate) struct MinLengthEvaluator {
    core: KeywordCore,
    limit: u64,
}

impl Evaluate for MinLengthEvaluator {
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
            Value::String(value) if (unicode_length(value) as u64) < self.limit => {
                let message = format!(
                    "string at {} is shorter than {} characters",
                    iloc.resolve().formatted(),
                    self.limit
                );
                self.core
                    .fail(instance, iloc, &kloc, "minLength", message, None, Vec::new())
            }
            _ => self.core.pass(iloc, &kloc, None, Vec::new()),
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        match instance {
            Value::String(value) => unicode_length(value) as u64 >= self.limit,
            _ => true,
        }
    }
}

pub(crate) struct PatternEvaluator {
    core: KeywordCore,
    source: Box<str>,
    pattern: Arc<CompiledPattern>,
}

impl Evaluate for PatternEvaluator {
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
            Value::String(value) if !self.pattern.is_match(value) => {
                let message = format!(
                    "string at {} does not match pattern `{}`",
                    iloc.resolve().formatted(),
                    self.source
                );
                self.core
                    .fail(instance, iloc, &kloc, "pattern", message, None, Vec::new())
            }
            _ => self.core.pass(iloc, &kloc, None, Vec::new()),
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        match instance {
            Value::String(value) => self.pattern.is_match(value),
            _ => true,
        }
    }
}

pub(crate) fn compile_max_length(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(as_u64(value).map(|limit| Keyword {
        kind: core.kind,
        evaluator: Box::new(MaxLengthEvaluator { core, limit }),
    }))
}

pub(crate) fn compile_min_length(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(as_u64(value).map(|limit| Keyword {
        kind: core.kind,
        evaluator: Box::new(MinLengthEvaluator { core, limit }),
    }))
}

pub(crate) fn compile_pattern(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::String(source) = value else {
        return Ok(None);
    };
    let pattern = ctx.pattern(source)?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(PatternEvaluator {
            core,
            source: source.as_str().into(),
            pattern,
        }),
    }))
}
