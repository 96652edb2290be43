//! `contentEncoding`, `contentMediaType`, and `contentSchema`.
//!
//! All three are annotation-only: decoding or parsing failures never fail
//! validation, they just withhold the annotation the next keyword in the
//! chain would have read.

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::content::{ContentDecoder, ContentParser};
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext, KeywordKind};
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::KeywordCore;

pub(crate) struct ContentEncodingEvaluator {
    core: KeywordCore,
    decoder: Option<ContentDecoder>,
}

impl Evaluate for ContentEncodingEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let annotation = match (instance, &self.decoder) {
            (Value::String(value), Some(decoder)) => decoder(value).map(Value::String),
            _ => None,
        };
        Some(self.core.pass(iloc, &kloc, annotation, Vec::new()))
    }

    fn is_valid(&self, _instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        true
    }
}

pub(crate) struct ContentMediaTypeEvaluator {
    core: KeywordCore,
    parser: Option<ContentParser>,
}

impl Evaluate for ContentMediaTypeEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        // Prefer the decoded form left by `contentEncoding`.
        let text = adjacent
            .annotation(KeywordKind::ContentEncoding)
            .and_then(Value::as_str)
            .or_else(|| instance.as_str());
        let annotation = match (text, &self.parser) {
            (Some(text), Some(parser)) => parser(text),
            _ => None,
        };
        Some(self.core.pass(iloc, &kloc, annotation, Vec::new()))
    }

    fn is_valid(&self, _instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        true
    }
}

pub(crate) struct ContentSchemaEvaluator {
    core: KeywordCore,
}

impl Evaluate for ContentSchemaEvaluator {
    fn evaluate(
        &self,
        _instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let annotation = Some(self.core.value.as_ref().clone());
        Some(self.core.pass(iloc, &kloc, annotation, Vec::new()))
    }

    fn is_valid(&self, _instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        true
    }
}

pub(crate) fn compile_content_encoding(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::String(name) = value else {
        return Ok(None);
    };
    let decoder = ctx.content_decoder(name);
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(ContentEncodingEvaluator { core, decoder }),
    }))
}

pub(crate) fn compile_content_media_type(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::String(name) = value else {
        return Ok(None);
    };
    let parser = ctx.content_parser(name);
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(ContentMediaTypeEvaluator { core, parser }),
    }))
}

pub(crate) fn compile_content_schema(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    // Per Draft 2020-12, `contentSchema` only applies alongside
    // `contentMediaType`.
    if !parent.contains_key("contentMediaType") {
        return Ok(None);
    }
    // Compiled so references into the subschema stay resolvable.
    ctx.subschema(&["contentSchema"], "contentSchema")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(ContentSchemaEvaluator { core }),
    }))
}
