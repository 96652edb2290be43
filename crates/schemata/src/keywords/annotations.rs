//! Annotation-only keywords: the meta-data vocabulary, OAS extras, and any
//! keyword the active vocabularies do not recognize.
//!
//! Unknown keywords keep their raw value as an annotation, which also keeps
//! them navigable as `$ref` targets.

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::KeywordCore;

pub(crate) struct AnnotationEvaluator {
    core: KeywordCore,
}

impl Evaluate for AnnotationEvaluator {
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

pub(crate) fn compile_annotation(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(AnnotationEvaluator { core }),
    }))
}
