//! `contains`, with `minContains`/`maxContains` reading its annotation.

use serde_json::{json, Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext, KeywordKind};
use crate::graph::NodeId;
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::helpers::as_u64;
use super::KeywordCore;

pub(crate) struct ContainsEvaluator {
    core: KeywordCore,
    node: NodeId,
    /// The sibling `minContains`, defaulting to 1. Zero means the keyword
    /// always validates but still produces its annotation.
    min_contains: u64,
}

impl Evaluate for ContainsEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let Value::Array(items) = instance else {
            return Some(self.core.pass(iloc, &kloc, None, Vec::new()));
        };
        let graph = ctx.graph;
        let mut matched = Vec::new();
        let mut nested = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let item_loc = iloc.push(index);
            let result = graph.node(self.node).evaluate(item, &item_loc, &kloc, ctx);
            if result.valid {
                matched.push(index);
                nested.push(result);
            }
        }
        let annotation = json!(matched);
        let valid = self.min_contains == 0 || matched.len() as u64 >= self.min_contains.max(1);
        let mut result = if valid {
            self.core.pass(iloc, &kloc, Some(annotation), nested)
        } else {
            let message = format!(
                "array at {} does not contain enough items matching the `contains` schema",
                iloc.resolve().formatted()
            );
            self.core
                .fail(instance, iloc, &kloc, "contains", message, None, nested)
        };
        // The nested results justify the annotation; flat outputs must not
        // treat them as independent failures.
        result.ignore_nested = true;
        Some(result)
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let Value::Array(items) = instance else {
            return true;
        };
        if self.min_contains == 0 {
            return true;
        }
        let graph = ctx.graph;
        let mut matched = 0u64;
        for item in items {
            if graph.node(self.node).is_valid(item, ctx) {
                matched += 1;
                if matched >= self.min_contains.max(1) {
                    return true;
                }
            }
        }
        false
    }
}

pub(crate) fn compile_contains(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let min_contains = parent.get("minContains").and_then(as_u64).unwrap_or(1);
    let node = ctx.subschema(&["contains"], "contains")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(ContainsEvaluator {
            core,
            node,
            min_contains,
        }),
    }))
}

pub(crate) struct MaxContainsEvaluator {
    core: KeywordCore,
    node: NodeId,
    limit: u64,
}

impl MaxContainsEvaluator {
    fn matched(&self, items: &[Value], ctx: &mut EvaluationContext) -> u64 {
        let graph = ctx.graph;
        items
            .iter()
            .filter(|item| graph.node(self.node).is_valid(item, ctx))
            .count() as u64
    }
}

impl Evaluate for MaxContainsEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let Value::Array(items) = instance else {
            return Some(self.core.pass(iloc, &kloc, None, Vec::new()));
        };
        // Prefer the `contains` annotation; recount only when it is absent.
        let matched = match adjacent
            .annotation(KeywordKind::Contains)
            .and_then(Value::as_array)
        {
            Some(indices) => indices.len() as u64,
            None => self.matched(items, ctx),
        };
        Some(if matched <= self.limit {
            self.core.pass(iloc, &kloc, None, Vec::new())
        } else {
            let message = format!(
                "array at {} contains more than {} items matching the `contains` schema",
                iloc.resolve().formatted(),
                self.limit
            );
            self.core
                .fail(instance, iloc, &kloc, "maxContains", message, None, Vec::new())
        })
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        match instance {
            Value::Array(items) => self.matched(items, ctx) <= self.limit,
            _ => true,
        }
    }
}

pub(crate) fn compile_max_contains(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    if !parent.contains_key("contains") {
        return Ok(None);
    }
    let Some(limit) = as_u64(value) else {
        return Ok(None);
    };
    let node = ctx.subschema(&["contains"], "contains")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(MaxContainsEvaluator { core, node, limit }),
    }))
}

/// `minContains` is folded into the `contains` evaluator; the keyword itself
/// compiles to nothing (and has no effect without `contains`).
pub(crate) fn compile_min_contains(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    _value: &Value,
    _core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(None)
}
