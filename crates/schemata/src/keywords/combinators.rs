//! Boolean combinators: `allOf`, `anyOf`, `oneOf`, `not`.

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::graph::NodeId;
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::KeywordCore;

fn compile_branches(ctx: &mut Ctx<'_>, name: &str, value: &Value) -> Result<Option<Vec<NodeId>>, SchemaError> {
    let Value::Array(subschemas) = value else {
        return Ok(None);
    };
    let mut nodes = Vec::with_capacity(subschemas.len());
    for index in 0..subschemas.len() {
        nodes.push(ctx.subschema(&[name, &index.to_string()], name)?);
    }
    Ok(Some(nodes))
}

fn evaluate_branches(
    nodes: &[NodeId],
    instance: &Value,
    iloc: &LazyLocation,
    kloc: &LazyLocation,
    ctx: &mut EvaluationContext,
) -> Vec<Evaluation> {
    let graph = ctx.graph;
    let mut results = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        let branch_kloc = kloc.push(index);
        results.push(graph.node(*node).evaluate(instance, iloc, &branch_kloc, ctx));
    }
    results
}

pub(crate) struct AllOfEvaluator {
    core: KeywordCore,
    nodes: Vec<NodeId>,
}

impl Evaluate for AllOfEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let nested = evaluate_branches(&self.nodes, instance, iloc, &kloc, ctx);
        Some(self.core.wrap(iloc, &kloc, None, nested))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let graph = ctx.graph;
        self.nodes
            .iter()
            .all(|node| graph.node(*node).is_valid(instance, ctx))
    }
}

pub(crate) struct AnyOfEvaluator {
    core: KeywordCore,
    nodes: Vec<NodeId>,
}

impl Evaluate for AnyOfEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        // All branches run so every passing branch contributes annotations.
        let nested = evaluate_branches(&self.nodes, instance, iloc, &kloc, ctx);
        Some(if nested.iter().any(|result| result.valid) {
            self.core.pass(iloc, &kloc, None, nested)
        } else {
            let message = format!(
                "value at {} does not match any `anyOf` schema",
                iloc.resolve().formatted()
            );
            self.core
                .fail(instance, iloc, &kloc, "anyof", message, None, nested)
        })
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let graph = ctx.graph;
        self.nodes
            .iter()
            .any(|node| graph.node(*node).is_valid(instance, ctx))
    }
}

pub(crate) struct OneOfEvaluator {
    core: KeywordCore,
    nodes: Vec<NodeId>,
}

impl Evaluate for OneOfEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let nested = evaluate_branches(&self.nodes, instance, iloc, &kloc, ctx);
        let matches = nested.iter().filter(|result| result.valid).count();
        Some(match matches {
            1 => self.core.pass(iloc, &kloc, None, nested),
            0 => {
                let message = format!(
                    "value at {} does not match any `oneOf` schema",
                    iloc.resolve().formatted()
                );
                self.core
                    .fail(instance, iloc, &kloc, "oneof", message, None, nested)
            }
            _ => {
                let message = format!(
                    "value at {} matches more than one `oneOf` schema",
                    iloc.resolve().formatted()
                );
                let mut result = self
                    .core
                    .fail(instance, iloc, &kloc, "oneof", message, None, nested);
                // The nested branches all passed; reporting them would bury
                // the actual problem.
                result.ignore_nested = true;
                result
            }
        })
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let graph = ctx.graph;
        let mut matches = 0;
        for node in &self.nodes {
            if graph.node(*node).is_valid(instance, ctx) {
                matches += 1;
                if matches > 1 {
                    return false;
                }
            }
        }
        matches == 1
    }
}

pub(crate) struct NotEvaluator {
    core: KeywordCore,
    node: NodeId,
}

impl Evaluate for NotEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let graph = ctx.graph;
        let inner = graph.node(self.node).evaluate(instance, iloc, &kloc, ctx);
        Some(if inner.valid {
            let message = format!(
                "value at {} matches the `not` schema",
                iloc.resolve().formatted()
            );
            self.core
                .fail(instance, iloc, &kloc, "not", message, None, vec![inner])
        } else {
            self.core.pass(iloc, &kloc, None, vec![inner])
        })
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let graph = ctx.graph;
        !graph.node(self.node).is_valid(instance, ctx)
    }
}

pub(crate) fn compile_all_of(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(compile_branches(ctx, "allOf", value)?.map(|nodes| Keyword {
        kind: core.kind,
        evaluator: Box::new(AllOfEvaluator { core, nodes }),
    }))
}

pub(crate) fn compile_any_of(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    // With an OpenAPI discriminator present, dispatch replaces `anyOf`.
    if ctx.discriminator_replaces_combinators() && parent.contains_key("discriminator") {
        return Ok(None);
    }
    Ok(compile_branches(ctx, "anyOf", value)?.map(|nodes| Keyword {
        kind: core.kind,
        evaluator: Box::new(AnyOfEvaluator { core, nodes }),
    }))
}

pub(crate) fn compile_one_of(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    if ctx.discriminator_replaces_combinators() && parent.contains_key("discriminator") {
        return Ok(None);
    }
    Ok(compile_branches(ctx, "oneOf", value)?.map(|nodes| Keyword {
        kind: core.kind,
        evaluator: Box::new(OneOfEvaluator { core, nodes }),
    }))
}

pub(crate) fn compile_not(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let node = ctx.subschema(&["not"], "not")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(NotEvaluator { core, node }),
    }))
}
