//! `if`/`then`/`else` and `dependentSchemas`.

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext, KeywordKind};
use crate::graph::NodeId;
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::KeywordCore;

/// `if` always reports valid; its actual outcome travels as an annotation for
/// the sibling `then`/`else`.
pub(crate) struct IfEvaluator {
    core: KeywordCore,
    node: NodeId,
}

impl Evaluate for IfEvaluator {
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
        let outcome = inner.valid;
        Some(
            self.core
                .pass(iloc, &kloc, Some(Value::Bool(outcome)), vec![inner]),
        )
    }

    fn is_valid(&self, _instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        true
    }
}

pub(crate) struct ThenEvaluator {
    core: KeywordCore,
    if_node: NodeId,
    node: NodeId,
    /// `false` for `else`: the branch applies when `if` failed.
    on_success: bool,
}

impl Evaluate for ThenEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let outcome = adjacent
            .annotation(KeywordKind::If)
            .and_then(Value::as_bool)?;
        if outcome != self.on_success {
            return None;
        }
        let kloc = kloc.push(self.core.name.as_ref());
        let graph = ctx.graph;
        let inner = graph.node(self.node).evaluate(instance, iloc, &kloc, ctx);
        Some(self.core.wrap(iloc, &kloc, None, vec![inner]))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let graph = ctx.graph;
        if graph.node(self.if_node).is_valid(instance, ctx) != self.on_success {
            return true;
        }
        graph.node(self.node).is_valid(instance, ctx)
    }
}

pub(crate) struct DependentSchemasEvaluator {
    core: KeywordCore,
    entries: Vec<(String, NodeId)>,
}

impl Evaluate for DependentSchemasEvaluator {
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
        let graph = ctx.graph;
        let mut nested = Vec::new();
        for (trigger, node) in &self.entries {
            if !object.contains_key(trigger) {
                continue;
            }
            let trigger_kloc = kloc.push(trigger.as_str());
            nested.push(graph.node(*node).evaluate(instance, iloc, &trigger_kloc, ctx));
        }
        Some(self.core.wrap(iloc, &kloc, None, nested))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let Value::Object(object) = instance else {
            return true;
        };
        let graph = ctx.graph;
        self.entries.iter().all(|(trigger, node)| {
            !object.contains_key(trigger) || graph.node(*node).is_valid(instance, ctx)
        })
    }
}

pub(crate) fn compile_if(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let node = ctx.subschema(&["if"], "if")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(IfEvaluator { core, node }),
    }))
}

fn compile_branch(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    core: KeywordCore,
    name: &'static str,
    on_success: bool,
) -> Result<Option<Keyword>, SchemaError> {
    // Without `if`, `then` and `else` never apply.
    if !parent.contains_key("if") {
        return Ok(None);
    }
    let if_node = ctx.subschema(&["if"], "if")?;
    let node = ctx.subschema(&[name], name)?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(ThenEvaluator {
            core,
            if_node,
            node,
            on_success,
        }),
    }))
}

pub(crate) fn compile_then(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    compile_branch(ctx, parent, core, "then", true)
}

pub(crate) fn compile_else(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    compile_branch(ctx, parent, core, "else", false)
}

pub(crate) fn compile_dependent_schemas(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(map) = value else {
        return Ok(None);
    };
    let mut entries = Vec::with_capacity(map.len());
    for trigger in map.keys() {
        let node = ctx.subschema(&["dependentSchemas", trigger], "dependentSchemas")?;
        entries.push((trigger.clone(), node));
    }
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(DependentSchemasEvaluator { core, entries }),
    }))
}
