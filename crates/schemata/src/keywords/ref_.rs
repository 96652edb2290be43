//! `$ref` and `$dynamicRef`.
//!
//! Both resolve to arena indices during compilation, so evaluation never
//! fails to find its target. `$dynamicRef` additionally searches the dynamic
//! scope at evaluation time when its lexical target carries a matching
//! `$dynamicAnchor`.

use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::graph::NodeId;
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::KeywordCore;

pub(crate) struct RefEvaluator {
    core: KeywordCore,
    target: NodeId,
}

impl Evaluate for RefEvaluator {
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
        let inner = graph.node(self.target).evaluate(instance, iloc, &kloc, ctx);
        Some(self.core.wrap(iloc, &kloc, None, vec![inner]))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let graph = ctx.graph;
        graph.node(self.target).is_valid(instance, ctx)
    }
}

pub(crate) struct DynamicRefEvaluator {
    core: KeywordCore,
    lexical: NodeId,
    /// `Some` when the lexical target declares a matching `$dynamicAnchor`;
    /// only then does the dynamic-scope search happen.
    anchor: Option<Box<str>>,
}

impl DynamicRefEvaluator {
    fn target(&self, ctx: &EvaluationContext) -> NodeId {
        let Some(anchor) = &self.anchor else {
            return self.lexical;
        };
        // Outermost resource first.
        for base in &ctx.dynamic_scope {
            if let Some(node) = ctx.graph.dynamic_anchor(base, anchor) {
                return node;
            }
        }
        self.lexical
    }
}

impl Evaluate for DynamicRefEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let target = self.target(ctx);
        let graph = ctx.graph;
        let inner = graph.node(target).evaluate(instance, iloc, &kloc, ctx);
        Some(self.core.wrap(iloc, &kloc, None, vec![inner]))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let target = self.target(ctx);
        let graph = ctx.graph;
        graph.node(target).is_valid(instance, ctx)
    }
}

pub(crate) fn compile_ref(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::String(reference) = value else {
        return Ok(None);
    };
    let target = ctx.resolve_ref(reference)?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(RefEvaluator { core, target }),
    }))
}

pub(crate) fn compile_dynamic_ref(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::String(reference) = value else {
        return Ok(None);
    };
    let (lexical, anchor) = ctx.resolve_dynamic_ref(reference)?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(DynamicRefEvaluator {
            core,
            lexical,
            anchor,
        }),
    }))
}
