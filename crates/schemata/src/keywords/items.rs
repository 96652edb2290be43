//! `prefixItems` and `items`.

use serde_json::{json, Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext, KeywordKind};
use crate::graph::NodeId;
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::KeywordCore;

pub(crate) struct PrefixItemsEvaluator {
    core: KeywordCore,
    items: Vec<NodeId>,
}

impl Evaluate for PrefixItemsEvaluator {
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
        let mut nested = Vec::with_capacity(self.items.len().min(items.len()));
        for (index, (node, item)) in self.items.iter().zip(items).enumerate() {
            let item_loc = iloc.push(index);
            let child_kloc = kloc.push(index);
            nested.push(graph.node(*node).evaluate(item, &item_loc, &child_kloc, ctx));
        }
        // Annotation: the highest index this keyword applied to, -1 for none.
        let highest = nested.len() as i64 - 1;
        Some(self.core.wrap(iloc, &kloc, Some(json!(highest)), nested))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let Value::Array(items) = instance else {
            return true;
        };
        let graph = ctx.graph;
        self.items
            .iter()
            .zip(items)
            .all(|(node, item)| graph.node(*node).is_valid(item, ctx))
    }
}

pub(crate) fn compile_prefix_items(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Array(subschemas) = value else {
        return Ok(None);
    };
    let mut items = Vec::with_capacity(subschemas.len());
    for index in 0..subschemas.len() {
        items.push(ctx.subschema(&["prefixItems", &index.to_string()], "prefixItems")?);
    }
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(PrefixItemsEvaluator { core, items }),
    }))
}

pub(crate) struct ItemsEvaluator {
    core: KeywordCore,
    node: NodeId,
    /// Static fallback offset: the length of the sibling `prefixItems`.
    offset: usize,
}

impl ItemsEvaluator {
    fn start(&self, adjacent: &AdjacentResults) -> usize {
        adjacent
            .annotation(KeywordKind::PrefixItems)
            .and_then(Value::as_i64)
            .map_or(self.offset, |highest| (highest + 1).max(0) as usize)
    }
}

impl Evaluate for ItemsEvaluator {
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
        let start = self.start(adjacent);
        let graph = ctx.graph;
        let mut nested = Vec::new();
        for (index, item) in items.iter().enumerate().skip(start) {
            let item_loc = iloc.push(index);
            nested.push(graph.node(self.node).evaluate(item, &item_loc, &kloc, ctx));
        }
        let annotation = if nested.is_empty() {
            None
        } else {
            Some(Value::Bool(true))
        };
        Some(self.core.wrap(iloc, &kloc, annotation, nested))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let Value::Array(items) = instance else {
            return true;
        };
        let graph = ctx.graph;
        items
            .iter()
            .skip(self.offset)
            .all(|item| graph.node(self.node).is_valid(item, ctx))
    }
}

pub(crate) fn compile_items(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let offset = parent
        .get("prefixItems")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    let node = ctx.subschema(&["items"], "items")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(ItemsEvaluator { core, node, offset }),
    }))
}
