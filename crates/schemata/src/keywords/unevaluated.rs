//! `unevaluatedItems` and `unevaluatedProperties`.
//!
//! Both compute what the sibling results (and their valid descendants at the
//! same instance location) already covered, then apply their subschema to the
//! remainder. They force the owning schema onto the full evaluation path even
//! for boolean validation, since coverage only exists as annotations.

use ahash::AHashSet;
use serde_json::{json, Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext, KeywordKind};
use crate::graph::NodeId;
use crate::node::{Evaluate, Keyword};
use crate::paths::{LazyLocation, Location};

use super::KeywordCore;

#[derive(Default)]
struct ItemCoverage {
    all: bool,
    /// Highest index covered by `prefixItems`-shaped annotations.
    highest: i64,
    /// Individual indices covered by `contains`.
    indices: AHashSet<usize>,
}

impl ItemCoverage {
    fn covers(&self, index: usize) -> bool {
        self.all || (index as i64) <= self.highest || self.indices.contains(&index)
    }
}

fn gather_item_coverage(result: &Evaluation, location: &Location, coverage: &mut ItemCoverage) {
    if !result.valid || result.instance_location != *location {
        return;
    }
    match result.source {
        Some(KeywordKind::PrefixItems) => match &result.annotation {
            Some(Value::Number(highest)) => {
                coverage.highest = coverage.highest.max(highest.as_i64().unwrap_or(-1));
            }
            Some(Value::Bool(true)) => coverage.all = true,
            _ => {}
        },
        Some(KeywordKind::Items | KeywordKind::UnevaluatedItems) => {
            if result.annotation == Some(Value::Bool(true)) {
                coverage.all = true;
            }
        }
        Some(KeywordKind::Contains) => {
            if let Some(Value::Array(indices)) = &result.annotation {
                coverage
                    .indices
                    .extend(indices.iter().filter_map(Value::as_u64).map(|i| i as usize));
            }
        }
        _ => {}
    }
    for child in &result.nested {
        gather_item_coverage(child, location, coverage);
    }
}

fn gather_key_coverage(result: &Evaluation, location: &Location, covered: &mut AHashSet<String>) {
    if !result.valid || result.instance_location != *location {
        return;
    }
    if matches!(
        result.source,
        Some(
            KeywordKind::Properties
                | KeywordKind::PatternProperties
                | KeywordKind::AdditionalProperties
                | KeywordKind::UnevaluatedProperties
        )
    ) {
        if let Some(Value::Array(keys)) = &result.annotation {
            covered.extend(keys.iter().filter_map(Value::as_str).map(str::to_string));
        }
    }
    for child in &result.nested {
        gather_key_coverage(child, location, covered);
    }
}

pub(crate) struct UnevaluatedItemsEvaluator {
    core: KeywordCore,
    node: NodeId,
}

impl Evaluate for UnevaluatedItemsEvaluator {
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
        let location = iloc.resolve();
        let mut coverage = ItemCoverage {
            highest: -1,
            ..ItemCoverage::default()
        };
        for result in adjacent.entries {
            gather_item_coverage(result, &location, &mut coverage);
        }
        let graph = ctx.graph;
        let mut nested = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if coverage.covers(index) {
                continue;
            }
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

    fn is_valid(&self, _instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        // Never called: `needs_adjacent` routes the owning schema through the
        // full evaluation.
        true
    }

    fn needs_adjacent(&self) -> bool {
        true
    }
}

pub(crate) struct UnevaluatedPropertiesEvaluator {
    core: KeywordCore,
    node: NodeId,
}

impl Evaluate for UnevaluatedPropertiesEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        let Value::Object(object) = instance else {
            return Some(self.core.pass(iloc, &kloc, None, Vec::new()));
        };
        let location = iloc.resolve();
        let mut covered = AHashSet::new();
        for result in adjacent.entries {
            gather_key_coverage(result, &location, &mut covered);
        }
        let graph = ctx.graph;
        let mut evaluated = Vec::new();
        let mut nested = Vec::new();
        for (name, value) in object {
            if covered.contains(name) {
                continue;
            }
            let property_loc = iloc.push(name);
            nested.push(graph.node(self.node).evaluate(value, &property_loc, &kloc, ctx));
            evaluated.push(name.clone());
        }
        let annotation = if evaluated.is_empty() {
            None
        } else {
            Some(json!(evaluated))
        };
        Some(self.core.wrap(iloc, &kloc, annotation, nested))
    }

    fn is_valid(&self, _instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        true
    }

    fn needs_adjacent(&self) -> bool {
        true
    }
}

pub(crate) fn compile_unevaluated_items(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let node = ctx.subschema(&["unevaluatedItems"], "unevaluatedItems")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(UnevaluatedItemsEvaluator { core, node }),
    }))
}

pub(crate) fn compile_unevaluated_properties(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let node = ctx.subschema(&["unevaluatedProperties"], "unevaluatedProperties")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(UnevaluatedPropertiesEvaluator { core, node }),
    }))
}
