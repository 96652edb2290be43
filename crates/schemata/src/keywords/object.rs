//! The property applicators: `properties`, `patternProperties`,
//! `additionalProperties`, and `propertyNames`.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use ahash::AHashSet;

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::graph::NodeId;
use crate::node::{Evaluate, Keyword};
use crate::options::PropertyHook;
use crate::paths::LazyLocation;
use crate::regex::CompiledPattern;

use super::KeywordCore;

pub(crate) struct PropertiesEvaluator {
    core: KeywordCore,
    /// `(name, compiled subschema, raw subschema)`; the raw value feeds the
    /// property hooks.
    properties: Vec<(String, NodeId, Arc<Value>)>,
    before: Vec<PropertyHook>,
    after: Vec<PropertyHook>,
}

impl Evaluate for PropertiesEvaluator {
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
        let mut evaluated = Vec::new();
        let mut nested = Vec::new();
        for (name, node, raw) in &self.properties {
            let Some(value) = object.get(name) else {
                continue;
            };
            for hook in &self.before {
                hook(object, name, raw);
            }
            let property_loc = iloc.push(name);
            let child_kloc = kloc.push(name.as_str());
            nested.push(graph.node(*node).evaluate(value, &property_loc, &child_kloc, ctx));
            for hook in &self.after {
                hook(object, name, raw);
            }
            evaluated.push(name.clone());
        }
        Some(self.core.wrap(iloc, &kloc, Some(json!(evaluated)), nested))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let Value::Object(object) = instance else {
            return true;
        };
        let graph = ctx.graph;
        self.properties.iter().all(|(name, node, _)| {
            object
                .get(name)
                .map_or(true, |value| graph.node(*node).is_valid(value, ctx))
        })
    }
}

pub(crate) fn compile_properties(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(map) = value else {
        return Ok(None);
    };
    let mut properties = Vec::with_capacity(map.len());
    for (name, subschema) in map {
        let node = ctx.subschema(&["properties", name], "properties")?;
        properties.push((name.clone(), node, Arc::new(subschema.clone())));
    }
    let before = ctx.options().before_property_validation.clone();
    let after = ctx.options().after_property_validation.clone();
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(PropertiesEvaluator {
            core,
            properties,
            before,
            after,
        }),
    }))
}

pub(crate) struct PatternPropertiesEvaluator {
    core: KeywordCore,
    patterns: Vec<(Box<str>, Arc<CompiledPattern>, NodeId)>,
}

impl Evaluate for PatternPropertiesEvaluator {
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
        let mut evaluated = AHashSet::new();
        let mut nested = Vec::new();
        for (source, pattern, node) in &self.patterns {
            let pattern_kloc = kloc.push(source.as_ref());
            for (name, value) in object {
                if !pattern.is_match(name) {
                    continue;
                }
                let property_loc = iloc.push(name);
                nested.push(graph.node(*node).evaluate(value, &property_loc, &pattern_kloc, ctx));
                evaluated.insert(name.clone());
            }
        }
        let mut keys: Vec<String> = evaluated.into_iter().collect();
        keys.sort_unstable();
        Some(self.core.wrap(iloc, &kloc, Some(json!(keys)), nested))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let Value::Object(object) = instance else {
            return true;
        };
        let graph = ctx.graph;
        for (_, pattern, node) in &self.patterns {
            for (name, value) in object {
                if pattern.is_match(name) && !graph.node(*node).is_valid(value, ctx) {
                    return false;
                }
            }
        }
        true
    }
}

pub(crate) fn compile_pattern_properties(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(map) = value else {
        return Ok(None);
    };
    let mut patterns = Vec::with_capacity(map.len());
    for name in map.keys() {
        let compiled = ctx.pattern(name)?;
        let node = ctx.subschema(&["patternProperties", name], "patternProperties")?;
        patterns.push((name.as_str().into(), compiled, node));
    }
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(PatternPropertiesEvaluator { core, patterns }),
    }))
}

pub(crate) struct AdditionalPropertiesEvaluator {
    core: KeywordCore,
    node: NodeId,
    /// Names claimed by the sibling `properties`.
    known: AHashSet<String>,
    /// Patterns claimed by the sibling `patternProperties`.
    patterns: Vec<Arc<CompiledPattern>>,
}

impl AdditionalPropertiesEvaluator {
    fn is_additional(&self, name: &str) -> bool {
        !self.known.contains(name) && !self.patterns.iter().any(|pattern| pattern.is_match(name))
    }
}

impl Evaluate for AdditionalPropertiesEvaluator {
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
        let mut evaluated = Vec::new();
        let mut nested = Vec::new();
        for (name, value) in object {
            if !self.is_additional(name) {
                continue;
            }
            let property_loc = iloc.push(name);
            nested.push(graph.node(self.node).evaluate(value, &property_loc, &kloc, ctx));
            evaluated.push(name.clone());
        }
        Some(self.core.wrap(iloc, &kloc, Some(json!(evaluated)), nested))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let Value::Object(object) = instance else {
            return true;
        };
        let graph = ctx.graph;
        object.iter().all(|(name, value)| {
            !self.is_additional(name) || graph.node(self.node).is_valid(value, ctx)
        })
    }
}

pub(crate) fn compile_additional_properties(
    ctx: &mut Ctx<'_>,
    parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let known: AHashSet<String> = parent
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| properties.keys().cloned().collect())
        .unwrap_or_default();
    let mut patterns = Vec::new();
    if let Some(Value::Object(pattern_properties)) = parent.get("patternProperties") {
        for name in pattern_properties.keys() {
            patterns.push(ctx.pattern(name)?);
        }
    }
    let node = ctx.subschema(&["additionalProperties"], "additionalProperties")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(AdditionalPropertiesEvaluator {
            core,
            node,
            known,
            patterns,
        }),
    }))
}

pub(crate) struct PropertyNamesEvaluator {
    core: KeywordCore,
    node: NodeId,
}

impl Evaluate for PropertyNamesEvaluator {
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
        for name in object.keys() {
            let as_value = Value::String(name.clone());
            let property_loc = iloc.push(name);
            nested.push(graph.node(self.node).evaluate(&as_value, &property_loc, &kloc, ctx));
        }
        Some(self.core.wrap(iloc, &kloc, None, nested))
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        let Value::Object(object) = instance else {
            return true;
        };
        let graph = ctx.graph;
        object.keys().all(|name| {
            let as_value = Value::String(name.clone());
            graph.node(self.node).is_valid(&as_value, ctx)
        })
    }
}

pub(crate) fn compile_property_names(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    _value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let node = ctx.subschema(&["propertyNames"], "propertyNames")?;
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(PropertyNamesEvaluator { core, node }),
    }))
}
