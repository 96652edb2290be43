//! The OpenAPI 3.1 `discriminator` keyword.
//!
//! The instance's discriminator property selects a target schema by mapping
//! entry or by component name, and the instance validates against that
//! target. A guard keyed by target node prevents a second dispatch when the
//! target `allOf`-references back into the schema holding the discriminator.

use ahash::AHashMap;
use serde_json::{Map, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::graph::NodeId;
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;
use schemata_referencing::escape_segment;
use super::KeywordCore;

pub(crate) struct DiscriminatorEvaluator {
    core: KeywordCore,
    property_name: Box<str>,
    /// Explicit `mapping` entries, resolved at compile time.
    mapping: AHashMap<String, NodeId>,
    /// Implicit targets: every schema under `#/components/schemas`.
    components: AHashMap<String, NodeId>,
}

enum Dispatch {
    Target(NodeId),
    MissingProperty,
    UnknownValue(String),
}

impl DiscriminatorEvaluator {
    fn dispatch(&self, instance: &Value) -> Option<Dispatch> {
        let object = instance.as_object()?;
        let Some(Value::String(tag)) = object.get(self.property_name.as_ref()) else {
            return Some(Dispatch::MissingProperty);
        };
        match self
            .mapping
            .get(tag)
            .or_else(|| self.components.get(tag))
        {
            Some(target) => Some(Dispatch::Target(*target)),
            None => Some(Dispatch::UnknownValue(tag.clone())),
        }
    }
}

impl Evaluate for DiscriminatorEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        match self.dispatch(instance) {
            None => Some(self.core.pass(iloc, &kloc, None, Vec::new())),
            Some(Dispatch::MissingProperty) => {
                let message = format!(
                    "object at {} is missing the discriminator property `{}`",
                    iloc.resolve().formatted(),
                    self.property_name
                );
                Some(self.core.fail(
                    instance,
                    iloc,
                    &kloc,
                    "discriminator",
                    message,
                    None,
                    Vec::new(),
                ))
            }
            Some(Dispatch::UnknownValue(tag)) => {
                let message = format!(
                    "value at {} has no discriminator schema for `{tag}`",
                    iloc.resolve().formatted()
                );
                Some(self.core.fail(
                    instance,
                    iloc,
                    &kloc,
                    "discriminator",
                    message,
                    None,
                    Vec::new(),
                ))
            }
            Some(Dispatch::Target(target)) => {
                if ctx.discriminator_guard.contains(&target) {
                    // Re-entered through the discriminated schema itself;
                    // dispatching again would recurse forever.
                    return Some(self.core.pass(iloc, &kloc, None, Vec::new()));
                }
                ctx.discriminator_guard.push(target);
                let graph = ctx.graph;
                let inner = graph.node(target).evaluate(instance, iloc, &kloc, ctx);
                ctx.discriminator_guard.pop();
                Some(self.core.wrap(iloc, &kloc, None, vec![inner]))
            }
        }
    }

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        match self.dispatch(instance) {
            None => true,
            Some(Dispatch::MissingProperty | Dispatch::UnknownValue(_)) => false,
            Some(Dispatch::Target(target)) => {
                if ctx.discriminator_guard.contains(&target) {
                    return true;
                }
                ctx.discriminator_guard.push(target);
                let graph = ctx.graph;
                let valid = graph.node(target).is_valid(instance, ctx);
                ctx.discriminator_guard.pop();
                valid
            }
        }
    }
}

pub(crate) fn compile_discriminator(
    ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(object) = value else {
        return Ok(None);
    };
    let Some(Value::String(property_name)) = object.get("propertyName") else {
        return Ok(None);
    };
    let mut components = AHashMap::new();
    if let Some(Value::Object(schemas)) = ctx
        .document()
        .get("components")
        .and_then(|components| components.get("schemas"))
    {
        let names: Vec<String> = schemas.keys().cloned().collect();
        for name in names {
            let node = ctx.resolve_document_pointer(&format!(
                "/components/schemas/{}",
                escape_segment(&name)
            ))?;
            components.insert(name, node);
        }
    }
    let mut mapping = AHashMap::new();
    if let Some(Value::Object(entries)) = object.get("mapping") {
        let entries: Vec<(String, String)> = entries
            .iter()
            .filter_map(|(key, target)| target.as_str().map(|t| (key.clone(), t.to_string())))
            .collect();
        for (key, target) in entries {
            // A mapping value is either a component name or a URI reference.
            let node = if let Some(component) = components.get(&target) {
                *component
            } else {
                ctx.resolve_ref(&target)?
            };
            mapping.insert(key, node);
        }
    }
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(DiscriminatorEvaluator {
            core,
            property_name: property_name.as_str().into(),
            mapping,
            components,
        }),
    }))
}
