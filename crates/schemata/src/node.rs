//! Compiled schema nodes and the keyword evaluation protocol.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;

use schemata_referencing::UriString;

use crate::evaluation::{AdjacentResults, ErrorDetail, Evaluation, EvaluationContext, KeywordKind};
use crate::paths::{LazyLocation, Location};
use crate::x_error::{interpolate, ErrorVariables};

/// A compiled keyword evaluator.
///
/// `evaluate` produces a full result node (annotations, nested results,
/// error details); `is_valid` is the allocation-free boolean path. Keywords
/// that read sibling results return `None` from `evaluate` when they do not
/// apply (e.g. `then` without a truthy `if`).
pub(crate) trait Evaluate: Send + Sync {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
        adjacent: &AdjacentResults,
    ) -> Option<Evaluation>;

    fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool;

    /// Whether this keyword must observe sibling results; schemas containing
    /// such keywords run the full evaluation even on the boolean path.
    fn needs_adjacent(&self) -> bool {
        false
    }
}

pub(crate) struct Keyword {
    pub(crate) kind: KeywordKind,
    pub(crate) evaluator: Box<dyn Evaluate>,
}

/// Compile-time identity shared by a schema node and its error reports.
pub(crate) struct NodeCore {
    /// The raw schema value this node was compiled from.
    pub(crate) value: Arc<Value>,
    /// Pointer from the owning document root; `schema_pointer` in classic
    /// output.
    pub(crate) schema_pointer: Location,
    /// `base-uri#resource-relative-pointer`.
    pub(crate) absolute_location: Arc<str>,
    /// The owning document root; `root_schema` in classic output.
    pub(crate) root_schema: Arc<Value>,
    /// `x-error` template delegated from the parent schema, used by boolean
    /// subschemas which cannot carry their own.
    pub(crate) error_template: Option<String>,
}

pub(crate) enum NodeInner {
    AlwaysValid,
    AlwaysInvalid,
    Keywords(Box<[Keyword]>),
}

pub(crate) struct SchemaNode {
    pub(crate) core: Arc<NodeCore>,
    pub(crate) inner: NodeInner,
    /// `Some` when this node roots a schema resource; entered resources form
    /// the dynamic scope.
    pub(crate) resource: Option<Arc<UriString>>,
    /// Whether any keyword here needs sibling results (`unevaluated*`).
    pub(crate) needs_full: bool,
}

impl std::fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NodeInner::AlwaysValid => f.write_str("SchemaNode(true)"),
            NodeInner::AlwaysInvalid => f.write_str("SchemaNode(false)"),
            NodeInner::Keywords(keywords) => f
                .debug_list()
                .entries(keywords.iter().map(|keyword| keyword.kind))
                .finish(),
        }
    }
}

impl SchemaNode {
    pub(crate) fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
    ) -> Evaluation {
        if let Some(base) = &self.resource {
            ctx.dynamic_scope.push(Arc::clone(base));
        }
        let result = self.evaluate_inner(instance, iloc, kloc, ctx);
        if self.resource.is_some() {
            ctx.dynamic_scope.pop();
        }
        result
    }

    fn evaluate_inner(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        ctx: &mut EvaluationContext,
    ) -> Evaluation {
        match &self.inner {
            NodeInner::AlwaysValid => Evaluation {
                valid: true,
                source: None,
                keyword_location: kloc.resolve(),
                absolute_keyword_location: Arc::clone(&self.core.absolute_location),
                instance_location: iloc.resolve(),
                annotation: None,
                error: None,
                nested: Vec::new(),
                ignore_nested: false,
            },
            NodeInner::AlwaysInvalid => self.false_schema_error(instance, iloc, kloc),
            NodeInner::Keywords(keywords) => {
                let mut results: Vec<Evaluation> = Vec::with_capacity(keywords.len());
                let mut valid = true;
                for keyword in keywords.iter() {
                    let outcome = {
                        let adjacent = AdjacentResults { entries: &results };
                        keyword
                            .evaluator
                            .evaluate(instance, iloc, kloc, ctx, &adjacent)
                    };
                    if let Some(result) = outcome {
                        valid &= result.valid;
                        results.push(result);
                    }
                }
                Evaluation {
                    valid,
                    source: None,
                    keyword_location: kloc.resolve(),
                    absolute_keyword_location: Arc::clone(&self.core.absolute_location),
                    instance_location: iloc.resolve(),
                    annotation: None,
                    error: None,
                    nested: results,
                    ignore_nested: false,
                }
            }
        }
    }

    pub(crate) fn is_valid(&self, instance: &Value, ctx: &mut EvaluationContext) -> bool {
        if let Some(base) = &self.resource {
            ctx.dynamic_scope.push(Arc::clone(base));
        }
        let valid = match &self.inner {
            NodeInner::AlwaysValid => true,
            NodeInner::AlwaysInvalid => false,
            NodeInner::Keywords(keywords) => {
                if self.needs_full {
                    let iloc = LazyLocation::new();
                    let kloc = LazyLocation::new();
                    self.evaluate_inner(instance, &iloc, &kloc, ctx).valid
                } else {
                    keywords
                        .iter()
                        .all(|keyword| keyword.evaluator.is_valid(instance, ctx))
                }
            }
        };
        if self.resource.is_some() {
            ctx.dynamic_scope.pop();
        }
        valid
    }

    fn false_schema_error(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
    ) -> Evaluation {
        let instance_location = iloc.resolve();
        let keyword_location = kloc.resolve();
        let message = match &self.core.error_template {
            Some(template) => interpolate(
                template,
                &ErrorVariables {
                    instance,
                    instance_location: &instance_location,
                    keyword_value: None,
                    keyword_location: &keyword_location,
                    absolute_keyword_location: &self.core.absolute_location,
                    details: None,
                },
            ),
            None => format!(
                "value at {} does not match schema",
                instance_location.formatted()
            ),
        };
        Evaluation {
            valid: false,
            source: None,
            keyword_location,
            absolute_keyword_location: Arc::clone(&self.core.absolute_location),
            instance_location: instance_location.clone(),
            annotation: None,
            error: Some(ErrorDetail {
                tag: Cow::Borrowed("schema"),
                message,
                details: None,
                data: instance.clone(),
                schema: Arc::clone(&self.core.value),
                schema_pointer: self.core.schema_pointer.clone(),
                root_schema: Arc::clone(&self.core.root_schema),
            }),
            nested: Vec::new(),
            ignore_nested: false,
        }
    }
}
