//! The evaluation result tree and per-call context.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;

use crate::graph::{NodeId, SchemaGraph};
use crate::paths::Location;

/// Whether `required` honors `readOnly`/`writeOnly` markers.
///
/// In read mode a `writeOnly: true` property is never reported missing; in
/// write mode, symmetrically, `readOnly: true` properties are exempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// Identity of the keyword that produced a result; the adjacency key for
/// inter-keyword annotation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum KeywordKind {
    Ref,
    DynamicRef,
    Type,
    Enum,
    Const,
    MultipleOf,
    Maximum,
    ExclusiveMaximum,
    Minimum,
    ExclusiveMinimum,
    MaxLength,
    MinLength,
    Pattern,
    MaxItems,
    MinItems,
    UniqueItems,
    MaxContains,
    MaxProperties,
    MinProperties,
    Required,
    DependentRequired,
    PrefixItems,
    Items,
    Contains,
    Properties,
    PatternProperties,
    AdditionalProperties,
    PropertyNames,
    AllOf,
    AnyOf,
    OneOf,
    Not,
    If,
    Then,
    Else,
    DependentSchemas,
    UnevaluatedItems,
    UnevaluatedProperties,
    Format,
    ContentEncoding,
    ContentMediaType,
    ContentSchema,
    Discriminator,
    /// Meta-data keywords (`title`, `default`, …) and unrecognized keywords;
    /// they only emit annotations.
    Annotation,
}

/// Everything the classic output needs to describe one failed unit.
#[derive(Debug, Clone)]
pub(crate) struct ErrorDetail {
    /// Short error tag, e.g. `"required"`, `"oneof"`, or the expected type.
    pub(crate) tag: Cow<'static, str>,
    pub(crate) message: String,
    pub(crate) details: Option<Value>,
    /// The instance value the unit failed on.
    pub(crate) data: Value,
    /// The schema (not keyword) the failing unit belongs to.
    pub(crate) schema: Arc<Value>,
    pub(crate) schema_pointer: Location,
    pub(crate) root_schema: Arc<Value>,
}

/// One node of the result tree.
#[derive(Debug, Clone)]
pub(crate) struct Evaluation {
    pub(crate) valid: bool,
    pub(crate) source: Option<KeywordKind>,
    pub(crate) keyword_location: Location,
    pub(crate) absolute_keyword_location: Arc<str>,
    pub(crate) instance_location: Location,
    pub(crate) annotation: Option<Value>,
    pub(crate) error: Option<ErrorDetail>,
    pub(crate) nested: Vec<Evaluation>,
    /// Set by `oneOf` (multiple matches) and `contains`: the nested results
    /// explain the annotation, not the failure, so flat outputs stop here.
    pub(crate) ignore_nested: bool,
}

impl Evaluation {
    /// Valid results only: the annotation this keyword left for its siblings.
    pub(crate) fn annotation_if_valid(&self) -> Option<&Value> {
        if self.valid {
            self.annotation.as_ref()
        } else {
            None
        }
    }
}

/// Sibling results produced so far at the current schema; reset on entry to
/// every schema.
pub(crate) struct AdjacentResults<'e> {
    pub(crate) entries: &'e [Evaluation],
}

impl AdjacentResults<'_> {
    pub(crate) fn result(&self, kind: KeywordKind) -> Option<&Evaluation> {
        self.entries
            .iter()
            .find(|entry| entry.source == Some(kind))
    }

    pub(crate) fn annotation(&self, kind: KeywordKind) -> Option<&Value> {
        self.result(kind).and_then(Evaluation::annotation_if_valid)
    }
}

/// Mutable state for one validation call.
///
/// `dynamic_scope` is the stack of schema resources entered so far, searched
/// outermost-first by `$dynamicRef`. The discriminator guard prevents a
/// discriminated schema that references back into its parent from dispatching
/// twice.
pub(crate) struct EvaluationContext<'a> {
    pub(crate) graph: &'a SchemaGraph,
    pub(crate) dynamic_scope: Vec<Arc<schemata_referencing::UriString>>,
    pub(crate) discriminator_guard: Vec<NodeId>,
    pub(crate) access_mode: Option<AccessMode>,
}

impl<'a> EvaluationContext<'a> {
    pub(crate) fn new(graph: &'a SchemaGraph, access_mode: Option<AccessMode>) -> Self {
        EvaluationContext {
            graph,
            dynamic_scope: Vec::new(),
            discriminator_guard: Vec::new(),
            access_mode,
        }
    }
}
