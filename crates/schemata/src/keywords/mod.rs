//! Keyword evaluators, one module per family, plus the vocabulary-ordered
//! dispatch table the compiler walks.

pub(crate) mod annotations;
pub(crate) mod combinators;
pub(crate) mod conditional;
pub(crate) mod contains;
pub(crate) mod content;
pub(crate) mod discriminator;
pub(crate) mod enum_;
pub(crate) mod format;
pub(crate) mod helpers;
pub(crate) mod items;
pub(crate) mod numeric;
pub(crate) mod object;
pub(crate) mod ref_;
pub(crate) mod required;
pub(crate) mod sizes;
pub(crate) mod string;
pub(crate) mod types;
pub(crate) mod unevaluated;

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Map, Value};

use schemata_referencing::Vocabulary;

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{ErrorDetail, Evaluation, KeywordKind};
use crate::node::Keyword;
use crate::paths::{LazyLocation, Location};
use crate::x_error::{interpolate, ErrorVariables};

/// Compile-time identity shared by every evaluator of one keyword instance.
pub(crate) struct KeywordCore {
    pub(crate) name: Box<str>,
    pub(crate) kind: KeywordKind,
    /// The raw keyword value.
    pub(crate) value: Arc<Value>,
    /// The schema object owning this keyword; `schema` in classic output.
    pub(crate) schema: Arc<Value>,
    pub(crate) schema_pointer: Location,
    pub(crate) absolute_location: Arc<str>,
    pub(crate) root_schema: Arc<Value>,
    /// Resolved `x-error` template, if the owning schema declares one for
    /// this keyword.
    pub(crate) template: Option<String>,
}

impl KeywordCore {
    /// A valid result at the keyword's location.
    pub(crate) fn pass(
        &self,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        annotation: Option<Value>,
        nested: Vec<Evaluation>,
    ) -> Evaluation {
        Evaluation {
            valid: true,
            source: Some(self.kind),
            keyword_location: kloc.resolve(),
            absolute_keyword_location: Arc::clone(&self.absolute_location),
            instance_location: iloc.resolve(),
            annotation,
            error: None,
            nested,
            ignore_nested: false,
        }
    }

    /// An invalid result carrying everything classic output needs. The
    /// built-in `message` is replaced by the schema's `x-error` template when
    /// one applies.
    pub(crate) fn fail(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        tag: impl Into<Cow<'static, str>>,
        message: String,
        details: Option<Value>,
        nested: Vec<Evaluation>,
    ) -> Evaluation {
        let instance_location = iloc.resolve();
        let keyword_location = kloc.resolve();
        let message = match &self.template {
            Some(template) => interpolate(
                template,
                &ErrorVariables {
                    instance,
                    instance_location: &instance_location,
                    keyword_value: Some(&self.value),
                    keyword_location: &keyword_location,
                    absolute_keyword_location: &self.absolute_location,
                    details: details.as_ref(),
                },
            ),
            None => message,
        };
        Evaluation {
            valid: false,
            source: Some(self.kind),
            keyword_location,
            absolute_keyword_location: Arc::clone(&self.absolute_location),
            instance_location: instance_location.clone(),
            annotation: None,
            error: Some(ErrorDetail {
                tag: tag.into(),
                message,
                details,
                data: instance.clone(),
                schema: Arc::clone(&self.schema),
                schema_pointer: self.schema_pointer.clone(),
                root_schema: Arc::clone(&self.root_schema),
            }),
            nested,
            ignore_nested: false,
        }
    }

    /// Wrap a subschema result, keeping its validity.
    pub(crate) fn wrap(
        &self,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        annotation: Option<Value>,
        nested: Vec<Evaluation>,
    ) -> Evaluation {
        let valid = nested.iter().all(|result| result.valid);
        Evaluation {
            valid,
            source: Some(self.kind),
            keyword_location: kloc.resolve(),
            absolute_keyword_location: Arc::clone(&self.absolute_location),
            instance_location: iloc.resolve(),
            annotation: if valid { annotation } else { None },
            error: None,
            nested,
            ignore_nested: false,
        }
    }
}

pub(crate) type FactoryFn =
    fn(&mut Ctx<'_>, &Map<String, Value>, &Value, KeywordCore) -> Result<Option<Keyword>, SchemaError>;

pub(crate) struct Spec {
    pub(crate) name: &'static str,
    pub(crate) kind: KeywordKind,
    pub(crate) factory: FactoryFn,
}

const fn spec(name: &'static str, kind: KeywordKind, factory: FactoryFn) -> Spec {
    Spec {
        name,
        kind,
        factory,
    }
}

static CORE: &[Spec] = &[
    spec("$ref", KeywordKind::Ref, ref_::compile_ref),
    spec("$dynamicRef", KeywordKind::DynamicRef, ref_::compile_dynamic_ref),
];

// `prefixItems` before `items`, the property applicators before
// `additionalProperties`: later keywords read the annotations of earlier
// ones.
static APPLICATOR: &[Spec] = &[
    spec("prefixItems", KeywordKind::PrefixItems, items::compile_prefix_items),
    spec("items", KeywordKind::Items, items::compile_items),
    spec("contains", KeywordKind::Contains, contains::compile_contains),
    spec("properties", KeywordKind::Properties, object::compile_properties),
    spec(
        "patternProperties",
        KeywordKind::PatternProperties,
        object::compile_pattern_properties,
    ),
    spec(
        "additionalProperties",
        KeywordKind::AdditionalProperties,
        object::compile_additional_properties,
    ),
    spec("propertyNames", KeywordKind::PropertyNames, object::compile_property_names),
    spec("allOf", KeywordKind::AllOf, combinators::compile_all_of),
    spec("anyOf", KeywordKind::AnyOf, combinators::compile_any_of),
    spec("oneOf", KeywordKind::OneOf, combinators::compile_one_of),
    spec("not", KeywordKind::Not, combinators::compile_not),
    spec("if", KeywordKind::If, conditional::compile_if),
    spec("then", KeywordKind::Then, conditional::compile_then),
    spec("else", KeywordKind::Else, conditional::compile_else),
    spec(
        "dependentSchemas",
        KeywordKind::DependentSchemas,
        conditional::compile_dependent_schemas,
    ),
];

static UNEVALUATED: &[Spec] = &[
    spec(
        "unevaluatedItems",
        KeywordKind::UnevaluatedItems,
        unevaluated::compile_unevaluated_items,
    ),
    spec(
        "unevaluatedProperties",
        KeywordKind::UnevaluatedProperties,
        unevaluated::compile_unevaluated_properties,
    ),
];

static VALIDATION: &[Spec] = &[
    spec("type", KeywordKind::Type, types::compile_type),
    spec("enum", KeywordKind::Enum, enum_::compile_enum),
    spec("const", KeywordKind::Const, enum_::compile_const),
    spec("multipleOf", KeywordKind::MultipleOf, numeric::compile_multiple_of),
    spec("maximum", KeywordKind::Maximum, numeric::compile_maximum),
    spec(
        "exclusiveMaximum",
        KeywordKind::ExclusiveMaximum,
        numeric::compile_exclusive_maximum,
    ),
    spec("minimum", KeywordKind::Minimum, numeric::compile_minimum),
    spec(
        "exclusiveMinimum",
        KeywordKind::ExclusiveMinimum,
        numeric::compile_exclusive_minimum,
    ),
    spec("maxLength", KeywordKind::MaxLength, string::compile_max_length),
    spec("minLength", KeywordKind::MinLength, string::compile_min_length),
    spec("pattern", KeywordKind::Pattern, string::compile_pattern),
    spec("maxItems", KeywordKind::MaxItems, sizes::compile_max_items),
    spec("minItems", KeywordKind::MinItems, sizes::compile_min_items),
    spec("uniqueItems", KeywordKind::UniqueItems, sizes::compile_unique_items),
    spec("maxContains", KeywordKind::MaxContains, contains::compile_max_contains),
    spec("minContains", KeywordKind::Contains, contains::compile_min_contains),
    spec("maxProperties", KeywordKind::MaxProperties, sizes::compile_max_properties),
    spec("minProperties", KeywordKind::MinProperties, sizes::compile_min_properties),
    spec("required", KeywordKind::Required, required::compile_required),
    spec(
        "dependentRequired",
        KeywordKind::DependentRequired,
        required::compile_dependent_required,
    ),
];

static META_DATA: &[Spec] = &[
    spec("title", KeywordKind::Annotation, annotations::compile_annotation),
    spec("description", KeywordKind::Annotation, annotations::compile_annotation),
    spec("default", KeywordKind::Annotation, annotations::compile_annotation),
    spec("deprecated", KeywordKind::Annotation, annotations::compile_annotation),
    spec("readOnly", KeywordKind::Annotation, annotations::compile_annotation),
    spec("writeOnly", KeywordKind::Annotation, annotations::compile_annotation),
    spec("examples", KeywordKind::Annotation, annotations::compile_annotation),
];

static FORMAT_ANNOTATION: &[Spec] =
    &[spec("format", KeywordKind::Format, format::compile_annotation_format)];

static FORMAT_ASSERTION: &[Spec] =
    &[spec("format", KeywordKind::Format, format::compile_assertion_format)];

static CONTENT: &[Spec] = &[
    spec(
        "contentEncoding",
        KeywordKind::ContentEncoding,
        content::compile_content_encoding,
    ),
    spec(
        "contentMediaType",
        KeywordKind::ContentMediaType,
        content::compile_content_media_type,
    ),
    spec("contentSchema", KeywordKind::ContentSchema, content::compile_content_schema),
];

static OAS_BASE: &[Spec] = &[
    spec(
        "discriminator",
        KeywordKind::Discriminator,
        discriminator::compile_discriminator,
    ),
    spec("example", KeywordKind::Annotation, annotations::compile_annotation),
    spec("externalDocs", KeywordKind::Annotation, annotations::compile_annotation),
    spec("xml", KeywordKind::Annotation, annotations::compile_annotation),
];

pub(crate) fn table(vocabulary: Vocabulary) -> &'static [Spec] {
    match vocabulary {
        Vocabulary::Core => CORE,
        Vocabulary::Applicator => APPLICATOR,
        Vocabulary::Unevaluated => UNEVALUATED,
        Vocabulary::Validation => VALIDATION,
        Vocabulary::MetaData => META_DATA,
        Vocabulary::FormatAnnotation => FORMAT_ANNOTATION,
        Vocabulary::FormatAssertion => FORMAT_ASSERTION,
        Vocabulary::Content => CONTENT,
        Vocabulary::OasBase => OAS_BASE,
    }
}

/// Keywords consumed structurally by the compiler; they never become
/// evaluators or unknown-keyword annotations.
pub(crate) const STRUCTURAL: &[&str] = &[
    "$anchor",
    "$comment",
    "$defs",
    "$dynamicAnchor",
    "$id",
    "$schema",
    "$vocabulary",
    "x-error",
];
