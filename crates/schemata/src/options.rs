//! Validator configuration.
//!
//! `ValidationOptions::default()` supplies the library-wide defaults; builder
//! calls produce new values rather than mutating shared state, so a
//! configured options value can be reused across schemas.

use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;
use serde_json::{Map, Value};

use schemata_referencing::{Retrieve, VocabularySet};

use crate::compiler;
use crate::content::{ContentDecoder, ContentParser};
use crate::error::SchemaError;
use crate::evaluation::AccessMode;
use crate::output::OutputFormat;
use crate::regex::PatternEngine;
use crate::Validator;

/// Observer invoked around each `properties` entry with the instance object,
/// the property name, and the raw property schema. Hooks observe; they carry
/// no validation semantics.
pub type PropertyHook = Arc<dyn Fn(&Map<String, Value>, &str, &Value) + Send + Sync>;

/// Custom format predicate.
pub type FormatCheckFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct ValidationOptions {
    pub(crate) base_uri: Option<String>,
    pub(crate) meta_schema: Option<String>,
    pub(crate) vocabularies: Option<VocabularySet>,
    pub(crate) format_assertion: bool,
    pub(crate) formats: AHashMap<String, FormatCheckFn>,
    pub(crate) content_encodings: AHashMap<String, ContentDecoder>,
    pub(crate) content_media_types: AHashMap<String, ContentParser>,
    pub(crate) retriever: Option<Arc<dyn Retrieve>>,
    pub(crate) pattern_engine: PatternEngine,
    pub(crate) output_format: OutputFormat,
    pub(crate) access_mode: Option<AccessMode>,
    pub(crate) before_property_validation: Vec<PropertyHook>,
    pub(crate) after_property_validation: Vec<PropertyHook>,
    pub(crate) insert_property_defaults: bool,
}

impl ValidationOptions {
    /// Base URI for the root schema when it carries no `$id`.
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Meta-schema URI assumed for schemas without `$schema`.
    #[must_use]
    pub fn with_meta_schema(mut self, meta_schema: impl Into<String>) -> Self {
        self.meta_schema = Some(meta_schema.into());
        self
    }

    /// Force a specific active vocabulary set, overriding `$vocabulary`.
    #[must_use]
    pub fn with_vocabularies(mut self, vocabularies: VocabularySet) -> Self {
        self.vocabularies = Some(vocabularies);
        self
    }

    /// Turn `format` into an assertion instead of an annotation.
    #[must_use]
    pub fn with_format_assertion(mut self, assert: bool) -> Self {
        self.format_assertion = assert;
        self
    }

    /// Register a custom format validator.
    #[must_use]
    pub fn with_format(
        mut self,
        name: impl Into<String>,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.formats.insert(name.into(), Arc::new(check));
        self
    }

    /// Register a content-encoding decoder.
    #[must_use]
    pub fn with_content_encoding(
        mut self,
        name: impl Into<String>,
        decoder: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.content_encodings.insert(name.into(), Arc::new(decoder));
        self
    }

    /// Register a content-media-type parser.
    #[must_use]
    pub fn with_content_media_type(
        mut self,
        name: impl Into<String>,
        parser: impl Fn(&str) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.content_media_types.insert(name.into(), Arc::new(parser));
        self
    }

    /// Resolve external references through `retriever`.
    #[must_use]
    pub fn with_retriever(mut self, retriever: impl Retrieve + 'static) -> Self {
        self.retriever = Some(Arc::new(retriever));
        self
    }

    /// Resolve external references through an already-shared retriever.
    #[must_use]
    pub fn with_shared_retriever(mut self, retriever: Arc<dyn Retrieve>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Select a bundled retriever by name: `net/http` or `file`.
    pub fn with_named_retriever(self, name: &str) -> Result<Self, SchemaError> {
        match name {
            #[cfg(feature = "resolve-http")]
            "net/http" => Ok(self.with_retriever(schemata_referencing::HttpRetriever::default())),
            #[cfg(feature = "resolve-file")]
            "file" => Ok(self.with_retriever(schemata_referencing::FileRetriever)),
            other => Err(SchemaError::InvalidRefResolution {
                uri: other.to_string(),
                message: "no such bundled retriever (is its feature enabled?)".to_string(),
            }),
        }
    }

    /// Regex dialect for `pattern` and friends.
    #[must_use]
    pub fn with_pattern_engine(mut self, engine: PatternEngine) -> Self {
        self.pattern_engine = engine;
        self
    }

    /// Default output shape for [`Validator::validate`].
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Make `required` honor `readOnly`/`writeOnly`.
    #[must_use]
    pub fn with_access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_before_property_validation(
        mut self,
        hook: impl Fn(&Map<String, Value>, &str, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.before_property_validation.push(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn with_after_property_validation(
        mut self,
        hook: impl Fn(&Map<String, Value>, &str, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.after_property_validation.push(Arc::new(hook));
        self
    }

    /// Accepted for API compatibility; instances are never mutated.
    // TODO: wire default insertion up once validation can take `&mut Value`
    // instances.
    #[must_use]
    pub fn with_insert_property_defaults(mut self, insert: bool) -> Self {
        self.insert_property_defaults = insert;
        self
    }

    /// Compile `schema` with these options.
    pub fn build(self, schema: &Value) -> Result<Validator, SchemaError> {
        compiler::compile(schema, self)
    }

    /// Parse `source` as JSON and compile it.
    pub fn build_from_str(self, source: &str) -> Result<Validator, SchemaError> {
        let schema: Value = serde_json::from_str(source)?;
        self.build(&schema)
    }

    /// Read and compile a schema file. The file's URI becomes the base URI,
    /// and sibling files are resolvable when the `resolve-file` feature is
    /// enabled.
    pub fn build_from_path(mut self, path: impl AsRef<Path>) -> Result<Validator, SchemaError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let canonical = path.canonicalize()?;
        let mut file_uri = String::from("file://");
        if !canonical.to_string_lossy().starts_with('/') {
            file_uri.push('/');
        }
        file_uri.push_str(&canonical.to_string_lossy().replace('\\', "/"));
        if self.base_uri.is_none() {
            self.base_uri = Some(file_uri);
        }
        #[cfg(feature = "resolve-file")]
        {
            if self.retriever.is_none() {
                self.retriever = Some(Arc::new(schemata_referencing::FileRetriever));
            }
        }
        self.build_from_str(&contents)
    }
}

impl std::fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("base_uri", &self.base_uri)
            .field("meta_schema", &self.meta_schema)
            .field("format_assertion", &self.format_assertion)
            .field("formats", &self.formats.len())
            .field("pattern_engine", &self.pattern_engine)
            .field("output_format", &self.output_format)
            .field("access_mode", &self.access_mode)
            .field("insert_property_defaults", &self.insert_property_defaults)
            .finish_non_exhaustive()
    }
}
