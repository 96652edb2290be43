//! # schemata
//!
//! A JSON Schema validator for Draft 2020-12 and the OpenAPI 3.1 dialect.
//!
//! ```rust
//! use serde_json::json;
//!
//! # fn main() -> Result<(), schemata::SchemaError> {
//! let schema = json!({"type": "integer", "minimum": 0, "maximum": 100});
//! let validator = schemata::validator_for(&schema)?;
//!
//! assert!(validator.is_valid(&json!(50)));
//!
//! let report = validator.validate(&json!(150));
//! assert_eq!(report["valid"], json!(false));
//! assert_eq!(report["errors"][0]["type"], json!("maximum"));
//! # Ok(())
//! # }
//! ```
//!
//! Compiled validators are immutable and `Send + Sync`; share one across
//! threads and validate concurrently. Configuration goes through
//! [`options()`]:
//!
//! ```rust
//! use schemata::{OutputFormat, PatternEngine};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), schemata::SchemaError> {
//! let validator = schemata::options()
//!     .with_format_assertion(true)
//!     .with_pattern_engine(PatternEngine::Ecma)
//!     .with_output_format(OutputFormat::Basic)
//!     .build(&json!({"format": "email"}))?;
//! assert!(!validator.is_valid(&json!("not an email")));
//! # Ok(())
//! # }
//! ```

mod compiler;
mod content;
mod error;
mod evaluation;
mod formats;
mod graph;
mod keywords;
pub mod meta;
mod node;
mod openapi;
mod options;
mod output;
mod paths;
mod regex;
mod x_error;

use std::sync::Arc;

use serde_json::{json, Value};

use graph::{NodeId, SchemaGraph};

pub use content::{ContentDecoder, ContentParser};
pub use error::SchemaError;
pub use evaluation::AccessMode;
pub use openapi::OpenApi31;
pub use options::{FormatCheckFn, PropertyHook, ValidationOptions};
pub use output::{ClassicError, OutputFormat};
pub use regex::{PatternEngine, PatternMatch, PatternResolver};
pub use schemata_referencing::{Retrieve, Uri, UriString, Vocabulary, VocabularySet};

/// A compiled schema, ready to validate instances.
///
/// Immutable after compilation; each validation call owns its own evaluation
/// state, so sharing a `Validator` across threads is safe.
pub struct Validator {
    pub(crate) graph: SchemaGraph,
    pub(crate) root: NodeId,
    pub(crate) root_schema: Arc<Value>,
    pub(crate) output_format: OutputFormat,
    pub(crate) access_mode: Option<AccessMode>,
    /// External documents compilation pulled in, for bundling.
    pub(crate) externals: Vec<(Arc<UriString>, Arc<Value>)>,
    pub(crate) base_uri: Arc<UriString>,
    pub(crate) resources: Vec<(String, String)>,
    pub(crate) anchors: Vec<(String, String, bool)>,
}

impl Validator {
    /// Parse `source` as JSON and compile it with default options.
    pub fn from_str(source: &str) -> Result<Validator, SchemaError> {
        ValidationOptions::default().build_from_str(source)
    }

    /// Read and compile a schema file; see
    /// [`ValidationOptions::build_from_path`].
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Validator, SchemaError> {
        ValidationOptions::default().build_from_path(path)
    }

    /// Boolean validation with early termination on the first failure.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        let mut ctx = evaluation::EvaluationContext::new(&self.graph, self.access_mode);
        self.graph.node(self.root).is_valid(instance, &mut ctx)
    }

    /// Validate and render in the configured output format.
    #[must_use]
    pub fn validate(&self, instance: &Value) -> Value {
        self.validate_as(instance, self.output_format)
    }

    /// Validate and render in an explicit output format.
    #[must_use]
    pub fn validate_as(&self, instance: &Value, format: OutputFormat) -> Value {
        if format == OutputFormat::Flag {
            return json!({"valid": self.is_valid(instance)});
        }
        let evaluation = self.apply(instance);
        match format {
            OutputFormat::Flag => unreachable!("handled above"),
            OutputFormat::Basic => output::basic(&evaluation),
            OutputFormat::Detailed => output::detailed(&evaluation),
            OutputFormat::Verbose => output::verbose(&evaluation),
            OutputFormat::Classic => output::classic_value(&evaluation),
        }
    }

    /// The flat classic error list, typed.
    #[must_use]
    pub fn classic_errors(&self, instance: &Value) -> Vec<ClassicError> {
        output::classic(&self.apply(instance))
    }

    fn apply(&self, instance: &Value) -> evaluation::Evaluation {
        let mut ctx = evaluation::EvaluationContext::new(&self.graph, self.access_mode);
        let iloc = paths::LazyLocation::new();
        let kloc = paths::LazyLocation::new();
        self.graph
            .node(self.root)
            .evaluate(instance, &iloc, &kloc, &mut ctx)
    }

    /// The root schema value this validator was compiled from.
    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.root_schema
    }

    /// Produce a self-contained schema: every externally-referenced document
    /// is embedded under `$defs` with its `$id` preserved, so the bundle
    /// recompiles without a retriever and validates identically.
    #[must_use]
    pub fn bundle(&self) -> Value {
        let mut bundled = self.root_schema.as_ref().clone();
        if self.externals.is_empty() {
            return bundled;
        }
        let Value::Object(root) = &mut bundled else {
            return bundled;
        };
        if !root.contains_key("$id") {
            root.insert("$id".to_string(), json!(self.base_uri.as_str()));
        }
        let defs = root
            .entry("$defs")
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Value::Object(defs) = defs {
            for (uri, document) in &self.externals {
                let mut embedded = document.as_ref().clone();
                if let Value::Object(embedded) = &mut embedded {
                    embedded
                        .entry("$id")
                        .or_insert_with(|| json!(uri.as_str()));
                }
                defs.insert(uri.as_str().to_string(), embedded);
            }
        }
        bundled
    }

    /// The lexical resource table: `(absolute URI, document pointer)` pairs,
    /// sorted. Two compilations of the same input produce equal tables.
    #[must_use]
    pub fn resources(&self) -> &[(String, String)] {
        &self.resources
    }

    /// The anchor table: `(resource base, name, dynamic)` triples, sorted.
    #[must_use]
    pub fn anchors(&self) -> &[(String, String, bool)] {
        &self.anchors
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("base_uri", &self.base_uri.as_str())
            .field("nodes", &self.graph.len())
            .field("resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

/// Compile `schema` with default options.
pub fn validator_for(schema: &Value) -> Result<Validator, SchemaError> {
    ValidationOptions::default().build(schema)
}

/// Start configuring a validator.
#[must_use]
pub fn options() -> ValidationOptions {
    ValidationOptions::default()
}
