//! OpenAPI 3.1 document support.

use std::sync::{Arc, LazyLock};

use serde_json::Value;

use schemata_referencing::{escape_segment, meta, Dialect};

use crate::compiler;
use crate::error::SchemaError;
use crate::options::ValidationOptions;
use crate::output::OutputFormat;
use crate::Validator;

static DOCUMENT_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    crate::options()
        .with_base_uri(meta::OAS31_SCHEMA_BASE_URI)
        .build(&meta::OAS31_SCHEMA_BASE)
        .expect("the bundled OpenAPI 3.1 document schema compiles")
});

/// A parsed OpenAPI 3.1 document.
///
/// Construction asserts the `openapi` version; the document itself validates
/// against the bundled OpenAPI 3.1 schema, and each component schema compiles
/// into a [`Validator`] using the dialect the document declares via
/// `jsonSchemaDialect` (the OAS base dialect by default, which activates
/// `discriminator`).
pub struct OpenApi31 {
    document: Arc<Value>,
    dialect: Dialect,
    options: ValidationOptions,
}

impl OpenApi31 {
    pub fn new(document: Value) -> Result<OpenApi31, SchemaError> {
        OpenApi31::with_options(document, ValidationOptions::default())
    }

    pub fn with_options(
        document: Value,
        options: ValidationOptions,
    ) -> Result<OpenApi31, SchemaError> {
        let version = document
            .get("openapi")
            .and_then(Value::as_str)
            .unwrap_or("missing");
        if !version.starts_with("3.1.") {
            return Err(SchemaError::UnsupportedOpenApiVersion {
                version: version.to_string(),
            });
        }
        let dialect = document
            .get("jsonSchemaDialect")
            .and_then(Value::as_str)
            .map_or(Some(Dialect::OpenApi31), Dialect::from_uri)
            .unwrap_or(Dialect::OpenApi31);
        Ok(OpenApi31 {
            document: Arc::new(document),
            dialect,
            options,
        })
    }

    /// Whether the document conforms to the OpenAPI 3.1 schema.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        DOCUMENT_VALIDATOR.is_valid(&self.document)
    }

    /// Validate the document against the OpenAPI 3.1 schema.
    #[must_use]
    pub fn validate(&self) -> Value {
        DOCUMENT_VALIDATOR.validate(&self.document)
    }

    #[must_use]
    pub fn validate_as(&self, format: OutputFormat) -> Value {
        DOCUMENT_VALIDATOR.validate_as(&self.document, format)
    }

    /// Compile the component schema at `#/components/schemas/{name}`.
    ///
    /// The whole document is registered, so references between components
    /// resolve, and `discriminator` can dispatch on component names.
    pub fn schema(&self, name: &str) -> Result<Validator, SchemaError> {
        let components = self
            .document
            .get("components")
            .and_then(|components| components.get("schemas"))
            .and_then(Value::as_object);
        let Some(schemas) = components else {
            return Err(SchemaError::UnknownComponentSchema {
                name: name.to_string(),
            });
        };
        if !schemas.contains_key(name) {
            return Err(SchemaError::UnknownComponentSchema {
                name: name.to_string(),
            });
        }
        let crawl_roots: Vec<String> = schemas
            .keys()
            .map(|component| format!("/components/schemas/{}", escape_segment(component)))
            .collect();
        compiler::compile_at(
            &self.document,
            self.options.clone(),
            self.dialect,
            &crawl_roots,
            &format!("/components/schemas/{}", escape_segment(name)),
        )
    }

    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl std::fmt::Debug for OpenApi31 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenApi31")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}
