//! Compile-time errors.
//!
//! Validation outcomes are never errors: instance problems are reported as
//! invalid nodes in the result tree. [`SchemaError`] covers schema authoring,
//! configuration, and reference-resolution failures, which all surface while
//! building a [`Validator`](crate::Validator).

use schemata_referencing::{Error as ReferencingError, UriError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// A `$ref`/`$dynamicRef` URI could not be resolved to any schema.
    #[error("unresolvable reference `{reference}`")]
    UnknownRef { reference: String },
    /// The retriever produced no document and no bundled meta-schema matched.
    #[error("failed to resolve `{uri}`: {message}")]
    InvalidRefResolution { uri: String, message: String },
    /// A JSON Pointer fragment did not land on a schema position.
    #[error("`{uri}` does not identify a schema position")]
    InvalidRefPointer { uri: String },
    /// The pattern could not be compiled under the selected regex dialect.
    #[error("cannot compile pattern `{pattern}`: {message}")]
    InvalidRegexpResolution { pattern: String, message: String },
    /// The pattern is not a valid ECMA-262 regular expression.
    #[error("invalid ECMA-262 pattern `{pattern}`: {message}")]
    InvalidEcmaRegexp { pattern: String, message: String },
    #[error("unknown required vocabulary `{uri}`")]
    UnknownVocabulary { uri: String },
    #[error("unsupported OpenAPI version `{version}`, expected 3.1.x")]
    UnsupportedOpenApiVersion { version: String },
    #[error("unknown output format `{format}`")]
    UnknownOutputFormat { format: String },
    #[error("`{uri}` is not a valid file URI")]
    InvalidFileUri { uri: String },
    /// The OpenAPI document has no schema under `#/components/schemas/{name}`.
    #[error("no component schema named `{name}`")]
    UnknownComponentSchema { name: String },
    #[error(transparent)]
    Uri(#[from] UriError),
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ReferencingError> for SchemaError {
    fn from(error: ReferencingError) -> SchemaError {
        match error {
            ReferencingError::InvalidUri(uri) => SchemaError::Uri(uri),
            ReferencingError::UnknownResource { uri } => SchemaError::UnknownRef { reference: uri },
            ReferencingError::PointerToNowhere { uri, .. } => SchemaError::InvalidRefPointer { uri },
            ReferencingError::UnknownAnchor { uri, anchor } => SchemaError::UnknownRef {
                reference: format!("{uri}#{anchor}"),
            },
            ReferencingError::Retrieve { uri, source } => SchemaError::InvalidRefResolution {
                uri,
                message: source.to_string(),
            },
            ReferencingError::InvalidFileUri { uri } => SchemaError::InvalidFileUri { uri },
            ReferencingError::UnknownVocabulary { uri } => SchemaError::UnknownVocabulary { uri },
        }
    }
}
