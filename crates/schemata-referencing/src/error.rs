use thiserror::Error;

/// A URI that could not be parsed or resolved.
#[derive(Debug, Error)]
#[error("invalid URI `{value}`: {message}")]
pub struct UriError {
    pub(crate) value: String,
    pub(crate) message: String,
}

impl UriError {
    pub(crate) fn new(value: impl Into<String>, message: impl std::fmt::Display) -> UriError {
        UriError {
            value: value.into(),
            message: message.to_string(),
        }
    }

    /// The offending input.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Errors produced while building or querying a [`Registry`](crate::Registry).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidUri(#[from] UriError),
    /// The URI does not name a registered resource and retrieval did not produce one.
    #[error("resource `{uri}` is not registered and could not be retrieved")]
    UnknownResource { uri: String },
    /// A JSON Pointer fragment pointed outside the resource it was applied to.
    #[error("JSON pointer `{pointer}` does not exist within `{uri}`")]
    PointerToNowhere { uri: String, pointer: String },
    /// A plain-name fragment named an anchor that no resource declares.
    #[error("anchor `{anchor}` is not registered within `{uri}`")]
    UnknownAnchor { uri: String, anchor: String },
    #[error("failed to retrieve `{uri}`: {source}")]
    Retrieve {
        uri: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("`{uri}` is not a valid file URI")]
    InvalidFileUri { uri: String },
    /// A `$vocabulary` entry marked required is not recognized.
    #[error("unknown required vocabulary `{uri}`")]
    UnknownVocabulary { uri: String },
}

impl Error {
    pub(crate) fn unknown_resource(uri: impl Into<String>) -> Error {
        Error::UnknownResource { uri: uri.into() }
    }

    pub(crate) fn pointer_to_nowhere(uri: impl Into<String>, pointer: impl Into<String>) -> Error {
        Error::PointerToNowhere {
            uri: uri.into(),
            pointer: pointer.into(),
        }
    }
}
