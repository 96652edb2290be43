//! # schemata-referencing
//!
//! Resource identification and reference resolution for JSON Schema Draft 2020-12
//! and the OpenAPI 3.1 dialect.
//!
//! A [`Registry`] stores JSON documents under their canonical URIs, eagerly crawls
//! them for embedded resources (`$id`) and anchors (`$anchor`, `$dynamicAnchor`),
//! and resolves absolute URIs (with JSON Pointer or anchor fragments) back to the
//! values they identify. External documents are fetched on demand through the
//! [`Retrieve`] trait; the Draft 2020-12 and OpenAPI 3.1 meta-schemas are bundled
//! and act as the resolver of last resort.
mod anchors;
mod dialect;
mod error;
pub mod meta;
mod pointer;
mod registry;
mod resource;
mod retriever;
pub mod uri;
mod vocabularies;

pub(crate) use anchors::{Anchor, AnchorKey};
pub use dialect::Dialect;
pub use error::{Error, UriError};
pub use fluent_uri::{Iri, IriRef, Uri, UriRef};
pub use pointer::{escape_segment, lookup, parse_index, unescape_segment};
pub use registry::{Registry, RegistryOptions, Resolved};
pub use resource::Resource;
pub use retriever::{DefaultRetriever, Retrieve};
pub use vocabularies::{Vocabulary, VocabularySet};

#[cfg(feature = "retrieve-file")]
pub use retriever::FileRetriever;
#[cfg(feature = "retrieve-http")]
pub use retriever::HttpRetriever;

/// Absolute URI with owned storage, the key type of every registry table.
pub type UriString = Uri<String>;
