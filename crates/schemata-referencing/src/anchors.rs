use std::sync::Arc;

use crate::UriString;

/// A named location within a schema resource, declared by `$anchor` or
/// `$dynamicAnchor`.
#[derive(Debug, Clone)]
pub(crate) struct Anchor {
    /// Owning document, so the target can be re-read without a second lookup.
    pub(crate) document: Arc<UriString>,
    /// JSON Pointer from the document root to the anchored schema.
    pub(crate) pointer: String,
    pub(crate) dynamic: bool,
}

/// Anchors are unique per resource: the key is the resource base plus the
/// plain name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct AnchorKey {
    pub(crate) base: Arc<UriString>,
    pub(crate) name: String,
}

impl AnchorKey {
    pub(crate) fn new(base: Arc<UriString>, name: impl Into<String>) -> AnchorKey {
        AnchorKey {
            base,
            name: name.into(),
        }
    }
}
