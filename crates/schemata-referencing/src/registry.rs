//! A registry of JSON Schema resources keyed by their canonical URIs.

use std::{collections::VecDeque, sync::Arc};

use ahash::AHashMap;
use serde_json::Value;

use crate::{
    meta, pointer,
    resource::{subschemas_of, Resource},
    retriever::{DefaultRetriever, Retrieve},
    uri, Anchor, AnchorKey, Dialect, Error, UriString,
};

#[derive(Debug)]
struct Document {
    contents: Arc<Value>,
    dialect: Dialect,
}

#[derive(Debug, Clone)]
struct ResourceEntry {
    document: Arc<UriString>,
    /// JSON Pointer from the document root to the resource root.
    pointer: String,
    dialect: Dialect,
}

/// Builder for a [`Registry`].
pub struct RegistryOptions {
    retriever: Arc<dyn Retrieve>,
}

impl RegistryOptions {
    /// Use `retriever` for documents that are not registered in-memory.
    #[must_use]
    pub fn retriever(mut self, retriever: impl Retrieve + 'static) -> RegistryOptions {
        self.retriever = Arc::new(retriever);
        RegistryOptions { ..self }
    }

    #[must_use]
    pub fn shared_retriever(mut self, retriever: Arc<dyn Retrieve>) -> RegistryOptions {
        self.retriever = retriever;
        RegistryOptions { ..self }
    }

    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            documents: AHashMap::new(),
            resources: AHashMap::new(),
            anchors: AHashMap::new(),
            document_resources: AHashMap::new(),
            retriever: self.retriever,
        }
    }
}

/// In-memory store of schema documents, embedded resources, and anchors.
///
/// Registration eagerly crawls each document, so subresources introduced by
/// `$id` and every `$anchor`/`$dynamicAnchor` are immediately addressable.
pub struct Registry {
    documents: AHashMap<Arc<UriString>, Document>,
    resources: AHashMap<Arc<UriString>, ResourceEntry>,
    anchors: AHashMap<AnchorKey, Anchor>,
    /// Per document: `(resource pointer, resource base)`, for innermost-resource
    /// queries against arbitrary pointers.
    document_resources: AHashMap<Arc<UriString>, Vec<(String, Arc<UriString>)>>,
    retriever: Arc<dyn Retrieve>,
}

/// The outcome of resolving an absolute URI: the owning document plus the
/// pointer identifying the target within it.
#[derive(Debug, Clone)]
pub struct Resolved {
    document: Arc<Value>,
    document_uri: Arc<UriString>,
    /// Document-root-relative pointer to the target value.
    pointer: String,
    /// Base URI of the innermost enclosing resource.
    base: Arc<UriString>,
    /// Pointer from the innermost resource root to the target.
    resource_pointer: String,
    dialect: Dialect,
}

impl Resolved {
    /// The resolved value.
    ///
    /// The pointer was applied at construction, so re-application cannot fail.
    #[must_use]
    pub fn value(&self) -> &Value {
        pointer::lookup(&self.document, &self.pointer).expect("pointer verified at resolution")
    }

    #[must_use]
    pub fn document(&self) -> &Arc<Value> {
        &self.document
    }

    #[must_use]
    pub fn document_uri(&self) -> &Arc<UriString> {
        &self.document_uri
    }

    #[must_use]
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    #[must_use]
    pub fn base(&self) -> &Arc<UriString> {
        &self.base
    }

    #[must_use]
    pub fn resource_pointer(&self) -> &str {
        &self.resource_pointer
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::options().build()
    }
}

impl Registry {
    #[must_use]
    pub fn options() -> RegistryOptions {
        RegistryOptions {
            retriever: Arc::new(DefaultRetriever),
        }
    }

    /// Register `resource` under `uri` and crawl it for subresources and
    /// anchors. Re-registering a known URI is a no-op.
    pub fn register(
        &mut self,
        uri: &UriString,
        resource: impl Into<Resource>,
    ) -> Result<Arc<UriString>, Error> {
        let document_uri = Arc::new(uri::fragmentless(uri)?);
        if self.documents.contains_key(&document_uri) {
            return Ok(document_uri);
        }
        let (contents, dialect) = resource.into().into_parts();
        self.insert_document(Arc::clone(&document_uri), contents, dialect, &[String::new()])?;
        Ok(document_uri)
    }

    /// Register a document whose schemas live only below the listed pointers
    /// (e.g. an OpenAPI document with schemas under `/components/schemas/*`).
    ///
    /// The document root itself is addressable by pointer but is not crawled
    /// as a schema.
    pub fn register_with_roots(
        &mut self,
        uri: &UriString,
        resource: impl Into<Resource>,
        roots: &[String],
    ) -> Result<Arc<UriString>, Error> {
        let document_uri = Arc::new(uri::fragmentless(uri)?);
        if self.documents.contains_key(&document_uri) {
            return Ok(document_uri);
        }
        let (contents, dialect) = resource.into().into_parts();
        self.insert_document(Arc::clone(&document_uri), contents, dialect, roots)?;
        Ok(document_uri)
    }

    fn insert_document(
        &mut self,
        document_uri: Arc<UriString>,
        contents: Value,
        dialect: Dialect,
        crawl_roots: &[String],
    ) -> Result<(), Error> {
        let contents = Arc::new(contents);
        self.documents.insert(
            Arc::clone(&document_uri),
            Document {
                contents: Arc::clone(&contents),
                dialect,
            },
        );
        self.insert_resource(Arc::clone(&document_uri), &document_uri, String::new(), dialect);
        for root in crawl_roots {
            self.crawl(&document_uri, &contents, dialect, root)?;
        }
        tracing::debug!(
            document = %document_uri,
            resources = self.document_resources.get(&document_uri).map_or(0, Vec::len),
            "registered schema document"
        );
        Ok(())
    }

    fn insert_resource(
        &mut self,
        base: Arc<UriString>,
        document: &Arc<UriString>,
        pointer: String,
        dialect: Dialect,
    ) {
        if self.resources.contains_key(&base) {
            tracing::debug!(uri = %base, "duplicate resource id, keeping the first");
            return;
        }
        self.document_resources
            .entry(Arc::clone(document))
            .or_default()
            .push((pointer.clone(), Arc::clone(&base)));
        self.resources.insert(
            base,
            ResourceEntry {
                document: Arc::clone(document),
                pointer,
                dialect,
            },
        );
    }

    fn crawl(
        &mut self,
        document_uri: &Arc<UriString>,
        contents: &Arc<Value>,
        dialect: Dialect,
        root_pointer: &str,
    ) -> Result<(), Error> {
        let root = match pointer::lookup(contents, root_pointer) {
            Some(root) => root,
            None => {
                return Err(Error::pointer_to_nowhere(
                    document_uri.as_str(),
                    root_pointer,
                ))
            }
        };
        let mut queue: VecDeque<(String, Arc<UriString>, &Value)> = VecDeque::new();
        queue.push_back((root_pointer.to_string(), Arc::clone(document_uri), root));
        while let Some((pointer, base, value)) = queue.pop_front() {
            let Some(object) = value.as_object() else {
                continue;
            };
            let base = match object.get("$id").and_then(Value::as_str) {
                Some(id) => {
                    let resolved = Arc::new(uri::fragmentless(&uri::resolve_against(&base, id)?)?);
                    self.insert_resource(
                        Arc::clone(&resolved),
                        document_uri,
                        pointer.clone(),
                        Dialect::detect(value, dialect),
                    );
                    resolved
                }
                None => base,
            };
            for (keyword, dynamic) in [("$anchor", false), ("$dynamicAnchor", true)] {
                if let Some(name) = object.get(keyword).and_then(Value::as_str) {
                    let key = AnchorKey::new(Arc::clone(&base), name);
                    // First declaration wins; duplicates are surfaced by
                    // meta-schema validation, not here.
                    self.anchors.entry(key).or_insert_with(|| Anchor {
                        document: Arc::clone(document_uri),
                        pointer: pointer.clone(),
                        dynamic,
                    });
                }
            }
            for (suffix, subschema) in subschemas_of(value) {
                queue.push_back((format!("{pointer}{suffix}"), Arc::clone(&base), subschema));
            }
        }
        Ok(())
    }

    /// Whether `base` (a fragmentless URI) names a registered resource.
    #[must_use]
    pub fn contains(&self, base: &UriString) -> bool {
        self.resources.contains_key(base)
    }

    /// Make sure the document behind `base` is registered, fetching it through
    /// the retriever, falling back to the bundled meta-schemas.
    pub fn ensure(&mut self, base: &UriString) -> Result<(), Error> {
        if self.resources.contains_key(base) {
            return Ok(());
        }
        match self.retriever.retrieve(base) {
            Ok(contents) => {
                tracing::debug!(uri = %base, "retrieved external schema document");
                self.register(base, Resource::from_contents(contents))?;
                Ok(())
            }
            Err(retrieval_error) => {
                if let Some(embedded) = meta::document(base.as_str()) {
                    self.register(base, Resource::from_contents(embedded.clone()))?;
                    return Ok(());
                }
                Err(Error::Retrieve {
                    uri: base.as_str().to_string(),
                    source: retrieval_error,
                })
            }
        }
    }

    /// Resolve an absolute URI, honoring JSON Pointer and plain-name anchor
    /// fragments.
    pub fn resolve(&self, target: &UriString) -> Result<Resolved, Error> {
        let fragment = uri::decoded_fragment(target);
        let base = uri::fragmentless(target)?;
        let (base_key, entry) = self
            .resources
            .get_key_value(&base)
            .ok_or_else(|| Error::unknown_resource(base.as_str()))?;
        let document = self
            .documents
            .get(&entry.document)
            .expect("resources always point at registered documents");
        let target_pointer = match fragment.as_deref() {
            None | Some("") => entry.pointer.clone(),
            Some(fragment) if fragment.starts_with('/') => {
                format!("{}{fragment}", entry.pointer)
            }
            Some(anchor) => {
                let key = AnchorKey::new(Arc::clone(base_key), anchor);
                let found = self.anchors.get(&key).ok_or_else(|| Error::UnknownAnchor {
                    uri: base.as_str().to_string(),
                    anchor: anchor.to_string(),
                })?;
                found.pointer.clone()
            }
        };
        if pointer::lookup(&document.contents, &target_pointer).is_none() {
            return Err(Error::pointer_to_nowhere(
                target.as_str(),
                target_pointer.clone(),
            ));
        }
        let (resource_root, resource_base) =
            self.innermost_resource(&entry.document, &target_pointer, base_key);
        Ok(Resolved {
            document: Arc::clone(&document.contents),
            document_uri: Arc::clone(&entry.document),
            resource_pointer: target_pointer[resource_root.len()..].to_string(),
            pointer: target_pointer,
            base: resource_base,
            dialect: entry.dialect,
        })
    }

    /// The longest registered resource pointer enclosing `pointer`.
    fn innermost_resource(
        &self,
        document: &Arc<UriString>,
        pointer: &str,
        fallback: &Arc<UriString>,
    ) -> (String, Arc<UriString>) {
        let mut best: Option<(&str, &Arc<UriString>)> = None;
        if let Some(entries) = self.document_resources.get(document) {
            for (candidate, base) in entries {
                let encloses = pointer == candidate
                    || (pointer.starts_with(candidate)
                        && pointer.as_bytes().get(candidate.len()) == Some(&b'/'));
                if encloses && best.map_or(true, |(current, _)| candidate.len() >= current.len()) {
                    best = Some((candidate, base));
                }
            }
        }
        match best {
            Some((pointer, base)) => (pointer.to_string(), Arc::clone(base)),
            None => (String::new(), Arc::clone(fallback)),
        }
    }

    /// Names of `$dynamicAnchor`s declared within the resource at `base`.
    #[must_use]
    pub fn dynamic_anchor_names(&self, base: &UriString) -> Vec<String> {
        let mut names: Vec<String> = self
            .anchors
            .iter()
            .filter(|(key, anchor)| anchor.dynamic && key.base.as_ref() == base)
            .map(|(key, _)| key.name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Whether the resource at `base` declares `$dynamicAnchor: name`.
    #[must_use]
    pub fn has_dynamic_anchor(&self, base: &UriString, name: &str) -> bool {
        self.anchors
            .iter()
            .any(|(key, anchor)| anchor.dynamic && key.name == name && key.base.as_ref() == base)
    }

    /// Registered resource URIs with their document-relative pointers, sorted
    /// by URI. Structural equality of two registries' tables can be checked by
    /// comparing these snapshots.
    #[must_use]
    pub fn resource_snapshot(&self) -> Vec<(String, String)> {
        let mut snapshot: Vec<(String, String)> = self
            .resources
            .iter()
            .map(|(base, entry)| (base.as_str().to_string(), entry.pointer.clone()))
            .collect();
        snapshot.sort();
        snapshot
    }

    /// Anchor table snapshot: `(resource base, name, dynamic)`, sorted.
    #[must_use]
    pub fn anchor_snapshot(&self) -> Vec<(String, String, bool)> {
        let mut snapshot: Vec<(String, String, bool)> = self
            .anchors
            .iter()
            .map(|(key, anchor)| {
                (
                    key.base.as_str().to_string(),
                    key.name.clone(),
                    anchor.dynamic,
                )
            })
            .collect();
        snapshot.sort();
        snapshot
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("documents", &self.documents.len())
            .field("resources", &self.resources.len())
            .field("anchors", &self.anchors.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Registry {
        let mut registry = Registry::options().build();
        let root = uri::parse("https://example.com/tree").expect("valid");
        registry
            .register(
                &root,
                Resource::from_contents(json!({
                    "$id": "https://example.com/tree",
                    "$dynamicAnchor": "node",
                    "properties": {
                        "subtree": {
                            "$id": "inner",
                            "$anchor": "leafy",
                            "items": {"type": "null"}
                        }
                    }
                })),
            )
            .expect("registers");
        registry
    }

    #[test]
    fn crawl_registers_embedded_resources() {
        let registry = sample();
        let inner = uri::parse("https://example.com/inner").expect("valid");
        let resolved = registry.resolve(&inner).expect("embedded resource");
        assert_eq!(resolved.pointer(), "/properties/subtree");
        assert_eq!(resolved.base().as_str(), "https://example.com/inner");
    }

    #[test]
    fn anchor_resolution() {
        let registry = sample();
        let anchored = uri::parse("https://example.com/inner#leafy").expect("valid");
        let resolved = registry.resolve(&anchored).expect("anchor");
        assert_eq!(resolved.pointer(), "/properties/subtree");
    }

    #[test]
    fn pointer_fragments_are_resource_relative() {
        let registry = sample();
        let target = uri::parse("https://example.com/inner#/items").expect("valid");
        let resolved = registry.resolve(&target).expect("pointer within resource");
        assert_eq!(resolved.pointer(), "/properties/subtree/items");
        assert_eq!(resolved.resource_pointer(), "/items");
        assert_eq!(resolved.value(), &json!({"type": "null"}));
    }

    #[test]
    fn dynamic_anchor_tables() {
        let registry = sample();
        let root = uri::parse("https://example.com/tree").expect("valid");
        assert!(registry.has_dynamic_anchor(&root, "node"));
        assert_eq!(registry.dynamic_anchor_names(&root), ["node"]);
        let inner = uri::parse("https://example.com/inner").expect("valid");
        assert!(!registry.has_dynamic_anchor(&inner, "node"));
    }

    #[test]
    fn missing_pointer_is_reported() {
        let registry = sample();
        let target = uri::parse("https://example.com/tree#/nope").expect("valid");
        let error = registry.resolve(&target).expect_err("missing pointer");
        assert!(matches!(error, Error::PointerToNowhere { .. }));
    }

    #[test]
    fn meta_schemas_resolve_without_a_retriever() {
        let mut registry = Registry::options().build();
        let draft = uri::parse(Dialect::DRAFT2020_12_URI).expect("valid");
        registry.ensure(&draft).expect("bundled meta-schema");
        let resolved = registry.resolve(&draft).expect("registered");
        assert!(resolved.value().is_object());
    }

    #[test]
    fn registration_is_idempotent() {
        let mut registry = sample();
        let root = uri::parse("https://example.com/tree").expect("valid");
        registry
            .register(&root, Resource::from_contents(json!({"type": "string"})))
            .expect("no-op");
        let snapshot = registry.resource_snapshot();
        let again = sample().resource_snapshot();
        assert_eq!(snapshot, again);
    }
}
