//! Schema compilation.
//!
//! Compilation walks raw `serde_json` values into [`SchemaNode`]s stored in a
//! flat arena. Every schema position is compiled at most once, keyed by
//! `(document URI, document pointer)`, which makes reference cycles terminate
//! naturally: a `$ref` back into a schema that is still being compiled just
//! receives the already-reserved arena index. After the root finishes, every
//! resource that was entered has its `$dynamicAnchor` targets compiled too,
//! so `$dynamicRef` resolution at validation time is a pure table lookup.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use serde_json::Value;

use schemata_referencing::{
    escape_segment, lookup, uri, Dialect, Registry, Resolved, Resource, UriString, Vocabulary,
    VocabularySet,
};

use crate::content::{self, ContentDecoder, ContentParser};
use crate::error::SchemaError;
use crate::evaluation::KeywordKind;
use crate::graph::{NodeId, SchemaGraph};
use crate::keywords::{self, KeywordCore, STRUCTURAL};
use crate::node::{Keyword, NodeCore, NodeInner, SchemaNode};
use crate::options::ValidationOptions;
use crate::paths::Location;
use crate::regex::{CompiledPattern, PatternCache};
use crate::x_error::{template_for, template_for_subschema};
use crate::Validator;

/// Base URI synthesized for root schemas without `$id`.
pub(crate) const DEFAULT_BASE_URI: &str = "schemata://root";

/// Position and scope of the schema value currently being compiled.
pub(crate) struct Frame {
    pub(crate) document_uri: Arc<UriString>,
    pub(crate) document: Arc<Value>,
    /// Pointer from the document root.
    pub(crate) pointer: String,
    /// Base URI of the enclosing resource.
    pub(crate) base: Arc<UriString>,
    /// Pointer from the enclosing resource root.
    pub(crate) resource_pointer: String,
    pub(crate) vocabularies: VocabularySet,
}

pub(crate) struct Compiler {
    registry: Registry,
    options: ValidationOptions,
    nodes: Vec<Option<SchemaNode>>,
    by_key: AHashMap<(Arc<UriString>, String), NodeId>,
    dynamic_anchors: AHashMap<Arc<UriString>, AHashMap<String, NodeId>>,
    /// Resource roots whose dynamic anchors still need eager compilation.
    pending_resources: Vec<Arc<UriString>>,
    processed_resources: AHashSet<Arc<UriString>>,
    patterns: PatternCache,
    vocabulary_cache: AHashMap<String, VocabularySet>,
    /// Documents other than the root that compilation pulled in; the bundler
    /// embeds these.
    externals: Vec<(Arc<UriString>, Arc<Value>)>,
    root_document: Arc<UriString>,
}

/// Everything a keyword factory may need from the compiler.
pub(crate) struct Ctx<'c> {
    compiler: &'c mut Compiler,
    frame: &'c Frame,
    x_error: Option<&'c Value>,
}

impl Ctx<'_> {
    /// Compile the subschema at `segments` below the current schema.
    pub(crate) fn subschema(
        &mut self,
        segments: &[&str],
        parent_keyword: &str,
    ) -> Result<NodeId, SchemaError> {
        let mut pointer = self.frame.pointer.clone();
        let mut resource_pointer = self.frame.resource_pointer.clone();
        for segment in segments {
            let escaped = escape_segment(segment);
            pointer.push('/');
            pointer.push_str(&escaped);
            resource_pointer.push('/');
            resource_pointer.push_str(&escaped);
        }
        let delegated = template_for_subschema(self.x_error, parent_keyword);
        self.compiler.compile_frame(
            Frame {
                document_uri: Arc::clone(&self.frame.document_uri),
                document: Arc::clone(&self.frame.document),
                pointer,
                base: Arc::clone(&self.frame.base),
                resource_pointer,
                vocabularies: self.frame.vocabularies.clone(),
            },
            delegated,
        )
    }

    pub(crate) fn resolve_ref(&mut self, reference: &str) -> Result<NodeId, SchemaError> {
        let base = Arc::clone(&self.frame.base);
        self.compiler.resolve_ref(&base, reference)
    }

    pub(crate) fn resolve_dynamic_ref(
        &mut self,
        reference: &str,
    ) -> Result<(NodeId, Option<Box<str>>), SchemaError> {
        let base = Arc::clone(&self.frame.base);
        self.compiler.resolve_dynamic_ref(&base, reference)
    }

    /// Compile the schema at an absolute pointer within the current document.
    pub(crate) fn resolve_document_pointer(&mut self, pointer: &str) -> Result<NodeId, SchemaError> {
        let target = uri::with_fragment(&self.frame.document_uri, Some(pointer))?;
        self.compiler.resolve_uri(&target)
    }

    pub(crate) fn pattern(&mut self, pattern: &str) -> Result<Arc<CompiledPattern>, SchemaError> {
        self.compiler.patterns.resolve(pattern)
    }

    pub(crate) fn options(&self) -> &ValidationOptions {
        &self.compiler.options
    }

    pub(crate) fn document(&self) -> &Arc<Value> {
        &self.frame.document
    }

    /// In the OpenAPI dialect, a sibling `discriminator` replaces
    /// `oneOf`/`anyOf` dispatch.
    pub(crate) fn discriminator_replaces_combinators(&self) -> bool {
        self.frame.vocabularies.contains(Vocabulary::OasBase)
    }

    pub(crate) fn content_decoder(&self, name: &str) -> Option<ContentDecoder> {
        self.compiler
            .options
            .content_encodings
            .get(name)
            .cloned()
            .or_else(|| content::builtin_decoder(name))
    }

    pub(crate) fn content_parser(&self, name: &str) -> Option<ContentParser> {
        self.compiler
            .options
            .content_media_types
            .get(name)
            .cloned()
            .or_else(|| content::builtin_parser(name))
    }
}

/// Compile `schema` into a [`Validator`].
pub(crate) fn compile(schema: &Value, options: ValidationOptions) -> Result<Validator, SchemaError> {
    let base = options
        .base_uri
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URI.to_string());
    let base_uri = uri::parse(&base)?;
    let default_dialect = options
        .meta_schema
        .as_deref()
        .and_then(Dialect::from_uri)
        .unwrap_or_default();
    let dialect = Dialect::detect(schema, default_dialect);
    let mut compiler = Compiler::new(&base_uri, options)?;
    let root_uri = compiler
        .registry
        .register(&base_uri, Resource::with_dialect(schema.clone(), dialect))?;
    compiler.root_document = Arc::clone(&root_uri);
    let root = compiler.resolve_uri(&root_uri)?;
    compiler.finish(root)
}

/// Compile the schema at `root_pointer` inside `document`, crawling only the
/// listed subtrees for resources (the OpenAPI entry point).
pub(crate) fn compile_at(
    document: &Value,
    options: ValidationOptions,
    dialect: Dialect,
    crawl_roots: &[String],
    root_pointer: &str,
) -> Result<Validator, SchemaError> {
    let base = options
        .base_uri
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URI.to_string());
    let base_uri = uri::parse(&base)?;
    let mut compiler = Compiler::new(&base_uri, options)?;
    let root_uri = compiler.registry.register_with_roots(
        &base_uri,
        Resource::with_dialect(document.clone(), dialect),
        crawl_roots,
    )?;
    compiler.root_document = Arc::clone(&root_uri);
    let target = uri::with_fragment(&root_uri, Some(root_pointer))?;
    let root = compiler.resolve_uri(&target)?;
    compiler.finish(root)
}

impl Compiler {
    fn new(base_uri: &UriString, options: ValidationOptions) -> Result<Compiler, SchemaError> {
        let retriever = options.retriever.clone();
        let registry = match retriever {
            Some(retriever) => Registry::options().shared_retriever(retriever).build(),
            None => Registry::options().build(),
        };
        Ok(Compiler {
            registry,
            patterns: PatternCache::new(options.pattern_engine.clone()),
            options,
            nodes: Vec::new(),
            by_key: AHashMap::new(),
            dynamic_anchors: AHashMap::new(),
            pending_resources: Vec::new(),
            processed_resources: AHashSet::new(),
            vocabulary_cache: AHashMap::new(),
            externals: Vec::new(),
            root_document: Arc::new(uri::fragmentless(base_uri)?),
        })
    }

    fn finish(mut self, root: NodeId) -> Result<Validator, SchemaError> {
        self.drain_pending()?;
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for slot in self.nodes {
            nodes.push(slot.expect("every reserved arena slot is filled during compilation"));
        }
        tracing::debug!(
            nodes = nodes.len(),
            externals = self.externals.len(),
            "schema compiled"
        );
        let root_schema = Arc::clone(&nodes[root.index()].core.root_schema);
        Ok(Validator {
            graph: SchemaGraph::new(nodes, self.dynamic_anchors),
            root,
            root_schema,
            output_format: self.options.output_format,
            access_mode: self.options.access_mode,
            externals: self.externals,
            base_uri: self.root_document,
            resources: self.registry.resource_snapshot(),
            anchors: self.registry.anchor_snapshot(),
        })
    }

    /// Eagerly compile the `$dynamicAnchor` targets of every resource that
    /// compilation entered, to a fixpoint.
    fn drain_pending(&mut self) -> Result<(), SchemaError> {
        while let Some(base) = self.pending_resources.pop() {
            for name in self.registry.dynamic_anchor_names(&base) {
                let target = uri::with_fragment(&base, Some(&name))?;
                let node = self.resolve_uri(&target)?;
                self.dynamic_anchors
                    .entry(Arc::clone(&base))
                    .or_default()
                    .entry(name)
                    .or_insert(node);
            }
        }
        Ok(())
    }

    fn resolve_ref(&mut self, base: &UriString, reference: &str) -> Result<NodeId, SchemaError> {
        let target = uri::resolve_against(base, reference)?;
        self.resolve_uri(&target)
    }

    fn resolve_dynamic_ref(
        &mut self,
        base: &UriString,
        reference: &str,
    ) -> Result<(NodeId, Option<Box<str>>), SchemaError> {
        let target = uri::resolve_against(base, reference)?;
        let lexical = self.resolve_uri(&target)?;
        // The dynamic search only happens when the lexical target itself
        // declares the matching `$dynamicAnchor`.
        let anchor = match uri::decoded_fragment(&target) {
            Some(fragment) if !fragment.is_empty() && !fragment.starts_with('/') => {
                let declares = self
                    .registry
                    .resolve(&target)
                    .ok()
                    .map(|resolved| {
                        resolved.value().get("$dynamicAnchor").and_then(Value::as_str)
                            == Some(fragment.as_str())
                    })
                    .unwrap_or(false);
                declares.then(|| fragment.into_boxed_str())
            }
            _ => None,
        };
        Ok((lexical, anchor))
    }

    fn resolve_uri(&mut self, target: &UriString) -> Result<NodeId, SchemaError> {
        let base = uri::fragmentless(target)?;
        if !self.registry.contains(&base) {
            self.registry.ensure(&base)?;
        }
        let resolved = self.registry.resolve(target)?;
        if !matches!(resolved.value(), Value::Object(_) | Value::Bool(_)) {
            return Err(SchemaError::InvalidRefPointer {
                uri: target.as_str().to_string(),
            });
        }
        self.compile_resolved(&resolved)
    }

    fn compile_resolved(&mut self, resolved: &Resolved) -> Result<NodeId, SchemaError> {
        if resolved.document_uri() != &self.root_document
            && !self
                .externals
                .iter()
                .any(|(uri, _)| uri == resolved.document_uri())
        {
            self.externals.push((
                Arc::clone(resolved.document_uri()),
                Arc::clone(resolved.document()),
            ));
        }
        let vocabularies = self.dialect_vocabularies(resolved.dialect());
        self.compile_frame(
            Frame {
                document_uri: Arc::clone(resolved.document_uri()),
                document: Arc::clone(resolved.document()),
                pointer: resolved.pointer().to_string(),
                base: Arc::clone(resolved.base()),
                resource_pointer: resolved.resource_pointer().to_string(),
                vocabularies,
            },
            None,
        )
    }

    fn compile_frame(
        &mut self,
        frame: Frame,
        delegated_template: Option<String>,
    ) -> Result<NodeId, SchemaError> {
        let key = (Arc::clone(&frame.document_uri), frame.pointer.clone());
        if let Some(existing) = self.by_key.get(&key) {
            return Ok(*existing);
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(None);
        self.by_key.insert(key, id);
        let node = self.compile_value(id, frame, delegated_template)?;
        self.nodes[id.index()] = Some(node);
        Ok(id)
    }

    fn apply_option_overrides(&self, mut set: VocabularySet) -> VocabularySet {
        if self.options.format_assertion {
            set.assert_formats();
        }
        set
    }

    fn dialect_vocabularies(&self, dialect: Dialect) -> VocabularySet {
        let set = self
            .options
            .vocabularies
            .clone()
            .unwrap_or_else(|| dialect.default_vocabularies());
        self.apply_option_overrides(set)
    }

    /// The vocabulary set declared by the meta-schema at `meta_uri`.
    fn vocabularies_for_meta(&mut self, meta_uri: &str) -> Result<VocabularySet, SchemaError> {
        if let Some(dialect) = Dialect::from_uri(meta_uri) {
            return Ok(self.dialect_vocabularies(dialect));
        }
        if let Some(cached) = self.vocabulary_cache.get(meta_uri) {
            return Ok(self.apply_option_overrides(cached.clone()));
        }
        let target = uri::parse(meta_uri)?;
        let base = uri::fragmentless(&target)?;
        self.registry.ensure(&base)?;
        let resolved = self.registry.resolve(&target)?;
        let set = match resolved.value().get("$vocabulary") {
            Some(Value::Object(declarations)) => VocabularySet::from_object(declarations)?,
            _ => Dialect::detect(resolved.value(), Dialect::Draft202012).default_vocabularies(),
        };
        self.vocabulary_cache
            .insert(meta_uri.to_string(), set.clone());
        Ok(self.apply_option_overrides(set))
    }

    fn compile_value(
        &mut self,
        id: NodeId,
        mut frame: Frame,
        delegated_template: Option<String>,
    ) -> Result<SchemaNode, SchemaError> {
        let document = Arc::clone(&frame.document);
        let Some(value) = lookup(&document, &frame.pointer) else {
            return Err(SchemaError::InvalidRefPointer {
                uri: format!("{}#{}", frame.document_uri, frame.pointer),
            });
        };
        let object = match value {
            Value::Bool(accepts) => {
                let inner = if *accepts {
                    NodeInner::AlwaysValid
                } else {
                    NodeInner::AlwaysInvalid
                };
                return Ok(SchemaNode {
                    core: Arc::new(NodeCore {
                        value: Arc::new(value.clone()),
                        schema_pointer: Location::from(frame.pointer.as_str()),
                        absolute_location: node_absolute(&frame),
                        root_schema: document,
                        error_template: delegated_template,
                    }),
                    inner,
                    resource: None,
                    needs_full: false,
                });
            }
            Value::Object(object) => object,
            _ => {
                return Err(SchemaError::InvalidRefPointer {
                    uri: format!("{}#{}", frame.document_uri, frame.pointer),
                })
            }
        };

        let is_document_root = frame.pointer.is_empty();
        let declares_id = object.contains_key("$id");
        // `$schema` is honored at resource roots only.
        if is_document_root || declares_id {
            if let Some(meta) = object.get("$schema").and_then(Value::as_str) {
                let meta = uri::resolve_against(&frame.base, meta)?;
                frame.vocabularies = self.vocabularies_for_meta(meta.as_str())?;
            }
        }
        // Validate `$vocabulary` declarations even though only meta-schema
        // users consume them: unknown required vocabularies are authoring
        // errors.
        if let Some(Value::Object(declarations)) = object.get("$vocabulary") {
            VocabularySet::from_object(declarations)?;
        }
        // Inline-discovered resources rebase here; targets arriving through
        // the registry already carry their own base.
        if let Some(identifier) = object.get("$id").and_then(Value::as_str) {
            if !frame.resource_pointer.is_empty() {
                let rebased = uri::fragmentless(&uri::resolve_against(&frame.base, identifier)?)?;
                frame.base = Arc::new(rebased);
                frame.resource_pointer = String::new();
            }
        }
        let resource = (is_document_root || declares_id).then(|| Arc::clone(&frame.base));
        if let Some(base) = &resource {
            if self.processed_resources.insert(Arc::clone(base)) {
                self.pending_resources.push(Arc::clone(base));
            }
        }
        if let Some(name) = object.get("$dynamicAnchor").and_then(Value::as_str) {
            self.dynamic_anchors
                .entry(Arc::clone(&frame.base))
                .or_default()
                .entry(name.to_string())
                .or_insert(id);
        }

        let x_error = object.get("x-error");
        let schema_value = Arc::new(value.clone());
        let schema_pointer = Location::from(frame.pointer.as_str());
        let mut compiled: Vec<Keyword> = Vec::new();
        let mut handled: AHashSet<&str> = STRUCTURAL.iter().copied().collect();
        let vocabularies = frame.vocabularies.clone();
        for vocabulary in vocabularies.iter() {
            for spec in keywords::table(vocabulary) {
                if handled.contains(spec.name) {
                    continue;
                }
                let Some(keyword_value) = object.get(spec.name) else {
                    continue;
                };
                handled.insert(spec.name);
                let core = keyword_core(
                    &frame,
                    &schema_value,
                    &schema_pointer,
                    &document,
                    x_error,
                    spec.name,
                    spec.kind,
                    keyword_value,
                );
                let mut ctx = Ctx {
                    compiler: self,
                    frame: &frame,
                    x_error,
                };
                if let Some(keyword) = (spec.factory)(&mut ctx, object, keyword_value, core)? {
                    compiled.push(keyword);
                }
            }
        }
        // Whatever remains is unrecognized: keep it as an annotation so
        // `$ref` can still navigate into it.
        for (name, keyword_value) in object {
            if handled.contains(name.as_str()) {
                continue;
            }
            let core = keyword_core(
                &frame,
                &schema_value,
                &schema_pointer,
                &document,
                x_error,
                name,
                KeywordKind::Annotation,
                keyword_value,
            );
            let mut ctx = Ctx {
                compiler: self,
                frame: &frame,
                x_error,
            };
            if let Some(keyword) =
                keywords::annotations::compile_annotation(&mut ctx, object, keyword_value, core)?
            {
                compiled.push(keyword);
            }
        }

        let needs_full = compiled
            .iter()
            .any(|keyword| keyword.evaluator.needs_adjacent());
        Ok(SchemaNode {
            core: Arc::new(NodeCore {
                value: schema_value,
                schema_pointer,
                absolute_location: node_absolute(&frame),
                root_schema: document,
                error_template: delegated_template,
            }),
            inner: NodeInner::Keywords(compiled.into_boxed_slice()),
            resource,
            needs_full,
        })
    }
}

fn node_absolute(frame: &Frame) -> Arc<str> {
    Arc::from(format!("{}#{}", frame.base, frame.resource_pointer))
}

#[allow(clippy::too_many_arguments)]
fn keyword_core(
    frame: &Frame,
    schema_value: &Arc<Value>,
    schema_pointer: &Location,
    document: &Arc<Value>,
    x_error: Option<&Value>,
    name: &str,
    kind: KeywordKind,
    keyword_value: &Value,
) -> KeywordCore {
    KeywordCore {
        name: name.into(),
        kind,
        value: Arc::new(keyword_value.clone()),
        schema: Arc::clone(schema_value),
        schema_pointer: schema_pointer.clone(),
        absolute_location: Arc::from(format!(
            "{}#{}/{}",
            frame.base,
            frame.resource_pointer,
            escape_segment(name)
        )),
        root_schema: Arc::clone(document),
        template: template_for(x_error, name),
    }
}
