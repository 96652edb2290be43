//! The compiled schema arena.
//!
//! Every compiled schema lives in one flat arena; subschema and reference
//! edges are [`NodeId`] indices, so self-referential and mutually-recursive
//! schemas need no ownership cycles.

use ahash::AHashMap;
use std::sync::Arc;

use schemata_referencing::UriString;

use crate::node::SchemaNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> NodeId {
        NodeId(u32::try_from(index).expect("schema arena exceeds u32 indices"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

pub(crate) struct SchemaGraph {
    nodes: Vec<SchemaNode>,
    /// `(resource base, anchor name)` to the anchored schema, consulted by
    /// `$dynamicRef` while walking the dynamic scope.
    dynamic_anchors: AHashMap<Arc<UriString>, AHashMap<String, NodeId>>,
}

impl SchemaGraph {
    pub(crate) fn new(
        nodes: Vec<SchemaNode>,
        dynamic_anchors: AHashMap<Arc<UriString>, AHashMap<String, NodeId>>,
    ) -> SchemaGraph {
        SchemaGraph {
            nodes,
            dynamic_anchors,
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn dynamic_anchor(&self, base: &UriString, name: &str) -> Option<NodeId> {
        self.dynamic_anchors.get(base)?.get(name).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}
