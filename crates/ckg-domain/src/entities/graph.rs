//! Graph entities: nodes, relationships, and subgraphs.
//!
//! Nodes carry deterministic ids derived from their identifying attributes so
//! MERGE semantics stay idempotent across re-ingestion. Relationships are kept
//! as `(from_id, to_id, type, properties)` tuples end-to-end; the in-memory
//! representation is never a cyclic object graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of node stored in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// An indexed source repository
    Repository,
    /// A file inside a repository
    File,
    /// A function or method definition
    Function,
    /// A class definition
    Class,
    /// An interface definition
    Interface,
    /// A type alias definition
    TypeAlias,
    /// An enum definition
    Enum,
    /// An external package marker
    Module,
    /// A vector-store chunk mirror
    Chunk,
}

impl NodeKind {
    /// Graph label for this node kind.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Repository => "Repository",
            Self::File => "File",
            Self::Function => "Function",
            Self::Class => "Class",
            Self::Interface => "Interface",
            Self::TypeAlias => "TypeAlias",
            Self::Enum => "Enum",
            Self::Module => "Module",
            Self::Chunk => "Chunk",
        }
    }

    /// Parse a label back into a node kind.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Repository" => Some(Self::Repository),
            "File" => Some(Self::File),
            "Function" => Some(Self::Function),
            "Class" => Some(Self::Class),
            "Interface" => Some(Self::Interface),
            "TypeAlias" => Some(Self::TypeAlias),
            "Enum" => Some(Self::Enum),
            "Module" => Some(Self::Module),
            "Chunk" => Some(Self::Chunk),
            _ => None,
        }
    }
}

/// Kind of directed relationship stored in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    /// Repository → File ownership
    Contains,
    /// File → entity definition
    Defines,
    /// File → Module import
    Imports,
    /// Function → Function call
    Calls,
    /// Cross-file pointer (also the transitive placeholder in dependency queries)
    References,
    /// File → Chunk mirror
    HasChunk,
}

impl RelationshipKind {
    /// Graph relationship-type string for this kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Contains => "CONTAINS",
            Self::Defines => "DEFINES",
            Self::Imports => "IMPORTS",
            Self::Calls => "CALLS",
            Self::References => "REFERENCES",
            Self::HasChunk => "HAS_CHUNK",
        }
    }

    /// Parse a relationship-type string back into a kind.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "CONTAINS" => Some(Self::Contains),
            "DEFINES" => Some(Self::Defines),
            "IMPORTS" => Some(Self::Imports),
            "CALLS" => Some(Self::Calls),
            "REFERENCES" => Some(Self::References),
            "HAS_CHUNK" => Some(Self::HasChunk),
            _ => None,
        }
    }
}

/// A node ready to be upserted into the graph store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Deterministic id (see [`crate::value_objects::node_id`])
    pub id: String,
    /// Node label; must satisfy label validation before reaching the store
    pub label: String,
    /// Flat property map; values are JSON scalars or arrays of scalars
    pub properties: HashMap<String, Value>,
}

impl GraphNode {
    /// Create a node with the given id and label and an empty property map.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties: HashMap::new(),
        }
    }

    /// Builder-style property insertion.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A directed, typed relationship ready to be upserted into the graph store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRelationship {
    /// Source node id
    pub from_id: String,
    /// Target node id
    pub to_id: String,
    /// Relationship type; must satisfy type validation before reaching the store
    pub rel_type: String,
    /// Flat property map
    pub properties: HashMap<String, Value>,
}

impl GraphRelationship {
    /// Create a relationship with an empty property map.
    #[must_use]
    pub fn new(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        rel_type: impl Into<String>,
    ) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            rel_type: rel_type.into(),
            properties: HashMap::new(),
        }
    }

    /// Builder-style property insertion.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A bounded subgraph returned by traversal queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subgraph {
    /// Nodes deduplicated by id
    pub nodes: Vec<GraphNode>,
    /// Relationships deduplicated by (from, to, type)
    pub relationships: Vec<GraphRelationship>,
}

impl Subgraph {
    /// Push a node unless one with the same id is already present.
    pub fn add_node(&mut self, node: GraphNode) {
        if !self.nodes.iter().any(|n| n.id == node.id) {
            self.nodes.push(node);
        }
    }

    /// Push a relationship unless an identical (from, to, type) edge is present.
    pub fn add_relationship(&mut self, rel: GraphRelationship) {
        let duplicate = self.relationships.iter().any(|r| {
            r.from_id == rel.from_id && r.to_id == rel.to_id && r.rel_type == rel.rel_type
        });
        if !duplicate {
            self.relationships.push(rel);
        }
    }
}
