//! Graph store provider port and its request/response types.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{GraphNode, GraphRelationship, RelationshipKind, Subgraph};
use crate::error::Result;
use crate::value_objects::NodeRef;

/// Maximum traversal depth; larger requests are silently clamped.
pub const MAX_TRAVERSAL_DEPTH: u32 = 5;

/// Maximum traversal result size; larger requests are silently clamped.
pub const MAX_TRAVERSAL_LIMIT: usize = 1000;

/// Maximum context-expansion result size; larger requests are silently clamped.
pub const MAX_CONTEXT_LIMIT: usize = 100;

/// Fixed relevance annotation for direct context connections.
pub const CONTEXT_RELEVANCE: f32 = 0.8;

/// A bounded subgraph traversal rooted at one node.
#[derive(Debug, Clone)]
pub struct TraversalRequest {
    /// Root of the traversal
    pub start: NodeRef,
    /// Relationship kinds to follow; empty means all kinds
    pub relationships: Vec<RelationshipKind>,
    /// Expansion depth, clamped to [`MAX_TRAVERSAL_DEPTH`]
    pub depth: u32,
    /// Result bound, clamped to [`MAX_TRAVERSAL_LIMIT`]
    pub limit: usize,
}

/// Direction of a dependency analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyDirection {
    /// Edges leaving the target
    DependsOn,
    /// Edges arriving at the target
    DependedOnBy,
    /// Union of both orientations
    Both,
}

/// A dependency analysis request.
#[derive(Debug, Clone)]
pub struct DependencyRequest {
    /// Node under analysis
    pub target: NodeRef,
    /// Orientation of the analysis
    pub direction: DependencyDirection,
    /// Whether to include transitive dependencies
    pub transitive: bool,
    /// Transitive depth, clamped to [`MAX_TRAVERSAL_DEPTH`]
    pub max_depth: u32,
}

/// One node reached by a dependency analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEntry {
    /// Deterministic node id
    pub id: String,
    /// Node label
    pub label: String,
    /// Display name
    pub name: String,
    /// Relationship type that reached this node
    pub relationship: String,
}

/// Result of a dependency analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyReport {
    /// Nodes one edge away
    pub direct: Vec<DependencyEntry>,
    /// Nodes further away, excluding the target and anything direct
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitive: Option<Vec<DependencyEntry>>,
    /// `min(1, (|direct| + |transitive|) / 100)`
    pub impact_score: f64,
    /// Analysis metadata (direction, depth, timings)
    pub metadata: HashMap<String, Value>,
}

/// Kinds of context expansion around seed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    /// Modules the seed imports
    Imports,
    /// Functions calling the seed
    Callers,
    /// Functions the seed calls
    Callees,
    /// Nodes sharing a CONTAINS or DEFINES parent
    Siblings,
    /// Referenced documentation files (`md`, `txt`, `rst`)
    Documentation,
}

impl ContextKind {
    /// Reason string attached to results of this kind.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Imports => "imported by seed",
            Self::Callers => "calls seed",
            Self::Callees => "called by seed",
            Self::Siblings => "shares parent with seed",
            Self::Documentation => "documentation referenced by seed",
        }
    }
}

/// A context-expansion request.
#[derive(Debug, Clone)]
pub struct ContextRequest {
    /// Seed nodes
    pub seeds: Vec<NodeRef>,
    /// Requested context kinds; one batched query is issued per kind
    pub include: Vec<ContextKind>,
    /// Result bound, clamped to [`MAX_CONTEXT_LIMIT`]
    pub limit: usize,
}

/// One node produced by context expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    /// Deterministic node id
    pub id: String,
    /// Node label
    pub label: String,
    /// Display name
    pub name: String,
    /// Context kind that produced this item
    pub kind: ContextKind,
    /// Fixed relevance for direct connections
    pub relevance: f32,
    /// Human-readable reason
    pub reason: String,
}

/// Node and relationship batches replacing one file's entity subgraph.
#[derive(Debug, Clone, Default)]
pub struct FileSubgraph {
    /// Nodes to upsert, grouped upstream by label
    pub nodes: Vec<GraphNode>,
    /// Relationships to upsert after all nodes exist
    pub relationships: Vec<GraphRelationship>,
}

/// Graph storage port: parameterized queries, node/edge upserts, cascade
/// deletes, and the three higher-level read queries.
///
/// Every label or relationship type reaching an implementation must already
/// satisfy `[A-Za-z][A-Za-z0-9_]*`; implementations re-validate before
/// composing query text and bind all values as parameters.
#[async_trait]
pub trait GraphStoreProvider: Send + Sync {
    /// Establish the backend connection.
    async fn connect(&self) -> Result<()>;

    /// Release the backend connection.
    async fn disconnect(&self) -> Result<()>;

    /// Probe backend liveness.
    async fn health_check(&self) -> Result<()>;

    /// Run a parameterized query and convert the named columns of each row
    /// into JSON values (driver integers stay 64-bit until this boundary).
    async fn run_query(
        &self,
        query: &str,
        params: HashMap<String, Value>,
        columns: &[&str],
    ) -> Result<Vec<HashMap<String, Value>>>;

    /// Idempotently upsert one node by deterministic id.
    async fn upsert_node(&self, node: &GraphNode) -> Result<()>;

    /// DETACH DELETE one node by id and label.
    async fn delete_node(&self, id: &str, label: &str) -> Result<()>;

    /// Idempotently create one relationship.
    async fn create_relationship(&self, rel: &GraphRelationship) -> Result<()>;

    /// Delete one relationship by endpoints and type.
    async fn delete_relationship(&self, from_id: &str, to_id: &str, rel_type: &str) -> Result<()>;

    /// Batch-upsert nodes sharing one label; a single parameterized query.
    async fn upsert_nodes(&self, label: &str, nodes: &[GraphNode]) -> Result<()>;

    /// Batch-upsert relationships sharing one type; a single parameterized query.
    async fn create_relationships(&self, rel_type: &str, rels: &[GraphRelationship]) -> Result<()>;

    /// Cascade-delete a repository's entire subgraph (DETACH DELETE of the
    /// repository and everything it owns through CONTAINS/DEFINES/HAS_CHUNK).
    async fn delete_repository_subgraph(&self, repository: &str) -> Result<()>;

    /// Cascade-delete one file node and the entities it DEFINES.
    async fn delete_file_subgraph(&self, repository: &str, file_path: &str) -> Result<()>;

    /// Replace one file's entity subgraph: delete prior DEFINES targets,
    /// then upsert the fresh nodes and relationships as batches.
    async fn replace_file_subgraph(
        &self,
        repository: &str,
        file_path: &str,
        subgraph: &FileSubgraph,
    ) -> Result<()>;

    /// Whether a repository node exists.
    async fn repository_exists(&self, repository: &str) -> Result<bool>;

    /// Bounded subgraph traversal (depth/limit silently clamped).
    async fn traverse(&self, request: &TraversalRequest) -> Result<Subgraph>;

    /// Dependency analysis along `IMPORTS|CALLS|REFERENCES`.
    async fn analyze_dependencies(&self, request: &DependencyRequest) -> Result<DependencyReport>;

    /// Context expansion: one batched query per requested kind, deduplicated
    /// across seeds, capped by the clamped limit.
    async fn get_context(&self, request: &ContextRequest) -> Result<Vec<ContextItem>>;
}
