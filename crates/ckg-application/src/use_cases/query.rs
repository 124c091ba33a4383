//! Query service: validated fan-out over the graph store.
//!
//! Thin layer over the graph port. Inputs are rejected here with
//! `INVALID_PARAMETERS`; everything the store raises propagates with its
//! kind preserved.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ckg_domain::entities::{NodeKind, RelationshipKind, Subgraph};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{
    ContextItem, ContextRequest, DependencyReport, DependencyRequest, GraphStoreProvider,
    TraversalRequest, MAX_CONTEXT_LIMIT, MAX_TRAVERSAL_DEPTH,
};
use ckg_domain::value_objects::NodeRef;

/// Projection granularity for architecture queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Repositories, files, and external modules
    Modules,
    /// Repositories and files with cross-file references
    Files,
    /// Files plus the entities they define and their calls
    Entities,
}

/// An architecture query scoped to one repository.
#[derive(Debug, Clone)]
pub struct ArchitectureRequest {
    /// Repository to describe
    pub repository: String,
    /// Projection granularity
    pub detail_level: DetailLevel,
}

/// Repository architecture projected by detail level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureView {
    /// Repository described
    pub repository: String,
    /// Projection granularity used
    pub detail_level: DetailLevel,
    /// Projected subgraph
    pub subgraph: Subgraph,
}

/// Dependency, architecture, and context-expansion queries.
pub struct QueryService {
    graph: Arc<dyn GraphStoreProvider>,
}

impl QueryService {
    /// Create the service over a graph store handle.
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStoreProvider>) -> Self {
        Self { graph }
    }

    fn require_repository_scope(node_ref: &NodeRef) -> Result<()> {
        let needs_repository = !matches!(node_ref.kind, NodeKind::Repository | NodeKind::Module);
        if needs_repository && node_ref.repository.is_none() {
            return Err(Error::invalid_parameters(format!(
                "'{}' requires a repository scope",
                node_ref.identifier
            )));
        }
        Ok(())
    }

    /// Dependency analysis for one node.
    ///
    /// # Errors
    ///
    /// `INVALID_PARAMETERS` for missing repository scope or out-of-range
    /// depth; graph errors propagate unchanged.
    pub async fn get_dependencies(&self, request: DependencyRequest) -> Result<DependencyReport> {
        Self::require_repository_scope(&request.target)?;
        if request.max_depth == 0 || request.max_depth > MAX_TRAVERSAL_DEPTH {
            return Err(Error::invalid_parameters(format!(
                "maxDepth must be within 1..={MAX_TRAVERSAL_DEPTH}, got {}",
                request.max_depth
            )));
        }
        self.graph.analyze_dependencies(&request).await
    }

    /// Repository architecture at the requested granularity.
    ///
    /// # Errors
    ///
    /// `INVALID_PARAMETERS` for an empty repository name; graph errors
    /// propagate unchanged.
    pub async fn get_architecture(&self, request: ArchitectureRequest) -> Result<ArchitectureView> {
        if request.repository.trim().is_empty() {
            return Err(Error::invalid_parameters("repository must not be empty"));
        }
        let (relationships, depth, keep_labels): (Vec<RelationshipKind>, u32, &[&str]) =
            match request.detail_level {
                DetailLevel::Modules => (
                    vec![RelationshipKind::Contains, RelationshipKind::Imports],
                    2,
                    &["Repository", "File", "Module"],
                ),
                DetailLevel::Files => (
                    vec![RelationshipKind::Contains, RelationshipKind::References],
                    2,
                    &["Repository", "File"],
                ),
                DetailLevel::Entities => (
                    vec![
                        RelationshipKind::Contains,
                        RelationshipKind::Defines,
                        RelationshipKind::Calls,
                    ],
                    3,
                    &["Repository", "File", "Function", "Class", "Interface", "TypeAlias", "Enum"],
                ),
            };
        let mut subgraph = self
            .graph
            .traverse(&TraversalRequest {
                start: NodeRef::repository(&request.repository),
                relationships,
                depth,
                limit: 1000,
            })
            .await?;

        subgraph
            .nodes
            .retain(|node| keep_labels.contains(&node.label.as_str()));
        let kept: std::collections::HashSet<&str> =
            subgraph.nodes.iter().map(|n| n.id.as_str()).collect();
        subgraph.relationships.retain(|rel| {
            kept.contains(rel.from_id.as_str()) && kept.contains(rel.to_id.as_str())
        });

        Ok(ArchitectureView {
            repository: request.repository,
            detail_level: request.detail_level,
            subgraph,
        })
    }

    /// Context expansion around seed nodes.
    ///
    /// # Errors
    ///
    /// `INVALID_PARAMETERS` for empty seeds, missing repository scope, or an
    /// out-of-range limit; graph errors propagate unchanged.
    pub async fn get_related_context(&self, request: ContextRequest) -> Result<Vec<ContextItem>> {
        if request.seeds.is_empty() {
            return Err(Error::invalid_parameters("seeds must not be empty"));
        }
        for seed in &request.seeds {
            Self::require_repository_scope(seed)?;
        }
        if request.limit == 0 || request.limit > MAX_CONTEXT_LIMIT {
            return Err(Error::invalid_parameters(format!(
                "limit must be within 1..={MAX_CONTEXT_LIMIT}, got {}",
                request.limit
            )));
        }
        self.graph.get_context(&request).await
    }
}
