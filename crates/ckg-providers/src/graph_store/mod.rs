//! Graph store providers.
//!
//! The bolt-backed client and the in-memory store share clamping and
//! request-normalization helpers so traversal semantics stay identical.

mod memory;
mod neo4j;

pub use memory::InMemoryGraphStore;
pub use neo4j::{Neo4jConfig, Neo4jGraphStore};

use ckg_domain::entities::NodeKind;
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{
    ContextRequest, DependencyRequest, TraversalRequest, MAX_CONTEXT_LIMIT, MAX_TRAVERSAL_DEPTH,
    MAX_TRAVERSAL_LIMIT,
};
use ckg_domain::value_objects::NodeRef;

/// Clamp traversal depth/limit to their maxima (silently, per contract).
pub(crate) fn clamp_traversal(request: &TraversalRequest) -> (u32, usize) {
    let depth = request.depth.clamp(1, MAX_TRAVERSAL_DEPTH);
    let limit = request.limit.clamp(1, MAX_TRAVERSAL_LIMIT);
    (depth, limit)
}

/// Clamp dependency depth to its maximum.
pub(crate) fn clamp_dependency_depth(request: &DependencyRequest) -> u32 {
    request.max_depth.clamp(1, MAX_TRAVERSAL_DEPTH)
}

/// Clamp context limit to its maximum.
pub(crate) fn clamp_context_limit(request: &ContextRequest) -> usize {
    request.limit.clamp(1, MAX_CONTEXT_LIMIT)
}

/// Validate that a node reference carries the repository scope its kind
/// requires.
pub(crate) fn validate_node_ref(node_ref: &NodeRef) -> Result<()> {
    if node_ref.identifier.trim().is_empty() {
        return Err(Error::invalid_parameters("node identifier must not be empty"));
    }
    let needs_repository = !matches!(node_ref.kind, NodeKind::Repository | NodeKind::Module);
    if needs_repository && node_ref.repository.is_none() {
        return Err(Error::invalid_parameters(format!(
            "{} reference '{}' requires a repository scope",
            node_ref.kind.label(),
            node_ref.identifier
        )));
    }
    Ok(())
}
