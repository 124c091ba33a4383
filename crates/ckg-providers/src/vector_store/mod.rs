//! Vector store providers.
//!
//! Both implementations share the boundary validation rules and the cosine
//! distance-to-similarity conversion so search semantics cannot drift
//! between the HTTP client and the in-memory store used in tests.

mod chroma;
mod memory;

pub use chroma::{ChromaConfig, ChromaVectorStore};
pub use memory::InMemoryVectorStore;

use std::collections::HashMap;

use serde_json::Value;

use ckg_domain::entities::VectorDocument;
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::SearchRequest;

/// Convert a raw cosine distance `d ∈ [0, 2]` to a similarity in `[0, 1]`.
///
/// Satisfies `similarity = clamp(1 - d/2, 0, 1)` exactly: inputs 0, 1, 2
/// map to 1, 0.5, 0.
#[must_use]
pub fn distance_to_similarity(distance: f32) -> f32 {
    (1.0 - distance / 2.0).clamp(0.0, 1.0)
}

/// Reject empty collection names.
pub(crate) fn validate_collection_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid_parameters("collection name must not be empty"));
    }
    Ok(())
}

/// Reject malformed documents: empty ids or empty embeddings.
pub(crate) fn validate_documents(docs: &[VectorDocument]) -> Result<()> {
    for doc in docs {
        if doc.id.trim().is_empty() {
            return Err(Error::invalid_parameters("document id must not be empty"));
        }
        if doc.embedding.is_empty() {
            return Err(Error::invalid_parameters(format!(
                "document '{}' has an empty embedding",
                doc.id
            )));
        }
    }
    Ok(())
}

/// Reject out-of-range search parameters.
pub(crate) fn validate_search(request: &SearchRequest) -> Result<()> {
    if request.embedding.is_empty() {
        return Err(Error::invalid_parameters("query embedding must not be empty"));
    }
    if request.limit < 1 {
        return Err(Error::invalid_parameters("limit must be at least 1"));
    }
    if !(0.0..=1.0).contains(&request.threshold) {
        return Err(Error::invalid_parameters(format!(
            "threshold must be within [0, 1], got {}",
            request.threshold
        )));
    }
    Ok(())
}

/// Stringify non-scalar metadata values at the store boundary.
///
/// The backing store only accepts primitive scalars; arrays and objects are
/// serialized to their JSON text.
pub(crate) fn normalize_metadata(metadata: &HashMap<String, Value>) -> HashMap<String, Value> {
    metadata
        .iter()
        .map(|(key, value)| {
            let normalized = match value {
                Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
                Value::Array(_) | Value::Object(_) => Value::from(value.to_string()),
            };
            (key.clone(), normalized)
        })
        .collect()
}
