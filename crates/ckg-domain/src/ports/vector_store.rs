//! Vector store provider port.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::entities::{CollectionInfo, SearchResult, VectorDocument};
use crate::error::Result;

/// A thresholded similarity search across one or more collections.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Query embedding
    pub embedding: Vec<f32>,
    /// Collections to search; missing ones are skipped with a warning
    pub collections: Vec<String>,
    /// Maximum merged results
    pub limit: usize,
    /// Minimum similarity in `[0, 1]`
    pub threshold: f32,
}

/// Vector storage port: collection lifecycle, document batches, and
/// thresholded similarity search.
///
/// Implementations wrap backend failures into typed errors at this boundary
/// (network → `CONNECTION_ERROR`, document ops → `DOCUMENT_OPERATION_ERROR`,
/// search → `SEARCH_OPERATION_ERROR`).
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Establish the backend connection.
    async fn connect(&self) -> Result<()>;

    /// Probe backend liveness.
    async fn health_check(&self) -> Result<()>;

    /// Release the backend connection.
    async fn disconnect(&self) -> Result<()>;

    /// Idempotently create (or fetch) a collection using cosine distance and
    /// cache its handle.
    async fn get_or_create_collection(&self, name: &str) -> Result<()>;

    /// Remove a collection and drop its cached handle.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// List all collections with counts and metadata.
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>>;

    /// Batch-insert documents; fails if any document is malformed.
    async fn add_documents(&self, collection: &str, docs: &[VectorDocument]) -> Result<()>;

    /// Idempotent add-or-update with the same validation contract as
    /// [`Self::add_documents`].
    async fn upsert_documents(&self, collection: &str, docs: &[VectorDocument]) -> Result<()>;

    /// Idempotently delete documents by id. An empty id list issues no
    /// backend call; a missing collection is `COLLECTION_NOT_FOUND`.
    async fn delete_documents(&self, collection: &str, ids: &[String]) -> Result<()>;

    /// Filtered scan by metadata equality conjunction. An empty where-clause
    /// is `INVALID_PARAMETERS`.
    async fn get_documents_by_metadata(
        &self,
        collection: &str,
        where_clause: &HashMap<String, Value>,
        include_embeddings: bool,
    ) -> Result<Vec<VectorDocument>>;

    /// Delete every chunk document for `(repository, file_path)` and return
    /// the deleted count.
    async fn delete_documents_by_file_prefix(
        &self,
        collection: &str,
        repository: &str,
        file_path: &str,
    ) -> Result<usize>;

    /// Thresholded similarity search merged across collections, sorted by
    /// similarity descending, truncated to `limit`.
    async fn similarity_search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;
}
