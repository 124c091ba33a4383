//! Chroma vector store client over the REST API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use ckg_domain::entities::{CollectionInfo, SearchResult, VectorDocument};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{SearchRequest, VectorStoreProvider};

use super::{
    distance_to_similarity, normalize_metadata, validate_collection_name, validate_documents,
    validate_search,
};
use crate::constants::{DEFAULT_CHROMA_URL, VECTOR_STORE_REQUEST_TIMEOUT_SECS};

/// Chroma connection configuration.
#[derive(Debug, Clone)]
pub struct ChromaConfig {
    /// Base URL of the Chroma server
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHROMA_URL.to_owned(),
            request_timeout: Duration::from_secs(VECTOR_STORE_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Cached handle for a resolved collection.
#[derive(Debug, Clone)]
struct CollectionHandle {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
    name: String,
    #[serde(default)]
    metadata: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<HashMap<String, Value>>>>,
    #[serde(default)]
    embeddings: Option<Vec<Option<Vec<f32>>>>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    distances: Vec<Vec<f32>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<HashMap<String, Value>>>>>,
}

/// Vector store provider backed by a Chroma server.
///
/// Collections are created with cosine distance and resolved handles are
/// cached in-process; the cache entry is invalidated on delete.
pub struct ChromaVectorStore {
    config: ChromaConfig,
    client: Client,
    collections: DashMap<String, CollectionHandle>,
}

impl ChromaVectorStore {
    /// Create a client against the configured server.
    ///
    /// # Errors
    ///
    /// Returns `CONNECTION_ERROR` when the HTTP client cannot be built.
    pub fn new(config: ChromaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::connection_with_source("failed to build HTTP client", e))?;
        Ok(Self {
            config,
            client,
            collections: DashMap::new(),
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Resolve a collection handle, consulting the cache first.
    async fn resolve_collection(&self, name: &str) -> Result<CollectionHandle> {
        validate_collection_name(name)?;
        if let Some(handle) = self.collections.get(name) {
            return Ok(handle.clone());
        }
        let response = self
            .client
            .get(self.api(&format!("/collections/{name}")))
            .send()
            .await
            .map_err(wrap_transport)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::collection_not_found(name)),
            status if status.is_success() => {
                let body: CollectionResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::collection_operation_with_source("malformed collection response", e))?;
                let handle = CollectionHandle { id: body.id };
                self.collections.insert(name.to_owned(), handle.clone());
                Ok(handle)
            }
            status => Err(Error::collection_operation(format!(
                "collection lookup for '{name}' failed with status {status}"
            ))),
        }
    }

    /// Build the add/upsert payload shared by both document writes.
    fn document_payload(docs: &[VectorDocument]) -> Value {
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        let embeddings: Vec<&[f32]> = docs.iter().map(|d| d.embedding.as_slice()).collect();
        let documents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        let metadatas: Vec<HashMap<String, Value>> =
            docs.iter().map(|d| normalize_metadata(&d.metadata)).collect();
        json!({
            "ids": ids,
            "embeddings": embeddings,
            "documents": documents,
            "metadatas": metadatas,
        })
    }

    async fn write_documents(
        &self,
        collection: &str,
        docs: &[VectorDocument],
        endpoint: &str,
    ) -> Result<()> {
        validate_documents(docs)?;
        if docs.is_empty() {
            return Ok(());
        }
        let handle = self.resolve_collection(collection).await?;
        let response = self
            .client
            .post(self.api(&format!("/collections/{}/{endpoint}", handle.id)))
            .json(&Self::document_payload(docs))
            .send()
            .await
            .map_err(wrap_transport)?;
        if !response.status().is_success() {
            return Err(Error::document_operation(format!(
                "{endpoint} of {} documents into '{collection}' failed with status {}",
                docs.len(),
                response.status()
            )));
        }
        debug!(collection, count = docs.len(), endpoint, "Documents written");
        Ok(())
    }

    /// Query one collection and convert hits above the threshold.
    async fn search_collection(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>> {
        let handle = self.resolve_collection(collection).await?;
        let response = self
            .client
            .post(self.api(&format!("/collections/{}/query", handle.id)))
            .json(&json!({
                "query_embeddings": [request.embedding],
                "n_results": request.limit,
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()
            .await
            .map_err(wrap_transport)?;
        if !response.status().is_success() {
            return Err(Error::search_operation(format!(
                "query against '{collection}' failed with status {}",
                response.status()
            )));
        }
        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::search_operation(format!("malformed query response: {e}")))?;

        let ids = body.ids.into_iter().next().unwrap_or_default();
        let distances = body.distances.into_iter().next().unwrap_or_default();
        let documents = body
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let metadatas = body
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default();

        let mut results = Vec::new();
        for (index, (id, distance)) in ids.into_iter().zip(distances).enumerate() {
            let similarity = distance_to_similarity(distance);
            if similarity < request.threshold {
                continue;
            }
            results.push(SearchResult {
                id,
                content: documents
                    .get(index)
                    .and_then(|d| d.clone())
                    .unwrap_or_default(),
                similarity,
                collection: collection.to_owned(),
                metadata: metadatas
                    .get(index)
                    .and_then(|m| m.clone())
                    .unwrap_or_default(),
            });
        }
        Ok(results)
    }
}

fn wrap_transport(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timeout(format!("vector store request timed out: {err}"))
    } else {
        Error::connection_with_source("vector store request failed", err)
    }
}

#[async_trait]
impl VectorStoreProvider for ChromaVectorStore {
    async fn connect(&self) -> Result<()> {
        self.health_check().await
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.api("/heartbeat"))
            .send()
            .await
            .map_err(wrap_transport)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::health_check(format!(
                "heartbeat returned status {}",
                response.status()
            )))
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.collections.clear();
        Ok(())
    }

    async fn get_or_create_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        let response = self
            .client
            .post(self.api("/collections"))
            .json(&json!({
                "name": name,
                "metadata": { "hnsw:space": "cosine" },
                "get_or_create": true,
            }))
            .send()
            .await
            .map_err(wrap_transport)?;
        if !response.status().is_success() {
            return Err(Error::collection_operation(format!(
                "get-or-create of '{name}' failed with status {}",
                response.status()
            )));
        }
        let body: CollectionResponse = response
            .json()
            .await
            .map_err(|e| Error::collection_operation_with_source("malformed collection response", e))?;
        if let Some(metadata) = &body.metadata
            && metadata.get("hnsw:space").and_then(Value::as_str) != Some("cosine")
        {
            return Err(Error::collection_operation(format!(
                "collection '{name}' exists with a non-cosine distance space"
            )));
        }
        self.collections
            .insert(body.name, CollectionHandle { id: body.id });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        let response = self
            .client
            .delete(self.api(&format!("/collections/{name}")))
            .send()
            .await
            .map_err(wrap_transport)?;
        self.collections.remove(name);
        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::collection_not_found(name)),
            status if status.is_success() => Ok(()),
            status => Err(Error::collection_delete(format!(
                "delete of '{name}' failed with status {status}"
            ))),
        }
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let response = self
            .client
            .get(self.api("/collections"))
            .send()
            .await
            .map_err(wrap_transport)?;
        if !response.status().is_success() {
            return Err(Error::collection_list(format!(
                "listing collections failed with status {}",
                response.status()
            )));
        }
        let bodies: Vec<CollectionResponse> = response
            .json()
            .await
            .map_err(|e| Error::collection_list(format!("malformed list response: {e}")))?;

        let mut infos = Vec::with_capacity(bodies.len());
        for body in bodies {
            let count = match self
                .client
                .get(self.api(&format!("/collections/{}/count", body.id)))
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => {
                    resp.json::<u64>().await.unwrap_or_default()
                }
                // A collection can vanish between list and count; skip it.
                Ok(resp) => {
                    warn!(collection = %body.name, status = %resp.status(), "Skipping unreadable collection");
                    continue;
                }
                Err(e) => return Err(wrap_transport(e)),
            };
            infos.push(CollectionInfo {
                name: body.name,
                count,
                metadata: body.metadata.unwrap_or_default(),
            });
        }
        Ok(infos)
    }

    async fn add_documents(&self, collection: &str, docs: &[VectorDocument]) -> Result<()> {
        self.write_documents(collection, docs, "add").await
    }

    async fn upsert_documents(&self, collection: &str, docs: &[VectorDocument]) -> Result<()> {
        self.write_documents(collection, docs, "upsert").await
    }

    async fn delete_documents(&self, collection: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let handle = self.resolve_collection(collection).await?;
        let response = self
            .client
            .post(self.api(&format!("/collections/{}/delete", handle.id)))
            .json(&json!({ "ids": ids }))
            .send()
            .await
            .map_err(wrap_transport)?;
        if !response.status().is_success() {
            return Err(Error::document_operation(format!(
                "delete of {} ids from '{collection}' failed with status {}",
                ids.len(),
                response.status()
            )));
        }
        Ok(())
    }

    async fn get_documents_by_metadata(
        &self,
        collection: &str,
        where_clause: &HashMap<String, Value>,
        include_embeddings: bool,
    ) -> Result<Vec<VectorDocument>> {
        if where_clause.is_empty() {
            return Err(Error::invalid_parameters(
                "metadata filter must not be empty",
            ));
        }
        let handle = self.resolve_collection(collection).await?;
        let mut include = vec!["documents", "metadatas"];
        if include_embeddings {
            include.push("embeddings");
        }
        let response = self
            .client
            .post(self.api(&format!("/collections/{}/get", handle.id)))
            .json(&json!({
                "where": build_where_filter(where_clause),
                "include": include,
            }))
            .send()
            .await
            .map_err(wrap_transport)?;
        if !response.status().is_success() {
            return Err(Error::document_operation(format!(
                "metadata scan of '{collection}' failed with status {}",
                response.status()
            )));
        }
        let body: GetResponse = response
            .json()
            .await
            .map_err(|e| Error::document_operation(format!("malformed get response: {e}")))?;

        let documents = body.documents.unwrap_or_default();
        let metadatas = body.metadatas.unwrap_or_default();
        let embeddings = body.embeddings.unwrap_or_default();
        Ok(body
            .ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| VectorDocument {
                id,
                content: documents
                    .get(index)
                    .and_then(|d| d.clone())
                    .unwrap_or_default(),
                embedding: embeddings
                    .get(index)
                    .and_then(|e| e.clone())
                    .unwrap_or_default(),
                metadata: metadatas
                    .get(index)
                    .and_then(|m| m.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn delete_documents_by_file_prefix(
        &self,
        collection: &str,
        repository: &str,
        file_path: &str,
    ) -> Result<usize> {
        let mut where_clause = HashMap::new();
        where_clause.insert("repository".to_owned(), Value::from(repository));
        where_clause.insert("file_path".to_owned(), Value::from(file_path));
        let matches = self
            .get_documents_by_metadata(collection, &where_clause, false)
            .await?;
        let ids: Vec<String> = matches.into_iter().map(|d| d.id).collect();
        let count = ids.len();
        self.delete_documents(collection, &ids).await?;
        Ok(count)
    }

    async fn similarity_search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        validate_search(request)?;
        let mut merged = Vec::new();
        for collection in &request.collections {
            match self.search_collection(collection, request).await {
                Ok(mut results) => merged.append(&mut results),
                Err(Error::CollectionNotFound { name }) => {
                    warn!(collection = %name, "Skipping missing collection in similarity search");
                }
                Err(err) => return Err(err),
            }
        }
        merged.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        merged.truncate(request.limit);
        Ok(merged)
    }
}

/// Compose the store's conjunction filter from equality predicates.
fn build_where_filter(where_clause: &HashMap<String, Value>) -> Value {
    if where_clause.len() == 1 {
        let (key, value) = where_clause
            .iter()
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
            .unwrap_or_default();
        return json!({ key: { "$eq": value } });
    }
    let mut predicates: Vec<Value> = where_clause
        .iter()
        .map(|(key, value)| json!({ key: { "$eq": value } }))
        .collect();
    // Deterministic predicate order keeps request bodies stable.
    predicates.sort_by_key(ToString::to_string);
    json!({ "$and": predicates })
}
