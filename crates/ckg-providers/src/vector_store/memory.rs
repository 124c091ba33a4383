//! In-memory vector store used by tests and local development.
//!
//! Implements the full port contract with exact cosine distances so
//! threshold and ordering semantics match the HTTP client.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::warn;

use ckg_domain::entities::{CollectionInfo, SearchResult, VectorDocument};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{SearchRequest, VectorStoreProvider};

use super::{
    distance_to_similarity, normalize_metadata, validate_collection_name, validate_documents,
    validate_search,
};

#[derive(Debug, Default)]
struct CollectionData {
    documents: HashMap<String, VectorDocument>,
}

/// In-memory vector store provider.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: DashMap<String, CollectionData>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn require_collection(&self, name: &str) -> Result<()> {
        if self.collections.contains_key(name) {
            Ok(())
        } else {
            Err(Error::collection_not_found(name))
        }
    }
}

/// Raw cosine distance in `[0, 2]` between two vectors.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 2.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 2.0;
    }
    1.0 - (dot / (norm_a * norm_b))
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn get_or_create_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        self.collections.entry(name.to_owned()).or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        if self.collections.remove(name).is_none() {
            return Err(Error::collection_not_found(name));
        }
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let mut infos: Vec<CollectionInfo> = self
            .collections
            .iter()
            .map(|entry| CollectionInfo {
                name: entry.key().clone(),
                count: entry.value().documents.len() as u64,
                metadata: HashMap::from([(
                    "hnsw:space".to_owned(),
                    Value::from("cosine"),
                )]),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn add_documents(&self, collection: &str, docs: &[VectorDocument]) -> Result<()> {
        validate_documents(docs)?;
        self.require_collection(collection)?;
        let mut data = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| Error::collection_not_found(collection))?;
        for doc in docs {
            if data.documents.contains_key(&doc.id) {
                return Err(Error::document_operation(format!(
                    "document '{}' already exists in '{collection}'",
                    doc.id
                )));
            }
        }
        for doc in docs {
            let mut stored = doc.clone();
            stored.metadata = normalize_metadata(&doc.metadata);
            data.documents.insert(stored.id.clone(), stored);
        }
        Ok(())
    }

    async fn upsert_documents(&self, collection: &str, docs: &[VectorDocument]) -> Result<()> {
        validate_documents(docs)?;
        self.require_collection(collection)?;
        let mut data = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| Error::collection_not_found(collection))?;
        for doc in docs {
            let mut stored = doc.clone();
            stored.metadata = normalize_metadata(&doc.metadata);
            data.documents.insert(stored.id.clone(), stored);
        }
        Ok(())
    }

    async fn delete_documents(&self, collection: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut data = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| Error::collection_not_found(collection))?;
        for id in ids {
            data.documents.remove(id);
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
        let data = self
            .collections
            .get(collection)
            .ok_or_else(|| Error::collection_not_found(collection))?;
        let mut matches: Vec<VectorDocument> = data
            .documents
            .values()
            .filter(|doc| {
                where_clause
                    .iter()
                    .all(|(key, value)| doc.metadata.get(key) == Some(value))
            })
            .cloned()
            .collect();
        if !include_embeddings {
            for doc in &mut matches {
                doc.embedding.clear();
            }
        }
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches)
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
        let ids: Vec<String> = self
            .get_documents_by_metadata(collection, &where_clause, false)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();
        let count = ids.len();
        self.delete_documents(collection, &ids).await?;
        Ok(count)
    }

    async fn similarity_search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        validate_search(request)?;
        let mut merged = Vec::new();
        for collection in &request.collections {
            let Some(data) = self.collections.get(collection) else {
                warn!(collection = %collection, "Skipping missing collection in similarity search");
                continue;
            };
            for doc in data.documents.values() {
                let distance = cosine_distance(&request.embedding, &doc.embedding);
                let similarity = distance_to_similarity(distance);
                if similarity >= request.threshold {
                    merged.push(SearchResult {
                        id: doc.id.clone(),
                        content: doc.content.clone(),
                        similarity,
                        collection: collection.clone(),
                        metadata: doc.metadata.clone(),
                    });
                }
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
