//! Chunk and vector-document entities shared by the chunker, the vector
//! store client, and the update coordinator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A bounded span of file text associated with one embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// First line of the span (1-indexed)
    pub start_line: u32,
    /// Last line of the span (1-indexed, inclusive)
    pub end_line: u32,
    /// Raw chunk text
    pub content: String,
    /// Hex SHA-256 of the chunk text
    pub content_hash: String,
}

/// A document stored in (or retrieved from) a vector-store collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    /// Document id, `{repository}:{file_path}:{chunk_index}`
    pub id: String,
    /// Chunk text
    pub content: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
    /// Flat metadata map; non-scalar values are stringified at the boundary
    pub metadata: HashMap<String, Value>,
}

/// Fixed metadata schema attached to every chunk document.
///
/// Field names are snake_case for compatibility with the backing store's
/// filter syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Repository-relative file path
    pub file_path: String,
    /// Owning repository name
    pub repository: String,
    /// Zero-based index of this chunk within the file
    pub chunk_index: u32,
    /// Total chunks produced for the file
    pub total_chunks: u32,
    /// First line covered by the chunk
    pub chunk_start_line: u32,
    /// Last line covered by the chunk
    pub chunk_end_line: u32,
    /// File extension without the dot
    pub file_extension: String,
    /// File size in bytes
    pub file_size_bytes: u64,
    /// Hex SHA-256 of the chunk content
    pub content_hash: String,
    /// ISO-8601 timestamp of indexing
    pub indexed_at: String,
    /// ISO-8601 timestamp of the file's last modification
    pub file_modified_at: String,
}

impl ChunkMetadata {
    /// Flatten into the metadata map shape the vector store expects.
    #[must_use]
    pub fn into_map(self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("file_path".into(), Value::from(self.file_path));
        map.insert("repository".into(), Value::from(self.repository));
        map.insert("chunk_index".into(), Value::from(self.chunk_index));
        map.insert("total_chunks".into(), Value::from(self.total_chunks));
        map.insert("chunk_start_line".into(), Value::from(self.chunk_start_line));
        map.insert("chunk_end_line".into(), Value::from(self.chunk_end_line));
        map.insert("file_extension".into(), Value::from(self.file_extension));
        map.insert("file_size_bytes".into(), Value::from(self.file_size_bytes));
        map.insert("content_hash".into(), Value::from(self.content_hash));
        map.insert("indexed_at".into(), Value::from(self.indexed_at));
        map.insert("file_modified_at".into(), Value::from(self.file_modified_at));
        map
    }
}

/// Summary of a vector-store collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name
    pub name: String,
    /// Number of documents
    pub count: u64,
    /// Collection-level metadata
    pub metadata: HashMap<String, Value>,
}

/// A single similarity-search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document id
    pub id: String,
    /// Document content
    pub content: String,
    /// Similarity in `[0, 1]`, derived from cosine distance
    pub similarity: f32,
    /// Collection the hit came from
    pub collection: String,
    /// Document metadata
    pub metadata: HashMap<String, Value>,
}

/// Compose the deterministic document id for a chunk.
#[must_use]
pub fn chunk_document_id(repository: &str, file_path: &str, chunk_index: u32) -> String {
    format!("{repository}:{file_path}:{chunk_index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_shape() {
        assert_eq!(chunk_document_id("demo", "src/a.ts", 0), "demo:src/a.ts:0");
        assert_eq!(chunk_document_id("demo", "src/a.ts", 12), "demo:src/a.ts:12");
    }

    #[test]
    fn metadata_map_uses_snake_case_keys() {
        let meta = ChunkMetadata {
            file_path: "src/a.ts".into(),
            repository: "demo".into(),
            chunk_index: 0,
            total_chunks: 1,
            chunk_start_line: 1,
            chunk_end_line: 10,
            file_extension: "ts".into(),
            file_size_bytes: 120,
            content_hash: "ab".into(),
            indexed_at: "2026-01-01T00:00:00Z".into(),
            file_modified_at: "2026-01-01T00:00:00Z".into(),
        };
        let map = meta.into_map();
        for key in [
            "file_path",
            "repository",
            "chunk_index",
            "total_chunks",
            "chunk_start_line",
            "chunk_end_line",
            "file_extension",
            "file_size_bytes",
            "content_hash",
            "indexed_at",
            "file_modified_at",
        ] {
            assert!(map.contains_key(key), "missing {key}");
        }
    }
}
