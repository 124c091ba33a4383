//! Embedding and chunking collaborator ports.
//!
//! Embedding inference itself is outside this system; the coordinator only
//! needs vectors back for the chunks it produces.

use async_trait::async_trait;

use crate::entities::Chunk;
use crate::error::Result;

/// External embedding collaborator.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of produced vectors.
    fn dimensions(&self) -> usize;

    /// Provider identifier (e.g. "ollama", "null").
    fn provider_name(&self) -> &'static str;
}

/// Splits file content into bounded chunks with content hashes.
pub trait Chunker: Send + Sync {
    /// Chunk `content`; returns at least one chunk for non-empty input.
    fn chunk(&self, content: &str) -> Vec<Chunk>;
}
