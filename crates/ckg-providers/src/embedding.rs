//! Embedding collaborator stubs.
//!
//! Real embedding inference is outside this system. The null provider
//! produces deterministic hash-derived vectors so pipelines and tests can
//! run without a model server.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use ckg_domain::error::Result;
use ckg_domain::ports::EmbeddingProvider;

/// Deterministic, model-free embedding provider.
#[derive(Debug, Clone)]
pub struct NullEmbeddingProvider {
    dimensions: usize,
}

impl Default for NullEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: 16 }
    }
}

impl NullEmbeddingProvider {
    /// Create a provider emitting vectors of the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let digest = Sha256::digest(text.as_bytes());
        (0..self.dimensions)
            .map(|i| {
                let byte = digest[i % digest.len()];
                f32::from(byte) / 255.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn vectors_are_deterministic_and_sized() {
        let provider = NullEmbeddingProvider::new(8);
        let a = provider.embed(&["hello".to_owned()]).await.expect("embed");
        let b = provider.embed(&["hello".to_owned()]).await.expect("embed");
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 8);
        let c = provider.embed(&["world".to_owned()]).await.expect("embed");
        assert_ne!(a[0], c[0]);
    }
}
