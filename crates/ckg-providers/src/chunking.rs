//! Line-window chunker.
//!
//! Splits file content into overlapping line windows, each carrying its
//! span and a content hash. Embeddings for the chunks come from the
//! external embedding collaborator.

use ckg_domain::entities::Chunk;
use ckg_domain::ports::Chunker;
use ckg_domain::utils::sha256_hex;

use crate::constants::{CHUNK_MAX_LINES, CHUNK_OVERLAP_LINES};

/// Chunker configuration.
#[derive(Debug, Clone)]
pub struct LineChunkerConfig {
    /// Maximum lines per chunk
    pub max_lines: usize,
    /// Lines of overlap between consecutive chunks
    pub overlap_lines: usize,
}

impl Default for LineChunkerConfig {
    fn default() -> Self {
        Self {
            max_lines: CHUNK_MAX_LINES,
            overlap_lines: CHUNK_OVERLAP_LINES,
        }
    }
}

/// Fixed-window line chunker.
#[derive(Debug, Clone, Default)]
pub struct LineChunker {
    config: LineChunkerConfig,
}

impl LineChunker {
    /// Create a chunker with the given configuration. The overlap is
    /// clamped below the window size so every step makes progress.
    #[must_use]
    pub fn new(config: LineChunkerConfig) -> Self {
        let overlap_lines = config.overlap_lines.min(config.max_lines.saturating_sub(1));
        Self {
            config: LineChunkerConfig {
                max_lines: config.max_lines.max(1),
                overlap_lines,
            },
        }
    }
}

impl Chunker for LineChunker {
    fn chunk(&self, content: &str) -> Vec<Chunk> {
        if content.is_empty() {
            return Vec::new();
        }
        let lines: Vec<&str> = content.lines().collect();
        let mut chunks = Vec::new();
        let step = self.config.max_lines - self.config.overlap_lines;
        let mut start = 0usize;
        while start < lines.len() {
            let end = (start + self.config.max_lines).min(lines.len());
            let text = lines[start..end].join("\n");
            chunks.push(Chunk {
                start_line: start as u32 + 1,
                end_line: end as u32,
                content_hash: sha256_hex(&text),
                content: text,
            });
            if end == lines.len() {
                break;
            }
            start += step.max(1);
        }
        chunks
    }
}
