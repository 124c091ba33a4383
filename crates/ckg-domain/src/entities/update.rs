//! Ingestion and incremental-update result entities.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source file handed to the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Repository-relative path
    pub path: String,
    /// File content
    pub content: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// ISO-8601 timestamp of the file's last modification
    pub modified_at: String,
}

/// Phases reported while ingesting a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPhase {
    /// Pipeline setup
    Initializing,
    /// Parsing files into entities
    ExtractingEntities,
    /// Deriving import/call edges
    ExtractingRelationships,
    /// Writing the Repository node
    CreatingRepositoryNode,
    /// Writing File nodes
    CreatingFileNodes,
    /// Writing entity nodes
    CreatingEntityNodes,
    /// Writing Module nodes
    CreatingModuleNodes,
    /// Writing relationship batches
    CreatingRelationships,
    /// Post-write verification
    Verifying,
    /// Terminal phase
    Completed,
}

/// A progress event published to the caller-provided sink.
///
/// Events are best-effort and may coalesce; semantic correctness never
/// depends on a consumer observing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Current phase
    pub phase: IngestPhase,
    /// Completion percentage in `[0, 100]`
    pub percentage: u8,
    /// Repository being processed
    pub repository: String,
}

/// Terminal status of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    /// All files processed
    Success,
    /// Some files failed, some processed
    Partial,
    /// No files processed and errors occurred
    Failed,
}

/// Counters accumulated by an ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Files fully processed
    pub files_processed: usize,
    /// Files that failed parsing or writing
    pub files_failed: usize,
    /// Nodes written
    pub nodes_created: usize,
    /// Relationships written
    pub relationships_created: usize,
    /// Node counts keyed by label
    pub nodes_by_type: HashMap<String, usize>,
    /// Relationship counts keyed by type
    pub relationships_by_type: HashMap<String, usize>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// A per-file (or run-level) ingestion error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestError {
    /// Offending file, when the error is file-scoped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Error description
    pub message: String,
}

/// Final result of an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Terminal status
    pub status: IngestStatus,
    /// Accumulated counters
    pub stats: IngestStats,
    /// Per-file errors; kinds are preserved in the messages
    pub errors: Vec<IngestError>,
}

/// File-level difference between two commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Paths added in the new commit
    pub added: Vec<String>,
    /// Paths modified between the commits
    pub modified: Vec<String>,
    /// Paths removed in the new commit
    pub deleted: Vec<String>,
}

impl FileDiff {
    /// Whether the diff carries no work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Terminal status of an incremental update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// All changed files applied
    Success,
    /// HEAD already matched the indexed commit
    NoChanges,
    /// Some files applied, some failed
    Partial,
    /// Nothing applied
    Failed,
}

impl UpdateStatus {
    /// Lowercase wire string (matches the persisted history entries).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoChanges => "no_changes",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// Result of `update_repository` for one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Repository name
    pub repository: String,
    /// Terminal status
    pub status: UpdateStatus,
    /// Files added
    pub files_added: usize,
    /// Files modified
    pub files_modified: usize,
    /// Files deleted
    pub files_deleted: usize,
    /// Chunks upserted into the vector store
    pub chunks_upserted: usize,
    /// Chunks deleted from the vector store
    pub chunks_deleted: usize,
    /// Per-file errors (kind preserved in the message)
    pub errors: Vec<IngestError>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl UpdateResult {
    /// A no-op result for an already-current repository.
    #[must_use]
    pub fn no_changes(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            status: UpdateStatus::NoChanges,
            files_added: 0,
            files_modified: 0,
            files_deleted: 0,
            chunks_upserted: 0,
            chunks_deleted: 0,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }
}

/// Summary of an `update_all` sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSummary {
    /// Repositories considered
    pub total: usize,
    /// Repositories updated with changes applied
    pub updated: usize,
    /// Repositories already current
    pub current: usize,
    /// Repositories whose update failed
    pub failed: usize,
    /// Individual results, in iteration order
    pub results: Vec<UpdateResult>,
}
