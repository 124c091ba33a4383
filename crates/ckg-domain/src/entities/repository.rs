//! Repository metadata entities persisted in `repositories.json`.
//!
//! The file is schema-versioned; only version `"1.0"` is accepted. Field
//! names are camelCase to match the persisted schema exactly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported metadata schema version.
pub const METADATA_SCHEMA_VERSION: &str = "1.0";

/// Lifecycle status of an indexed repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryStatus {
    /// Indexed and queryable
    Ready,
    /// Initial indexing in progress
    Indexing,
    /// Last operation failed
    Error,
}

/// One rotation-limited entry of a repository's incremental-update history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHistoryEntry {
    /// When the update finished
    pub timestamp: DateTime<Utc>,
    /// Commit the update started from
    pub previous_commit: String,
    /// Commit the update advanced to
    pub new_commit: String,
    /// Count of added files
    pub files_added: usize,
    /// Count of modified files
    pub files_modified: usize,
    /// Count of deleted files
    pub files_deleted: usize,
    /// Chunks written to the vector store
    pub chunks_upserted: usize,
    /// Chunks removed from the vector store
    pub chunks_deleted: usize,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Per-file errors encountered
    pub error_count: usize,
    /// Terminal status of the update run
    pub status: String,
    /// Graph nodes written, when the graph side ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_nodes_created: Option<usize>,
    /// Graph nodes removed, when the graph side ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_nodes_deleted: Option<usize>,
}

/// Per-repository state record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    /// Unique repository name
    pub name: String,
    /// Remote URL
    pub url: String,
    /// Local checkout path
    pub local_path: String,
    /// Backing vector-store collection name
    pub collection_name: String,
    /// Indexed file count
    pub file_count: usize,
    /// Indexed chunk count
    pub chunk_count: usize,
    /// When the last full indexing finished
    pub last_indexed_at: DateTime<Utc>,
    /// Duration of the last full indexing in milliseconds
    pub index_duration_ms: u64,
    /// Lifecycle status
    pub status: RepositoryStatus,
    /// Failure description when `status` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Indexed branch
    pub branch: String,
    /// Extensions included during indexing (without dots)
    pub include_extensions: Vec<String>,
    /// Glob patterns excluded during indexing
    pub exclude_patterns: Vec<String>,
    /// Embedding provider identifier, when recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_provider: Option<String>,
    /// Embedding model identifier, when recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    /// Embedding dimensionality, when recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_dimensions: Option<usize>,
    /// Commit the stores currently reflect (40-hex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_indexed_commit_sha: Option<String>,
    /// When the last incremental update finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_incremental_update_at: Option<DateTime<Utc>>,
    /// Number of incremental updates applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incremental_update_count: Option<u64>,
    /// Newest-first, rotation-limited update history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_history: Option<Vec<UpdateHistoryEntry>>,
    /// Whether an update currently holds this repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_in_progress: Option<bool>,
    /// When the holding update started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_started_at: Option<DateTime<Utc>>,
}

impl RepositoryInfo {
    /// Validate structural rules before persisting.
    ///
    /// # Errors
    ///
    /// Returns `VALIDATION_ERROR` when the name is empty or a recorded
    /// commit sha is not 40 hex characters.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("repository name must not be empty"));
        }
        if self.collection_name.trim().is_empty() {
            return Err(Error::validation("collection name must not be empty"));
        }
        if let Some(sha) = &self.last_indexed_commit_sha
            && (sha.len() != 40 || !sha.bytes().all(|b| b.is_ascii_hexdigit()))
        {
            return Err(Error::validation(format!(
                "lastIndexedCommitSha must be 40 hex characters, got '{sha}'"
            )));
        }
        Ok(())
    }

    /// Push an update-history entry, keeping newest first and enforcing the
    /// rotation limit.
    pub fn push_history(&mut self, entry: UpdateHistoryEntry, limit: usize) {
        let history = self.update_history.get_or_insert_with(Vec::new);
        history.insert(0, entry);
        history.truncate(limit);
    }
}

/// On-disk shape of `repositories.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataFile {
    /// Schema version; `"1.0"` only
    pub version: String,
    /// Repository records keyed by name (sorted for stable output)
    pub repositories: BTreeMap<String, RepositoryInfo>,
}

impl Default for MetadataFile {
    fn default() -> Self {
        Self {
            version: METADATA_SCHEMA_VERSION.to_owned(),
            repositories: BTreeMap::new(),
        }
    }
}

impl MetadataFile {
    /// Reject unknown schema versions.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_METADATA_FORMAT` for any version other than `"1.0"`.
    pub fn check_version(&self) -> Result<()> {
        if self.version != METADATA_SCHEMA_VERSION {
            return Err(Error::invalid_metadata_format(format!(
                "unsupported metadata schema version '{}', expected '{METADATA_SCHEMA_VERSION}'",
                self.version
            )));
        }
        Ok(())
    }
}
