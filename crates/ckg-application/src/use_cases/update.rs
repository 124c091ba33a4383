//! Incremental update coordinator.
//!
//! Keeps the vector store and the graph consistent with the underlying git
//! state after repository changes. Writes against a given repository are
//! serialized by an in-process lock keyed on the repository name plus the
//! persisted `updateInProgress` flag; the flag is cleared on every terminal
//! path.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use ckg_domain::constants::{
    DEFAULT_FILE_CONCURRENCY, DEFAULT_STALE_UPDATE_THRESHOLD_SECS, DEFAULT_UPDATE_HISTORY_LIMIT,
};
use ckg_domain::entities::{
    chunk::chunk_document_id, ChunkMetadata, GraphNode, GraphRelationship, IngestError,
    RepositoryInfo, RepositoryStatus, SourceFile, UpdateHistoryEntry, UpdateResult, UpdateStatus,
    UpdateSummary, VectorDocument,
};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{
    CancellationFlag, Chunker, CodeParser, EmbeddingProvider, GraphStoreProvider, MetadataStore,
    VcsProvider, VectorStoreProvider,
};
use ckg_domain::utils::RetryConfig;
use ckg_domain::value_objects::node_id;

use super::ingest::{file_subgraph, global_function_ids};

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Rotation limit for per-repository update history
    pub history_limit: usize,
    /// Seconds after which a persisted `updateInProgress` flag is stale
    pub stale_threshold_secs: i64,
    /// Bounded concurrency for per-file work inside one repository
    pub file_concurrency: usize,
    /// Retry policy for transient store failures
    pub retry: RetryConfig,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_UPDATE_HISTORY_LIMIT,
            stale_threshold_secs: DEFAULT_STALE_UPDATE_THRESHOLD_SECS,
            file_concurrency: DEFAULT_FILE_CONCURRENCY,
            retry: RetryConfig::default(),
        }
    }
}

/// Per-repository incremental update coordinator.
pub struct UpdateCoordinator {
    metadata: Arc<dyn MetadataStore>,
    vector_store: Arc<dyn VectorStoreProvider>,
    graph: Arc<dyn GraphStoreProvider>,
    parser: Arc<dyn CodeParser>,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    vcs: Arc<dyn VcsProvider>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    config: UpdateConfig,
}

impl UpdateCoordinator {
    /// Create the coordinator with injected dependencies.
    #[must_use]
    #[allow(clippy::too_many_arguments, reason = "composition root wiring")]
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        vector_store: Arc<dyn VectorStoreProvider>,
        graph: Arc<dyn GraphStoreProvider>,
        parser: Arc<dyn CodeParser>,
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn EmbeddingProvider>,
        vcs: Arc<dyn VcsProvider>,
        config: UpdateConfig,
    ) -> Self {
        Self {
            metadata,
            vector_store,
            graph,
            parser,
            chunker,
            embedder,
            vcs,
            locks: DashMap::new(),
            config,
        }
    }

    fn repo_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Refresh one repository to its branch HEAD.
    ///
    /// # Errors
    ///
    /// `REPOSITORY_METADATA_ERROR` for unknown repositories or when another
    /// non-stale update holds the repository. Per-file failures do not fail
    /// the call; they surface in the result's `errors` and status.
    pub async fn update_repository(
        &self,
        name: &str,
        cancellation: &CancellationFlag,
    ) -> Result<UpdateResult> {
        let lock = self.repo_lock(name);
        let _guard = lock.lock().await;
        let operation_id = Uuid::new_v4();

        let mut info = self
            .metadata
            .get_repository(name)
            .await?
            .ok_or_else(|| Error::repository_metadata(format!("unknown repository '{name}'")))?;

        if info.status == RepositoryStatus::Indexing {
            return Err(Error::repository_metadata(format!(
                "repository '{name}' is being indexed"
            )));
        }
        if info.update_in_progress == Some(true) {
            let stale = info.update_started_at.is_none_or(|started_at| {
                Utc::now() - started_at > Duration::seconds(self.config.stale_threshold_secs)
            });
            if stale {
                warn!(repository = name, "Taking over a stale update lock");
            } else {
                return Err(Error::repository_metadata(format!(
                    "update already in progress for '{name}'"
                )));
            }
        }

        info.update_in_progress = Some(true);
        info.update_started_at = Some(Utc::now());
        self.metadata.update_repository(info.clone()).await?;

        let outcome = self
            .run_update(&mut info, operation_id, cancellation)
            .await;

        // Terminal path: the in-progress flag is always cleared, even when
        // the update itself failed.
        info.update_in_progress = Some(false);
        info.update_started_at = None;
        if let Err(persist_err) = self.metadata.update_repository(info.clone()).await {
            warn!(
                repository = name,
                error = %persist_err,
                "Failed to clear update-in-progress flag"
            );
        }
        outcome
    }

    async fn run_update(
        &self,
        info: &mut RepositoryInfo,
        operation_id: Uuid,
        cancellation: &CancellationFlag,
    ) -> Result<UpdateResult> {
        let started = Instant::now();
        let name = info.name.clone();

        let new_head = ckg_domain::utils::with_retry(&self.config.retry, || {
            self.vcs.resolve_branch_head(&info.local_path, &info.branch)
        })
        .await?;

        let Some(old_head) = info.last_indexed_commit_sha.clone() else {
            return Err(Error::repository_metadata(format!(
                "repository '{name}' has no recorded commit; run a full ingestion first"
            )));
        };

        if old_head == new_head {
            info!(
                repository = %name,
                operation = %operation_id,
                commit = %new_head,
                "Repository already current"
            );
            return Ok(UpdateResult::no_changes(&name));
        }

        let diff = self
            .vcs
            .diff_commits(&info.local_path, &old_head, &new_head)
            .await?;
        info!(
            repository = %name,
            operation = %operation_id,
            added = diff.added.len(),
            modified = diff.modified.len(),
            deleted = diff.deleted.len(),
            "Applying incremental update"
        );

        let mut errors: Vec<IngestError> = Vec::new();
        let mut chunks_deleted = 0usize;
        let mut chunks_upserted = 0usize;
        let mut files_applied = 0usize;
        let mut nodes_deleted = 0usize;

        for path in &diff.deleted {
            if cancellation.is_cancelled() {
                errors.push(IngestError {
                    file_path: None,
                    message: "operation cancelled".to_owned(),
                });
                break;
            }
            match self
                .vector_store
                .delete_documents_by_file_prefix(&info.collection_name, &name, path)
                .await
            {
                Ok(count) => chunks_deleted += count,
                Err(err) => {
                    errors.push(IngestError {
                        file_path: Some(path.clone()),
                        message: format!("{}: {err}", err.code()),
                    });
                    continue;
                }
            }
            match self.graph.delete_file_subgraph(&name, path).await {
                Ok(()) => {
                    files_applied += 1;
                    nodes_deleted += 1;
                }
                Err(err) => errors.push(IngestError {
                    file_path: Some(path.clone()),
                    message: format!("{}: {err}", err.code()),
                }),
            }
        }

        let changed: Vec<String> = diff
            .added
            .iter()
            .chain(diff.modified.iter())
            .cloned()
            .collect();
        // File-level work pipelines up to `file_concurrency` wide. Each
        // file's delete-then-upsert stays inside its own task, so partial
        // observers see that file either prior-complete or post-complete.
        let frozen_info = info.clone();
        let outcomes: Vec<(String, Result<(usize, usize)>)> =
            futures::stream::iter(changed.iter().cloned())
                .map(|path| {
                    let info = &frozen_info;
                    let new_head = &new_head;
                    async move {
                        if cancellation.is_cancelled() {
                            return (path, Err(Error::graph("operation cancelled")));
                        }
                        let outcome = self
                            .apply_changed_file(info, new_head, &path, cancellation)
                            .await;
                        (path, outcome)
                    }
                })
                .buffer_unordered(self.config.file_concurrency.max(1))
                .collect()
                .await;
        for (path, outcome) in outcomes {
            match outcome {
                Ok((deleted, upserted)) => {
                    chunks_deleted += deleted;
                    chunks_upserted += upserted;
                    files_applied += 1;
                }
                Err(err) => errors.push(IngestError {
                    file_path: Some(path),
                    message: format!("{}: {err}", err.code()),
                }),
            }
        }

        let total_work = diff.deleted.len() + changed.len();
        let status = if errors.is_empty() {
            UpdateStatus::Success
        } else if files_applied > 0 {
            UpdateStatus::Partial
        } else {
            UpdateStatus::Failed
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let entry = UpdateHistoryEntry {
            timestamp: Utc::now(),
            previous_commit: old_head.clone(),
            new_commit: new_head.clone(),
            files_added: diff.added.len(),
            files_modified: diff.modified.len(),
            files_deleted: diff.deleted.len(),
            chunks_upserted,
            chunks_deleted,
            duration_ms,
            error_count: errors.len(),
            status: status.as_str().to_owned(),
            graph_nodes_created: Some(files_applied.saturating_sub(nodes_deleted)),
            graph_nodes_deleted: Some(nodes_deleted),
        };
        info.push_history(entry, self.config.history_limit);

        // The recorded commit advances only when data was actually written.
        if status != UpdateStatus::Failed {
            info.last_indexed_commit_sha = Some(new_head.clone());
            info.last_incremental_update_at = Some(Utc::now());
            info.incremental_update_count = Some(info.incremental_update_count.unwrap_or(0) + 1);
            info.file_count = info
                .file_count
                .saturating_add(diff.added.len())
                .saturating_sub(diff.deleted.len());
            info.chunk_count = info
                .chunk_count
                .saturating_add(chunks_upserted)
                .saturating_sub(chunks_deleted);
            info.status = RepositoryStatus::Ready;
            info.error_message = None;
        } else {
            info.status = RepositoryStatus::Error;
            info.error_message = errors.first().map(|e| e.message.clone());
        }

        info!(
            repository = %name,
            operation = %operation_id,
            status = status.as_str(),
            files = total_work,
            chunks_upserted,
            chunks_deleted,
            errors = errors.len(),
            duration_ms,
            "Incremental update finished"
        );

        Ok(UpdateResult {
            repository: name,
            status,
            files_added: diff.added.len(),
            files_modified: diff.modified.len(),
            files_deleted: diff.deleted.len(),
            chunks_upserted,
            chunks_deleted,
            errors,
            duration_ms,
        })
    }

    /// Apply one added/modified file: replace its chunks in the vector
    /// store, then its entity subgraph and chunk mirrors in the graph.
    async fn apply_changed_file(
        &self,
        info: &RepositoryInfo,
        commit: &str,
        path: &str,
        _cancellation: &CancellationFlag,
    ) -> Result<(usize, usize)> {
        let name = &info.name;
        let content = self
            .vcs
            .read_file_at(&info.local_path, commit, path)
            .await?;

        let deleted = self
            .vector_store
            .delete_documents_by_file_prefix(&info.collection_name, name, path)
            .await?;

        let chunks = self.chunker.chunk(&content);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed(&texts).await?
        };
        if embeddings.len() != chunks.len() {
            return Err(Error::document_operation(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let now = Utc::now().to_rfc3339();
        let extension = path.rsplit('.').next().unwrap_or_default().to_owned();
        let total_chunks = chunks.len() as u32;
        let documents: Vec<VectorDocument> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (chunk, embedding))| {
                let metadata = ChunkMetadata {
                    file_path: path.to_owned(),
                    repository: name.clone(),
                    chunk_index: index as u32,
                    total_chunks,
                    chunk_start_line: chunk.start_line,
                    chunk_end_line: chunk.end_line,
                    file_extension: extension.clone(),
                    file_size_bytes: content.len() as u64,
                    content_hash: chunk.content_hash.clone(),
                    indexed_at: now.clone(),
                    file_modified_at: now.clone(),
                };
                VectorDocument {
                    id: chunk_document_id(name, path, index as u32),
                    content: chunk.content.clone(),
                    embedding,
                    metadata: metadata.into_map(),
                }
            })
            .collect();
        if !documents.is_empty() {
            ckg_domain::utils::with_retry(&self.config.retry, || {
                self.vector_store
                    .upsert_documents(&info.collection_name, &documents)
            })
            .await?;
        }

        // Graph side: re-upsert the file's entity subgraph plus chunk
        // mirrors, replacing whatever was there for this file.
        let source_file = SourceFile {
            path: path.to_owned(),
            size_bytes: content.len() as u64,
            modified_at: now.clone(),
            content,
        };
        let parse = if self.parser.supported_language(path).is_some() {
            Some(self.parser.parse(&source_file.content, path).await?)
        } else {
            None
        };
        let known_paths: HashSet<String> = HashSet::from([path.to_owned()]);
        let function_ids = parse.as_ref().map_or_else(HashMap::new, |result| {
            let files = [source_file.clone()];
            let parsed = HashMap::from([(0usize, result)]);
            global_function_ids(name, &files, &parsed)
        });
        let mut subgraph = file_subgraph(
            name,
            &source_file,
            parse.as_ref(),
            &known_paths,
            &function_ids,
        );

        let file_id = node_id::file(name, path);
        for document in &documents {
            let chunk_node_id = node_id::chunk(&document.id);
            let chunk_index = document
                .metadata
                .get("chunk_index")
                .and_then(Value::as_u64)
                .unwrap_or_default();
            let content_hash = document
                .metadata
                .get("content_hash")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            subgraph.nodes.push(
                GraphNode::new(&chunk_node_id, "Chunk")
                    .with_property("chromaId", document.id.clone())
                    .with_property("repository", name.clone())
                    .with_property("filePath", path.to_owned())
                    .with_property("chunkIndex", chunk_index)
                    .with_property("contentHash", content_hash),
            );
            subgraph.relationships.push(GraphRelationship::new(
                &file_id,
                &chunk_node_id,
                "HAS_CHUNK",
            ));
        }

        self.graph
            .replace_file_subgraph(name, path, &subgraph)
            .await?;
        Ok((deleted, documents.len()))
    }

    /// Update every ready repository sequentially, continuing past
    /// per-repository failures.
    pub async fn update_all(&self, cancellation: &CancellationFlag) -> UpdateSummary {
        let repositories = match self.metadata.list_repositories().await {
            Ok(list) => list,
            Err(err) => {
                warn!(error = %err, "Failed to list repositories for update sweep");
                return UpdateSummary {
                    total: 0,
                    updated: 0,
                    current: 0,
                    failed: 0,
                    results: Vec::new(),
                };
            }
        };
        let ready: Vec<RepositoryInfo> = repositories
            .into_iter()
            .filter(|r| r.status == RepositoryStatus::Ready)
            .collect();

        let mut summary = UpdateSummary {
            total: ready.len(),
            updated: 0,
            current: 0,
            failed: 0,
            results: Vec::new(),
        };
        for repository in ready {
            if cancellation.is_cancelled() {
                break;
            }
            let result = match self.update_repository(&repository.name, cancellation).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(repository = %repository.name, code = err.code(), error = %err, "Repository update failed");
                    UpdateResult {
                        repository: repository.name.clone(),
                        status: UpdateStatus::Failed,
                        files_added: 0,
                        files_modified: 0,
                        files_deleted: 0,
                        chunks_upserted: 0,
                        chunks_deleted: 0,
                        errors: vec![IngestError {
                            file_path: None,
                            message: format!("{}: {err}", err.code()),
                        }],
                        duration_ms: 0,
                    }
                }
            };
            match result.status {
                UpdateStatus::Success | UpdateStatus::Partial => summary.updated += 1,
                UpdateStatus::NoChanges => summary.current += 1,
                UpdateStatus::Failed => summary.failed += 1,
            }
            summary.results.push(result);
        }
        summary
    }
}
