//! Shared fixtures for the application test suite.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use ckg_application::{GraphIngestService, IngestConfig, IngestOptions};
use ckg_domain::entities::{FileDiff, RepositoryInfo, RepositoryStatus, SourceFile};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{CodeParser, GraphStoreProvider, ParserOptions, VcsProvider};
use ckg_providers::graph_store::InMemoryGraphStore;
use ckg_providers::parser::SourceCodeParser;

pub const OLD_SHA: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const NEW_SHA: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

/// VCS fake with a fixed head, diff, and file snapshot.
#[derive(Debug, Clone, Default)]
pub struct FakeVcs {
    pub head: String,
    pub diff: FileDiff,
    pub files: HashMap<String, String>,
}

#[async_trait]
impl VcsProvider for FakeVcs {
    async fn resolve_branch_head(&self, _local_path: &str, _branch: &str) -> Result<String> {
        Ok(self.head.clone())
    }

    async fn diff_commits(
        &self,
        _local_path: &str,
        _old_commit: &str,
        _new_commit: &str,
    ) -> Result<FileDiff> {
        Ok(self.diff.clone())
    }

    async fn read_file_at(
        &self,
        _local_path: &str,
        _commit: &str,
        file_path: &str,
    ) -> Result<String> {
        self.files
            .get(file_path)
            .cloned()
            .ok_or_else(|| Error::file_operation(format!("'{file_path}' not in fake snapshot")))
    }
}

/// A source file fixture with size/mtime derived from the content.
#[must_use]
pub fn source_file(path: &str, content: &str) -> SourceFile {
    SourceFile {
        path: path.to_owned(),
        size_bytes: content.len() as u64,
        modified_at: Utc::now().to_rfc3339(),
        content: content.to_owned(),
    }
}

/// A ready repository record pointing at [`OLD_SHA`].
#[must_use]
pub fn repository_info(name: &str) -> RepositoryInfo {
    RepositoryInfo {
        name: name.to_owned(),
        url: format!("https://example.com/{name}.git"),
        local_path: format!("/tmp/{name}"),
        collection_name: format!("repo_{name}"),
        file_count: 1,
        chunk_count: 1,
        last_indexed_at: Utc::now(),
        index_duration_ms: 5,
        status: RepositoryStatus::Ready,
        error_message: None,
        branch: "main".to_owned(),
        include_extensions: vec!["ts".to_owned()],
        exclude_patterns: vec![],
        embedding_provider: Some("null".to_owned()),
        embedding_model: None,
        embedding_dimensions: Some(16),
        last_indexed_commit_sha: Some(OLD_SHA.to_owned()),
        last_incremental_update_at: None,
        incremental_update_count: None,
        update_history: None,
        update_in_progress: None,
        update_started_at: None,
    }
}

/// Graph store seeded by a real ingestion of the given files.
pub async fn ingested_graph(
    repository: &str,
    files: &[SourceFile],
) -> (Arc<InMemoryGraphStore>, Arc<dyn CodeParser>) {
    let graph = Arc::new(InMemoryGraphStore::new());
    let parser: Arc<dyn CodeParser> = Arc::new(SourceCodeParser::new(ParserOptions::default()));
    let service = GraphIngestService::new(
        graph.clone() as Arc<dyn GraphStoreProvider>,
        parser.clone(),
        IngestConfig::default(),
    );
    let report = service
        .ingest_files(files, &IngestOptions::for_repository(repository))
        .await
        .expect("seed ingestion succeeds");
    assert!(
        matches!(
            report.status,
            ckg_domain::entities::IngestStatus::Success
        ),
        "seed ingestion must succeed: {:?}",
        report.errors
    );
    (graph, parser)
}
