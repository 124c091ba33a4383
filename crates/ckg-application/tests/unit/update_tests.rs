//! Tests for the incremental update coordinator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use ckg_application::{UpdateConfig, UpdateCoordinator};
use ckg_domain::entities::{FileDiff, UpdateStatus};
use ckg_domain::ports::{
    CancellationFlag, Chunker, EmbeddingProvider, GraphStoreProvider, MetadataStore,
    SearchRequest, VcsProvider, VectorStoreProvider,
};
use ckg_domain::value_objects::node_id;
use ckg_infrastructure::{JsonMetadataStore, MetadataStoreConfig};
use ckg_providers::chunking::LineChunker;
use ckg_providers::embedding::NullEmbeddingProvider;
use ckg_providers::graph_store::InMemoryGraphStore;
use ckg_providers::parser::SourceCodeParser;
use ckg_providers::vector_store::InMemoryVectorStore;

use crate::common::{ingested_graph, repository_info, source_file, FakeVcs, NEW_SHA, OLD_SHA};

struct Harness {
    coordinator: UpdateCoordinator,
    metadata: Arc<JsonMetadataStore>,
    vector_store: Arc<InMemoryVectorStore>,
    graph: Arc<InMemoryGraphStore>,
    _tempdir: tempfile::TempDir,
}

async fn harness(vcs: FakeVcs, seed_files: &[ckg_domain::entities::SourceFile]) -> Harness {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let metadata = Arc::new(
        JsonMetadataStore::new(MetadataStoreConfig::new(tempdir.path()))
            .await
            .expect("metadata store"),
    );
    metadata
        .update_repository(repository_info("demo"))
        .await
        .expect("seed metadata");

    let (graph, parser) = ingested_graph("demo", seed_files).await;
    let vector_store = Arc::new(InMemoryVectorStore::new());
    vector_store
        .get_or_create_collection("repo_demo")
        .await
        .expect("collection");

    let coordinator = UpdateCoordinator::new(
        metadata.clone() as Arc<dyn MetadataStore>,
        vector_store.clone() as Arc<dyn VectorStoreProvider>,
        graph.clone() as Arc<dyn GraphStoreProvider>,
        parser,
        Arc::new(LineChunker::default()) as Arc<dyn Chunker>,
        Arc::new(NullEmbeddingProvider::default()) as Arc<dyn EmbeddingProvider>,
        Arc::new(vcs) as Arc<dyn VcsProvider>,
        UpdateConfig::default(),
    );
    Harness {
        coordinator,
        metadata,
        vector_store,
        graph,
        _tempdir: tempdir,
    }
}

#[tokio::test]
async fn unchanged_head_is_a_no_op() {
    let vcs = FakeVcs {
        head: OLD_SHA.to_owned(),
        diff: FileDiff::default(),
        files: HashMap::new(),
    };
    let harness = harness(vcs, &[source_file("src/a.ts", "export function f(){}")]).await;

    let result = harness
        .coordinator
        .update_repository("demo", &CancellationFlag::new())
        .await
        .expect("update runs");
    assert_eq!(result.status, UpdateStatus::NoChanges);

    let info = harness
        .metadata
        .get_repository("demo")
        .await
        .expect("read")
        .expect("present");
    assert_eq!(info.last_indexed_commit_sha.as_deref(), Some(OLD_SHA));
    assert_eq!(info.update_in_progress, Some(false));
    assert!(info.update_history.is_none());
}

#[tokio::test]
async fn modified_file_replaces_entities_and_chunks() {
    let vcs = FakeVcs {
        head: NEW_SHA.to_owned(),
        diff: FileDiff {
            added: vec![],
            modified: vec!["src/a.ts".to_owned()],
            deleted: vec![],
        },
        files: HashMap::from([(
            "src/a.ts".to_owned(),
            "export function g(){}".to_owned(),
        )]),
    };
    let harness = harness(vcs, &[source_file("src/a.ts", "export function f(){}")]).await;

    let result = harness
        .coordinator
        .update_repository("demo", &CancellationFlag::new())
        .await
        .expect("update runs");
    assert_eq!(result.status, UpdateStatus::Success, "{:?}", result.errors);
    assert_eq!(result.files_modified, 1);
    assert_eq!(result.chunks_upserted, 1);

    // Graph side: the file node is unique, f replaced by g, chunks mirrored.
    let ids = harness.graph.node_ids().await;
    assert!(!ids.contains(&node_id::function("demo", "src/a.ts", "f", 1)));
    assert!(ids.contains(&node_id::function("demo", "src/a.ts", "g", 1)));
    assert_eq!(
        ids.iter()
            .filter(|id| **id == node_id::file("demo", "src/a.ts"))
            .count(),
        1
    );
    assert!(ids.iter().any(|id| id.starts_with("Chunk:")));
    let rels = harness.graph.relationship_tuples().await;
    assert!(rels.iter().any(|(_, _, t)| t == "HAS_CHUNK"));

    // Vector side: new chunk ids present for the file.
    let hits = harness
        .vector_store
        .similarity_search(&SearchRequest {
            embedding: vec![1.0; 16],
            collections: vec!["repo_demo".to_owned()],
            limit: 10,
            threshold: 0.0,
        })
        .await
        .expect("search");
    assert!(hits.iter().any(|h| h.id == "demo:src/a.ts:0"));

    // Metadata advanced and history recorded newest-first.
    let info = harness
        .metadata
        .get_repository("demo")
        .await
        .expect("read")
        .expect("present");
    assert_eq!(info.last_indexed_commit_sha.as_deref(), Some(NEW_SHA));
    assert_eq!(info.incremental_update_count, Some(1));
    assert_eq!(info.update_in_progress, Some(false));
    let history = info.update_history.expect("history recorded");
    assert_eq!(history[0].previous_commit, OLD_SHA);
    assert_eq!(history[0].new_commit, NEW_SHA);
    assert_eq!(history[0].files_modified, 1);
    assert_eq!(history[0].chunks_upserted, 1);
    assert_eq!(history[0].status, "success");
}

#[tokio::test]
async fn deleted_file_cascades_from_both_stores() {
    let vcs = FakeVcs {
        head: NEW_SHA.to_owned(),
        diff: FileDiff {
            added: vec![],
            modified: vec![],
            deleted: vec!["src/a.ts".to_owned()],
        },
        files: HashMap::new(),
    };
    let harness = harness(
        vcs,
        &[
            source_file("src/a.ts", "export function f(){}"),
            source_file("src/b.ts", "export function h(){}"),
        ],
    )
    .await;

    let result = harness
        .coordinator
        .update_repository("demo", &CancellationFlag::new())
        .await
        .expect("update runs");
    assert_eq!(result.status, UpdateStatus::Success);
    assert_eq!(result.files_deleted, 1);

    let ids = harness.graph.node_ids().await;
    assert!(!ids.contains(&node_id::file("demo", "src/a.ts")));
    assert!(!ids.contains(&node_id::function("demo", "src/a.ts", "f", 1)));
    assert!(ids.contains(&node_id::file("demo", "src/b.ts")));
}

#[tokio::test]
async fn unknown_repository_is_a_metadata_error() {
    let vcs = FakeVcs {
        head: NEW_SHA.to_owned(),
        ..FakeVcs::default()
    };
    let harness = harness(vcs, &[source_file("src/a.ts", "export function f(){}")]).await;
    let err = harness
        .coordinator
        .update_repository("ghost", &CancellationFlag::new())
        .await
        .expect_err("unknown repository");
    assert_eq!(err.code(), "REPOSITORY_METADATA_ERROR");
}

#[tokio::test]
async fn fresh_in_progress_flag_blocks_concurrent_update() {
    let vcs = FakeVcs {
        head: NEW_SHA.to_owned(),
        ..FakeVcs::default()
    };
    let harness = harness(vcs, &[source_file("src/a.ts", "export function f(){}")]).await;

    let mut info = repository_info("demo");
    info.update_in_progress = Some(true);
    info.update_started_at = Some(Utc::now());
    harness
        .metadata
        .update_repository(info)
        .await
        .expect("mark in progress");

    let err = harness
        .coordinator
        .update_repository("demo", &CancellationFlag::new())
        .await
        .expect_err("held repository rejected");
    assert_eq!(err.code(), "REPOSITORY_METADATA_ERROR");
}

#[tokio::test]
async fn stale_in_progress_flag_is_taken_over() {
    let vcs = FakeVcs {
        head: OLD_SHA.to_owned(),
        ..FakeVcs::default()
    };
    let harness = harness(vcs, &[source_file("src/a.ts", "export function f(){}")]).await;

    let mut info = repository_info("demo");
    info.update_in_progress = Some(true);
    info.update_started_at = Some(Utc::now() - chrono::Duration::hours(12));
    harness
        .metadata
        .update_repository(info)
        .await
        .expect("mark stale");

    let result = harness
        .coordinator
        .update_repository("demo", &CancellationFlag::new())
        .await
        .expect("stale lock taken over");
    assert_eq!(result.status, UpdateStatus::NoChanges);
    let info = harness
        .metadata
        .get_repository("demo")
        .await
        .expect("read")
        .expect("present");
    assert_eq!(info.update_in_progress, Some(false));
}

#[tokio::test]
async fn per_file_failures_leave_a_partial_result() {
    // The fake snapshot is missing src/broken.ts, so that file fails while
    // src/a.ts applies.
    let vcs = FakeVcs {
        head: NEW_SHA.to_owned(),
        diff: FileDiff {
            added: vec![],
            modified: vec!["src/a.ts".to_owned(), "src/broken.ts".to_owned()],
            deleted: vec![],
        },
        files: HashMap::from([(
            "src/a.ts".to_owned(),
            "export function g(){}".to_owned(),
        )]),
    };
    let harness = harness(vcs, &[source_file("src/a.ts", "export function f(){}")]).await;

    let result = harness
        .coordinator
        .update_repository("demo", &CancellationFlag::new())
        .await
        .expect("update runs");
    assert_eq!(result.status, UpdateStatus::Partial);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].file_path.as_deref(), Some("src/broken.ts"));

    // Partial outcomes still advance the commit for the data written.
    let info = harness
        .metadata
        .get_repository("demo")
        .await
        .expect("read")
        .expect("present");
    assert_eq!(info.last_indexed_commit_sha.as_deref(), Some(NEW_SHA));
    let history = info.update_history.expect("history");
    assert_eq!(history[0].status, "partial");
    assert_eq!(history[0].error_count, 1);
}

#[tokio::test]
async fn update_all_summarizes_per_repository_outcomes() {
    let vcs = FakeVcs {
        head: OLD_SHA.to_owned(),
        ..FakeVcs::default()
    };
    let harness = harness(vcs, &[source_file("src/a.ts", "export function f(){}")]).await;

    let summary = harness
        .coordinator
        .update_all(&CancellationFlag::new())
        .await;
    assert_eq!(summary.total, 1);
    assert_eq!(summary.current, 1);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].status, UpdateStatus::NoChanges);
}
