//! Tests for the graph ingestion pipeline.

use std::sync::{Arc, Mutex};

use ckg_application::{GraphIngestService, IngestConfig, IngestOptions};
use ckg_domain::entities::{IngestPhase, IngestStatus, ProgressEvent};
use ckg_domain::ports::{CodeParser, GraphStoreProvider, ParserOptions};
use ckg_domain::value_objects::node_id;
use ckg_providers::graph_store::InMemoryGraphStore;
use ckg_providers::parser::SourceCodeParser;

use crate::common::source_file;

fn service(graph: Arc<InMemoryGraphStore>) -> GraphIngestService {
    let parser: Arc<dyn CodeParser> = Arc::new(SourceCodeParser::new(ParserOptions::default()));
    GraphIngestService::new(
        graph as Arc<dyn GraphStoreProvider>,
        parser,
        IngestConfig::default(),
    )
}

#[tokio::test]
async fn first_ingestion_creates_expected_subgraph() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let report = service(graph.clone())
        .ingest_files(
            &[source_file("src/a.ts", "export function f(){}")],
            &IngestOptions::for_repository("demo"),
        )
        .await
        .expect("ingestion succeeds");

    assert_eq!(report.status, IngestStatus::Success);
    assert_eq!(report.stats.files_processed, 1);
    assert_eq!(report.stats.files_failed, 0);
    assert!(report.errors.is_empty());

    let ids = graph.node_ids().await;
    assert!(ids.contains(&node_id::repository("demo")));
    assert!(ids.contains(&node_id::file("demo", "src/a.ts")));
    assert!(ids.contains(&node_id::function("demo", "src/a.ts", "f", 1)));

    let rels = graph.relationship_tuples().await;
    assert!(rels.contains(&(
        node_id::repository("demo"),
        node_id::file("demo", "src/a.ts"),
        "CONTAINS".to_owned()
    )));
    assert!(rels.contains(&(
        node_id::file("demo", "src/a.ts"),
        node_id::function("demo", "src/a.ts", "f", 1),
        "DEFINES".to_owned()
    )));
}

#[tokio::test]
async fn reingest_without_force_is_rejected() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let svc = service(graph.clone());
    let files = [source_file("src/a.ts", "export function f(){}")];
    svc.ingest_files(&files, &IngestOptions::for_repository("demo"))
        .await
        .expect("first ingestion");

    let err = svc
        .ingest_files(&files, &IngestOptions::for_repository("demo"))
        .await
        .expect_err("second ingestion without force");
    assert_eq!(err.code(), "REPOSITORY_EXISTS");
}

#[tokio::test]
async fn force_reingest_is_id_stable() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let svc = service(graph.clone());
    let files = [
        source_file("src/a.ts", "export function f(){}\nexport class C {}"),
        source_file("src/b.ts", "import { f } from './a';\nexport function g(){ f(); }"),
    ];
    svc.ingest_files(&files, &IngestOptions::for_repository("demo"))
        .await
        .expect("first ingestion");
    let first_nodes = graph.node_ids().await;
    let first_rels = graph.relationship_tuples().await;

    let mut options = IngestOptions::for_repository("demo");
    options.force = true;
    svc.ingest_files(&files, &options)
        .await
        .expect("forced re-ingestion");

    assert_eq!(graph.node_ids().await, first_nodes);
    assert_eq!(graph.relationship_tuples().await, first_rels);
}

#[tokio::test]
async fn empty_file_list_creates_only_repository_node() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let report = service(graph.clone())
        .ingest_files(&[], &IngestOptions::for_repository("demo"))
        .await
        .expect("empty ingestion");
    assert_eq!(report.status, IngestStatus::Success);
    assert_eq!(report.stats.files_processed, 0);
    assert_eq!(graph.node_ids().await, vec![node_id::repository("demo")]);
}

#[tokio::test]
async fn imports_produce_module_nodes_and_references() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let files = [
        source_file(
            "src/a.ts",
            "import fs from \"node:fs\";\nimport { helper } from './util';\nexport function f(){ helper(); }",
        ),
        source_file("src/util.ts", "export function helper(){}"),
    ];
    service(graph.clone())
        .ingest_files(&files, &IngestOptions::for_repository("demo"))
        .await
        .expect("ingestion");

    let ids = graph.node_ids().await;
    assert!(ids.contains(&node_id::module("node:fs")));

    let rels = graph.relationship_tuples().await;
    assert!(rels.contains(&(
        node_id::file("demo", "src/a.ts"),
        node_id::module("node:fs"),
        "IMPORTS".to_owned()
    )));
    // The relative import resolves to a file-to-file reference, not a module.
    assert!(rels.contains(&(
        node_id::file("demo", "src/a.ts"),
        node_id::file("demo", "src/util.ts"),
        "REFERENCES".to_owned()
    )));
    // Cross-file call resolved through the repository-wide function map.
    assert!(rels.contains(&(
        node_id::function("demo", "src/a.ts", "f", 3),
        node_id::function("demo", "src/util.ts", "helper", 1),
        "CALLS".to_owned()
    )));
}

#[tokio::test]
async fn unsupported_files_become_plain_file_nodes() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let report = service(graph.clone())
        .ingest_files(
            &[
                source_file("README.md", "# demo"),
                source_file("src/a.ts", "export function f(){}"),
            ],
            &IngestOptions::for_repository("demo"),
        )
        .await
        .expect("ingestion");
    assert_eq!(report.status, IngestStatus::Success);
    assert_eq!(report.stats.files_processed, 2);

    let ids = graph.node_ids().await;
    assert!(ids.contains(&node_id::file("demo", "README.md")));
    // No entities extracted from the markdown file.
    assert!(!ids.iter().any(|id| id.contains("README.md:")));
}

#[tokio::test]
async fn oversized_file_is_partial_not_fatal() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let parser: Arc<dyn CodeParser> = Arc::new(SourceCodeParser::new(ParserOptions {
        max_file_size_bytes: 32,
        ..ParserOptions::default()
    }));
    let svc = GraphIngestService::new(
        graph.clone() as Arc<dyn GraphStoreProvider>,
        parser,
        IngestConfig::default(),
    );
    let report = svc
        .ingest_files(
            &[
                source_file("src/ok.ts", "export function f(){}"),
                source_file(
                    "src/huge.ts",
                    "export function tooLongForTheConfiguredLimit(){}",
                ),
            ],
            &IngestOptions::for_repository("demo"),
        )
        .await
        .expect("ingestion runs");

    assert_eq!(report.status, IngestStatus::Partial);
    assert_eq!(report.stats.files_failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].file_path.as_deref(), Some("src/huge.ts"));
    assert!(report.errors[0].message.contains("FILE_TOO_LARGE_ERROR"));
}

#[tokio::test]
async fn progress_phases_arrive_in_order() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_events = events.clone();

    let mut options = IngestOptions::for_repository("demo");
    options.progress = Some(Arc::new(move |event| {
        sink_events.lock().expect("sink lock").push(event);
    }));

    service(graph)
        .ingest_files(&[source_file("src/a.ts", "export function f(){}")], &options)
        .await
        .expect("ingestion");

    let seen = events.lock().expect("events lock");
    let phases: Vec<IngestPhase> = seen.iter().map(|e| e.phase).collect();
    assert_eq!(phases.first(), Some(&IngestPhase::Initializing));
    assert_eq!(phases.last(), Some(&IngestPhase::Completed));
    let position = |phase: IngestPhase| {
        phases
            .iter()
            .position(|p| *p == phase)
            .unwrap_or(usize::MAX)
    };
    assert!(position(IngestPhase::CreatingRepositoryNode) < position(IngestPhase::CreatingFileNodes));
    assert!(position(IngestPhase::CreatingFileNodes) < position(IngestPhase::CreatingRelationships));
    assert!(position(IngestPhase::CreatingRelationships) < position(IngestPhase::Completed));
    assert!(seen.iter().all(|e| e.repository == "demo"));
    assert!(seen.iter().all(|e| e.percentage <= 100));
}
