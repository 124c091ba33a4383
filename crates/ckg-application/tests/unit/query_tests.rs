//! Tests for the query service.

use std::sync::Arc;

use ckg_application::{ArchitectureRequest, DetailLevel, QueryService};
use ckg_domain::entities::NodeKind;
use ckg_domain::ports::{
    ContextKind, ContextRequest, DependencyDirection, DependencyRequest, GraphStoreProvider,
};
use ckg_domain::value_objects::NodeRef;

use crate::common::{ingested_graph, source_file};

async fn seeded_service() -> QueryService {
    let files = [
        source_file(
            "src/a.ts",
            "import fs from \"node:fs\";\nimport { helper } from './util';\nexport function f(){ helper(); }",
        ),
        source_file("src/util.ts", "export function helper(){}"),
    ];
    let (graph, _parser) = ingested_graph("demo", &files).await;
    QueryService::new(graph as Arc<dyn GraphStoreProvider>)
}

#[tokio::test]
async fn dependencies_require_repository_scope() {
    let service = seeded_service().await;
    let err = service
        .get_dependencies(DependencyRequest {
            target: NodeRef {
                kind: NodeKind::Function,
                identifier: "f".into(),
                repository: None,
            },
            direction: DependencyDirection::DependsOn,
            transitive: false,
            max_depth: 3,
        })
        .await
        .expect_err("missing scope");
    assert_eq!(err.code(), "INVALID_PARAMETERS");
}

#[tokio::test]
async fn dependencies_reject_out_of_range_depth() {
    let service = seeded_service().await;
    let err = service
        .get_dependencies(DependencyRequest {
            target: NodeRef::file("demo", "src/a.ts"),
            direction: DependencyDirection::DependsOn,
            transitive: true,
            max_depth: 9,
        })
        .await
        .expect_err("depth out of range");
    assert_eq!(err.code(), "INVALID_PARAMETERS");
}

#[tokio::test]
async fn dependencies_fan_out_to_the_graph() {
    let service = seeded_service().await;
    let report = service
        .get_dependencies(DependencyRequest {
            target: NodeRef {
                kind: NodeKind::Function,
                identifier: "f".into(),
                repository: Some("demo".into()),
            },
            direction: DependencyDirection::DependsOn,
            transitive: false,
            max_depth: 3,
        })
        .await
        .expect("analysis runs");
    assert_eq!(report.direct.len(), 1);
    assert_eq!(report.direct[0].name, "helper");
    assert_eq!(report.direct[0].relationship, "CALLS");
}

#[tokio::test]
async fn graph_errors_propagate_with_kind() {
    let service = seeded_service().await;
    let err = service
        .get_dependencies(DependencyRequest {
            target: NodeRef {
                kind: NodeKind::Function,
                identifier: "missing".into(),
                repository: Some("demo".into()),
            },
            direction: DependencyDirection::DependsOn,
            transitive: false,
            max_depth: 3,
        })
        .await
        .expect_err("unknown target");
    assert_eq!(err.code(), "NODE_NOT_FOUND");
}

#[tokio::test]
async fn architecture_projects_by_detail_level() {
    let service = seeded_service().await;

    let modules = service
        .get_architecture(ArchitectureRequest {
            repository: "demo".into(),
            detail_level: DetailLevel::Modules,
        })
        .await
        .expect("modules view");
    assert!(modules
        .subgraph
        .nodes
        .iter()
        .all(|n| matches!(n.label.as_str(), "Repository" | "File" | "Module")));
    assert!(modules.subgraph.nodes.iter().any(|n| n.label == "Module"));

    let files = service
        .get_architecture(ArchitectureRequest {
            repository: "demo".into(),
            detail_level: DetailLevel::Files,
        })
        .await
        .expect("files view");
    assert!(files
        .subgraph
        .nodes
        .iter()
        .all(|n| matches!(n.label.as_str(), "Repository" | "File")));

    let entities = service
        .get_architecture(ArchitectureRequest {
            repository: "demo".into(),
            detail_level: DetailLevel::Entities,
        })
        .await
        .expect("entities view");
    assert!(entities.subgraph.nodes.iter().any(|n| n.label == "Function"));
    // Every surviving relationship connects surviving nodes.
    for rel in &entities.subgraph.relationships {
        assert!(entities.subgraph.nodes.iter().any(|n| n.id == rel.from_id));
        assert!(entities.subgraph.nodes.iter().any(|n| n.id == rel.to_id));
    }
}

#[tokio::test]
async fn architecture_rejects_empty_repository() {
    let service = seeded_service().await;
    let err = service
        .get_architecture(ArchitectureRequest {
            repository: "  ".into(),
            detail_level: DetailLevel::Files,
        })
        .await
        .expect_err("empty repository");
    assert_eq!(err.code(), "INVALID_PARAMETERS");
}

#[tokio::test]
async fn related_context_validates_and_fans_out() {
    let service = seeded_service().await;

    let err = service
        .get_related_context(ContextRequest {
            seeds: vec![],
            include: vec![ContextKind::Imports],
            limit: 10,
        })
        .await
        .expect_err("empty seeds");
    assert_eq!(err.code(), "INVALID_PARAMETERS");

    let err = service
        .get_related_context(ContextRequest {
            seeds: vec![NodeRef::file("demo", "src/a.ts")],
            include: vec![ContextKind::Imports],
            limit: 500,
        })
        .await
        .expect_err("limit out of range");
    assert_eq!(err.code(), "INVALID_PARAMETERS");

    let items = service
        .get_related_context(ContextRequest {
            seeds: vec![NodeRef::file("demo", "src/a.ts")],
            include: vec![ContextKind::Imports, ContextKind::Siblings],
            limit: 10,
        })
        .await
        .expect("context expansion");
    assert!(items.iter().any(|i| i.kind == ContextKind::Imports));
    assert!(items.iter().any(|i| i.kind == ContextKind::Siblings));
    assert!(items.iter().all(|i| (i.relevance - 0.8).abs() < f32::EPSILON));
}
