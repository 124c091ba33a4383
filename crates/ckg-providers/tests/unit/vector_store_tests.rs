//! Tests for the in-memory vector store (shared search semantics).

use std::collections::HashMap;

use serde_json::Value;

use ckg_domain::entities::VectorDocument;
use ckg_domain::ports::{SearchRequest, VectorStoreProvider};
use ckg_providers::vector_store::InMemoryVectorStore;

fn doc(id: &str, embedding: Vec<f32>, repository: &str, file_path: &str) -> VectorDocument {
    let mut metadata = HashMap::new();
    metadata.insert("repository".to_owned(), Value::from(repository));
    metadata.insert("file_path".to_owned(), Value::from(file_path));
    VectorDocument {
        id: id.to_owned(),
        content: format!("content of {id}"),
        embedding,
        metadata,
    }
}

async fn store_with_collection(name: &str) -> InMemoryVectorStore {
    let store = InMemoryVectorStore::new();
    store
        .get_or_create_collection(name)
        .await
        .expect("collection created");
    store
}

#[tokio::test]
async fn threshold_search_returns_descending_hits() {
    let store = store_with_collection("repo_demo").await;
    // Cosine distances to the query [1, 0]: 0.0, 0.6, 1.8.
    let docs = vec![
        doc("demo:src/a.ts:0", vec![1.0, 0.0], "demo", "src/a.ts"),
        doc("demo:src/b.ts:0", vec![0.4, 0.916_515], "demo", "src/b.ts"),
        doc("demo:src/c.ts:0", vec![-0.8, 0.6], "demo", "src/c.ts"),
    ];
    store
        .add_documents("repo_demo", &docs)
        .await
        .expect("documents added");

    let hits = store
        .similarity_search(&SearchRequest {
            embedding: vec![1.0, 0.0],
            collections: vec!["repo_demo".to_owned()],
            limit: 10,
            threshold: 0.5,
        })
        .await
        .expect("search succeeds");

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "demo:src/a.ts:0");
    assert!((hits[0].similarity - 1.0).abs() < 1e-4);
    assert_eq!(hits[1].id, "demo:src/b.ts:0");
    assert!((hits[1].similarity - 0.7).abs() < 1e-4);
}

#[tokio::test]
async fn threshold_one_returns_only_exact_matches() {
    let store = store_with_collection("repo_demo").await;
    store
        .add_documents(
            "repo_demo",
            &[
                doc("exact", vec![0.0, 1.0], "demo", "src/a.ts"),
                doc("close", vec![0.1, 0.995], "demo", "src/b.ts"),
            ],
        )
        .await
        .expect("added");

    let hits = store
        .similarity_search(&SearchRequest {
            embedding: vec![0.0, 1.0],
            collections: vec!["repo_demo".to_owned()],
            limit: 10,
            threshold: 1.0,
        })
        .await
        .expect("search succeeds");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "exact");
}

#[tokio::test]
async fn missing_collections_are_skipped_not_fatal() {
    let store = store_with_collection("repo_demo").await;
    store
        .add_documents("repo_demo", &[doc("only", vec![1.0, 0.0], "demo", "a.ts")])
        .await
        .expect("added");

    let hits = store
        .similarity_search(&SearchRequest {
            embedding: vec![1.0, 0.0],
            collections: vec!["repo_missing".to_owned(), "repo_demo".to_owned()],
            limit: 10,
            threshold: 0.0,
        })
        .await
        .expect("missing collection skipped");
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn invalid_search_parameters_are_rejected() {
    let store = store_with_collection("repo_demo").await;
    let err = store
        .similarity_search(&SearchRequest {
            embedding: vec![1.0],
            collections: vec!["repo_demo".to_owned()],
            limit: 10,
            threshold: 1.5,
        })
        .await
        .expect_err("threshold out of range");
    assert_eq!(err.code(), "INVALID_PARAMETERS");

    let err = store
        .similarity_search(&SearchRequest {
            embedding: vec![],
            collections: vec!["repo_demo".to_owned()],
            limit: 10,
            threshold: 0.5,
        })
        .await
        .expect_err("empty embedding");
    assert_eq!(err.code(), "INVALID_PARAMETERS");
}

#[tokio::test]
async fn delete_documents_is_idempotent_and_lazy() {
    let store = store_with_collection("repo_demo").await;
    store
        .add_documents("repo_demo", &[doc("gone", vec![1.0], "demo", "a.ts")])
        .await
        .expect("added");

    // Empty id list issues no backend call even for a missing collection.
    store
        .delete_documents("repo_never_created", &[])
        .await
        .expect("empty delete is a no-op");

    let ids = vec!["gone".to_owned()];
    store
        .delete_documents("repo_demo", &ids)
        .await
        .expect("first delete");
    store
        .delete_documents("repo_demo", &ids)
        .await
        .expect("second delete is a no-op");

    let err = store
        .delete_documents("repo_missing", &ids)
        .await
        .expect_err("missing collection is distinguishable");
    assert_eq!(err.code(), "COLLECTION_NOT_FOUND");
}

#[tokio::test]
async fn add_rejects_duplicates_upsert_replaces() {
    let store = store_with_collection("repo_demo").await;
    let original = doc("dup", vec![1.0], "demo", "a.ts");
    store
        .add_documents("repo_demo", std::slice::from_ref(&original))
        .await
        .expect("first add");
    let err = store
        .add_documents("repo_demo", std::slice::from_ref(&original))
        .await
        .expect_err("duplicate add fails");
    assert_eq!(err.code(), "DOCUMENT_OPERATION_ERROR");

    let mut replacement = original.clone();
    replacement.content = "updated".to_owned();
    store
        .upsert_documents("repo_demo", &[replacement])
        .await
        .expect("upsert replaces");
}

#[tokio::test]
async fn empty_where_clause_is_rejected() {
    let store = store_with_collection("repo_demo").await;
    let err = store
        .get_documents_by_metadata("repo_demo", &HashMap::new(), false)
        .await
        .expect_err("empty filter rejected");
    assert_eq!(err.code(), "INVALID_PARAMETERS");
}

#[tokio::test]
async fn file_prefix_delete_reports_count() {
    let store = store_with_collection("repo_demo").await;
    store
        .add_documents(
            "repo_demo",
            &[
                doc("demo:src/a.ts:0", vec![1.0], "demo", "src/a.ts"),
                doc("demo:src/a.ts:1", vec![1.0], "demo", "src/a.ts"),
                doc("demo:src/b.ts:0", vec![1.0], "demo", "src/b.ts"),
            ],
        )
        .await
        .expect("added");

    let deleted = store
        .delete_documents_by_file_prefix("repo_demo", "demo", "src/a.ts")
        .await
        .expect("prefix delete");
    assert_eq!(deleted, 2);

    let deleted_again = store
        .delete_documents_by_file_prefix("repo_demo", "demo", "src/a.ts")
        .await
        .expect("second prefix delete");
    assert_eq!(deleted_again, 0);

    let infos = store.list_collections().await.expect("list");
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].count, 1);
}

#[tokio::test]
async fn malformed_documents_are_rejected() {
    let store = store_with_collection("repo_demo").await;
    let mut empty_embedding = doc("bad", vec![], "demo", "a.ts");
    empty_embedding.embedding.clear();
    let err = store
        .add_documents("repo_demo", &[empty_embedding])
        .await
        .expect_err("empty embedding rejected");
    assert_eq!(err.code(), "INVALID_PARAMETERS");
}
