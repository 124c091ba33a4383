//! # Application Layer
//!
//! Orchestration over the domain ports:
//!
//! | Use case | Description |
//! |----------|-------------|
//! | [`use_cases::GraphIngestService`] | Batched transformation of parsed files into graph mutations |
//! | [`use_cases::UpdateCoordinator`] | Incremental git-diff-driven refresh of both stores |
//! | [`use_cases::QueryService`] | Dependency, architecture, and context queries |
//!
//! Services receive `Arc<dyn Port>` handles; no provider types appear here.

pub mod use_cases;

pub use use_cases::{
    ArchitectureRequest, ArchitectureView, DetailLevel, GraphIngestService, IngestConfig,
    IngestOptions, QueryService, UpdateConfig, UpdateCoordinator,
};
