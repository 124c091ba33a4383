//! Core business entities.

pub mod chunk;
pub mod graph;
pub mod parse;
pub mod repository;
pub mod update;

pub use chunk::{Chunk, ChunkMetadata, CollectionInfo, SearchResult, VectorDocument};
pub use graph::{GraphNode, GraphRelationship, NodeKind, RelationshipKind, Subgraph};
pub use parse::{
    CallSite, CodeEntity, EntityKind, ExportStatement, ImportStatement, Parameter,
    ParseDiagnostic, ParseResult, SourceLanguage,
};
pub use repository::{
    MetadataFile, RepositoryInfo, RepositoryStatus, UpdateHistoryEntry, METADATA_SCHEMA_VERSION,
};
pub use update::{
    FileDiff, IngestError, IngestPhase, IngestReport, IngestStats, IngestStatus, ProgressEvent,
    SourceFile, UpdateResult, UpdateStatus, UpdateSummary,
};
