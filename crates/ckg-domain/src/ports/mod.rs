//! Port interfaces implemented by providers and infrastructure.

pub mod embedding;
pub mod graph_store;
pub mod metadata;
pub mod parser;
pub mod progress;
pub mod vcs;
pub mod vector_store;

pub use embedding::{Chunker, EmbeddingProvider};
pub use graph_store::{
    ContextItem, ContextKind, ContextRequest, DependencyDirection, DependencyEntry,
    DependencyReport, DependencyRequest, FileSubgraph, GraphStoreProvider, TraversalRequest,
    CONTEXT_RELEVANCE, MAX_CONTEXT_LIMIT, MAX_TRAVERSAL_DEPTH, MAX_TRAVERSAL_LIMIT,
};
pub use metadata::MetadataStore;
pub use parser::{CodeParser, ParserOptions};
pub use progress::{CancellationFlag, ProgressSink};
pub use vcs::VcsProvider;
pub use vector_store::{SearchRequest, VectorStoreProvider};
