//! Provider configuration constants.

/// Default Chroma base URL.
pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";

/// Default per-request timeout for vector store calls (seconds).
pub const VECTOR_STORE_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default bolt URI for the graph store.
pub const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";

/// Default per-query timeout for graph store calls (seconds).
pub const GRAPH_QUERY_TIMEOUT_SECS: u64 = 30;

/// Default retry count for vector store API requests.
pub const VECTOR_STORE_RETRY_COUNT: u32 = 2;

/// Default retry count for graph store queries.
pub const GRAPH_STORE_RETRY_COUNT: u32 = 3;

/// Default chunk size for the line-window chunker (lines).
pub const CHUNK_MAX_LINES: usize = 100;

/// Default chunk overlap for the line-window chunker (lines).
pub const CHUNK_OVERLAP_LINES: usize = 10;
