//! Domain-level constants and defaults.

/// Default node batch size for graph ingestion.
pub const DEFAULT_NODE_BATCH_SIZE: usize = 50;

/// Default relationship batch size for graph ingestion.
pub const DEFAULT_RELATIONSHIP_BATCH_SIZE: usize = 100;

/// Default rotation limit for per-repository update history.
pub const DEFAULT_UPDATE_HISTORY_LIMIT: usize = 50;

/// Default threshold after which an `updateInProgress` flag is considered
/// stale (seconds).
pub const DEFAULT_STALE_UPDATE_THRESHOLD_SECS: i64 = 2 * 60 * 60;

/// Default bounded concurrency for per-file work inside one update.
pub const DEFAULT_FILE_CONCURRENCY: usize = 4;

/// Default graph store connection pool size.
pub const DEFAULT_GRAPH_POOL_SIZE: usize = 50;

/// Default rename-detection similarity threshold (git scale, 0-100).
pub const DEFAULT_RENAME_SIMILARITY: u16 = 50;

/// Synthetic caller name for top-level call sites.
pub const MODULE_CALLER_NAME: &str = "<module>";

/// Synthetic name assigned to anonymous functions when their extraction is
/// enabled.
pub const ANONYMOUS_FUNCTION_NAME: &str = "<anonymous>";

/// Extensions recognized as documentation files in context expansion.
pub const DOCUMENTATION_EXTENSIONS: &[&str] = &["md", "txt", "rst"];
