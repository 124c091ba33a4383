//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ckg_domain::constants::{
    DEFAULT_FILE_CONCURRENCY, DEFAULT_GRAPH_POOL_SIZE, DEFAULT_NODE_BATCH_SIZE,
    DEFAULT_RELATIONSHIP_BATCH_SIZE, DEFAULT_RENAME_SIMILARITY,
    DEFAULT_STALE_UPDATE_THRESHOLD_SECS, DEFAULT_UPDATE_HISTORY_LIMIT,
};

/// Graph store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphStoreSettings {
    /// Bolt URI
    pub uri: String,
    /// Username
    pub user: String,
    /// Password
    pub password: String,
    /// Database name; server default when absent
    pub database: Option<String>,
    /// Connection pool size
    pub max_connections: usize,
    /// Per-query timeout (seconds)
    pub query_timeout_secs: u64,
    /// Prefer the APOC path-expansion procedure
    pub use_apoc: bool,
}

impl Default for GraphStoreSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_owned(),
            user: "neo4j".to_owned(),
            password: String::new(),
            database: None,
            max_connections: DEFAULT_GRAPH_POOL_SIZE,
            query_timeout_secs: 30,
            use_apoc: false,
        }
    }
}

/// Vector store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Base URL of the Chroma server
    pub url: String,
    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_owned(),
            request_timeout_secs: 30,
        }
    }
}

/// Parser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Hard failure threshold for input size (bytes)
    pub max_file_size_bytes: u64,
    /// Per-parse deadline (milliseconds)
    pub timeout_ms: u64,
    /// Extract anonymous functions as `<anonymous>`
    pub include_anonymous: bool,
    /// Capture leading doc comments
    pub extract_documentation: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 2 * 1024 * 1024,
            timeout_ms: 10_000,
            include_anonymous: false,
            extract_documentation: true,
        }
    }
}

/// Ingestion batch sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    /// Nodes per UNWIND batch
    pub node_batch_size: usize,
    /// Relationships per UNWIND batch
    pub relationship_batch_size: usize,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            node_batch_size: DEFAULT_NODE_BATCH_SIZE,
            relationship_batch_size: DEFAULT_RELATIONSHIP_BATCH_SIZE,
        }
    }
}

/// Incremental update settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    /// Rotation limit for update history
    pub history_limit: usize,
    /// Seconds after which a persisted in-progress flag is stale
    pub stale_threshold_secs: i64,
    /// Bounded per-file concurrency inside one repository
    pub file_concurrency: usize,
    /// Rename-detection similarity threshold (0-100)
    pub rename_similarity: u16,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_UPDATE_HISTORY_LIMIT,
            stale_threshold_secs: DEFAULT_STALE_UPDATE_THRESHOLD_SECS,
            file_concurrency: DEFAULT_FILE_CONCURRENCY,
            rename_similarity: DEFAULT_RENAME_SIMILARITY,
        }
    }
}

/// Retry policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum re-attempts after the initial try
    pub max_retries: u32,
    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay (milliseconds)
    pub max_delay_ms: u64,
    /// Exponential growth factor
    pub multiplier: f64,
    /// Apply ±25% jitter
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 10_000,
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetrySettings {
    /// Convert into the domain retry configuration.
    #[must_use]
    pub fn to_retry_config(&self) -> ckg_domain::utils::RetryConfig {
        ckg_domain::utils::RetryConfig {
            max_retries: self.max_retries,
            initial_delay: std::time::Duration::from_millis(self.initial_delay_ms),
            max_delay: std::time::Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
            jitter: self.jitter,
        }
    }
}

/// Top-level application configuration (the `settings:` section).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding persisted state (`repositories.json`)
    pub data_path: Option<PathBuf>,
    /// Graph store settings
    pub graph_store: GraphStoreSettings,
    /// Vector store settings
    pub vector_store: VectorStoreSettings,
    /// Parser settings
    pub parser: ParserSettings,
    /// Ingestion settings
    pub indexing: IndexingSettings,
    /// Incremental update settings
    pub updates: UpdateSettings,
    /// Retry policy
    pub retry: RetrySettings,
}
