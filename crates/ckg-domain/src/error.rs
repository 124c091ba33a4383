//! Error handling types
//!
//! Every failure surfaced at a component boundary is one of the closed set of
//! variants below. Each variant maps to a stable code string (see [`Error::code`])
//! so downstream consumers can branch on kind without parsing messages.

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed source error attached to variants that wrap an underlying cause.
pub type ErrorSource = Option<Box<dyn std::error::Error + Send + Sync>>;

/// Main error type for the code-knowledge indexing service
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure reaching the vector or graph store
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure
        message: String,
        /// Optional underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A backend health check did not come back healthy
    #[error("Health check failed: {message}")]
    HealthCheckFailed {
        /// Description of the failed check
        message: String,
    },

    /// Vector store collection does not exist
    #[error("Collection not found: {name}")]
    CollectionNotFound {
        /// Name of the missing collection
        name: String,
    },

    /// Collection create/get operation failed
    #[error("Collection operation failed: {message}")]
    CollectionOperation {
        /// Description of the collection failure
        message: String,
        /// Optional underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Collection deletion failed
    #[error("Collection delete failed: {message}")]
    CollectionDelete {
        /// Description of the delete failure
        message: String,
    },

    /// Listing collections failed
    #[error("Collection list failed: {message}")]
    CollectionList {
        /// Description of the list failure
        message: String,
    },

    /// Collection statistics query failed
    #[error("Collection stats failed: {message}")]
    CollectionStats {
        /// Description of the stats failure
        message: String,
    },

    /// Caller-supplied parameters failed validation
    #[error("Invalid parameters: {message}")]
    InvalidParameters {
        /// Description of the invalid input
        message: String,
    },

    /// Document add/upsert/get/delete operation failed
    #[error("Document operation failed: {message}")]
    DocumentOperation {
        /// Description of the document failure
        message: String,
        /// Optional underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Similarity search failed
    #[error("Search operation failed: {message}")]
    SearchOperation {
        /// Description of the search failure
        message: String,
        /// Optional underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An operation exceeded its configured deadline
    #[error("Timeout: {message}")]
    Timeout {
        /// Description of what timed out
        message: String,
    },

    /// Graph store query or mutation failed
    #[error("Graph error: {message}")]
    Graph {
        /// Description of the graph failure
        message: String,
        /// Optional underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Graph node does not exist
    #[error("Node not found: {id}")]
    NodeNotFound {
        /// Deterministic id of the missing node
        id: String,
    },

    /// Repository already ingested and `force` was not set
    #[error("Repository already exists: {name}")]
    RepositoryExists {
        /// Name of the conflicting repository
        name: String,
    },

    /// Repository metadata operation failed
    #[error("Repository metadata error: {message}")]
    RepositoryMetadata {
        /// Description of the metadata failure
        message: String,
    },

    /// Filesystem operation (read, write, rename) failed
    #[error("File operation error: {message}")]
    FileOperation {
        /// Description of the file failure
        message: String,
        /// Optional underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Metadata file content is not the supported schema
    #[error("Invalid metadata format: {message}")]
    InvalidMetadataFormat {
        /// Description of the schema violation
        message: String,
    },

    /// Input violated a structural rule (labels, relationship types, ids)
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the violated rule
        message: String,
    },

    /// File extension maps to no supported parser
    #[error("Language not supported: {file_name}")]
    LanguageNotSupported {
        /// File whose language could not be resolved
        file_name: String,
    },

    /// Parser backend could not be constructed
    #[error("Parser initialization error: {message}")]
    ParserInitialization {
        /// Description of the initialization failure
        message: String,
    },

    /// A single parse exceeded the configured timeout
    #[error("Parse timeout after {timeout_ms}ms: {file_name}")]
    ParseTimeout {
        /// File being parsed when the deadline expired
        file_name: String,
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// File exceeds the configured maximum parse size
    #[error("File too large: {file_name} ({size_bytes} bytes, max {max_bytes})")]
    FileTooLarge {
        /// Offending file
        file_name: String,
        /// Actual size
        size_bytes: u64,
        /// Configured maximum
        max_bytes: u64,
    },

    /// Entity extraction failed after a successful parse
    #[error("Extraction error: {message}")]
    Extraction {
        /// Description of the extraction failure
        message: String,
        /// Optional underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Stable code string for this error kind.
    ///
    /// These strings are part of the external contract and never change.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "CONNECTION_ERROR",
            Self::HealthCheckFailed { .. } => "HEALTH_CHECK_FAILED",
            Self::CollectionNotFound { .. } => "COLLECTION_NOT_FOUND",
            Self::CollectionOperation { .. } => "COLLECTION_OPERATION_ERROR",
            Self::CollectionDelete { .. } => "COLLECTION_DELETE_ERROR",
            Self::CollectionList { .. } => "COLLECTION_LIST_ERROR",
            Self::CollectionStats { .. } => "COLLECTION_STATS_ERROR",
            Self::InvalidParameters { .. } => "INVALID_PARAMETERS",
            Self::DocumentOperation { .. } => "DOCUMENT_OPERATION_ERROR",
            Self::SearchOperation { .. } => "SEARCH_OPERATION_ERROR",
            Self::Timeout { .. } => "TIMEOUT_ERROR",
            Self::Graph { .. } => "GRAPH_ERROR",
            Self::NodeNotFound { .. } => "NODE_NOT_FOUND",
            Self::RepositoryExists { .. } => "REPOSITORY_EXISTS",
            Self::RepositoryMetadata { .. } => "REPOSITORY_METADATA_ERROR",
            Self::FileOperation { .. } => "FILE_OPERATION_ERROR",
            Self::InvalidMetadataFormat { .. } => "INVALID_METADATA_FORMAT",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::LanguageNotSupported { .. } => "LANGUAGE_NOT_SUPPORTED",
            Self::ParserInitialization { .. } => "PARSER_INITIALIZATION_ERROR",
            Self::ParseTimeout { .. } => "PARSE_TIMEOUT_ERROR",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE_ERROR",
            Self::Extraction { .. } => "EXTRACTION_ERROR",
        }
    }

    /// Whether the retry harness may re-attempt an operation that failed
    /// with this error.
    ///
    /// Connection resets, timeouts, and failed health probes are transient;
    /// everything user- or schema-induced is permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::HealthCheckFailed { .. }
        )
    }
}

// Store and transport error constructors
impl Error {
    /// Create a connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error with source
    pub fn connection_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a health check error
    pub fn health_check<S: Into<String>>(message: S) -> Self {
        Self::HealthCheckFailed {
            message: message.into(),
        }
    }

    /// Create a collection not found error
    pub fn collection_not_found<S: Into<String>>(name: S) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Create a collection operation error
    pub fn collection_operation<S: Into<String>>(message: S) -> Self {
        Self::CollectionOperation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a collection operation error with source
    pub fn collection_operation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CollectionOperation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a collection delete error
    pub fn collection_delete<S: Into<String>>(message: S) -> Self {
        Self::CollectionDelete {
            message: message.into(),
        }
    }

    /// Create a collection list error
    pub fn collection_list<S: Into<String>>(message: S) -> Self {
        Self::CollectionList {
            message: message.into(),
        }
    }

    /// Create a collection stats error
    pub fn collection_stats<S: Into<String>>(message: S) -> Self {
        Self::CollectionStats {
            message: message.into(),
        }
    }

    /// Create a document operation error
    pub fn document_operation<S: Into<String>>(message: S) -> Self {
        Self::DocumentOperation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a document operation error with source
    pub fn document_operation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DocumentOperation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a search operation error
    pub fn search_operation<S: Into<String>>(message: S) -> Self {
        Self::SearchOperation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }
}

// Graph error constructors
impl Error {
    /// Create a graph error
    pub fn graph<S: Into<String>>(message: S) -> Self {
        Self::Graph {
            message: message.into(),
            source: None,
        }
    }

    /// Create a graph error with source
    pub fn graph_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Graph {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a node not found error
    pub fn node_not_found<S: Into<String>>(id: S) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a repository exists error
    pub fn repository_exists<S: Into<String>>(name: S) -> Self {
        Self::RepositoryExists { name: name.into() }
    }
}

// Metadata and filesystem error constructors
impl Error {
    /// Create a repository metadata error
    pub fn repository_metadata<S: Into<String>>(message: S) -> Self {
        Self::RepositoryMetadata {
            message: message.into(),
        }
    }

    /// Create a file operation error
    pub fn file_operation<S: Into<String>>(message: S) -> Self {
        Self::FileOperation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a file operation error with source
    pub fn file_operation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::FileOperation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid metadata format error
    pub fn invalid_metadata_format<S: Into<String>>(message: S) -> Self {
        Self::InvalidMetadataFormat {
            message: message.into(),
        }
    }
}

// Validation and parser error constructors
impl Error {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a language not supported error
    pub fn language_not_supported<S: Into<String>>(file_name: S) -> Self {
        Self::LanguageNotSupported {
            file_name: file_name.into(),
        }
    }

    /// Create a parser initialization error
    pub fn parser_initialization<S: Into<String>>(message: S) -> Self {
        Self::ParserInitialization {
            message: message.into(),
        }
    }

    /// Create an extraction error
    pub fn extraction<S: Into<String>>(message: S) -> Self {
        Self::Extraction {
            message: message.into(),
            source: None,
        }
    }
}
