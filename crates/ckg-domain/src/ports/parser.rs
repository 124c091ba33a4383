//! Code parser port.

use async_trait::async_trait;

use crate::entities::{ParseResult, SourceLanguage};
use crate::error::Result;

/// Parser configuration options.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Hard failure threshold for input size
    pub max_file_size_bytes: u64,
    /// Per-parse wall-clock deadline
    pub timeout_ms: u64,
    /// Include anonymous functions as `<anonymous>` entities
    pub include_anonymous: bool,
    /// Capture leading doc-comment blocks verbatim
    pub extract_documentation: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 2 * 1024 * 1024,
            timeout_ms: 10_000,
            include_anonymous: false,
            extract_documentation: true,
        }
    }
}

/// Source-code parsing port.
///
/// Implementations are error-tolerant: recoverable syntax errors produce a
/// successful result with diagnostics; only init failures, unsupported
/// languages, oversized files, and timeouts are hard errors.
#[async_trait]
pub trait CodeParser: Send + Sync {
    /// Parse file content into entities, imports, exports, and calls.
    async fn parse(&self, content: &str, file_name: &str) -> Result<ParseResult>;

    /// Resolve the language this parser would use for a file, if any.
    fn supported_language(&self, file_name: &str) -> Option<SourceLanguage>;
}
