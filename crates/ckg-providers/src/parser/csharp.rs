//! Out-of-process C# parser.
//!
//! Invoked only when the .NET toolchain is detected. Detection runs once and
//! is cached for the process lifetime; tests reset the cache explicitly.
//! The helper process receives the source on stdin and returns a JSON
//! [`ParseResult`] on stdout.

use std::process::Stdio;
use std::sync::Mutex;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use ckg_domain::entities::ParseResult;
use ckg_domain::error::{Error, Result};

static TOOLCHAIN_DETECTED: Mutex<Option<bool>> = Mutex::new(None);

/// Whether the .NET toolchain is available, probing at most once per
/// process.
pub async fn toolchain_available() -> bool {
    if let Ok(cache) = TOOLCHAIN_DETECTED.lock()
        && let Some(cached) = *cache
    {
        return cached;
    }
    let detected = Command::new("dotnet")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false);
    if let Ok(mut cache) = TOOLCHAIN_DETECTED.lock() {
        *cache = Some(detected);
    }
    debug!(detected, "C# toolchain detection");
    detected
}

/// Reset the cached toolchain detection (tests only).
pub fn reset_toolchain_detection() {
    if let Ok(mut cache) = TOOLCHAIN_DETECTED.lock() {
        *cache = None;
    }
}

/// Out-of-process C# parser configuration.
#[derive(Debug, Clone)]
pub struct CSharpParserConfig {
    /// Helper executable invoked per parse
    pub helper_command: String,
    /// Arguments passed before the file name
    pub helper_args: Vec<String>,
}

impl Default for CSharpParserConfig {
    fn default() -> Self {
        Self {
            helper_command: "ckg-csharp-parser".to_owned(),
            helper_args: Vec::new(),
        }
    }
}

/// Subprocess-backed C# parser.
#[derive(Debug, Clone, Default)]
pub struct CSharpParser {
    config: CSharpParserConfig,
}

impl CSharpParser {
    /// Create a parser with the given helper configuration.
    #[must_use]
    pub fn new(config: CSharpParserConfig) -> Self {
        Self { config }
    }

    /// Parse C# content by piping it through the helper process.
    ///
    /// # Errors
    ///
    /// `LANGUAGE_NOT_SUPPORTED` when the toolchain is absent;
    /// `EXTRACTION_ERROR` when the helper fails or returns malformed JSON.
    pub async fn parse(&self, content: &str, file_name: &str) -> Result<ParseResult> {
        if !toolchain_available().await {
            return Err(Error::language_not_supported(file_name));
        }

        let mut child = Command::new(&self.config.helper_command)
            .args(&self.config.helper_args)
            .arg(file_name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::Extraction {
                    message: format!(
                        "failed to spawn C# helper '{}'",
                        self.config.helper_command
                    ),
                    source: Some(Box::new(e)),
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(content.as_bytes())
                .await
                .map_err(|e| Error::extraction(format!("failed to write to C# helper: {e}")))?;
        }
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::extraction(format!("C# helper did not terminate: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(file = file_name, %stderr, "C# helper exited non-zero");
            return Err(Error::extraction(format!(
                "C# helper failed for '{file_name}' with status {}",
                output.status
            )));
        }

        serde_json::from_slice::<ParseResult>(&output.stdout)
            .map_err(|e| Error::extraction(format!("malformed C# helper output: {e}")))
    }
}
