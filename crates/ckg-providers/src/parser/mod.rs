//! Code parsers.
//!
//! Language dispatch is a tagged enum plus a match: TS/JS variants go to the
//! tree-sitter extractor, C# to the out-of-process helper. New languages
//! extend [`SourceLanguage`] and the match below.

mod csharp;
mod typescript;

pub use csharp::{reset_toolchain_detection, toolchain_available, CSharpParser, CSharpParserConfig};
pub use typescript::parse_source;

use async_trait::async_trait;

use ckg_domain::entities::{ParseResult, SourceLanguage};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{CodeParser, ParserOptions};

/// The production parser: tree-sitter for TS/JS, subprocess for C#.
#[derive(Debug, Default)]
pub struct SourceCodeParser {
    options: ParserOptions,
    csharp: CSharpParser,
}

impl SourceCodeParser {
    /// Create a parser with the given options.
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            csharp: CSharpParser::default(),
        }
    }

    /// Create a parser with options and a custom C# helper configuration.
    #[must_use]
    pub fn with_csharp(options: ParserOptions, csharp: CSharpParser) -> Self {
        Self { options, csharp }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }
}

#[async_trait]
impl CodeParser for SourceCodeParser {
    async fn parse(&self, content: &str, file_name: &str) -> Result<ParseResult> {
        let language = SourceLanguage::from_file_name(file_name)
            .ok_or_else(|| Error::language_not_supported(file_name))?;

        let size_bytes = content.len() as u64;
        if size_bytes > self.options.max_file_size_bytes {
            return Err(Error::FileTooLarge {
                file_name: file_name.to_owned(),
                size_bytes,
                max_bytes: self.options.max_file_size_bytes,
            });
        }

        match language {
            SourceLanguage::CSharp => self.csharp.parse(content, file_name).await,
            SourceLanguage::TypeScript | SourceLanguage::Tsx | SourceLanguage::JavaScript => {
                let options = self.options.clone();
                let owned_content = content.to_owned();
                let deadline = std::time::Duration::from_millis(self.options.timeout_ms);
                let parse_task = tokio::task::spawn_blocking(move || {
                    parse_source(&owned_content, language, &options)
                });
                match tokio::time::timeout(deadline, parse_task).await {
                    Ok(joined) => joined.map_err(|e| {
                        Error::extraction(format!("parser task panicked: {e}"))
                    })?,
                    Err(_) => Err(Error::ParseTimeout {
                        file_name: file_name.to_owned(),
                        timeout_ms: self.options.timeout_ms,
                    }),
                }
            }
        }
    }

    fn supported_language(&self, file_name: &str) -> Option<SourceLanguage> {
        SourceLanguage::from_file_name(file_name)
    }
}
