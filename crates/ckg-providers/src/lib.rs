//! # Provider Layer
//!
//! Implementations of the domain ports:
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`vector_store`] | Chroma REST client and the in-memory store used in tests |
//! | [`graph_store`] | Neo4j bolt client and the in-memory store used in tests |
//! | [`parser`] | Tree-sitter TS/JS extraction and the out-of-process C# parser |
//! | [`vcs`] | git2-backed branch/diff operations |
//! | [`chunking`] | Line-window chunker feeding the vector pipeline |
//! | [`embedding`] | Embedding collaborator stubs |

pub mod chunking;
pub mod constants;
pub mod embedding;
pub mod graph_store;
pub mod parser;
pub mod vcs;
pub mod vector_store;
