//! # Domain Layer
//!
//! Core types, ports, and business rules for the CKG code-knowledge
//! indexing service.
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`entities`] | Graph nodes, parse results, chunks, repository metadata |
//! | [`value_objects`] | Label validation, collection-name sanitization, node refs |
//! | [`ports`] | Provider port interfaces (vector store, graph store, parser, VCS, metadata) |
//! | [`utils`] | Retry harness and hashing helpers |
//! | [`constants`] | Domain defaults |
//! | [`error`] | The closed error set with stable codes |
//!
//! ## Principles
//!
//! - Entities are plain serde types; relationships stay `(from, to, type)`
//!   tuples — never an in-memory cyclic object graph.
//! - Ports are `async_trait` traits consumed as `Arc<dyn Port>`.
//! - Every boundary failure is one of the closed error variants and carries
//!   a stable code string.

pub mod constants;
pub mod entities;
pub mod error;
pub mod ports;
pub mod utils;
pub mod value_objects;

pub use error::{Error, Result};
