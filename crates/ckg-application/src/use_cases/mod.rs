//! Use cases orchestrating the provider ports.

pub mod ingest;
pub mod query;
pub mod update;

pub use ingest::{GraphIngestService, IngestConfig, IngestOptions};
pub use query::{ArchitectureRequest, ArchitectureView, DetailLevel, QueryService};
pub use update::{UpdateConfig, UpdateCoordinator};
