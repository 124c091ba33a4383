//! # Infrastructure Layer
//!
//! Configuration loading, logging initialization, and the repository
//! metadata store.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | YAML `settings:` loader with validation |
//! | [`logging`] | tracing subscriber setup |
//! | [`storage`] | `repositories.json` metadata store with atomic writes |

pub mod config;
pub mod logging;
pub mod storage;

pub use config::{AppConfig, ConfigLoader};
pub use storage::{JsonMetadataStore, MetadataStoreConfig};
