//! Configuration loading.
//!
//! Application settings live under the `settings:` key of a YAML file,
//! resolved from an explicit path or `CKG_ENV` (default: `development`,
//! giving `config/development.yaml`, overridable by
//! `config/development.local.yaml`).

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AppConfig, GraphStoreSettings, IndexingSettings, ParserSettings, RetrySettings,
    UpdateSettings, VectorStoreSettings,
};
