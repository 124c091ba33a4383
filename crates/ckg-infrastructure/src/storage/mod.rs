//! Persistent infrastructure stores.

mod metadata;

pub use metadata::{JsonMetadataStore, MetadataStoreConfig};
