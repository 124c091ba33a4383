//! Immutable value objects and pure derivations.

pub mod collection;
pub mod labels;
pub mod node_ref;

pub use collection::{sanitize_collection_name, COLLECTION_NAME_PREFIX, MAX_COLLECTION_NAME_LEN};
pub use labels::{validate_label, validate_relationship_type};
pub use node_ref::{node_id, NodeRef};
