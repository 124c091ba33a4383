//! Repository metadata store port.

use async_trait::async_trait;

use crate::entities::RepositoryInfo;
use crate::error::Result;

/// Persistent per-repository state (`repositories.json`).
///
/// Constructed once at the composition root and passed as a handle; tests
/// build their own store over a temporary directory instead of replacing a
/// process-global.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All known repositories.
    async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>>;

    /// One repository by name, or `None`.
    async fn get_repository(&self, name: &str) -> Result<Option<RepositoryInfo>>;

    /// Validate and persist one repository record (insert or replace).
    async fn update_repository(&self, info: RepositoryInfo) -> Result<()>;

    /// Remove one repository record; removing a missing name is a no-op.
    async fn remove_repository(&self, name: &str) -> Result<()>;
}
