//! Version-control port used by the incremental update coordinator.

use async_trait::async_trait;

use crate::entities::FileDiff;
use crate::error::Result;

/// Version-control operations against a local checkout.
#[async_trait]
pub trait VcsProvider: Send + Sync {
    /// Resolve the current HEAD commit sha of `branch`.
    async fn resolve_branch_head(&self, local_path: &str, branch: &str) -> Result<String>;

    /// File-level diff between two commits. Renames are classified as a
    /// paired delete+add using the provider's rename-detection window.
    async fn diff_commits(
        &self,
        local_path: &str,
        old_commit: &str,
        new_commit: &str,
    ) -> Result<FileDiff>;

    /// Read a file's content at a commit.
    async fn read_file_at(
        &self,
        local_path: &str,
        commit: &str,
        file_path: &str,
    ) -> Result<String>;
}
