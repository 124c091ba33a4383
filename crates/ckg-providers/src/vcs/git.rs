//! git2-backed VCS provider.
//!
//! libgit2 calls are blocking, so every operation runs on the blocking
//! thread pool. Renames are paired back into delete+add at the port
//! boundary.

use std::path::Path;

use async_trait::async_trait;
use git2::{Delta, DiffFindOptions, Oid, Repository};

use ckg_domain::constants::DEFAULT_RENAME_SIMILARITY;
use ckg_domain::entities::FileDiff;
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::VcsProvider;

/// git2 provider configuration.
#[derive(Debug, Clone)]
pub struct Git2ProviderConfig {
    /// Rename-detection similarity threshold (0-100, git scale)
    pub rename_similarity: u16,
}

impl Default for Git2ProviderConfig {
    fn default() -> Self {
        Self {
            rename_similarity: DEFAULT_RENAME_SIMILARITY,
        }
    }
}

/// VCS provider backed by libgit2.
#[derive(Debug, Clone, Default)]
pub struct Git2Provider {
    config: Git2ProviderConfig,
}

impl Git2Provider {
    /// Create a provider with the given configuration.
    #[must_use]
    pub fn new(config: Git2ProviderConfig) -> Self {
        Self { config }
    }

    fn open(local_path: &str) -> Result<Repository> {
        Repository::open(local_path).map_err(|e| {
            Error::file_operation_with_source(
                format!("failed to open git repository at '{local_path}'"),
                e,
            )
        })
    }

    fn resolve_commit(repo: &Repository, commit: &str) -> Result<Oid> {
        Oid::from_str(commit)
            .map_err(|e| Error::file_operation_with_source(format!("invalid commit '{commit}'"), e))
    }
}

#[async_trait]
impl VcsProvider for Git2Provider {
    async fn resolve_branch_head(&self, local_path: &str, branch: &str) -> Result<String> {
        let local_path = local_path.to_owned();
        let branch = branch.to_owned();
        tokio::task::spawn_blocking(move || {
            let repo = Self::open(&local_path)?;
            let reference = repo
                .revparse_single(&format!("refs/heads/{branch}"))
                .or_else(|_| repo.revparse_single(&branch))
                .map_err(|e| {
                    Error::file_operation_with_source(
                        format!("failed to resolve branch '{branch}'"),
                        e,
                    )
                })?;
            let commit = reference.peel_to_commit().map_err(|e| {
                Error::file_operation_with_source(
                    format!("branch '{branch}' does not point at a commit"),
                    e,
                )
            })?;
            Ok(commit.id().to_string())
        })
        .await
        .map_err(|e| Error::file_operation(format!("git task panicked: {e}")))?
    }

    async fn diff_commits(
        &self,
        local_path: &str,
        old_commit: &str,
        new_commit: &str,
    ) -> Result<FileDiff> {
        let local_path = local_path.to_owned();
        let old_commit = old_commit.to_owned();
        let new_commit = new_commit.to_owned();
        let rename_similarity = self.config.rename_similarity;
        tokio::task::spawn_blocking(move || {
            let repo = Self::open(&local_path)?;
            let old_tree = repo
                .find_commit(Self::resolve_commit(&repo, &old_commit)?)
                .and_then(|c| c.tree())
                .map_err(|e| {
                    Error::file_operation_with_source(
                        format!("failed to load tree for '{old_commit}'"),
                        e,
                    )
                })?;
            let new_tree = repo
                .find_commit(Self::resolve_commit(&repo, &new_commit)?)
                .and_then(|c| c.tree())
                .map_err(|e| {
                    Error::file_operation_with_source(
                        format!("failed to load tree for '{new_commit}'"),
                        e,
                    )
                })?;

            let mut diff = repo
                .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)
                .map_err(|e| Error::file_operation_with_source("diff failed", e))?;
            let mut find_opts = DiffFindOptions::new();
            find_opts.renames(true);
            find_opts.rename_threshold(rename_similarity);
            diff.find_similar(Some(&mut find_opts))
                .map_err(|e| Error::file_operation_with_source("rename detection failed", e))?;

            let mut result = FileDiff::default();
            for delta in diff.deltas() {
                let old_path = delta
                    .old_file()
                    .path()
                    .map(|p| p.to_string_lossy().into_owned());
                let new_path = delta
                    .new_file()
                    .path()
                    .map(|p| p.to_string_lossy().into_owned());
                match delta.status() {
                    Delta::Added => {
                        if let Some(path) = new_path {
                            result.added.push(path);
                        }
                    }
                    Delta::Deleted => {
                        if let Some(path) = old_path {
                            result.deleted.push(path);
                        }
                    }
                    Delta::Modified => {
                        if let Some(path) = new_path {
                            result.modified.push(path);
                        }
                    }
                    Delta::Renamed => {
                        // A rename is a paired delete+add downstream.
                        if let Some(path) = old_path {
                            result.deleted.push(path);
                        }
                        if let Some(path) = new_path {
                            result.added.push(path);
                        }
                    }
                    _ => {}
                }
            }
            result.added.sort();
            result.modified.sort();
            result.deleted.sort();
            Ok(result)
        })
        .await
        .map_err(|e| Error::file_operation(format!("git task panicked: {e}")))?
    }

    async fn read_file_at(
        &self,
        local_path: &str,
        commit: &str,
        file_path: &str,
    ) -> Result<String> {
        let local_path = local_path.to_owned();
        let commit = commit.to_owned();
        let file_path = file_path.to_owned();
        tokio::task::spawn_blocking(move || {
            let repo = Self::open(&local_path)?;
            let tree = repo
                .find_commit(Self::resolve_commit(&repo, &commit)?)
                .and_then(|c| c.tree())
                .map_err(|e| {
                    Error::file_operation_with_source(
                        format!("failed to load tree for '{commit}'"),
                        e,
                    )
                })?;
            let entry = tree.get_path(Path::new(&file_path)).map_err(|e| {
                Error::file_operation_with_source(
                    format!("'{file_path}' not present at '{commit}'"),
                    e,
                )
            })?;
            let object = entry
                .to_object(&repo)
                .map_err(|e| Error::file_operation_with_source("failed to load blob", e))?;
            let blob = object
                .peel_to_blob()
                .map_err(|e| Error::file_operation_with_source("entry is not a blob", e))?;
            String::from_utf8(blob.content().to_vec())
                .map_err(|e| Error::file_operation(format!("'{file_path}' is not UTF-8: {e}")))
        })
        .await
        .map_err(|e| Error::file_operation(format!("git task panicked: {e}")))?
    }
}
