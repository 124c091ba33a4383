//! Repository metadata store backed by `repositories.json`.
//!
//! Writes are torn-write safe: serialize, write to `repositories.json.tmp`,
//! rename over the target. There is no cross-process lock; simultaneous
//! writers are last-writer-wins (an acknowledged limitation).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use ckg_domain::entities::{MetadataFile, RepositoryInfo};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::MetadataStore;

/// Metadata store configuration.
#[derive(Debug, Clone)]
pub struct MetadataStoreConfig {
    /// Directory holding `repositories.json`
    pub data_path: PathBuf,
}

impl MetadataStoreConfig {
    /// Configuration rooted at the given data directory.
    #[must_use]
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
        }
    }
}

/// JSON-file metadata store.
///
/// Constructed once at the composition root and shared as a handle; all
/// writes inside the process are serialized through an internal mutex and
/// flow through the atomic rename.
pub struct JsonMetadataStore {
    file_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonMetadataStore {
    /// Create a store over `{data_path}/repositories.json`, creating the
    /// directory and an empty file when missing.
    ///
    /// # Errors
    ///
    /// `FILE_OPERATION_ERROR` when the data directory cannot be created or
    /// the initial file cannot be written.
    pub async fn new(config: MetadataStoreConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.data_path)
            .await
            .map_err(|e| {
                Error::file_operation_with_source(
                    format!(
                        "failed to create data directory '{}'",
                        config.data_path.display()
                    ),
                    e,
                )
            })?;
        let store = Self {
            file_path: config.data_path.join("repositories.json"),
            write_lock: Mutex::new(()),
        };
        if !store.file_path.exists() {
            store.write_file(&MetadataFile::default()).await?;
            debug!(path = %store.file_path.display(), "Created empty metadata file");
        }
        Ok(store)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    async fn read_file(&self) -> Result<MetadataFile> {
        let content = match tokio::fs::read_to_string(&self.file_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MetadataFile::default());
            }
            Err(e) => {
                return Err(Error::file_operation_with_source(
                    format!("failed to read '{}'", self.file_path.display()),
                    e,
                ));
            }
        };
        let file: MetadataFile = serde_json::from_str(&content).map_err(|e| {
            Error::invalid_metadata_format(format!(
                "'{}' is not valid metadata JSON: {e}",
                self.file_path.display()
            ))
        })?;
        file.check_version()?;
        Ok(file)
    }

    async fn write_file(&self, file: &MetadataFile) -> Result<()> {
        let serialized = serde_json::to_string_pretty(file).map_err(|e| {
            Error::repository_metadata(format!("failed to serialize metadata: {e}"))
        })?;
        let temp_path = self.file_path.with_extension("json.tmp");

        let write_result = async {
            tokio::fs::write(&temp_path, serialized.as_bytes())
                .await
                .map_err(|e| {
                    Error::file_operation_with_source(
                        format!("failed to write '{}'", temp_path.display()),
                        e,
                    )
                })?;
            tokio::fs::rename(&temp_path, &self.file_path)
                .await
                .map_err(|e| {
                    Error::file_operation_with_source(
                        format!(
                            "failed to rename '{}' over '{}'",
                            temp_path.display(),
                            self.file_path.display()
                        ),
                        e,
                    )
                })
        }
        .await;

        if write_result.is_err()
            && let Err(cleanup) = tokio::fs::remove_file(&temp_path).await
            && cleanup.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %temp_path.display(), error = %cleanup, "Failed to clean up temp metadata file");
        }
        write_result
    }
}

#[async_trait]
impl MetadataStore for JsonMetadataStore {
    async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>> {
        let file = self.read_file().await?;
        Ok(file.repositories.into_values().collect())
    }

    async fn get_repository(&self, name: &str) -> Result<Option<RepositoryInfo>> {
        let file = self.read_file().await?;
        Ok(file.repositories.get(name).cloned())
    }

    async fn update_repository(&self, info: RepositoryInfo) -> Result<()> {
        info.validate()?;
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file().await?;
        file.repositories.insert(info.name.clone(), info);
        self.write_file(&file).await
    }

    async fn remove_repository(&self, name: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file().await?;
        if file.repositories.remove(name).is_none() {
            return Ok(());
        }
        self.write_file(&file).await
    }
}
