//! Configuration loader — YAML-based.
//!
//! Reads the `settings:` section of `config/{env}.yaml`, with
//! `config/{env}.local.yaml` as the highest-priority override. Environment
//! is resolved from `CKG_ENV` (default: `development`).

use std::env;
use std::path::{Path, PathBuf};

use tracing::info;

use ckg_domain::error::{Error, Result};

use super::AppConfig;

/// Configuration loader service.
#[derive(Clone, Default)]
pub struct ConfigLoader {
    /// Explicit config file path, overriding environment resolution
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader with default resolution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit configuration file path.
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    fn environment() -> String {
        env::var("CKG_ENV").unwrap_or_else(|_| "development".to_owned())
    }

    fn find_config_path(&self) -> Result<PathBuf> {
        if let Some(explicit) = &self.config_path {
            if explicit.exists() {
                return Ok(explicit.clone());
            }
            return Err(Error::file_operation(format!(
                "config file '{}' does not exist",
                explicit.display()
            )));
        }
        let environment = Self::environment();
        for candidate in [
            PathBuf::from(format!("config/{environment}.local.yaml")),
            PathBuf::from(format!("config/{environment}.yaml")),
        ] {
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(Error::file_operation(format!(
            "no config file found for environment '{environment}'"
        )))
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// `FILE_OPERATION_ERROR` when no file is found,
    /// `INVALID_PARAMETERS` when parsing or validation fails.
    pub fn load(&self) -> Result<AppConfig> {
        let path = self.find_config_path()?;
        info!(path = %path.display(), "Configuration loaded");

        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::file_operation_with_source(
                format!("failed to read config '{}'", path.display()),
                e,
            )
        })?;
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
            .map_err(|e| Error::invalid_parameters(format!("invalid config YAML: {e}")))?;
        let settings = yaml.get("settings").ok_or_else(|| {
            Error::invalid_parameters("no 'settings' key found in configuration file")
        })?;
        let config: AppConfig = serde_yaml::from_value(settings.clone())
            .map_err(|e| Error::invalid_parameters(format!("invalid settings section: {e}")))?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &AppConfig) -> Result<()> {
        if config.graph_store.max_connections == 0 {
            return Err(Error::invalid_parameters(
                "graph_store.max_connections must be at least 1",
            ));
        }
        if config.indexing.node_batch_size == 0 || config.indexing.relationship_batch_size == 0 {
            return Err(Error::invalid_parameters(
                "indexing batch sizes must be at least 1",
            ));
        }
        if config.updates.history_limit == 0 {
            return Err(Error::invalid_parameters(
                "updates.history_limit must be at least 1",
            ));
        }
        if config.updates.rename_similarity > 100 {
            return Err(Error::invalid_parameters(
                "updates.rename_similarity must be within 0..=100",
            ));
        }
        if config.retry.multiplier < 1.0 {
            return Err(Error::invalid_parameters(
                "retry.multiplier must be at least 1.0",
            ));
        }
        Ok(())
    }
}
