//! Client configuration loading.
//!
//! The configuration is read from the platform-specific config directory:
//! - Linux: ~/.config/storekeeper/config.json
//! - macOS: ~/Library/Application Support/storekeeper/config.json
//! - Windows: %APPDATA%/storekeeper/config.json

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use storekeeper_domain::{ClientConfig, DomainError};
use tokio::fs;
use tracing::debug;

use crate::serialization::{SerializationError, from_json_bytes};

const APP_DIR: &str = "storekeeper";
const CONFIG_FILE: &str = "config.json";

/// Overrides the backend base URL.
pub const BASE_URL_ENV: &str = "STOREKEEPER_BASE_URL";
/// Overrides the session storage directory.
pub const STORAGE_DIR_ENV: &str = "STOREKEEPER_STORAGE_DIR";

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid configuration JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The loaded configuration is not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] DomainError),
}

/// Repository for the client configuration file.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    path: Option<PathBuf>,
}

impl Default for ConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRepository {
    /// Creates a repository using the platform config directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: dirs::config_dir().map(|p| p.join(APP_DIR).join(CONFIG_FILE)),
        }
    }

    /// Creates a repository reading `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns the path where the configuration is stored, if available.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads the configuration with overrides from the process environment.
    ///
    /// Returns the defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result fails validation.
    pub async fn load(&self) -> Result<ClientConfig, ConfigError> {
        self.load_with(|name| std::env::var(name).ok()).await
    }

    /// Loads the configuration, taking overrides from `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub async fn load_with<F>(&self, lookup: F) -> Result<ClientConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String> + Send,
    {
        let config = match &self.path {
            Some(path) => Self::read(path).await?,
            None => ClientConfig::default(),
        };
        let config = apply_overrides(config, lookup);
        config.validate()?;
        Ok(config)
    }

    async fn read(path: &Path) -> Result<ClientConfig, ConfigError> {
        match fs::read(path).await {
            Ok(content) => Ok(from_json_bytes(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(ClientConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Applies environment overrides looked up through `lookup`.
///
/// Empty values are ignored.
#[must_use]
pub fn apply_overrides<F>(mut config: ClientConfig, lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(base_url) = lookup(BASE_URL_ENV) {
        config.base_url = base_url.trim().to_string();
    }
    if let Some(dir) = lookup(STORAGE_DIR_ENV) {
        config.storage_dir = Some(PathBuf::from(dir));
    }
    config
}

/// Returns the platform directory for the encrypted session files.
#[must_use]
pub fn default_storage_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join(APP_DIR))
}
