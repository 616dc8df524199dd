//! Startup wiring: one token store, one notifier, one gateway per process.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use storekeeper_application::{
    AuthClient, RequestGateway, SecureKeyValueStore, SessionExpiryNotifier, SessionService,
    TokenStore,
};
use storekeeper_domain::ClientConfig;
use storekeeper_infrastructure::{
    ConfigRepository, EncryptedFileStore, MemoryKeyValueStore, ReqwestTransport,
    default_storage_dir,
};
use tracing::{debug, info};

/// Message shown when a session cannot be recovered.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Shared services for one run of the client.
#[derive(Debug)]
pub struct AppContext {
    /// Effective configuration.
    pub config: ClientConfig,
    /// Session state, shared with the gateway.
    pub store: TokenStore,
    /// Announces unrecoverable sessions.
    pub notifier: Arc<SessionExpiryNotifier>,
    /// Login, registration and logout.
    pub sessions: SessionService,
    /// Authenticated calls.
    pub gateway: RequestGateway,
}

/// Loads the configuration from `path` (or the default location) and
/// applies a command-line base URL.
///
/// # Errors
///
/// Returns an error if the file is unreadable or the result is invalid.
pub async fn load_config(path: Option<PathBuf>, base_url: Option<String>) -> Result<ClientConfig> {
    let repository = path.map_or_else(ConfigRepository::new, ConfigRepository::at);
    let mut config = repository
        .load()
        .await
        .context("failed to load configuration")?;

    if let Some(base_url) = base_url {
        config.base_url = base_url;
        config.validate().context("invalid --base-url")?;
    }
    debug!(base_url = %config.base_url, "Configuration loaded");
    Ok(config)
}

impl AppContext {
    /// Wires the services for `config`.
    ///
    /// With `ephemeral` the session lives in memory only; otherwise it is
    /// kept in the encrypted store under the storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the session store cannot be
    /// initialised.
    pub async fn build(config: ClientConfig, ephemeral: bool) -> Result<Self> {
        let backend: Arc<dyn SecureKeyValueStore> = if ephemeral {
            Arc::new(MemoryKeyValueStore::new())
        } else {
            let dir = config
                .storage_dir
                .clone()
                .or_else(default_storage_dir)
                .context("no data directory available, set STOREKEEPER_STORAGE_DIR")?;
            debug!(dir = %dir.display(), "Using encrypted session store");
            Arc::new(EncryptedFileStore::new(dir))
        };
        Self::with_backend(config, backend).await
    }

    /// Wires the services around an existing session backend.
    ///
    /// # Errors
    ///
    /// Same as [`Self::build`].
    pub async fn with_backend(
        config: ClientConfig,
        backend: Arc<dyn SecureKeyValueStore>,
    ) -> Result<Self> {
        let transport =
            Arc::new(ReqwestTransport::new(&config).context("failed to create HTTP client")?);
        let auth = Arc::new(AuthClient::new(transport.clone(), config.clone()));
        let store = TokenStore::open(backend)
            .await
            .context("failed to open session store")?;

        let notifier = Arc::new(SessionExpiryNotifier::new());
        notifier.register(|| eprintln!("{SESSION_EXPIRED_MESSAGE}"));

        let sessions = SessionService::new(auth.clone(), store.clone());
        let gateway = RequestGateway::new(
            config.clone(),
            transport,
            auth,
            store.clone(),
            notifier.clone(),
        );

        info!(logged_in = store.is_logged_in().await, "Client ready");
        Ok(Self {
            config,
            store,
            notifier,
            sessions,
            gateway,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use storekeeper_domain::{TokenPair, UserIdentity};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ephemeral_context_starts_logged_out() {
        let context = AppContext::build(ClientConfig::default(), true)
            .await
            .unwrap();

        assert!(!context.store.is_logged_in().await);
        assert!(context.notifier.has_listener());
    }

    #[tokio::test]
    async fn test_persistent_context_restores_session() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig {
            storage_dir: Some(dir.path().to_path_buf()),
            ..ClientConfig::default()
        };

        let first = AppContext::build(config.clone(), false).await.unwrap();
        first
            .store
            .save(
                TokenPair::new("A1", Some("R1".to_string())),
                Some(UserIdentity::new("u1", Some("Ann".into()), None)),
            )
            .await
            .unwrap();

        let second = AppContext::build(config, false).await.unwrap();
        assert_eq!(second.store.access_token().await.as_deref(), Some("A1"));
        assert!(second.sessions.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_config_file_and_base_url_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url":"https://file.example.com"}"#).unwrap();

        let config = load_config(Some(path.clone()), None).await.unwrap();
        // The environment may override the file.
        if std::env::var("STOREKEEPER_BASE_URL").is_err() {
            assert_eq!(config.base_url, "https://file.example.com");
        }

        let config = load_config(Some(path), Some("https://cli.example.com".to_string()))
            .await
            .unwrap();
        assert_eq!(config.base_url, "https://cli.example.com");
    }

    #[tokio::test]
    async fn test_invalid_base_url_override_is_rejected() {
        let dir = TempDir::new().unwrap();
        let result = load_config(
            Some(dir.path().join("config.json")),
            Some("not a url".to_string()),
        )
        .await;

        assert!(result.is_err());
    }
}
