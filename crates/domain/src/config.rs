//! Client configuration
//!
//! Defines the backend location, network timeouts and local storage
//! directory used by the session core.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Default for every network timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Configuration of the session core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL; endpoint paths are resolved against it.
    pub base_url: String,
    /// TCP connect timeout.
    pub connect_timeout_ms: u64,
    /// Timeout between reads of the response.
    pub read_timeout_ms: u64,
    /// Whole-request timeout; bounds the write side as well.
    pub request_timeout_ms: u64,
    /// Upper bound on one coordinated token refresh.
    pub refresh_timeout_ms: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Directory holding the encrypted session file; `None` uses the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            refresh_timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: concat!("Storekeeper/", env!("CARGO_PKG_VERSION")).to_string(),
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    /// Creates a default configuration pointing at `base_url`.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Checks that the base URL is http(s) and every timeout is non-zero.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> DomainResult<()> {
        let url = self.parsed_base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DomainError::InvalidUrl(format!(
                "base URL must use http or https: {}",
                self.base_url
            )));
        }

        let timeouts = [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("read_timeout_ms", self.read_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("refresh_timeout_ms", self.refresh_timeout_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, value)| *value == 0) {
            return Err(DomainError::InvalidConfig(format!("{name} must be positive")));
        }

        Ok(())
    }

    /// Resolves an endpoint path (e.g. `/api/login`) against the base URL.
    ///
    /// Absolute URLs are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if either part is malformed.
    pub fn resolve(&self, path: &str) -> DomainResult<String> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path)
                .map(String::from)
                .map_err(|e| DomainError::InvalidUrl(format!("{e}: {path}")));
        }

        let mut base = self.parsed_base_url()?;
        // Keep any path prefix on the base URL, e.g. https://host/v2 + /api/login.
        let prefix = base.path().trim_end_matches('/').to_string();
        let (suffix, query) = match path.split_once('?') {
            Some((suffix, query)) => (suffix, Some(query)),
            None => (path, None),
        };
        base.set_path(&format!("{prefix}/{}", suffix.trim_start_matches('/')));
        base.set_query(query);
        Ok(base.into())
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read timeout as a [`Duration`].
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Whole-request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Refresh timeout as a [`Duration`].
    #[must_use]
    pub const fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    fn parsed_base_url(&self) -> DomainResult<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.base_url)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_use_thirty_second_timeouts() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://api.example.com"}"#).unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.request_timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_resolve_paths() {
        let config = ClientConfig::with_base_url("https://api.example.com");
        assert_eq!(
            config.resolve("/api/login").unwrap(),
            "https://api.example.com/api/login"
        );

        let prefixed = ClientConfig::with_base_url("https://api.example.com/v2/");
        assert_eq!(
            prefixed.resolve("api/refresh").unwrap(),
            "https://api.example.com/v2/api/refresh"
        );

        assert_eq!(
            config.resolve("/api/shops?page=2").unwrap(),
            "https://api.example.com/api/shops?page=2"
        );

        assert_eq!(
            config.resolve("https://other.example.com/x").unwrap(),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig::with_base_url("ftp://files.example.com");
        assert!(matches!(config.validate(), Err(DomainError::InvalidUrl(_))));

        let config = ClientConfig::with_base_url("not a url");
        assert!(config.validate().is_err());

        let config = ClientConfig {
            refresh_timeout_ms: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(DomainError::InvalidConfig(_))));
    }
}
