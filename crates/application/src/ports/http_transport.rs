//! HTTP transport port

use async_trait::async_trait;
use storekeeper_domain::{AuthError, PendingRequest, ResponseSpec};

/// Transport-level failures: no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that was exceeded.
        timeout_ms: u64,
    },

    /// Host name resolution failed.
    #[error("unable to resolve host {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connection failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns true if the failure happened before any byte reached the server.
    #[must_use]
    pub const fn is_connect(&self) -> bool {
        matches!(
            self,
            Self::DnsError { .. } | Self::ConnectionRefused { .. } | Self::ConnectionFailed(_)
        )
    }
}

impl From<TransportError> for AuthError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::InvalidUrl(message) => Self::UnknownError { message },
            other => Self::NetworkError {
                message: other.to_string(),
            },
        }
    }
}

/// Port for sending HTTP requests.
///
/// Implementations apply their own connect, read and whole-request timeouts
/// and report non-2xx responses as `Ok`; only transport failures are `Err`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no HTTP response was received.
    async fn execute(&self, request: &PendingRequest) -> Result<ResponseSpec, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use storekeeper_domain::AuthErrorKind;

    #[test]
    fn test_transport_failures_map_to_network_errors() {
        let error: AuthError = TransportError::Timeout { timeout_ms: 30_000 }.into();
        assert_eq!(error.kind(), AuthErrorKind::NetworkError);
        assert!(error.message().contains("30000ms"));

        let error: AuthError = TransportError::ConnectionRefused {
            host: "localhost".into(),
            port: 8080,
        }
        .into();
        assert_eq!(error.kind(), AuthErrorKind::NetworkError);
    }

    #[test]
    fn test_invalid_url_is_not_a_network_error() {
        let error: AuthError = TransportError::InvalidUrl("nope".into()).into();
        assert_eq!(error.kind(), AuthErrorKind::UnknownError);
    }

    #[test]
    fn test_is_connect() {
        assert!(TransportError::ConnectionFailed("reset".into()).is_connect());
        assert!(!TransportError::Timeout { timeout_ms: 1 }.is_connect());
    }
}
