//! Gateway errors

use storekeeper_domain::auth::extract_error_message;
use storekeeper_domain::{AuthError, AuthErrorKind, DomainError, classify};
use thiserror::Error;

use crate::ports::TransportError;

/// Failure of a call made through [`super::RequestGateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The session could not be recovered; the user must sign in again.
    #[error("session expired (HTTP {status}), sign in again")]
    SessionExpired {
        /// Status of the rejected response.
        status: u16,
    },

    /// The backend answered with a non-2xx status.
    #[error("request failed with HTTP {status}")]
    Status {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },

    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Refreshed tokens could not be persisted.
    #[error("secure storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] DomainError),

    /// The caller cancelled the call.
    #[error("request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Categorises this error with the authentication taxonomy.
    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::SessionExpired { .. } => AuthErrorKind::UnauthorizedSession,
            Self::Status { status, body } => {
                classify(&backend_message(*status, body), Some(*status))
            }
            Self::Transport(_) => AuthErrorKind::NetworkError,
            Self::StorageUnavailable(_) => AuthErrorKind::StorageUnavailable,
            Self::InvalidRequest(_) | Self::Cancelled => AuthErrorKind::UnknownError,
        }
    }

    /// Returns true if the caller should route the user to the login screen.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}

fn backend_message(status: u16, body: &str) -> String {
    extract_error_message(body, &format!("HTTP {status}"))
}

impl From<GatewayError> for AuthError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::SessionExpired { .. } => Self::UnauthorizedSession,
            GatewayError::Status { status, body } => {
                Self::classified(backend_message(status, &body), Some(status))
            }
            GatewayError::Transport(e) => e.into(),
            GatewayError::StorageUnavailable(message) => Self::StorageUnavailable { message },
            other => Self::UnknownError {
                message: other.to_string(),
            },
        }
    }
}
