//! Authentication error taxonomy

use thiserror::Error;

/// Category of an authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// Wrong identifier or password. Recoverable by re-entering credentials.
    InvalidCredentials,
    /// Transport failure or timeout. Recoverable by retry.
    NetworkError,
    /// Backend 5xx. Recoverable by retry with backoff.
    ServerError,
    /// Refresh token missing or rejected. Recoverable only by a full login.
    UnauthorizedSession,
    /// Local encrypted store inaccessible.
    StorageUnavailable,
    /// Anything else.
    UnknownError,
}

impl AuthErrorKind {
    /// Returns a short title for inline display.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid credentials",
            Self::NetworkError => "Network error",
            Self::ServerError => "Server error",
            Self::UnauthorizedSession => "Session expired",
            Self::StorageUnavailable => "Secure storage unavailable",
            Self::UnknownError => "Unexpected error",
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::NetworkError | Self::ServerError)
    }
}

/// Authentication errors surfaced by the auth client and session services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Wrong identifier or password.
    #[error("invalid credentials: {message}")]
    InvalidCredentials {
        /// Backend message.
        message: String,
    },

    /// Transport failure or timeout.
    #[error("network error: {message}")]
    NetworkError {
        /// Error description.
        message: String,
    },

    /// Backend reported an internal failure.
    #[error("server error: {message}")]
    ServerError {
        /// HTTP status, when one was received.
        status: Option<u16>,
        /// Backend message.
        message: String,
    },

    /// Refresh token missing or rejected; a full login is required.
    #[error("session expired, sign in again")]
    UnauthorizedSession,

    /// Local encrypted store inaccessible.
    #[error("secure storage unavailable: {message}")]
    StorageUnavailable {
        /// Error description.
        message: String,
    },

    /// Catch-all carrying the original message.
    #[error("unexpected error: {message}")]
    UnknownError {
        /// Original message.
        message: String,
    },
}

impl AuthError {
    /// Builds an error of the given kind.
    #[must_use]
    pub fn from_kind(kind: AuthErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            AuthErrorKind::InvalidCredentials => Self::InvalidCredentials { message },
            AuthErrorKind::NetworkError => Self::NetworkError { message },
            AuthErrorKind::ServerError => Self::ServerError { status, message },
            AuthErrorKind::UnauthorizedSession => Self::UnauthorizedSession,
            AuthErrorKind::StorageUnavailable => Self::StorageUnavailable { message },
            AuthErrorKind::UnknownError => Self::UnknownError { message },
        }
    }

    /// Classifies a raw failure and builds the matching error.
    #[must_use]
    pub fn classified(message: impl Into<String>, status: Option<u16>) -> Self {
        let message = message.into();
        let kind = super::classify(&message, status);
        Self::from_kind(kind, status, message)
    }

    /// Like [`Self::classified`], for calls that submitted credentials.
    #[must_use]
    pub fn classified_credentials(message: impl Into<String>, status: Option<u16>) -> Self {
        let message = message.into();
        let kind = super::classify_credentials(&message, status);
        Self::from_kind(kind, status, message)
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> AuthErrorKind {
        match self {
            Self::InvalidCredentials { .. } => AuthErrorKind::InvalidCredentials,
            Self::NetworkError { .. } => AuthErrorKind::NetworkError,
            Self::ServerError { .. } => AuthErrorKind::ServerError,
            Self::UnauthorizedSession => AuthErrorKind::UnauthorizedSession,
            Self::StorageUnavailable { .. } => AuthErrorKind::StorageUnavailable,
            Self::UnknownError { .. } => AuthErrorKind::UnknownError,
        }
    }

    /// Returns the underlying message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidCredentials { message }
            | Self::NetworkError { message }
            | Self::ServerError { message, .. }
            | Self::StorageUnavailable { message }
            | Self::UnknownError { message } => message,
            Self::UnauthorizedSession => "session expired",
        }
    }
}
