//! Authentication API trait.

use async_trait::async_trait;
use storekeeper_domain::{AuthError, AuthSession, SignupRequest, TokenPair};

/// The backend's authentication endpoints.
///
/// [`super::AuthClient`] is the HTTP implementation; the gateway and the
/// session service only see this trait.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a session.
    ///
    /// # Errors
    /// Returns a classified [`AuthError`].
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Creates an account and returns its session.
    ///
    /// When the login already exists, the account is promoted to a store
    /// owner with the same payload instead.
    ///
    /// # Errors
    /// Returns a classified [`AuthError`].
    async fn register(&self, request: &SignupRequest) -> Result<AuthSession, AuthError>;

    /// Exchanges a refresh token for a new token pair.
    ///
    /// # Errors
    /// Returns [`AuthError::UnauthorizedSession`] if the refresh token is
    /// rejected, or a classified error for any other failure.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Notifies the backend that the session ends. Callers treat failures
    /// as non-fatal.
    ///
    /// # Errors
    /// Returns a classified [`AuthError`].
    async fn logout(&self, access_token: Option<&str>) -> Result<(), AuthError>;
}
