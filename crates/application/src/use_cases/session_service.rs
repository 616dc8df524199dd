//! Session use cases: login, registration, logout and status.

use std::sync::Arc;

use storekeeper_domain::{AuthError, AuthSession, SessionStatus, SignupRequest};
use tracing::{info, warn};

use crate::auth::{AuthApi, TokenStore};

/// Input for logging in.
#[derive(Clone)]
pub struct LoginInput {
    /// Login identifier, usually an email address.
    pub identifier: String,
    /// Plain-text password.
    pub password: String,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

/// Input for registering a store owner.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    /// Registration payload, sent unchanged to signup and promotion.
    pub request: SignupRequest,
}

/// Orchestrates the auth API and the token store.
///
/// A successful login or registration is saved before it is returned, so
/// the next gateway call already carries the new token.
#[derive(Clone)]
pub struct SessionService {
    auth: Arc<dyn AuthApi>,
    store: TokenStore,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService").finish_non_exhaustive()
    }
}

impl SessionService {
    /// Creates the service.
    #[must_use]
    pub fn new(auth: Arc<dyn AuthApi>, store: TokenStore) -> Self {
        Self { auth, store }
    }

    /// Logs in and stores the session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for blank input without
    /// contacting the backend, or the classified backend/storage error.
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let identifier = input.identifier.trim();
        if identifier.is_empty() || input.password.is_empty() {
            return Err(AuthError::InvalidCredentials {
                message: "identifier and password are required".to_string(),
            });
        }

        let session = self.auth.login(identifier, &input.password).await?;
        self.store
            .save(session.tokens.clone(), Some(session.identity.clone()))
            .await?;
        info!(user_id = %session.identity.user_id, "Session started");
        Ok(session)
    }

    /// Registers (or promotes) a store owner and stores the session.
    ///
    /// # Errors
    ///
    /// Returns the classified backend or storage error.
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        let session = self.auth.register(&input.request).await?;
        self.store
            .save(session.tokens.clone(), Some(session.identity.clone()))
            .await?;
        info!(user_id = %session.identity.user_id, "Session started after registration");
        Ok(session)
    }

    /// Ends the session.
    ///
    /// The backend is told first; if that fails the local session is
    /// cleared anyway.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StorageUnavailable`] if the local wipe fails.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let token = self.store.access_token().await;
        if let Err(e) = self.auth.logout(token.as_deref()).await {
            warn!(error = %e, "Backend logout failed, clearing local session anyway");
        }
        self.store.clear().await?;
        info!("Logged out");
        Ok(())
    }

    /// Returns true if a session is held.
    pub async fn is_logged_in(&self) -> bool {
        self.store.is_logged_in().await
    }

    /// Summarises the session for display.
    pub async fn status(&self) -> SessionStatus {
        self.store.status().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{FakeAuth, MemoryStore, session};
    use pretty_assertions::assert_eq;
    use storekeeper_domain::AuthErrorKind;

    type Fixture = (SessionService, TokenStore, Arc<FakeAuth>, Arc<MemoryStore>);

    async fn service(auth: FakeAuth) -> Fixture {
        let backend = Arc::new(MemoryStore::default());
        let store = TokenStore::open(backend.clone()).await.unwrap();
        let auth = Arc::new(auth);
        (
            SessionService::new(auth.clone(), store.clone()),
            store,
            auth,
            backend,
        )
    }

    fn login_input() -> LoginInput {
        LoginInput {
            identifier: " alice@example.com ".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_stores_session() {
        let (service, store, _auth, backend) =
            service(FakeAuth::refreshing_to("A2", None)).await;

        let session = service.login(login_input()).await.unwrap();

        assert_eq!(session.tokens.access_token, "A1");
        assert!(service.is_logged_in().await);
        assert_eq!(store.refresh_token().await.as_deref(), Some("R1"));
        assert_eq!(backend.entries().get("user_id").map(String::as_str), Some("u1"));
        assert_eq!(
            service.status().await.display_message(),
            "Signed in as A L (will auto-refresh)"
        );
    }

    #[tokio::test]
    async fn test_blank_credentials_are_rejected_locally() {
        let (service, _store, _auth, _backend) =
            service(FakeAuth::refreshing_to("A2", None)).await;

        let error = service
            .login(LoginInput {
                identifier: "  ".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(error.kind(), AuthErrorKind::InvalidCredentials);
        assert!(!service.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_state() {
        let (service, store, auth, _backend) =
            service(FakeAuth::refreshing_to("A2", None)).await;
        auth.set_login_result(Err(AuthError::InvalidCredentials {
            message: "Bad credentials".to_string(),
        }));

        let error = service.login(login_input()).await.unwrap_err();

        assert_eq!(error.kind(), AuthErrorKind::InvalidCredentials);
        assert!(!store.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_login_with_storage_failure() {
        let (service, _store, _auth, backend) =
            service(FakeAuth::refreshing_to("A2", None)).await;
        backend.set_fail_writes(true);

        let error = service.login(login_input()).await.unwrap_err();

        assert_eq!(error.kind(), AuthErrorKind::StorageUnavailable);
        assert!(!service.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_register_stores_session() {
        let (service, store, auth, _backend) =
            service(FakeAuth::refreshing_to("A2", None)).await;
        auth.set_login_result(Ok(session("N1", Some("NR1"))));

        service
            .register(RegisterInput {
                request: SignupRequest {
                    first_name: "A".into(),
                    last_name: "L".into(),
                    login: "alice@example.com".into(),
                    email: "alice@example.com".into(),
                    password: "pw".into(),
                },
            })
            .await
            .unwrap();

        assert_eq!(store.access_token().await.as_deref(), Some("N1"));
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let (service, store, auth, backend) =
            service(FakeAuth::refreshing_to("A2", None)).await;
        service.login(login_input()).await.unwrap();
        auth.set_logout_result(Err(AuthError::NetworkError {
            message: "connection reset".to_string(),
        }));

        service.logout().await.unwrap();

        assert_eq!(auth.logout_tokens(), vec![Some("A1".to_string())]);
        assert!(!store.is_logged_in().await);
        assert!(backend.entries().is_empty());
        assert_eq!(service.status().await, SessionStatus::LoggedOut);
    }

    #[tokio::test]
    async fn test_logout_when_logged_out() {
        let (service, _store, auth, _backend) =
            service(FakeAuth::refreshing_to("A2", None)).await;

        service.logout().await.unwrap();

        assert_eq!(auth.logout_tokens(), vec![None]);
    }
}
