//! HTTP client for the authentication endpoints.
//!
//! Every call is a JSON `POST` against the configured base URL. Transport
//! failures become [`AuthError::NetworkError`]; non-2xx responses are
//! classified from their status and message.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use storekeeper_domain::auth::{endpoints, extract_error_message};
use storekeeper_domain::{
    AuthError, AuthResponse, AuthSession, ClientConfig, LoginRequest, PendingRequest,
    RefreshRequest, ResponseSpec, SignupRequest, TokenPair, indicates_existing_account,
};
use tracing::{debug, info, warn};

use super::AuthApi;
use crate::ports::HttpTransport;

/// Authentication API client over an [`HttpTransport`].
#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<dyn HttpTransport>,
    config: ClientConfig,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    /// Creates a client sending requests through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    async fn post<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
        bearer: Option<&str>,
    ) -> Result<ResponseSpec, AuthError> {
        let url = self
            .config
            .resolve(path)
            .map_err(|e| AuthError::UnknownError {
                message: e.to_string(),
            })?;
        let body = serde_json::to_value(body).map_err(|e| AuthError::UnknownError {
            message: format!("Failed to encode request: {e}"),
        })?;
        let request = PendingRequest::post_json(url, &body).with_bearer(bearer);

        debug!(request_id = %request.id, path, "Sending auth request");
        let response = self.transport.execute(&request).await?;
        debug!(request_id = %request.id, status = response.status, "Auth response");
        Ok(response)
    }

    fn parse(response: &ResponseSpec) -> Result<AuthResponse, AuthError> {
        if response.body.trim().is_empty() {
            return Ok(AuthResponse::default());
        }
        response.json().map_err(|e| AuthError::UnknownError {
            message: format!("Failed to parse auth response: {e}"),
        })
    }

    fn failure_message(response: &ResponseSpec) -> String {
        extract_error_message(&response.body, &format!("HTTP {}", response.status))
    }

    fn failure(response: &ResponseSpec) -> AuthError {
        AuthError::classified(Self::failure_message(response), Some(response.status))
    }

    fn credentials_failure(response: &ResponseSpec) -> AuthError {
        AuthError::classified_credentials(Self::failure_message(response), Some(response.status))
    }

    fn session_from(response: &ResponseSpec) -> Result<AuthSession, AuthError> {
        if response.is_success() {
            Self::parse(response)?.into_session()
        } else {
            Err(Self::credentials_failure(response))
        }
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession, AuthError> {
        let body = LoginRequest {
            login: identifier.to_string(),
            password: password.to_string(),
        };
        let response = self.post(endpoints::LOGIN, &body, None).await?;
        let session = Self::session_from(&response)?;
        info!(user_id = %session.identity.user_id, "Logged in");
        Ok(session)
    }

    async fn register(&self, request: &SignupRequest) -> Result<AuthSession, AuthError> {
        let response = self.post(endpoints::SIGNUP, request, None).await?;
        if response.is_success() {
            let session = Self::session_from(&response)?;
            info!(user_id = %session.identity.user_id, "Registered new account");
            return Ok(session);
        }

        let message = Self::failure_message(&response);
        if !indicates_existing_account(&message) {
            return Err(AuthError::classified_credentials(
                message,
                Some(response.status),
            ));
        }

        info!(login = %request.login, "Login already exists, promoting to store owner");
        let promoted = self
            .post(endpoints::REGISTER_STORE_OWNER, request, None)
            .await?;
        let session = Self::session_from(&promoted)?;
        info!(user_id = %session.identity.user_id, "Promoted existing account");
        Ok(session)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let response = self.post(endpoints::REFRESH, &body, None).await?;
        match response.status {
            status if (200..300).contains(&status) => Self::parse(&response)?.into_token_pair(),
            400 | 401 | 403 => {
                warn!(status = response.status, "Refresh token rejected");
                Err(AuthError::UnauthorizedSession)
            }
            _ => Err(Self::failure(&response)),
        }
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<(), AuthError> {
        let response = self
            .post(endpoints::LOGOUT, &serde_json::json!({}), access_token)
            .await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(Self::failure(&response))
        }
    }
}
