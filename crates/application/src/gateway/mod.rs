//! Authenticated request gateway.
//!
//! Every backend call goes through [`RequestGateway`]. A call moves through
//! these states:
//!
//! - `Unauthenticated` / `Attached`: sent without or with the stored token
//! - `Refreshing`: the response was 401/403, the session is being recovered
//! - `Retried`: replayed once with the recovered token
//! - `Failed`: the session expired or the replay was refused too
//!
//! A call is replayed at most once and never triggers a second refresh.

mod coordinator;
mod error;
mod interceptor;

pub use coordinator::{RefreshCoordinator, RefreshOutcome};
pub use error::GatewayError;
pub use interceptor::{Attempt, AuthInterceptor, ResponseAction};

use std::sync::Arc;

use storekeeper_domain::{ClientConfig, HttpMethod, PendingRequest, ResponseSpec, token_preview};
use tracing::{Instrument, debug, debug_span, warn};

use crate::auth::{AuthApi, SessionExpiryNotifier, TokenStore};
use crate::ports::{CancellationReceiver, HttpTransport};

/// Result of a gateway call.
pub type GatewayResult = Result<ResponseSpec, GatewayError>;

#[derive(Debug, Clone, Copy)]
enum CallState {
    Unauthenticated,
    Attached,
    Refreshing,
    Retried,
    Failed,
}

/// Sends requests with the current access token and recovers from
/// authorization rejections.
#[derive(Clone)]
pub struct RequestGateway {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    store: TokenStore,
    interceptor: AuthInterceptor,
    coordinator: RefreshCoordinator,
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.config.base_url)
            .field("interceptor", &self.interceptor)
            .finish_non_exhaustive()
    }
}

impl RequestGateway {
    /// Creates a gateway.
    ///
    /// `auth` performs refreshes; `notifier` is fired when a session cannot
    /// be recovered.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        auth: Arc<dyn AuthApi>,
        store: TokenStore,
        notifier: Arc<SessionExpiryNotifier>,
    ) -> Self {
        let coordinator =
            RefreshCoordinator::new(auth, store.clone(), notifier, config.refresh_timeout());
        Self {
            config,
            transport,
            store,
            interceptor: AuthInterceptor::default(),
            coordinator,
        }
    }

    /// Replaces the interceptor.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: AuthInterceptor) -> Self {
        self.interceptor = interceptor;
        self
    }

    /// Returns the token store used for every call.
    #[must_use]
    pub const fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Sends `request` with the current access token.
    ///
    /// On 401/403 the session is recovered once (joining any refresh already
    /// running) and the request is replayed with the new token.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::SessionExpired`] if the session could not be recovered
    /// - [`GatewayError::Status`] for any other non-2xx response, including a
    ///   replay that was refused again
    /// - [`GatewayError::Transport`] if no response was received
    pub async fn call(&self, request: &PendingRequest) -> GatewayResult {
        let span = debug_span!(
            "gateway_call",
            request_id = %request.id,
            method = request.method.as_str(),
            url = %request.url,
        );
        self.run(request).instrument(span).await
    }

    /// Like [`Self::call`], but gives up when `cancel` fires.
    ///
    /// Cancelling abandons only this call; a refresh it started keeps running
    /// for the other callers.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Cancelled`] if cancelled first, otherwise the
    /// same errors as [`Self::call`].
    pub async fn call_with_cancellation(
        &self,
        request: &PendingRequest,
        mut cancel: CancellationReceiver,
    ) -> GatewayResult {
        tokio::select! {
            result = self.call(request) => result,
            () = cancel.cancelled() => {
                debug!(request_id = %request.id, "Call cancelled");
                Err(GatewayError::Cancelled)
            }
        }
    }

    /// Sends a GET to `path`, resolved against the base URL.
    ///
    /// # Errors
    ///
    /// Same as [`Self::call`], plus [`GatewayError::InvalidRequest`].
    pub async fn get(&self, path: &str) -> GatewayResult {
        let request = PendingRequest::get(self.config.resolve(path)?);
        self.call(&request).await
    }

    /// Sends a JSON POST to `path`, resolved against the base URL.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`].
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> GatewayResult {
        let request = PendingRequest::post_json(self.config.resolve(path)?, body);
        self.call(&request).await
    }

    /// Sends a DELETE to `path`, resolved against the base URL.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`].
    pub async fn delete(&self, path: &str) -> GatewayResult {
        let request = PendingRequest::new(HttpMethod::Delete, self.config.resolve(path)?);
        self.call(&request).await
    }

    async fn run(&self, request: &PendingRequest) -> GatewayResult {
        let token = self.store.access_token().await;
        let state = if token.is_some() {
            CallState::Attached
        } else {
            CallState::Unauthenticated
        };
        let response = self.send(request, token.as_deref(), state).await?;

        if self.interceptor.on_response(response.status, Attempt::Initial)
            != ResponseAction::Refresh
        {
            return Self::complete(response);
        }

        debug!(state = ?CallState::Refreshing, status = response.status, "Authorization rejected");
        match self.coordinator.recover(token.as_deref()).await {
            RefreshOutcome::Refreshed { access_token } => {
                let replay = self
                    .send(request, Some(&access_token), CallState::Retried)
                    .await?;
                if self.interceptor.on_response(replay.status, Attempt::Replay)
                    == ResponseAction::Escalate
                {
                    warn!(
                        state = ?CallState::Failed,
                        status = replay.status,
                        "Replay refused after refresh"
                    );
                    return Err(GatewayError::Status {
                        status: replay.status,
                        body: replay.body,
                    });
                }
                Self::complete(replay)
            }
            RefreshOutcome::Expired => {
                warn!(state = ?CallState::Failed, status = response.status, "Session expired");
                Err(GatewayError::SessionExpired {
                    status: response.status,
                })
            }
            RefreshOutcome::StorageUnavailable { message } => {
                warn!(state = ?CallState::Failed, "Refreshed session could not be stored");
                Err(GatewayError::StorageUnavailable(message))
            }
        }
    }

    async fn send(
        &self,
        request: &PendingRequest,
        token: Option<&str>,
        state: CallState,
    ) -> GatewayResult {
        let outbound = self.interceptor.before_send(request, token);
        debug!(
            state = ?state,
            token = token.map(token_preview).as_deref(),
            "Sending request"
        );
        let response = self.transport.execute(&outbound).await?;
        debug!(status = response.status, duration = ?response.duration, "Response received");
        Ok(response)
    }

    fn complete(response: ResponseSpec) -> GatewayResult {
        if response.is_success() {
            Ok(response)
        } else {
            Err(GatewayError::Status {
                status: response.status,
                body: response.body,
            })
        }
    }
}
