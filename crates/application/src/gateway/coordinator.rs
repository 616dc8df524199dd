//! Single-flight token refresh.
//!
//! At most one refresh runs at a time. The first caller that needs one
//! spawns it as a task and parks its shared outcome in a slot; later callers
//! await the same outcome. Because the refresh runs in its own task, a
//! caller that is cancelled or dropped never cancels it for the others.
//!
//! The task persists the new tokens before clearing the slot, so a caller
//! that finds the slot empty always sees the refreshed session.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use storekeeper_domain::TokenPair;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::auth::{
    AuthApi, ClearOutcome, SessionExpiryNotifier, SwapOutcome, TokenStore, TokenStoreError,
};

/// Result of recovering from an authorization rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A usable access token is available; replay with it.
    Refreshed {
        /// The token to replay with.
        access_token: String,
    },
    /// The session is gone; the user must sign in again.
    Expired,
    /// New tokens were issued but could not be persisted.
    StorageUnavailable {
        /// Storage error description.
        message: String,
    },
}

type SharedOutcome = Shared<BoxFuture<'static, RefreshOutcome>>;

struct InFlight {
    id: u64,
    outcome: SharedOutcome,
}

struct Inner {
    auth: Arc<dyn AuthApi>,
    store: TokenStore,
    notifier: Arc<SessionExpiryNotifier>,
    refresh_timeout: Duration,
    in_flight: Mutex<Option<InFlight>>,
    // Generation whose expiry was already announced.
    notified_generation: std::sync::Mutex<Option<u64>>,
    next_id: AtomicU64,
}

/// Coordinates token refreshes across concurrent calls.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_timeout", &self.inner.refresh_timeout)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Creates a coordinator.
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthApi>,
        store: TokenStore,
        notifier: Arc<SessionExpiryNotifier>,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                auth,
                store,
                notifier,
                refresh_timeout,
                in_flight: Mutex::new(None),
                notified_generation: std::sync::Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Recovers after a request sent with `rejected_token` was refused.
    ///
    /// Joins the running refresh if there is one. If the stored token has
    /// already moved on from `rejected_token`, returns it without refreshing.
    /// Otherwise starts a refresh, or expires the session when there is no
    /// refresh token.
    pub async fn recover(&self, rejected_token: Option<&str>) -> RefreshOutcome {
        let outcome = {
            let mut slot = self.inner.in_flight.lock().await;
            if let Some(flight) = slot.as_ref() {
                debug!(refresh_id = flight.id, "Joining in-flight refresh");
                flight.outcome.clone()
            } else {
                let (session, generation) = self.inner.store.snapshot().await;

                if let Some(current) = session.access_token()
                    && Some(current) != rejected_token
                {
                    debug!("Access token already rotated, replaying without refresh");
                    return RefreshOutcome::Refreshed {
                        access_token: current.to_string(),
                    };
                }

                let Some(refresh_token) = session.refresh_token() else {
                    info!("No refresh token available, session cannot be recovered");
                    self.inner.expire(generation).await;
                    return RefreshOutcome::Expired;
                };

                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                let outcome = self.spawn_refresh(id, refresh_token.to_string(), generation);
                *slot = Some(InFlight {
                    id,
                    outcome: outcome.clone(),
                });
                outcome
            }
        };

        outcome.await
    }

    /// Returns true while a refresh is running.
    pub async fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().await.is_some()
    }

    fn spawn_refresh(&self, id: u64, refresh_token: String, generation: u64) -> SharedOutcome {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(inner.run_refresh(id, &refresh_token, generation))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(refresh_id = id, "Refresh task panicked");
                    inner.expire(generation).await;
                    RefreshOutcome::Expired
                }
            };

            let mut slot = inner.in_flight.lock().await;
            if slot.as_ref().is_some_and(|flight| flight.id == id) {
                *slot = None;
            }
            outcome
        });

        async move {
            task.await.unwrap_or_else(|e| {
                error!(refresh_id = id, error = %e, "Refresh task did not complete");
                RefreshOutcome::Expired
            })
        }
        .boxed()
        .shared()
    }
}

impl Inner {
    async fn run_refresh(&self, id: u64, refresh_token: &str, generation: u64) -> RefreshOutcome {
        info!(refresh_id = id, "Refreshing access token");
        match tokio::time::timeout(self.refresh_timeout, self.auth.refresh(refresh_token)).await {
            Ok(Ok(pair)) => self.adopt(id, pair, generation).await,
            Ok(Err(e)) => {
                warn!(refresh_id = id, error = %e, kind = ?e.kind(), "Token refresh failed");
                self.expire(generation).await;
                RefreshOutcome::Expired
            }
            Err(_) => {
                warn!(
                    refresh_id = id,
                    timeout = ?self.refresh_timeout,
                    "Token refresh timed out"
                );
                self.expire(generation).await;
                RefreshOutcome::Expired
            }
        }
    }

    async fn adopt(&self, id: u64, pair: TokenPair, generation: u64) -> RefreshOutcome {
        let access_token = pair.access_token.clone();
        match self.store.compare_and_swap_tokens(generation, pair).await {
            Ok(SwapOutcome::Updated) => {
                info!(refresh_id = id, "Access token refreshed");
                RefreshOutcome::Refreshed { access_token }
            }
            Ok(SwapOutcome::Stale) => {
                debug!(refresh_id = id, "Session replaced during refresh");
                self.store
                    .access_token()
                    .await
                    .map_or(RefreshOutcome::Expired, |access_token| {
                        RefreshOutcome::Refreshed { access_token }
                    })
            }
            Err(TokenStoreError::NoActiveSession) => RefreshOutcome::Expired,
            Err(TokenStoreError::StorageUnavailable(e)) => {
                error!(refresh_id = id, error = %e, "Failed to persist refreshed tokens");
                RefreshOutcome::StorageUnavailable {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Clears the session observed at `generation` and announces the expiry
    /// once per session.
    async fn expire(&self, generation: u64) {
        match self.store.clear_if_generation(generation).await {
            Ok(ClearOutcome::Stale) => {
                debug!("Session replaced meanwhile, keeping it");
                return;
            }
            Ok(ClearOutcome::Cleared | ClearOutcome::AlreadyEmpty) => {}
            Err(e) => error!(error = %e, "Failed to clear expired session"),
        }

        let current = self.store.generation().await;
        let first = {
            let mut notified = self
                .notified_generation
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            notified.replace(current) != Some(current)
        };
        if first {
            self.notifier.fire();
        } else {
            debug!(generation = current, "Session expiry already announced");
        }
    }
}
