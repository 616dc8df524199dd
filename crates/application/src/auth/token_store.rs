//! Persistent session token store.
//!
//! The store keeps the current [`Session`] in memory and writes it through
//! to a [`SecureKeyValueStore`] on every change. The in-memory copy is only
//! updated after the write succeeds, so the cache and the persisted record
//! never disagree. All mutations are serialized behind one lock.
//!
//! Every change of the session bumps a generation counter. The gateway uses
//! it to tell whether the session it observed is still the current one.

use std::collections::BTreeMap;
use std::sync::Arc;

use storekeeper_domain::{AuthError, Session, SessionStatus, TokenPair, UserIdentity};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::ports::{SecureKeyValueStore, StorageError};

const AUTH_TOKEN_KEY: &str = "auth_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const USER_ID_KEY: &str = "user_id";
const FIRST_NAME_KEY: &str = "first_name";
const LAST_NAME_KEY: &str = "last_name";

/// Errors returned by [`TokenStore`].
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    /// The secure store could not be read or written.
    #[error("secure storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// Tokens were saved without an identity while logged out.
    #[error("no active session to attach tokens to")]
    NoActiveSession,
}

impl From<TokenStoreError> for AuthError {
    fn from(error: TokenStoreError) -> Self {
        match error {
            TokenStoreError::StorageUnavailable(e) => Self::StorageUnavailable {
                message: e.to_string(),
            },
            TokenStoreError::NoActiveSession => Self::UnauthorizedSession,
        }
    }
}

/// Result of [`TokenStore::compare_and_swap_tokens`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The tokens were replaced.
    Updated,
    /// The session changed since it was observed; nothing was written.
    Stale,
}

/// Result of [`TokenStore::clear_if_generation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// A session was removed.
    Cleared,
    /// There was no session to remove.
    AlreadyEmpty,
    /// The session changed since it was observed; nothing was removed.
    Stale,
}

#[derive(Debug, Default)]
struct StoreState {
    session: Session,
    generation: u64,
}

/// Persistent holder of the current session.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn SecureKeyValueStore>,
    state: Arc<RwLock<StoreState>>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Loads the persisted session from `backend`.
    ///
    /// A record that is only partly present, or that cannot be decrypted,
    /// is wiped and the store starts logged out.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::StorageUnavailable`] if the backend cannot
    /// be read or wiped.
    pub async fn open(backend: Arc<dyn SecureKeyValueStore>) -> Result<Self, TokenStoreError> {
        let session = match backend.read_all().await {
            Ok(entries) => match session_from_entries(&entries) {
                Ok(session) => session,
                Err(reason) => {
                    warn!(%reason, "Discarding inconsistent persisted session");
                    backend.delete_all().await?;
                    Session::logged_out()
                }
            },
            Err(e @ (StorageError::Crypto(_) | StorageError::Serialization(_))) => {
                warn!(error = %e, "Discarding unreadable persisted session");
                backend.delete_all().await?;
                Session::logged_out()
            }
            Err(e) => return Err(e.into()),
        };

        info!(logged_in = session.is_logged_in(), "Token store opened");
        Ok(Self {
            backend,
            state: Arc::new(RwLock::new(StoreState {
                session,
                generation: 0,
            })),
        })
    }

    /// Stores a token pair.
    ///
    /// With an identity (login, registration) the session is replaced as a
    /// whole. Without one (refresh) the current identity is kept, and so is
    /// the current refresh token when `pair` carries none.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::NoActiveSession`] when `identity` is `None`
    /// and nobody is logged in, or [`TokenStoreError::StorageUnavailable`]
    /// if the write fails. The session is unchanged on error.
    pub async fn save(
        &self,
        pair: TokenPair,
        identity: Option<UserIdentity>,
    ) -> Result<(), TokenStoreError> {
        let mut state = self.state.write().await;
        let next = match identity {
            Some(identity) => Session::logged_in(pair, identity),
            None => state
                .session
                .with_refreshed_tokens(pair)
                .map_err(|_| TokenStoreError::NoActiveSession)?,
        };
        self.commit(&mut state, next).await
    }

    /// Replaces the token pair only if the session is still at `expected_generation`.
    ///
    /// The identity and sticky refresh token are kept as in [`Self::save`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::save`].
    pub async fn compare_and_swap_tokens(
        &self,
        expected_generation: u64,
        pair: TokenPair,
    ) -> Result<SwapOutcome, TokenStoreError> {
        let mut state = self.state.write().await;
        if state.generation != expected_generation {
            debug!(
                expected_generation,
                current_generation = state.generation,
                "Session changed, discarding refreshed tokens"
            );
            return Ok(SwapOutcome::Stale);
        }
        let next = state
            .session
            .with_refreshed_tokens(pair)
            .map_err(|_| TokenStoreError::NoActiveSession)?;
        self.commit(&mut state, next).await?;
        Ok(SwapOutcome::Updated)
    }

    /// Removes the session from memory and from the secure store.
    ///
    /// Clearing an empty store does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::StorageUnavailable`] if the wipe fails;
    /// the session is unchanged in that case.
    pub async fn clear(&self) -> Result<(), TokenStoreError> {
        let mut state = self.state.write().await;
        self.wipe(&mut state).await.map(|_| ())
    }

    /// Removes the session only if it is still at `expected_generation`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::clear`].
    pub async fn clear_if_generation(
        &self,
        expected_generation: u64,
    ) -> Result<ClearOutcome, TokenStoreError> {
        let mut state = self.state.write().await;
        if state.generation != expected_generation {
            return Ok(ClearOutcome::Stale);
        }
        self.wipe(&mut state).await
    }

    /// Returns a copy of the current session.
    pub async fn session(&self) -> Session {
        self.state.read().await.session.clone()
    }

    /// Returns the current session together with its generation.
    pub async fn snapshot(&self) -> (Session, u64) {
        let state = self.state.read().await;
        (state.session.clone(), state.generation)
    }

    /// Returns the generation counter; it changes on every save and every
    /// clear that removed a session.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Returns the current access token.
    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.session.access_token().map(String::from)
    }

    /// Returns the current refresh token.
    pub async fn refresh_token(&self) -> Option<String> {
        self.state.read().await.session.refresh_token().map(String::from)
    }

    /// Returns the current user id.
    pub async fn user_id(&self) -> Option<String> {
        self.state.read().await.session.user_id().map(String::from)
    }

    /// Returns the current identity.
    pub async fn identity(&self) -> Option<UserIdentity> {
        self.state.read().await.session.identity().cloned()
    }

    /// Returns true if an access token is held.
    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.session.is_logged_in()
    }

    /// Summarises the session for display.
    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.session.status()
    }

    async fn commit(&self, state: &mut StoreState, next: Session) -> Result<(), TokenStoreError> {
        self.backend.write_all(&entries_from_session(&next)).await?;
        state.session = next;
        state.generation += 1;
        debug!(generation = state.generation, "Session saved");
        Ok(())
    }

    async fn wipe(&self, state: &mut StoreState) -> Result<ClearOutcome, TokenStoreError> {
        if !state.session.is_logged_in() {
            return Ok(ClearOutcome::AlreadyEmpty);
        }
        self.backend.delete_all().await?;
        state.session = Session::logged_out();
        state.generation += 1;
        info!(generation = state.generation, "Session cleared");
        Ok(ClearOutcome::Cleared)
    }
}

fn entries_from_session(session: &Session) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    if let Some(pair) = session.token_pair() {
        entries.insert(AUTH_TOKEN_KEY.to_string(), pair.access_token.clone());
        if let Some(refresh) = &pair.refresh_token {
            entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh.clone());
        }
    }
    if let Some(identity) = session.identity() {
        entries.insert(USER_ID_KEY.to_string(), identity.user_id.clone());
        if let Some(first) = &identity.first_name {
            entries.insert(FIRST_NAME_KEY.to_string(), first.clone());
        }
        if let Some(last) = &identity.last_name {
            entries.insert(LAST_NAME_KEY.to_string(), last.clone());
        }
    }
    entries
}

fn session_from_entries(entries: &BTreeMap<String, String>) -> Result<Session, String> {
    let value = |key: &str| entries.get(key).filter(|v| !v.is_empty()).cloned();

    let pair = value(AUTH_TOKEN_KEY).map(|access| TokenPair::new(access, value(REFRESH_TOKEN_KEY)));
    let identity = value(USER_ID_KEY)
        .map(|id| UserIdentity::new(id, value(FIRST_NAME_KEY), value(LAST_NAME_KEY)));

    let session = Session::from_parts(pair, identity).map_err(|e| e.to_string())?;
    if !session.is_logged_in() && !entries.is_empty() {
        return Err(format!(
            "{} stray key(s) without an access token",
            entries.len()
        ));
    }
    Ok(session)
}
