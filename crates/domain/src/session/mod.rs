//! Session domain types
//!
//! A session is either logged out (no tokens, no identity) or logged in
//! (token pair and identity populated together). The constructors on
//! [`Session`] are the only way to build one, so the half-populated state
//! cannot be produced by callers.

mod status;
mod tokens;

pub use status::{SessionStatus, token_preview};
pub use tokens::{TokenPair, UserIdentity};

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// The locally held identity and token state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token_pair: Option<TokenPair>,
    identity: Option<UserIdentity>,
}

impl Session {
    /// Creates a logged-out session.
    #[must_use]
    pub const fn logged_out() -> Self {
        Self {
            token_pair: None,
            identity: None,
        }
    }

    /// Creates a logged-in session from one login, registration or refresh result.
    #[must_use]
    pub const fn logged_in(token_pair: TokenPair, identity: UserIdentity) -> Self {
        Self {
            token_pair: Some(token_pair),
            identity: Some(identity),
        }
    }

    /// Rebuilds a session from optional parts, as read back from storage.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InconsistentSession`] if exactly one of the two
    /// halves is present.
    pub fn from_parts(
        token_pair: Option<TokenPair>,
        identity: Option<UserIdentity>,
    ) -> DomainResult<Self> {
        match (token_pair, identity) {
            (Some(pair), Some(identity)) => Ok(Self::logged_in(pair, identity)),
            (None, None) => Ok(Self::logged_out()),
            (Some(_), None) => Err(DomainError::InconsistentSession(
                "access token present without a user id".to_string(),
            )),
            (None, Some(_)) => Err(DomainError::InconsistentSession(
                "user id present without an access token".to_string(),
            )),
        }
    }

    /// Returns a copy of this session with its token pair replaced.
    ///
    /// The refresh token is sticky: if `next` carries none, the current one is kept.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InconsistentSession`] when called on a logged-out
    /// session, since there is no identity to attach the tokens to.
    pub fn with_refreshed_tokens(&self, next: TokenPair) -> DomainResult<Self> {
        let Some(identity) = self.identity.clone() else {
            return Err(DomainError::InconsistentSession(
                "cannot refresh tokens of a logged-out session".to_string(),
            ));
        };
        let previous_refresh = self
            .token_pair
            .as_ref()
            .and_then(|pair| pair.refresh_token.clone());
        Ok(Self::logged_in(next.or_refresh_token(previous_refresh), identity))
    }

    /// Returns true if an access token is present.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.token_pair.is_some()
    }

    /// Returns the token pair, if logged in.
    #[must_use]
    pub const fn token_pair(&self) -> Option<&TokenPair> {
        self.token_pair.as_ref()
    }

    /// Returns the user identity, if logged in.
    #[must_use]
    pub const fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    /// Returns the access token, if logged in.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.token_pair.as_ref().map(|pair| pair.access_token.as_str())
    }

    /// Returns the refresh token, if one was issued.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.token_pair
            .as_ref()
            .and_then(|pair| pair.refresh_token.as_deref())
    }

    /// Returns the user id, if logged in.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.user_id.as_str())
    }

    /// Summarises the session for display.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match (&self.token_pair, &self.identity) {
            (Some(pair), Some(identity)) => SessionStatus::LoggedIn {
                user_id: identity.user_id.clone(),
                display_name: identity.display_name(),
                can_refresh: pair.can_refresh(),
            },
            _ => SessionStatus::LoggedOut,
        }
    }
}
