//! Token pair and identity value types

use serde::{Deserialize, Serialize};

/// An access token with its optional refresh token.
///
/// The access token is only ever replaced as a whole.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential.
    pub access_token: String,
    /// Longer-lived credential exchanged for a new access token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// Returns true if the pair carries a refresh token.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Fills in `fallback` as the refresh token when this pair has none.
    #[must_use]
    pub fn or_refresh_token(mut self, fallback: Option<String>) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = fallback;
        }
        self
    }

    /// Returns the `Authorization` header value for this pair.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

// Never print raw credentials, even in debug output.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &super::token_preview(&self.access_token))
            .field(
                "refresh_token",
                &self.refresh_token.as_deref().map(super::token_preview),
            )
            .finish()
    }
}

/// The identity half of a logged-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Backend user id.
    pub user_id: String,
    /// Given name, if the backend supplied one.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name, if the backend supplied one.
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserIdentity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            first_name,
            last_name,
        }
    }

    /// Returns "First Last", falling back to the user id when no name is known.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect();

        if parts.is_empty() {
            self.user_id.clone()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_authorization_header() {
        let pair = TokenPair::new("abc", None);
        assert_eq!(pair.authorization_header(), "Bearer abc");
    }

    #[test]
    fn test_debug_hides_tokens() {
        let pair = TokenPair::new("supersecretaccesstoken", Some("supersecretrefresh".into()));
        let debug = format!("{pair:?}");
        assert!(!debug.contains("supersecretaccesstoken"));
        assert!(!debug.contains("supersecretrefresh"));
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(UserIdentity::new("u1", None, None).display_name(), "u1");
        assert_eq!(
            UserIdentity::new("u1", Some("Ana".into()), None).display_name(),
            "Ana"
        );
        assert_eq!(
            UserIdentity::new("u1", Some("Ana".into()), Some("Ruiz".into())).display_name(),
            "Ana Ruiz"
        );
    }
}
