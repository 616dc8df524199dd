//! Session status for display by the app shell.

/// Summary of the local session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session is stored.
    LoggedOut,
    /// A session is stored.
    LoggedIn {
        /// Backend user id.
        user_id: String,
        /// Human-readable name.
        display_name: String,
        /// Whether the session can be refreshed without a password.
        can_refresh: bool,
    },
}

impl SessionStatus {
    /// Returns true for [`SessionStatus::LoggedIn`].
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::LoggedOut => "Not signed in".to_string(),
            Self::LoggedIn {
                display_name,
                can_refresh,
                ..
            } => {
                let refresh_hint = if *can_refresh {
                    " (will auto-refresh)"
                } else {
                    ""
                };
                format!("Signed in as {display_name}{refresh_hint}")
            }
        }
    }
}

/// Get a preview of a token (first 8 chars + ...) safe for logs.
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        "***".to_string()
    }
}
