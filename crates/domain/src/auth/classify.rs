//! Heuristic classification of backend failures.
//!
//! The backend does not set status codes consistently and its messages are
//! not a stable contract, so classification looks at the status first and
//! only falls back to message text. Rules, in order:
//!
//! | # | Condition                                                    | Kind                  |
//! |---|--------------------------------------------------------------|-----------------------|
//! | 1 | status is 5xx                                                | `ServerError`         |
//! | 2 | status is 401                                                | see below             |
//! | 3 | the text mentions bad credentials                            | `InvalidCredentials`  |
//! | 4 | no status (transport failure), or the text mentions network  | `NetworkError`        |
//! | 5 | the text mentions a server error                             | `ServerError`         |
//! | 6 | anything else                                                | `UnknownError`        |
//!
//! A 401 means different things depending on what was sent. On a login or
//! signup ([`classify_credentials`]) the submitted credentials were refused.
//! On any call carrying a bearer token ([`classify`]) the session itself was
//! refused, which is `UnauthorizedSession`.

use super::AuthErrorKind;

const CREDENTIAL_HINTS: &[&str] = &[
    "invalid credentials",
    "bad credentials",
    "wrong password",
    "incorrect password",
    "invalid password",
    "invalid login",
    "user not found",
];

const NETWORK_HINTS: &[&str] = &[
    "timeout",
    "timed out",
    "connection",
    "network",
    "unable to resolve host",
    "failed to connect",
    "dns",
];

const SERVER_HINTS: &[&str] = &["internal server error", "server error", "service unavailable"];

const EXISTING_ACCOUNT_HINT: &str = "already exists";

/// Classifies a failure of a call made on behalf of a session.
///
/// `status` is `None` when no HTTP response was received at all.
#[must_use]
pub fn classify(message: &str, status: Option<u16>) -> AuthErrorKind {
    classify_with(message, status, AuthErrorKind::UnauthorizedSession)
}

/// Classifies a failure of a call that submitted credentials (login, signup).
#[must_use]
pub fn classify_credentials(message: &str, status: Option<u16>) -> AuthErrorKind {
    classify_with(message, status, AuthErrorKind::InvalidCredentials)
}

fn classify_with(
    message: &str,
    status: Option<u16>,
    on_unauthorized: AuthErrorKind,
) -> AuthErrorKind {
    let text = message.to_lowercase();
    let mentions = |hints: &[&str]| hints.iter().any(|hint| text.contains(hint));

    if status.is_some_and(|s| (500..600).contains(&s)) {
        return AuthErrorKind::ServerError;
    }
    if status == Some(401) {
        return on_unauthorized;
    }
    if mentions(CREDENTIAL_HINTS) {
        return AuthErrorKind::InvalidCredentials;
    }
    if status.is_none() || mentions(NETWORK_HINTS) {
        return AuthErrorKind::NetworkError;
    }
    if mentions(SERVER_HINTS) {
        return AuthErrorKind::ServerError;
    }
    AuthErrorKind::UnknownError
}

/// Returns true if a signup failure says the login is already taken.
#[must_use]
pub fn indicates_existing_account(message: &str) -> bool {
    message.to_lowercase().contains(EXISTING_ACCOUNT_HINT)
}

/// Pulls a human-readable message out of an error response body.
///
/// JSON bodies are searched for `message`, `error` and `detail` in that order;
/// anything else is returned trimmed. An empty body yields `fallback`.
#[must_use]
pub fn extract_error_message(body: &str, fallback: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(serde_json::Value::String(text)) = map.get(key)
                && !text.trim().is_empty()
            {
                return text.trim().to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
