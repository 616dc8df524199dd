//! JSON wire format of the authentication API.
//!
//! Every response field is optional on the wire and unknown fields are
//! ignored; missing required values are reported when converting into
//! domain types, never while parsing.

use serde::{Deserialize, Deserializer, Serialize};

use super::AuthError;
use crate::session::{TokenPair, UserIdentity};

/// Body of `POST /api/login`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login identifier (usually an email address).
    pub login: String,
    /// Plain-text password.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/signup` and `POST /api/register-store-owner`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login identifier.
    pub login: String,
    /// Contact email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("login", &self.login)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/refresh`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token to exchange.
    pub refresh_token: String,
}

/// Response of the login, signup, promotion and refresh endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthResponse {
    /// New access token.
    pub access_token: Option<String>,
    /// New refresh token.
    pub refresh_token: Option<String>,
    /// User id; the backend sends either a string or a number.
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Login identifier.
    pub login: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Account role.
    pub role: Option<String>,
}

/// A successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Issued tokens.
    pub tokens: TokenPair,
    /// Session identity.
    pub identity: UserIdentity,
    /// Login identifier echoed by the backend.
    pub login: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Account role.
    pub role: Option<String>,
}

impl AuthResponse {
    /// Extracts the token pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownError`] if no usable access token was sent.
    pub fn into_token_pair(self) -> Result<TokenPair, AuthError> {
        match self.access_token {
            Some(access) if !access.is_empty() => Ok(TokenPair::new(
                access,
                self.refresh_token.filter(|token| !token.is_empty()),
            )),
            _ => Err(AuthError::UnknownError {
                message: "response is missing accessToken".to_string(),
            }),
        }
    }

    /// Extracts a full session: tokens plus identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownError`] if the access token or user id is missing.
    pub fn into_session(self) -> Result<AuthSession, AuthError> {
        let Some(user_id) = self.id.clone().filter(|id| !id.is_empty()) else {
            return Err(AuthError::UnknownError {
                message: "response is missing id".to_string(),
            });
        };
        let identity = UserIdentity::new(user_id, self.first_name.clone(), self.last_name.clone());
        let login = self.login.clone();
        let email = self.email.clone();
        let role = self.role.clone();

        Ok(AuthSession {
            tokens: self.into_token_pair()?,
            identity,
            login,
            email,
            role,
        })
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_login_request_is_camel_case() {
        let body = serde_json::to_value(SignupRequest {
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            login: "ana@example.com".into(),
            email: "ana@example.com".into(),
            password: "pw".into(),
        })
        .unwrap();
        assert_eq!(body["firstName"], "Ana");
        assert_eq!(body["lastName"], "Ruiz");

        let refresh = serde_json::to_value(RefreshRequest {
            refresh_token: "R1".into(),
        })
        .unwrap();
        assert_eq!(refresh, serde_json::json!({"refreshToken": "R1"}));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let login = LoginRequest {
            login: "ana".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{login:?}").contains("hunter2"));
    }

    #[test]
    fn test_full_login_response() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"accessToken":"A1","refreshToken":"R1","id":"u1","firstName":"A","lastName":"L",
                "login":"alice@example.com","email":"alice@example.com","role":"STORE_OWNER"}"#,
        )
        .unwrap();

        let session = response.into_session().unwrap();
        assert_eq!(session.tokens.access_token, "A1");
        assert_eq!(session.tokens.refresh_token.as_deref(), Some("R1"));
        assert_eq!(session.identity.user_id, "u1");
        assert_eq!(session.role.as_deref(), Some("STORE_OWNER"));
    }

    #[test]
    fn test_numeric_id_and_unknown_fields() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"accessToken":"A1","id":42,"shopCount":3,"nested":{"x":1}}"#,
        )
        .unwrap();
        assert_eq!(response.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_fields_parse_as_none() {
        let response: AuthResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response, AuthResponse::default());

        let response: AuthResponse = serde_json::from_str(r#"{"id":null}"#).unwrap();
        assert_eq!(response.id, None);
    }

    #[test]
    fn test_refresh_response_without_refresh_token() {
        let response: AuthResponse = serde_json::from_str(r#"{"accessToken":"A2"}"#).unwrap();
        let pair = response.into_token_pair().unwrap();
        assert_eq!(pair.access_token, "A2");
        assert_eq!(pair.refresh_token, None);
    }

    #[test]
    fn test_missing_access_token_is_an_error() {
        let response: AuthResponse = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
        assert!(matches!(
            response.into_session(),
            Err(AuthError::UnknownError { .. })
        ));
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let response: AuthResponse = serde_json::from_str(r#"{"accessToken":"A1"}"#).unwrap();
        let error = response.into_session().unwrap_err();
        assert!(error.message().contains("id"));
    }
}
