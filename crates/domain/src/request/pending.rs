//! Pending request description

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Header, HttpMethod};

const AUTHORIZATION: &str = "Authorization";
const CONTENT_TYPE: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

/// An outbound HTTP request captured so it can be replayed exactly.
///
/// Attaching a bearer token produces a new value; the captured request is
/// never mutated, so a replay after a token refresh starts from the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    /// Unique identifier used to correlate log lines.
    pub id: Uuid,
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: String,
    /// HTTP headers.
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl PendingRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a GET request with the given URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post_json(url: impl Into<String>, body: &serde_json::Value) -> Self {
        Self::new(HttpMethod::Post, url).with_json_body(body)
    }

    /// Adds a header, replacing any existing header of the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let header = Header::new(name, value);
        self.headers.retain(|existing| !existing.is(&header.name));
        self.headers.push(header);
        self
    }

    /// Sets a JSON body and its content type.
    #[must_use]
    pub fn with_json_body(mut self, body: &serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self.with_header(CONTENT_TYPE, JSON_CONTENT_TYPE)
    }

    /// Returns a copy carrying `Authorization: Bearer <token>`.
    ///
    /// With `None` the copy carries no `Authorization` header at all.
    #[must_use]
    pub fn with_bearer(&self, token: Option<&str>) -> Self {
        let mut request = self.clone();
        request.headers.retain(|header| !header.is(AUTHORIZATION));
        if let Some(token) = token {
            request
                .headers
                .push(Header::new(AUTHORIZATION, format!("Bearer {token}")));
        }
        request
    }

    /// Returns the value of the first header with the given name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.is(name))
            .map(|header| header.value.as_str())
    }

    /// Returns the bearer token attached to this request, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}
