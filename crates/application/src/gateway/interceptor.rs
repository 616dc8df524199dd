//! Bearer-token interceptor.
//!
//! Decides what to put on an outbound request and what to do with the
//! response. It holds no state; the gateway owns the call lifecycle.

use storekeeper_domain::PendingRequest;

/// Which send of a call a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// The first send.
    Initial,
    /// The single replay after a token refresh.
    Replay,
}

/// What the gateway should do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    /// Hand the response to the caller as-is.
    PassThrough,
    /// Recover the session, then replay the request once.
    Refresh,
    /// The replay was rejected too; fail without refreshing again.
    Escalate,
}

/// Attaches bearer tokens and classifies authorization rejections.
#[derive(Debug, Clone, Copy)]
pub struct AuthInterceptor {
    refresh_on_forbidden: bool,
}

impl Default for AuthInterceptor {
    fn default() -> Self {
        Self {
            refresh_on_forbidden: true,
        }
    }
}

impl AuthInterceptor {
    /// Creates an interceptor treating 401 and 403 alike.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a 403 triggers a refresh like a 401 does.
    #[must_use]
    pub const fn with_refresh_on_forbidden(mut self, enabled: bool) -> Self {
        self.refresh_on_forbidden = enabled;
        self
    }

    /// Returns a copy of `request` carrying `token`, or no authorization at all.
    #[must_use]
    pub fn before_send(&self, request: &PendingRequest, token: Option<&str>) -> PendingRequest {
        request.with_bearer(token)
    }

    /// Returns true if `status` means the credentials were refused.
    #[must_use]
    pub const fn is_rejection(&self, status: u16) -> bool {
        status == 401 || (status == 403 && self.refresh_on_forbidden)
    }

    /// Decides how to handle a response with `status`.
    #[must_use]
    pub const fn on_response(&self, status: u16, attempt: Attempt) -> ResponseAction {
        match (self.is_rejection(status), attempt) {
            (false, _) => ResponseAction::PassThrough,
            (true, Attempt::Initial) => ResponseAction::Refresh,
            (true, Attempt::Replay) => ResponseAction::Escalate,
        }
    }
}
