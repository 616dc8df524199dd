//! Backend endpoint paths, relative to the configured base URL.

/// Credentials → token pair.
pub const LOGIN: &str = "/api/login";

/// Registration → token pair.
pub const SIGNUP: &str = "/api/signup";

/// Promotes an existing account to store owner; used when signup reports
/// that the login already exists.
pub const REGISTER_STORE_OWNER: &str = "/api/register-store-owner";

/// Server-side session teardown.
pub const LOGOUT: &str = "/api/logout";

/// Refresh token → new token pair.
pub const REFRESH: &str = "/api/refresh";
