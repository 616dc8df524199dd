//! Authentication domain types
//!
//! Error taxonomy, the heuristic failure classifier, backend endpoint paths
//! and the JSON wire format of the authentication API.

mod classify;
pub mod endpoints;
mod error;
mod wire;

pub use classify::{
    classify, classify_credentials, extract_error_message, indicates_existing_account,
};
pub use error::{AuthError, AuthErrorKind};
pub use wire::{AuthResponse, AuthSession, LoginRequest, RefreshRequest, SignupRequest};
