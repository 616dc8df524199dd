//! Storekeeper Domain - Core session and request types
//!
//! This crate defines the domain model for the Storekeeper session core:
//! tokens, sessions, outbound request descriptions, the backend wire format
//! and the authentication error taxonomy.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod session;

pub use auth::{
    AuthError, AuthErrorKind, AuthResponse, AuthSession, LoginRequest, RefreshRequest,
    SignupRequest, classify, classify_credentials, indicates_existing_account,
};
pub use config::ClientConfig;
pub use error::{DomainError, DomainResult};
pub use request::{Header, HttpMethod, PendingRequest};
pub use response::ResponseSpec;
pub use session::{Session, SessionStatus, TokenPair, UserIdentity, token_preview};
