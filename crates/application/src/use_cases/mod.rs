//! Use cases (application services)
//!
//! Use cases orchestrate the auth API and the token store to implement
//! the session flows.

mod session_service;

pub use session_service::{LoginInput, RegisterInput, SessionService};
