//! Authentication for the Storekeeper session core.
//!
//! This module provides:
//! - The persistent token store backed by the secure key-value store
//! - The authentication API trait and its HTTP client
//! - The session-expiry notifier

mod client;
mod expiry;
mod provider;
mod token_store;

pub use client::AuthClient;
pub use expiry::{SessionExpiryListener, SessionExpiryNotifier};
pub use provider::AuthApi;
pub use token_store::{ClearOutcome, SwapOutcome, TokenStore, TokenStoreError};
