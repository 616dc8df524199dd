//! Storekeeper Application - Session core services and ports
//!
//! This crate defines the application layer with:
//! - Port traits (secure storage, HTTP transport)
//! - The persistent token store and the authentication client
//! - The request gateway with single-flight token refresh
//! - The session-expiry notifier and session use cases

pub mod auth;
pub mod gateway;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{
    AuthApi, AuthClient, SessionExpiryListener, SessionExpiryNotifier, TokenStore,
    TokenStoreError,
};
pub use gateway::{AuthInterceptor, GatewayError, GatewayResult, RequestGateway};
pub use ports::{
    CancellationReceiver, CancellationToken, HttpTransport, SecureKeyValueStore, StorageError,
    TransportError,
};
pub use use_cases::{LoginInput, RegisterInput, SessionService};
