//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and external systems.
//! Each port is a trait implemented by adapters in the infrastructure layer.

mod cancellation;
mod http_transport;
mod secure_store;

pub use cancellation::{CancellationReceiver, CancellationToken};
pub use http_transport::{HttpTransport, TransportError};
pub use secure_store::{SecureKeyValueStore, StorageError};
