//! Storekeeper Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: the reqwest HTTP transport,
//! the encrypted session store and the configuration repository.

pub mod adapters;
pub mod persistence;
pub mod serialization;

pub use adapters::ReqwestTransport;
pub use persistence::{
    ConfigError, ConfigRepository, EncryptedFileStore, MemoryKeyValueStore, default_storage_dir,
};
pub use serialization::{SerializationError, from_json_bytes};
