//! Persistence adapters: session stores and the configuration file.

mod config_repository;
mod encrypted_store;
mod memory_store;

pub use config_repository::{
    BASE_URL_ENV, ConfigError, ConfigRepository, STORAGE_DIR_ENV, apply_overrides,
    default_storage_dir,
};
pub use encrypted_store::EncryptedFileStore;
pub use memory_store::MemoryKeyValueStore;
