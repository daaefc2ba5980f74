//! Persistence layer
//!
//! - Key/value port and its implementations
//! - Typed access to the persisted session selection
//! - Data models

mod file_system;
mod memory;
mod models;
mod selection;

pub use file_system::FileStore;
pub use memory::MemoryStore;
pub use models::WalletAccount;
pub use selection::{SelectionStore, STORAGE_PREFIX};

use crate::error::StorageError;

/// String key/value persistence port
///
/// Writes are applied immediately and the last writer wins; there is no
/// locking across processes sharing the same backing store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
