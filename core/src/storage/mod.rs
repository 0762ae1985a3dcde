//! storage: small key/value persistence for visitor and session ids.
//!
//! `FileStore` keeps one JSON object on disk and rewrites it atomically
//! (temp file + rename) on every change. `MemoryStore` is the session-scoped
//! variant and the fallback when no path is configured.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::types::StorageError;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
