//! String key-value store capability
//!
//! A small async `get`/`set`/`delete` interface over string keys and values
//! with an implied byte quota. Callers hold a `dyn KeyValueStore` so the
//! backing storage can be swapped: [`MemoryStore`] for tests and ephemeral
//! use (with fault injection), [`FileStore`] for a persistent on-disk store.

mod error;
mod file;
mod memory;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

/// Persistent string-keyed, string-valued storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
