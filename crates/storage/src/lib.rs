use async_trait::async_trait;
use thiserror::Error;

pub mod db;
pub mod memory;
pub mod repositories;

pub use memory::MemoryCounterStore;
pub use repositories::SqliteCounterStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to prepare data folder: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable key to string mapping backing the visit badges.
///
/// Durability and consistency belong to the implementation. Callers doing a
/// read-modify-write through `get` then `put` get no isolation from other
/// callers on the same key.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
