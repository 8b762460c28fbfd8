use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{CounterStore, StorageError};

/// Process-local store used when no data folder is configured.
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.values.lock().await.len()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().await;
        Ok(values.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().await;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
