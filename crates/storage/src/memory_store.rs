use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::KeyValueStore;

/// Process-local store, used as the fake backend in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(k: &str, v: &str) -> Self {
        let mut map = HashMap::new();
        map.insert(k.to_string(), v.to_string());
        Self { map: RwLock::new(map) }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    type Error = MemoryStoreError;

    async fn get(&self, k: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.map.read().await.get(k).cloned())
    }

    async fn set(&self, k: &str, v: &str) -> Result<(), Self::Error> {
        self.map.write().await.insert(k.to_string(), v.to_string());
        Ok(())
    }

    async fn delete(&self, k: &str) -> Result<(), Self::Error> {
        self.map.write().await.remove(k);
        Ok(())
    }
}

// Never constructed, the in-memory store cannot fail
#[derive(Debug, Error)]
#[error("memory store error")]
pub struct MemoryStoreError;
