use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

pub use file_store::{FileStore, FileStoreError};
pub use memory_store::{MemoryStore, MemoryStoreError};
pub use redis_client::{RedisClient, RedisClientError};

pub mod file_store;
pub mod memory_store;
pub mod redis_client;

/// Durable string key/value storage.
///
/// `set` replaces the previous value wholesale; there is no merge at this layer.
#[async_trait]
pub trait KeyValueStore: Debug + Send + Sync {
    type Error: Error + Debug + Send + Sync + 'static;

    async fn get(&self, k: &str) -> Result<Option<String>, Self::Error>;

    async fn set(&self, k: &str, v: &str) -> Result<(), Self::Error>;

    async fn delete(&self, k: &str) -> Result<(), Self::Error>;
}
