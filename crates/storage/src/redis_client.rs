use async_trait::async_trait;
use log::info;
use redis::RedisError;
use redis::{self, aio, AsyncCommands};
use thiserror::Error;

use crate::KeyValueStore;

#[derive(Clone)]
pub struct RedisClient {
    connection: aio::MultiplexedConnection,
    redis_url: String,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient").field("redis_url", &self.redis_url).finish()
    }
}

impl RedisClient {
    pub async fn build(redis_url: &str) -> Result<Self, RedisClientError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(RedisClient { connection, redis_url: redis_url.to_string() })
    }
}

#[async_trait]
impl KeyValueStore for RedisClient {
    type Error = RedisClientError;

    async fn get(&self, k: &str) -> Result<Option<String>, Self::Error> {
        info!("Getting key: {}", k);
        self.connection
            .clone()
            .get::<_, Option<String>>(k)
            .await
            .map_err(RedisClientError::RedisLibraryError)
    }

    async fn set(&self, k: &str, v: &str) -> Result<(), Self::Error> {
        info!("Setting key: {}", k);
        self.connection
            .clone()
            .set::<_, _, ()>(k, v)
            .await
            .map_err(RedisClientError::RedisLibraryError)
    }

    async fn delete(&self, k: &str) -> Result<(), Self::Error> {
        info!("Deleting key: {}", k);
        self.connection.clone().del::<_, ()>(k).await.map_err(RedisClientError::RedisLibraryError)
    }
}

#[derive(Debug, Error)]
pub enum RedisClientError {
    #[error("Error thrown from Redis Library: {0}")]
    RedisLibraryError(#[from] RedisError),
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> RedisClient {
        let redis_url = "redis://localhost:6379".to_string();
        RedisClient::build(&redis_url).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a redis server on localhost:6379"]
    async fn test_key_store() {
        let client = setup().await;

        let key = "hydra_test_key";

        // Clear
        client.delete(key).await.unwrap();
        assert_eq!(client.get(key).await.unwrap(), None);

        // Test set
        client.set(key, "first").await.unwrap();
        client.set(key, "second").await.unwrap();

        // Test get
        assert_eq!(client.get(key).await.unwrap(), Some("second".to_string()));

        client.delete(key).await.unwrap();
    }
}
