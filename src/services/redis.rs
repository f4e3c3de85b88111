//! Redis connection used as a JSON key-value cache

use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    ttl_seconds: u64,
}

impl RedisCache {
    /// Create a new Redis cache and check the connection
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Cache(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Cache(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Cache(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Cache(format!("Failed to get Redis connection: {}", e)))
    }

    /// Read and decode a cached value; `None` on a miss
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to read {} from Redis: {}", key, e)))?;

        match raw {
            Some(data) => serde_json::from_str(&data)
                .map(Some)
                .map_err(|e| AppError::Cache(format!("Corrupt cache entry {}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Store a value with the configured expiration
    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> AppResult<()> {
        let data = serde_json::to_string(value)
            .map_err(|e| AppError::Cache(format!("Failed to encode {}: {}", key, e)))?;

        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, data, self.ttl_seconds)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to store {} in Redis: {}", key, e)))?;
        Ok(())
    }

    /// Drop cached keys after a write
    pub async fn invalidate(&self, keys: &[String]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(keys)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to invalidate cache keys: {}", e)))?;
        Ok(())
    }
}
