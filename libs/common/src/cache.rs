//! Redis helpers for the AgendaPro services
//!
//! The agenda service keeps one monotonically increasing counter per
//! `(collection, owner)` pair in Redis. Mutations increment the counter and
//! readers compare it against the version their cached copy was fetched at.

use anyhow::Result;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::info;

/// Where the version counters live
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Prefix applied to every key written by this process
    pub key_prefix: String,
}

impl RedisConfig {
    /// Reads `REDIS_URL` (default `redis://localhost:6379`) and
    /// `REDIS_KEY_PREFIX` (default `agenda`)
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix = std::env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "agenda".to_string());

        Ok(RedisConfig { url, key_prefix })
    }
}

/// Shared Redis client with a key namespace
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    key_prefix: String,
}

impl RedisPool {
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        info!(prefix = %config.key_prefix, "Redis client ready at {}", config.url);
        Ok(RedisPool {
            client,
            key_prefix: config.key_prefix.clone(),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    /// Atomically increment a counter and return its new value
    pub async fn incr(&self, key: &str) -> Result<u64> {
        let mut conn = self.connection().await?;
        let value: u64 = conn.incr(self.key(key), 1u64).await?;
        Ok(value)
    }

    /// Read a counter, treating a missing key as zero
    pub async fn counter(&self, key: &str) -> Result<u64> {
        let mut conn = self.connection().await?;
        let value: Option<u64> = conn.get(self.key(key)).await?;
        Ok(value.unwrap_or(0))
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: u64 = conn.del(self.key(key)).await?;
        Ok(())
    }

    /// PING the server
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> RedisConfig {
        RedisConfig {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "agenda-test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_keys_are_prefixed() -> Result<()> {
        let pool = RedisPool::new(&local_config()).await?;
        assert_eq!(pool.key("appointments:42"), "agenda-test:appointments:42");
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_counter_incr_delete() -> Result<()> {
        let pool = RedisPool::new(&local_config()).await?;
        assert!(pool.health_check().await?);

        let key = "test_counter";
        pool.delete(key).await?;
        assert_eq!(pool.counter(key).await?, 0);

        assert_eq!(pool.incr(key).await?, 1);
        assert_eq!(pool.incr(key).await?, 2);
        assert_eq!(pool.counter(key).await?, 2);

        pool.delete(key).await?;
        assert_eq!(pool.counter(key).await?, 0);

        Ok(())
    }
}
