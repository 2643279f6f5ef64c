use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use redis::{AsyncCommands, RedisError};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, trace};

use rcache_core::{CacheError, Result, StoreClient};

use super::config::RedisConfig;

/// Store client backed by a pool of Redis connections
///
/// Every method is a single command on a pooled connection. Pooling, reconnects
/// and protocol framing are left to `bb8` and `redis`.
#[derive(Clone)]
pub struct RedisClient {
    pool: Pool<RedisConnectionManager>,
    config: RedisConfig,
}

impl RedisClient {
    /// Create a new Redis client
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        info!(
            target: "rcache",
            pool_size = config.pool_size,
            "Redis connection pool ready"
        );

        Ok(Self { pool, config })
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Get connection from pool
    async fn get_connection(&self) -> Result<PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

/// Convert a timeout already expressed in the command's unit
///
/// A non-zero `ttl` that truncates to zero is raised to one unit, so the
/// server never sees a timeout that deletes the key at once.
fn timeout(amount: u128, ttl: Duration, cmd: &str) -> Result<i64> {
    let amount = if amount == 0 && !ttl.is_zero() { 1 } else { amount };
    i64::try_from(amount)
        .map_err(|_| CacheError::InvalidArgument(format!("invalid expire time in '{cmd}' command")))
}

fn backend(err: RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}

#[async_trait]
impl StoreClient for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;
        trace!(target: "rcache", key, "GET");
        conn.get(key).await.map_err(backend)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.get_connection().await?;
        trace!(target: "rcache", key, ttl = ?ttl, "SET");
        match ttl {
            Some(ttl) => {
                let millis = timeout(ttl.as_millis(), ttl, "set")?;
                conn.pset_ex::<_, _, ()>(key, value, millis.unsigned_abs())
                    .await
                    .map_err(backend)
            }
            None => conn.set::<_, _, ()>(key, value).await.map_err(backend),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        trace!(target: "rcache", key, "DEL");
        let deleted: u64 = conn.del(key).await.map_err(backend)?;
        Ok(deleted > 0)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.get_connection().await?;
        conn.incr(key, delta).await.map_err(backend)
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.get_connection().await?;
        conn.decr(key, delta).await.map_err(backend)
    }

    async fn rpush(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        let mut conn = self.get_connection().await?;
        conn.rpush(key, value).await.map_err(backend)
    }

    async fn lpush(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        let mut conn = self.get_connection().await?;
        conn.lpush(key, value).await.map_err(backend)
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        let mut conn = self.get_connection().await?;
        conn.llen(key).await.map_err(backend)
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;
        conn.lindex(key, index as isize).await.map_err(backend)
    }

    async fn lset(&self, key: &str, index: i64, value: Vec<u8>) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.lset::<_, _, ()>(key, index as isize, value)
            .await
            .map_err(backend)
    }

    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let created: u64 = conn.hset(key, field, value).await.map_err(backend)?;
        Ok(created > 0)
    }

    async fn hmset(&self, key: &str, fields: Vec<(String, Vec<u8>)>) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut conn = self.get_connection().await?;
        conn.hset_multiple::<_, _, _, ()>(key, &fields)
            .await
            .map_err(backend)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;
        conn.hget(key, field).await.map_err(backend)
    }

    async fn hlen(&self, key: &str) -> Result<u64> {
        let mut conn = self.get_connection().await?;
        conn.hlen(key).await.map_err(backend)
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let removed: u64 = conn.hdel(key, field).await.map_err(backend)?;
        Ok(removed > 0)
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        conn.hexists(key, field).await.map_err(backend)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, Vec<u8>>> {
        let mut conn = self.get_connection().await?;
        conn.hgetall(key).await.map_err(backend)
    }

    async fn sadd(&self, key: &str, member: Vec<u8>) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let added: u64 = conn.sadd(key, member).await.map_err(backend)?;
        Ok(added > 0)
    }

    async fn srandmember(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;
        conn.srandmember(key).await.map_err(backend)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        trace!(target: "rcache", key, ttl = ?ttl, "EXPIRE");
        // Whole seconds use EXPIRE, anything finer needs PEXPIRE
        if ttl.subsec_nanos() == 0 {
            let secs = timeout(u128::from(ttl.as_secs()), ttl, "expire")?;
            conn.expire(key, secs).await.map_err(backend)
        } else {
            let millis = timeout(ttl.as_millis(), ttl, "pexpire")?;
            conn.pexpire(key, millis).await.map_err(backend)
        }
    }

    async fn execute(&self, cmd: &str, key: &str, args: &[String]) -> Result<()> {
        let mut conn = self.get_connection().await?;
        trace!(target: "rcache", cmd, key, args = ?args, "raw command");
        redis::cmd(cmd)
            .arg(key)
            .arg(args)
            .query_async::<redis::Value>(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
