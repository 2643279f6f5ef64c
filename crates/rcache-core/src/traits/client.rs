//! Remote store client trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::Result;

/// Raw key-value primitives provided by a store client
///
/// This is the only seam the cache facade depends on. Implementations own
/// connection management, transport and protocol framing; values cross this
/// boundary as already-encoded bytes and absent values come back as `None`.
/// Errors from the store are returned as-is, without retries.
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    /// Read the string value stored at `key`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` at `key`, replacing any previous value and timeout
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Delete `key`
    ///
    /// Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Add `delta` to the integer stored at `key`
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;

    /// Subtract `delta` from the integer stored at `key`
    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64>;

    /// Append to the list at `key`, returning the new length
    async fn rpush(&self, key: &str, value: Vec<u8>) -> Result<u64>;

    /// Prepend to the list at `key`, returning the new length
    async fn lpush(&self, key: &str, value: Vec<u8>) -> Result<u64>;

    async fn llen(&self, key: &str) -> Result<u64>;

    /// Element at `index`; negative indexes count from the tail
    async fn lindex(&self, key: &str, index: i64) -> Result<Option<Vec<u8>>>;

    async fn lset(&self, key: &str, index: i64, value: Vec<u8>) -> Result<()>;

    /// Set a hash field, returning `true` if the field is new
    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool>;

    async fn hmset(&self, key: &str, fields: Vec<(String, Vec<u8>)>) -> Result<()>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    async fn hlen(&self, key: &str) -> Result<u64>;

    /// Remove a hash field, returning `true` if it existed
    async fn hdel(&self, key: &str, field: &str) -> Result<bool>;

    async fn hexists(&self, key: &str, field: &str) -> Result<bool>;

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, Vec<u8>>>;

    /// Add a set member, returning `true` if it was not already present
    async fn sadd(&self, key: &str, member: Vec<u8>) -> Result<bool>;

    async fn srandmember(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a relative timeout on `key`
    ///
    /// Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Execute a raw command of the form `CMD key args...`
    async fn execute(&self, cmd: &str, key: &str, args: &[String]) -> Result<()>;
}
