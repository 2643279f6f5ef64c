//! Capability sets exposed to cache callers

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::{Encode, ExpireCommand, Result};

/// Base cache capability: read, write, fetch-or-compute and delete
///
/// Values written through this trait are encoded with [`Encode`]; values read
/// back are either returned as text or decoded into a caller-chosen type.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the value stored at `key` as text
    ///
    /// Fails with [`CacheError::NotFound`](crate::CacheError::NotFound) if the
    /// key is absent.
    async fn get(&self, key: &str) -> Result<String>;

    /// Read the value stored at `key` and decode it into `T`
    async fn unmarshal<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Send;

    /// Encode `value` and store it at `key` without a timeout
    async fn set<V>(&self, key: &str, value: &V) -> Result<()>
    where
        V: Encode + Sync + ?Sized;

    /// Return the value at `key`, or compute, store and return it
    ///
    /// `producer` runs at most once per call and only when the read did not
    /// produce a value. Concurrent callers racing on the same missing key may
    /// each run their producer; the last write wins.
    async fn fetch<V, F>(&self, key: &str, producer: F) -> Result<String>
    where
        F: FnOnce() -> V + Send,
        V: Encode + Send;

    /// Remove `key`; removing an absent key succeeds
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Extended store capability: counters, lists, hashes, sets and expiration
///
/// Every operation maps to a single store command.
#[async_trait]
pub trait ExtendedStore: CacheStore {
    /// Read the value stored at `key` as raw bytes
    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>>;

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64>;

    /// Append an element to the list at `key`, returning the new length
    async fn rpush<V>(&self, key: &str, value: &V) -> Result<u64>
    where
        V: Encode + Sync + ?Sized;

    /// Prepend an element to the list at `key`, returning the new length
    async fn lpush<V>(&self, key: &str, value: &V) -> Result<u64>
    where
        V: Encode + Sync + ?Sized;

    async fn llen(&self, key: &str) -> Result<u64>;

    /// Element at `index` of the list at `key`
    ///
    /// Negative indexes count from the tail. Out-of-range indexes fail with
    /// `NotFound`.
    async fn lindex(&self, key: &str, index: i64) -> Result<String>;

    /// Overwrite the element at `index` of the list at `key`
    async fn lset<V>(&self, key: &str, index: i64, value: &V) -> Result<()>
    where
        V: Encode + Sync + ?Sized;

    /// Set one hash field, returning `true` if the field was created
    async fn hset<V>(&self, key: &str, field: &str, value: &V) -> Result<bool>
    where
        V: Encode + Sync + ?Sized;

    /// Set several hash fields at once
    async fn hmset<V>(&self, key: &str, fields: &[(&str, V)]) -> Result<()>
    where
        V: Encode + Sync;

    async fn hget(&self, key: &str, field: &str) -> Result<String>;

    async fn hlen(&self, key: &str) -> Result<u64>;

    /// Remove a hash field, returning `true` if it existed
    async fn hdel(&self, key: &str, field: &str) -> Result<bool>;

    async fn hexists(&self, key: &str, field: &str) -> Result<bool>;

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Add a member to the set at `key`, returning `true` if it is new
    async fn sadd<V>(&self, key: &str, member: &V) -> Result<bool>
    where
        V: Encode + Sync + ?Sized;

    /// A random member of the set at `key`
    async fn srandmember(&self, key: &str) -> Result<String>;

    /// Set a relative timeout on `key`, returning `false` if it is absent
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Run a raw expiration-family command such as `EXPIRE key 60`
    async fn do_command(&self, cmd: &str, key: &str, arg: &str) -> Result<()>;

    /// Typed form of [`ExtendedStore::do_command`]
    async fn expire_with(&self, key: &str, command: ExpireCommand) -> Result<()>;
}
