//! Pass-through list, hash, set, counter and expiration operations

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use rcache_core::{
    CacheError, CacheMetrics, CacheOperation, Encode, ExpireCommand, ExtendedStore, Result,
    Serializer, StoreClient,
};

use super::{into_text, Cache};

#[async_trait]
impl<C, S, M> ExtendedStore for Cache<C, S, M>
where
    C: StoreClient,
    S: Serializer,
    M: CacheMetrics,
{
    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        self.observe(CacheOperation::Get, self.read(key)).await
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let key = self.full_key(key);
        self.observe(CacheOperation::Counter, self.client.incr_by(&key, delta))
            .await
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let key = self.full_key(key);
        self.observe(CacheOperation::Counter, self.client.decr_by(&key, delta))
            .await
    }

    async fn rpush<V>(&self, key: &str, value: &V) -> Result<u64>
    where
        V: Encode + Sync + ?Sized,
    {
        let bytes = self.encode(value)?;
        let key = self.full_key(key);
        self.observe(CacheOperation::List, self.client.rpush(&key, bytes))
            .await
    }

    async fn lpush<V>(&self, key: &str, value: &V) -> Result<u64>
    where
        V: Encode + Sync + ?Sized,
    {
        let bytes = self.encode(value)?;
        let key = self.full_key(key);
        self.observe(CacheOperation::List, self.client.lpush(&key, bytes))
            .await
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        let key = self.full_key(key);
        self.observe(CacheOperation::List, self.client.llen(&key))
            .await
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<String> {
        let full_key = self.full_key(key);
        let found = self
            .observe(CacheOperation::List, self.client.lindex(&full_key, index))
            .await?;
        match found {
            Some(bytes) => into_text(bytes),
            None => Err(CacheError::NotFound(format!("{}[{}]", key, index))),
        }
    }

    async fn lset<V>(&self, key: &str, index: i64, value: &V) -> Result<()>
    where
        V: Encode + Sync + ?Sized,
    {
        let bytes = self.encode(value)?;
        let key = self.full_key(key);
        self.observe(CacheOperation::List, self.client.lset(&key, index, bytes))
            .await
    }

    async fn hset<V>(&self, key: &str, field: &str, value: &V) -> Result<bool>
    where
        V: Encode + Sync + ?Sized,
    {
        let bytes = self.encode(value)?;
        let key = self.full_key(key);
        self.observe(CacheOperation::Hash, self.client.hset(&key, field, bytes))
            .await
    }

    async fn hmset<V>(&self, key: &str, fields: &[(&str, V)]) -> Result<()>
    where
        V: Encode + Sync,
    {
        let encoded = fields
            .iter()
            .map(|(field, value)| Ok((field.to_string(), self.encode(value)?)))
            .collect::<Result<Vec<_>>>()?;
        let key = self.full_key(key);
        self.observe(CacheOperation::Hash, self.client.hmset(&key, encoded))
            .await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<String> {
        let full_key = self.full_key(key);
        let found = self
            .observe(CacheOperation::Hash, self.client.hget(&full_key, field))
            .await?;
        match found {
            Some(bytes) => into_text(bytes),
            None => Err(CacheError::NotFound(format!("{}.{}", key, field))),
        }
    }

    async fn hlen(&self, key: &str) -> Result<u64> {
        let key = self.full_key(key);
        self.observe(CacheOperation::Hash, self.client.hlen(&key))
            .await
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        let key = self.full_key(key);
        self.observe(CacheOperation::Hash, self.client.hdel(&key, field))
            .await
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        let key = self.full_key(key);
        self.observe(CacheOperation::Hash, self.client.hexists(&key, field))
            .await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let key = self.full_key(key);
        let raw = self
            .observe(CacheOperation::Hash, self.client.hgetall(&key))
            .await?;
        raw.into_iter()
            .map(|(field, bytes)| Ok((field, into_text(bytes)?)))
            .collect()
    }

    async fn sadd<V>(&self, key: &str, member: &V) -> Result<bool>
    where
        V: Encode + Sync + ?Sized,
    {
        let bytes = self.encode(member)?;
        let key = self.full_key(key);
        self.observe(CacheOperation::Members, self.client.sadd(&key, bytes))
            .await
    }

    async fn srandmember(&self, key: &str) -> Result<String> {
        let full_key = self.full_key(key);
        let found = self
            .observe(CacheOperation::Members, self.client.srandmember(&full_key))
            .await?;
        match found {
            Some(bytes) => into_text(bytes),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let key = self.full_key(key);
        self.observe(CacheOperation::Expire, self.client.expire(&key, ttl))
            .await
    }

    async fn do_command(&self, cmd: &str, key: &str, arg: &str) -> Result<()> {
        // PERSIST and friends take no argument after the key
        let args: Vec<String> = if arg.is_empty() {
            Vec::new()
        } else {
            vec![arg.to_string()]
        };
        let key = self.full_key(key);
        self.observe(CacheOperation::Command, self.client.execute(cmd, &key, &args))
            .await
    }

    async fn expire_with(&self, key: &str, command: ExpireCommand) -> Result<()> {
        let args = command.args();
        let key = self.full_key(key);
        self.observe(
            CacheOperation::Expire,
            self.client.execute(command.name(), &key, &args),
        )
        .await
    }
}
