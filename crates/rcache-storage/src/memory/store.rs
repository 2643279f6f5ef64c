//! In-memory store using DashMap

use async_trait::async_trait;
use dashmap::DashMap;
use rand::seq::IteratorRandom;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::task::JoinHandle;
use tracing::debug;

use rcache_core::{CacheError, ExpireCommand, Result, StoreClient};

/// Shortest interval accepted by [`MemoryStore::spawn_purger`]
pub const MIN_PURGE_PERIOD: Duration = Duration::from_millis(1);

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// Value kinds the store understands
#[derive(Debug, Clone)]
enum Value {
    Str(Vec<u8>),
    List(VecDeque<Vec<u8>>),
    Hash(HashMap<String, Vec<u8>>),
    Set(HashSet<Vec<u8>>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// In-process store with the command set of the remote server
///
/// Strings, lists, hashes, sets, counters and key timeouts behave the way
/// the server does, including `WRONGTYPE` errors when a command targets a
/// key holding another kind of value. Expired keys are dropped lazily on
/// access, or in bulk by [`MemoryStore::purge_expired`].
///
/// Cloning creates a new handle to the SAME underlying store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<DashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with room for `capacity` keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Arc::new(DashMap::with_capacity(capacity)),
        }
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.iter().filter(|entry| !entry.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining time to live of `key`, `None` if absent or persistent
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.evict_expired(key);
        self.data
            .get(key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Drop every expired key and return how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.data.len())
    }

    /// Run [`MemoryStore::purge_expired`] every `period` on the tokio runtime
    ///
    /// Periods shorter than [`MIN_PURGE_PERIOD`] are raised to it. The task
    /// runs until the returned handle is aborted.
    pub fn spawn_purger(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = period.max(MIN_PURGE_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    debug!(target: "rcache", purged, "Purged expired keys");
                }
            }
        })
    }

    fn evict_expired(&self, key: &str) {
        self.data.remove_if(key, |_, entry| entry.is_expired());
    }

    fn add(&self, key: &str, delta: i64) -> Result<i64> {
        self.evict_expired(key);
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Str(b"0".to_vec())));
        let Value::Str(bytes) = &mut entry.value else {
            return Err(wrong_type());
        };

        let current: i64 = std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| backend("ERR value is not an integer or out of range"))?;
        let next = current
            .checked_add(delta)
            .ok_or_else(|| backend("ERR increment or decrement would overflow"))?;

        *bytes = next.to_string().into_bytes();
        Ok(next)
    }

    fn push(&self, key: &str, value: Vec<u8>, front: bool) -> Result<u64> {
        self.evict_expired(key);
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
        let Value::List(list) = &mut entry.value else {
            return Err(wrong_type());
        };

        if front {
            list.push_front(value);
        } else {
            list.push_back(value);
        }
        Ok(list.len() as u64)
    }

    /// Apply a timeout; zero deletes the key, `None` makes it persistent
    fn apply_ttl(&self, key: &str, ttl: Option<Duration>) -> Result<bool> {
        self.evict_expired(key);
        let expires_at = match ttl {
            Some(ttl) if ttl.is_zero() => return Ok(self.data.remove(key).is_some()),
            Some(ttl) => Some(deadline(ttl, "expire")?),
            None => None,
        };
        match self.data.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = expires_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove `key` if it holds an empty hash
    fn drop_if_empty_hash(&self, key: &str) {
        self.data
            .remove_if(key, |_, entry| matches!(&entry.value, Value::Hash(hash) if hash.is_empty()));
    }
}

/// Instant `ttl` from now, rejecting timeouts the clock cannot represent
fn deadline(ttl: Duration, cmd: &str) -> Result<Instant> {
    Instant::now()
        .checked_add(ttl)
        .ok_or_else(|| CacheError::InvalidArgument(format!("invalid expire time in '{cmd}' command")))
}

fn backend(message: &str) -> CacheError {
    CacheError::Backend(message.to_string())
}

fn wrong_type() -> CacheError {
    backend(WRONG_TYPE)
}

/// Resolve a possibly negative list index
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.evict_expired(key);
        match self.data.get(key) {
            Some(entry) => match &entry.value {
                Value::Str(bytes) => Ok(Some(bytes.clone())),
                _ => Err(wrong_type()),
            },
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        if ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(CacheError::InvalidArgument(
                "invalid expire time in 'set' command".to_string(),
            ));
        }

        let entry = Entry {
            value: Value::Str(value),
            expires_at: ttl.map(|ttl| deadline(ttl, "set")).transpose()?,
        };
        self.data.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.evict_expired(key);
        Ok(self.data.remove(key).is_some())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.add(key, delta)
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let delta = delta
            .checked_neg()
            .ok_or_else(|| backend("ERR decrement would overflow"))?;
        self.add(key, delta)
    }

    async fn rpush(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        self.push(key, value, false)
    }

    async fn lpush(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        self.push(key, value, true)
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        self.evict_expired(key);
        match self.data.get(key) {
            Some(entry) => match &entry.value {
                Value::List(list) => Ok(list.len() as u64),
                _ => Err(wrong_type()),
            },
            None => Ok(0),
        }
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<Vec<u8>>> {
        self.evict_expired(key);
        match self.data.get(key) {
            Some(entry) => match &entry.value {
                Value::List(list) => {
                    Ok(resolve_index(index, list.len()).map(|i| list[i].clone()))
                }
                _ => Err(wrong_type()),
            },
            None => Ok(None),
        }
    }

    async fn lset(&self, key: &str, index: i64, value: Vec<u8>) -> Result<()> {
        self.evict_expired(key);
        let mut entry = self
            .data
            .get_mut(key)
            .ok_or_else(|| backend("ERR no such key"))?;
        let Value::List(list) = &mut entry.value else {
            return Err(wrong_type());
        };

        let i = resolve_index(index, list.len()).ok_or_else(|| backend("ERR index out of range"))?;
        list[i] = value;
        Ok(())
    }

    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool> {
        self.evict_expired(key);
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Hash(HashMap::new())));
        let Value::Hash(hash) = &mut entry.value else {
            return Err(wrong_type());
        };
        Ok(hash.insert(field.to_string(), value).is_none())
    }

    async fn hmset(&self, key: &str, fields: Vec<(String, Vec<u8>)>) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        self.evict_expired(key);
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Hash(HashMap::new())));
        let Value::Hash(hash) = &mut entry.value else {
            return Err(wrong_type());
        };
        hash.extend(fields);
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.evict_expired(key);
        match self.data.get(key) {
            Some(entry) => match &entry.value {
                Value::Hash(hash) => Ok(hash.get(field).cloned()),
                _ => Err(wrong_type()),
            },
            None => Ok(None),
        }
    }

    async fn hlen(&self, key: &str) -> Result<u64> {
        self.evict_expired(key);
        match self.data.get(key) {
            Some(entry) => match &entry.value {
                Value::Hash(hash) => Ok(hash.len() as u64),
                _ => Err(wrong_type()),
            },
            None => Ok(0),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        self.evict_expired(key);
        let removed = match self.data.get_mut(key) {
            Some(mut entry) => match &mut entry.value {
                Value::Hash(hash) => hash.remove(field).is_some(),
                _ => return Err(wrong_type()),
            },
            None => false,
        };

        if removed {
            self.drop_if_empty_hash(key);
        }
        Ok(removed)
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        self.evict_expired(key);
        match self.data.get(key) {
            Some(entry) => match &entry.value {
                Value::Hash(hash) => Ok(hash.contains_key(field)),
                _ => Err(wrong_type()),
            },
            None => Ok(false),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, Vec<u8>>> {
        self.evict_expired(key);
        match self.data.get(key) {
            Some(entry) => match &entry.value {
                Value::Hash(hash) => Ok(hash.clone()),
                _ => Err(wrong_type()),
            },
            None => Ok(HashMap::new()),
        }
    }

    async fn sadd(&self, key: &str, member: Vec<u8>) -> Result<bool> {
        self.evict_expired(key);
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Set(HashSet::new())));
        let Value::Set(set) = &mut entry.value else {
            return Err(wrong_type());
        };
        Ok(set.insert(member))
    }

    async fn srandmember(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.evict_expired(key);
        match self.data.get(key) {
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.iter().choose(&mut rand::rng()).cloned()),
                _ => Err(wrong_type()),
            },
            None => Ok(None),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.apply_ttl(key, Some(ttl))
    }

    async fn execute(&self, cmd: &str, key: &str, args: &[String]) -> Result<()> {
        let command = ExpireCommand::parse(cmd, args)?;
        self.apply_ttl(key, command.remaining(SystemTime::now()))?;
        Ok(())
    }
}
