//! Cache facade over a store client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use rcache_core::{
    CacheError, CacheMetrics, CacheOperation, CacheStore, Encode, JsonSerializer, NoopMetrics,
    Result, Serializer, StoreClient,
};

mod config;
mod extended;

pub use config::{CacheConfig, FetchPolicy};

/// Cache facade with fetch-or-compute and typed reads
///
/// Generic over:
/// - `C`: The store client (Memory, Redis)
/// - `S`: The serializer for structured values (JSON, MessagePack)
/// - `M`: The metrics collector
///
/// The facade holds no state besides the shared client handle, so clones are
/// cheap and all of them talk to the same store.
pub struct Cache<C, S = JsonSerializer, M = NoopMetrics>
where
    C: StoreClient,
    S: Serializer,
    M: CacheMetrics,
{
    client: Arc<C>,
    serializer: Arc<S>,
    metrics: Arc<M>,
    config: CacheConfig,
}

// Constructors for default serializer/metrics
impl<C: StoreClient> Cache<C, JsonSerializer, NoopMetrics> {
    /// Create a new Cache with default JSON serializer and no metrics
    pub fn new(client: C) -> Self {
        Self::with_config(client, CacheConfig::default())
    }

    /// Create with custom config
    pub fn with_config(client: C, config: CacheConfig) -> Self {
        Self::with_serializer_and_metrics(client, JsonSerializer, NoopMetrics, config)
    }
}

impl<C, S, M> Cache<C, S, M>
where
    C: StoreClient,
    S: Serializer,
    M: CacheMetrics,
{
    /// Create a Cache with custom serializer and metrics
    pub fn with_serializer_and_metrics(
        client: C,
        serializer: S,
        metrics: M,
        config: CacheConfig,
    ) -> Self {
        Self {
            client: Arc::new(client),
            serializer: Arc::new(serializer),
            metrics: Arc::new(metrics),
            config,
        }
    }

    /// The underlying store client
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the full key with namespace prefix
    fn full_key(&self, key: &str) -> String {
        match &self.config.namespace {
            Some(ns) => format!("{}:{}", ns, key),
            None => key.to_string(),
        }
    }

    /// Time `fut` and count its failure; an absent key is not a failure
    async fn observe<T>(
        &self,
        operation: CacheOperation,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = fut.await;
        self.metrics.record_latency(operation, start.elapsed());
        if let Err(err) = &result {
            if !err.is_not_found() {
                self.metrics.record_error(operation);
            }
        }
        result
    }

    fn encode<V: Encode + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        let start = Instant::now();
        let result = value.encode(self.serializer.as_ref());
        self.metrics
            .record_latency(CacheOperation::Encode, start.elapsed());
        if result.is_err() {
            self.metrics.record_error(CacheOperation::Encode);
        }
        result
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let start = Instant::now();
        let result = rcache_core::decode(bytes, self.serializer.as_ref());
        self.metrics
            .record_latency(CacheOperation::Decode, start.elapsed());
        if result.is_err() {
            self.metrics.record_error(CacheOperation::Decode);
        }
        result
    }

    /// Read raw bytes, turning an absent key into `NotFound`
    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let full_key = self.full_key(key);
        match self.client.get(&full_key).await? {
            Some(bytes) => {
                self.metrics.record_hit(&full_key);
                Ok(bytes)
            }
            None => {
                self.metrics.record_miss(&full_key);
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let full_key = self.full_key(key);
        self.client.set(&full_key, bytes, None).await
    }

    /// Return the stored text, or run `producer` and store its result
    async fn read_through<V, F>(&self, key: &str, producer: F) -> Result<String>
    where
        F: FnOnce() -> V + Send,
        V: Encode + Send,
    {
        match self.read(key).await {
            Ok(bytes) => {
                debug!(target: "rcache", key, "fetch hit");
                return into_text(bytes);
            }
            Err(err) if self.recomputes_on(&err) => {
                if err.is_not_found() {
                    debug!(target: "rcache", key, "fetch miss, running producer");
                } else {
                    warn!(
                        target: "rcache",
                        key,
                        error = %err,
                        "fetch read failed, recomputing"
                    );
                }
            }
            Err(err) => return Err(err),
        }

        let bytes = self.encode(&producer())?;
        // Reject non-text results before anything is written
        let text = into_text(bytes)?;
        self.write(key, text.as_bytes().to_vec()).await?;
        Ok(text)
    }

    /// Whether a failed read in `fetch` should run the producer
    fn recomputes_on(&self, err: &CacheError) -> bool {
        match self.config.fetch_policy {
            FetchPolicy::MissOnly => err.is_not_found(),
            FetchPolicy::AnyError => true,
        }
    }
}

/// Stored bytes as text
pub(crate) fn into_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| CacheError::Decode(e.to_string()))
}

impl<C, S, M> Clone for Cache<C, S, M>
where
    C: StoreClient,
    S: Serializer,
    M: CacheMetrics,
{
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            serializer: self.serializer.clone(),
            metrics: self.metrics.clone(),
            config: self.config.clone(),
        }
    }
}

#[async_trait]
impl<C, S, M> CacheStore for Cache<C, S, M>
where
    C: StoreClient,
    S: Serializer,
    M: CacheMetrics,
{
    async fn get(&self, key: &str) -> Result<String> {
        let bytes = self.observe(CacheOperation::Get, self.read(key)).await?;
        into_text(bytes)
    }

    async fn unmarshal<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let bytes = self.observe(CacheOperation::Get, self.read(key)).await?;
        self.decode(&bytes)
    }

    async fn set<V>(&self, key: &str, value: &V) -> Result<()>
    where
        V: Encode + Sync + ?Sized,
    {
        let bytes = self.encode(value)?;
        self.observe(CacheOperation::Set, self.write(key, bytes))
            .await
    }

    async fn fetch<V, F>(&self, key: &str, producer: F) -> Result<String>
    where
        F: FnOnce() -> V + Send,
        V: Encode + Send,
    {
        self.observe(CacheOperation::Fetch, self.read_through(key, producer))
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_key = self.full_key(key);
        self.observe(CacheOperation::Delete, self.client.delete(&full_key))
            .await?;
        Ok(())
    }
}
