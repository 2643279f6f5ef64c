//! Integration tests for Cache

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use crate::{CacheMetrics, CacheOperation};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    /// Memory store whose reads or writes can be made to fail like a dropped connection
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        down: Arc<AtomicBool>,
        writes_down: Arc<AtomicBool>,
    }

    impl FlakyStore {
        fn set_down(&self, down: bool) {
            self.down.store(down, Ordering::SeqCst);
        }

        fn set_writes_down(&self, down: bool) {
            self.writes_down.store(down, Ordering::SeqCst);
        }
    }

    /// Metrics collector that counts every hook call
    #[derive(Clone, Default)]
    struct CountingMetrics {
        hits: Arc<AtomicUsize>,
        misses: Arc<AtomicUsize>,
        latencies: Arc<Mutex<Vec<CacheOperation>>>,
        errors: Arc<Mutex<Vec<CacheOperation>>>,
    }

    impl CountingMetrics {
        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        fn misses(&self) -> usize {
            self.misses.load(Ordering::SeqCst)
        }

        fn errors(&self) -> Vec<CacheOperation> {
            self.errors.lock().unwrap().clone()
        }

        fn latencies_of(&self, operation: CacheOperation) -> usize {
            self.latencies
                .lock()
                .unwrap()
                .iter()
                .filter(|op| **op == operation)
                .count()
        }
    }

    impl CacheMetrics for CountingMetrics {
        fn record_hit(&self, _key: &str) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }

        fn record_miss(&self, _key: &str) {
            self.misses.fetch_add(1, Ordering::SeqCst);
        }

        fn record_latency(&self, operation: CacheOperation, _duration: Duration) {
            self.latencies.lock().unwrap().push(operation);
        }

        fn record_error(&self, operation: CacheOperation) {
            self.errors.lock().unwrap().push(operation);
        }
    }

    type CountedCache = Cache<FlakyStore, JsonSerializer, CountingMetrics>;

    fn counted(store: FlakyStore) -> (CountedCache, CountingMetrics) {
        let metrics = CountingMetrics::default();
        let cache = Cache::with_serializer_and_metrics(
            store,
            JsonSerializer,
            metrics.clone(),
            CacheConfig::default(),
        );
        (cache, metrics)
    }

    #[async_trait]
    impl StoreClient for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            if self.down.load(Ordering::SeqCst) {
                return Err(CacheError::Connection("connection refused".into()));
            }
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
            if self.writes_down.load(Ordering::SeqCst) {
                return Err(CacheError::Connection("broken pipe".into()));
            }
            self.inner.set(key, value, ttl).await
        }
        async fn delete(&self, key: &str) -> Result<bool> {
            self.inner.delete(key).await
        }
        async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
            self.inner.incr_by(key, delta).await
        }
        async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
            self.inner.decr_by(key, delta).await
        }
        async fn rpush(&self, key: &str, value: Vec<u8>) -> Result<u64> {
            self.inner.rpush(key, value).await
        }
        async fn lpush(&self, key: &str, value: Vec<u8>) -> Result<u64> {
            self.inner.lpush(key, value).await
        }
        async fn llen(&self, key: &str) -> Result<u64> {
            self.inner.llen(key).await
        }
        async fn lindex(&self, key: &str, index: i64) -> Result<Option<Vec<u8>>> {
            self.inner.lindex(key, index).await
        }
        async fn lset(&self, key: &str, index: i64, value: Vec<u8>) -> Result<()> {
            self.inner.lset(key, index, value).await
        }
        async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool> {
            self.inner.hset(key, field, value).await
        }
        async fn hmset(&self, key: &str, fields: Vec<(String, Vec<u8>)>) -> Result<()> {
            self.inner.hmset(key, fields).await
        }
        async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
            self.inner.hget(key, field).await
        }
        async fn hlen(&self, key: &str) -> Result<u64> {
            self.inner.hlen(key).await
        }
        async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
            self.inner.hdel(key, field).await
        }
        async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
            self.inner.hexists(key, field).await
        }
        async fn hgetall(&self, key: &str) -> Result<HashMap<String, Vec<u8>>> {
            self.inner.hgetall(key).await
        }
        async fn sadd(&self, key: &str, member: Vec<u8>) -> Result<bool> {
            self.inner.sadd(key, member).await
        }
        async fn srandmember(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.inner.srandmember(key).await
        }
        async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
            self.inner.expire(key, ttl).await
        }
        async fn execute(&self, cmd: &str, key: &str, args: &[String]) -> Result<()> {
            self.inner.execute(cmd, key, args).await
        }
    }

    #[tokio::test]
    async fn test_string_roundtrip() {
        let cache = Cache::new(MemoryStore::new());

        cache.set("greeting", "hello world").await.unwrap();
        assert_eq!(cache.get("greeting").await.unwrap(), "hello world");

        // Text that looks like JSON is stored verbatim, not re-quoted
        cache.set("raw", &String::from("{\"a\":1}")).await.unwrap();
        assert_eq!(cache.get("raw").await.unwrap(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_bytes_roundtrip() {
        let cache = Cache::new(MemoryStore::new());
        let payload = vec![0u8, 255, 128, 7];

        cache.set("blob", &payload).await.unwrap();
        assert_eq!(cache.get_bytes("blob").await.unwrap(), payload);

        // Not valid UTF-8, so it cannot be read as text
        assert!(matches!(
            cache.get("blob").await,
            Err(CacheError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_structured_roundtrip() {
        let cache = Cache::new(MemoryStore::new());
        let user = User {
            name: "Ann".to_string(),
            age: 31,
        };

        cache.set("user:1", &Structured(&user)).await.unwrap();
        let loaded: User = cache.unmarshal("user:1").await.unwrap();
        assert_eq!(loaded, user);
    }

    #[tokio::test]
    async fn test_unmarshal_name_field() {
        #[derive(serde::Deserialize)]
        struct Named {
            name: String,
        }

        let cache = Cache::new(MemoryStore::new());
        cache
            .set("user:1", &Structured(serde_json::json!({ "name": "Ann" })))
            .await
            .unwrap();

        let user: Named = cache.unmarshal("user:1").await.unwrap();
        assert_eq!(user.name, "Ann");
    }

    #[tokio::test]
    async fn test_unmarshal_errors() {
        let cache = Cache::new(MemoryStore::new());
        assert!(matches!(
            cache.unmarshal::<User>("missing").await,
            Err(CacheError::NotFound(_))
        ));

        cache.set("user:2", "not json").await.unwrap();
        assert!(matches!(
            cache.unmarshal::<User>("user:2").await,
            Err(CacheError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_scalars_are_stored_as_text() {
        let cache = Cache::new(MemoryStore::new());
        cache.set("answer", &42i64).await.unwrap();
        assert_eq!(cache.get("answer").await.unwrap(), "42");
        assert_eq!(cache.unmarshal::<i64>("answer").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_encode_failure_writes_nothing() {
        let cache = Cache::new(MemoryStore::new());
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys");

        let err = cache.set("bad", &Structured(bad)).await.unwrap_err();
        assert!(matches!(err, CacheError::Encode(_)));
        assert!(cache.client().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_miss_runs_producer_once() {
        let cache = Cache::new(MemoryStore::new());
        let calls = AtomicUsize::new(0);

        let value = cache
            .fetch("counter:missing", || {
                calls.fetch_add(1, Ordering::SeqCst);
                "0"
            })
            .await
            .unwrap();

        assert_eq!(value, "0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("counter:missing").await.unwrap(), "0");
    }

    #[tokio::test]
    async fn test_fetch_hit_skips_producer() {
        let cache = Cache::new(MemoryStore::new());
        cache.set("key", "cached").await.unwrap();

        let value = cache
            .fetch("key", || -> &'static str { panic!("producer must not run on a hit") })
            .await
            .unwrap();
        assert_eq!(value, "cached");
    }

    #[tokio::test]
    async fn test_fetch_structured_value() {
        let cache = Cache::new(MemoryStore::new());
        let value = cache
            .fetch("user:3", || {
                Structured(User {
                    name: "Bo".to_string(),
                    age: 40,
                })
            })
            .await
            .unwrap();

        assert_eq!(value, r#"{"name":"Bo","age":40}"#);
        let user: User = cache.unmarshal("user:3").await.unwrap();
        assert_eq!(user.name, "Bo");
    }

    #[tokio::test]
    async fn test_fetch_propagates_transport_error_by_default() {
        let store = FlakyStore::default();
        let cache = Cache::new(store.clone());
        store.set_down(true);

        let calls = AtomicUsize::new(0);
        let err = cache
            .fetch("key", || {
                calls.fetch_add(1, Ordering::SeqCst);
                "fresh"
            })
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_any_error_policy_recomputes() {
        let store = FlakyStore::default();
        let config = CacheConfig::default().fetch_policy(FetchPolicy::AnyError);
        let cache = Cache::with_config(store.clone(), config);

        cache.set("key", "stale").await.unwrap();
        store.set_down(true);

        let value = cache.fetch("key", || "fresh").await.unwrap();
        assert_eq!(value, "fresh");

        store.set_down(false);
        assert_eq!(cache.get("key").await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_text_before_writing() {
        let cache = Cache::new(MemoryStore::new());
        let err = cache
            .fetch("blob", || vec![0xffu8, 0xfe])
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Decode(_)));
        assert!(cache.client().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = Cache::new(MemoryStore::new());
        cache.set("key", "value").await.unwrap();

        cache.delete("key").await.unwrap();
        assert!(cache.get("key").await.unwrap_err().is_not_found());

        // Deleting again is not an error
        cache.delete("key").await.unwrap();
    }

    #[tokio::test]
    async fn test_get_distinguishes_missing_from_transport() {
        let store = FlakyStore::default();
        let cache = Cache::new(store.clone());

        assert!(cache.get("nope").await.unwrap_err().is_not_found());

        store.set_down(true);
        let err = cache.get("nope").await.unwrap_err();
        assert_eq!(err, CacheError::Connection("connection refused".into()));
    }

    #[tokio::test]
    async fn test_set_overwrites_and_clears_ttl() {
        let cache = Cache::new(MemoryStore::new());
        cache.set("key", "one").await.unwrap();
        assert!(cache.expire("key", Duration::from_secs(60)).await.unwrap());

        cache.set("key", "two").await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), "two");
        assert_eq!(cache.client().ttl("key"), None);
    }

    #[tokio::test]
    async fn test_namespace() {
        let store = MemoryStore::new();
        let cache = Cache::with_config(store.clone(), CacheConfig::with_namespace("myapp"));

        cache.set("key", "value").await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), "value");
        assert_eq!(
            store.get("myapp:key").await.unwrap(),
            Some(b"value".to_vec())
        );
        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_counters() {
        let cache = Cache::new(MemoryStore::new());
        assert_eq!(cache.incr_by("visits", 3).await.unwrap(), 3);
        assert_eq!(cache.decr_by("visits", 1).await.unwrap(), 2);
        assert_eq!(cache.get("visits").await.unwrap(), "2");
    }

    #[tokio::test]
    async fn test_lists() {
        let cache = Cache::new(MemoryStore::new());
        cache.rpush("queue", "b").await.unwrap();
        cache.rpush("queue", &Structured(vec![1, 2])).await.unwrap();
        assert_eq!(cache.lpush("queue", "a").await.unwrap(), 3);

        assert_eq!(cache.llen("queue").await.unwrap(), 3);
        assert_eq!(cache.lindex("queue", 0).await.unwrap(), "a");
        assert_eq!(cache.lindex("queue", -1).await.unwrap(), "[1,2]");
        assert!(cache.lindex("queue", 10).await.unwrap_err().is_not_found());

        cache.lset("queue", 1, "B").await.unwrap();
        assert_eq!(cache.lindex("queue", 1).await.unwrap(), "B");
    }

    #[tokio::test]
    async fn test_hashes() {
        let cache = Cache::new(MemoryStore::new());
        assert!(cache.hset("user:1", "name", "Ann").await.unwrap());
        cache
            .hmset("user:1", &[("age", "31"), ("city", "Oslo")])
            .await
            .unwrap();

        assert_eq!(cache.hlen("user:1").await.unwrap(), 3);
        assert_eq!(cache.hget("user:1", "city").await.unwrap(), "Oslo");
        assert!(cache.hget("user:1", "zip").await.unwrap_err().is_not_found());
        assert!(cache.hexists("user:1", "age").await.unwrap());

        let all = cache.hgetall("user:1").await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all["name"], "Ann");

        assert!(cache.hdel("user:1", "age").await.unwrap());
        assert!(!cache.hexists("user:1", "age").await.unwrap());
    }

    #[tokio::test]
    async fn test_sets() {
        let cache = Cache::new(MemoryStore::new());
        assert!(cache.sadd("colors", "red").await.unwrap());
        assert!(!cache.sadd("colors", "red").await.unwrap());

        assert_eq!(cache.srandmember("colors").await.unwrap(), "red");
        assert!(cache.srandmember("none").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_expire_removes_key() {
        let cache = Cache::new(MemoryStore::new());
        assert!(!cache.expire("missing", Duration::from_secs(1)).await.unwrap());

        cache.set("session", "token").await.unwrap();
        assert!(cache.expire("session", Duration::from_millis(20)).await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("session").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_do_command_and_expire_with() {
        let cache = Cache::new(MemoryStore::new());
        cache.set("key", "value").await.unwrap();

        cache.do_command("EXPIRE", "key", "60").await.unwrap();
        assert!(cache.client().ttl("key").is_some());

        cache.do_command("PERSIST", "key", "").await.unwrap();
        assert_eq!(cache.client().ttl("key"), None);

        cache
            .expire_with("key", ExpireCommand::PExpire(Duration::from_secs(30)))
            .await
            .unwrap();
        assert!(cache.client().ttl("key").is_some());

        cache
            .expire_with("key", ExpireCommand::Expire(Duration::ZERO))
            .await
            .unwrap();
        assert!(cache.get("key").await.unwrap_err().is_not_found());

        assert!(matches!(
            cache.do_command("EXPIRE", "key", "soon").await,
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_clone_shares_client() {
        let cache1 = Cache::new(MemoryStore::new());
        let cache2 = cache1.clone();

        cache1.set("key", "value").await.unwrap();
        assert_eq!(cache2.get("key").await.unwrap(), "value");
    }

    #[tokio::test]
    async fn test_generic_over_capability() {
        async fn warm<T: CacheStore>(store: &T) -> Result<String> {
            store.fetch("warm", || "ready").await
        }

        let cache = Cache::new(MemoryStore::new());
        assert_eq!(warm(&cache).await.unwrap(), "ready");
    }

    #[tokio::test]
    async fn test_metrics_count_hits_misses_and_errors() {
        let store = FlakyStore::default();
        let (cache, metrics) = counted(store.clone());

        assert!(cache.get("key").await.unwrap_err().is_not_found());
        assert_eq!((metrics.hits(), metrics.misses()), (0, 1));

        cache.set("key", "value").await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), "value");
        assert_eq!((metrics.hits(), metrics.misses()), (1, 1));

        assert_eq!(cache.fetch("lazy", || "computed").await.unwrap(), "computed");
        assert_eq!((metrics.hits(), metrics.misses()), (1, 2));

        // Absent keys are misses, not failures
        assert!(metrics.errors().is_empty());

        store.set_down(true);
        assert!(cache.get("key").await.unwrap_err().is_transport());
        assert!(cache.fetch("key", || "fresh").await.unwrap_err().is_transport());

        assert_eq!((metrics.hits(), metrics.misses()), (1, 2));
        assert_eq!(
            metrics.errors(),
            vec![CacheOperation::Get, CacheOperation::Fetch]
        );
    }

    #[tokio::test]
    async fn test_fetch_records_latency_on_every_exit() {
        let store = FlakyStore::default();
        let (cache, metrics) = counted(store.clone());

        cache.fetch("key", || "v").await.unwrap();
        cache.fetch("key", || "v").await.unwrap();
        assert_eq!(metrics.latencies_of(CacheOperation::Fetch), 2);

        store.set_writes_down(true);
        assert!(cache.fetch("other", || "v").await.unwrap_err().is_transport());
        assert_eq!(metrics.latencies_of(CacheOperation::Fetch), 3);
        assert_eq!(metrics.errors(), vec![CacheOperation::Fetch]);
    }

    #[tokio::test]
    async fn test_do_command_outside_expiration_family_is_unsupported() {
        let cache = Cache::new(MemoryStore::new());
        cache.set("key", "value").await.unwrap();

        assert_eq!(
            cache.do_command("DEL", "key", "").await,
            Err(CacheError::Unsupported("DEL".to_string()))
        );
        assert_eq!(cache.get("key").await.unwrap(), "value");
    }

    #[cfg(feature = "tracing")]
    #[tokio::test]
    async fn test_tracing_metrics_integration() {
        use crate::TracingMetrics;

        let cache = Cache::with_serializer_and_metrics(
            MemoryStore::new(),
            JsonSerializer,
            TracingMetrics::new(),
            CacheConfig::default(),
        );

        cache.set("key", "value").await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), "value");
        assert!(cache.get("missing").await.unwrap_err().is_not_found());
    }
}
