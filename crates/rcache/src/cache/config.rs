/// What a failed read means to [`fetch`](rcache_core::CacheStore::fetch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Only an absent key runs the producer; other read errors are returned
    #[default]
    MissOnly,
    /// Any read error runs the producer and overwrites the key
    ///
    /// A store outage then looks like a run of misses.
    AnyError,
}

/// Configuration for [`Cache`](crate::Cache)
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Prefix added to every key as `"{namespace}:{key}"`
    pub namespace: Option<String>,
    /// How `fetch` treats read failures
    pub fetch_policy: FetchPolicy,
}

impl CacheConfig {
    /// Create config with namespace
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    /// Set the fetch policy
    pub fn fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }
}
