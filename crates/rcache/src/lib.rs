//! rcache: Thin cache facade over a remote key-value store
//!
//! # Features
//!
//! - **Fetch-or-compute** reads with lazy population
//! - **Typed reads** of structured values (JSON by default)
//! - **Lists, hashes, sets, counters and expirations** forwarded to the store
//! - **Pluggable store clients** (in-memory, Redis)
//! - **Metrics integration**
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rcache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let cache = Cache::new(MemoryStore::new());
//!
//!     cache.set("greeting", "hello").await?;
//!     assert_eq!(cache.get("greeting").await?, "hello");
//!
//!     let value = cache.fetch("counter", || "0").await?;
//!     assert_eq!(value, "0");
//!
//!     Ok(())
//! }
//! ```

mod cache;

// Re-export core
pub use rcache_core::*;

// Re-export store clients
#[cfg(feature = "memory")]
pub use rcache_storage::MemoryStore;

#[cfg(feature = "redis")]
pub use rcache_storage::{RedisClient, RedisConfig};

pub use cache::{Cache, CacheConfig, FetchPolicy};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Cache, CacheConfig, CacheError, CacheStore, Encode, ExpireCommand, ExtendedStore,
        FetchPolicy, JsonSerializer, Result, Serializer, StoreClient, Structured,
    };

    #[cfg(feature = "memory")]
    pub use crate::MemoryStore;

    #[cfg(feature = "redis")]
    pub use crate::{RedisClient, RedisConfig};

    #[cfg(feature = "msgpack")]
    pub use crate::MsgPackSerializer;
}

#[cfg(all(test, feature = "memory"))]
mod tests;
