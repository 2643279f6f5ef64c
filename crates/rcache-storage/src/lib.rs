//! rcache-storage: Store clients for rcache
//!
//! - [`MemoryStore`] (feature `memory`, default): in-process store with the
//!   same command set as the remote server.
//! - [`RedisClient`] (feature `redis`): pooled connections to a Redis server.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

#[cfg(feature = "redis")]
pub use redis::{RedisClient, RedisConfig};
