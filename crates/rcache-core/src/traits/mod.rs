//! Core traits for cache operations

mod client;
mod metrics;
mod serializer;
mod store;

#[cfg(feature = "tracing")]
mod tracing_metrics;

pub use client::StoreClient;
pub use metrics::{CacheMetrics, CacheOperation, NoopMetrics};
pub use serializer::{JsonSerializer, Serializer};
pub use store::{CacheStore, ExtendedStore};

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;

#[cfg(feature = "msgpack")]
pub use serializer::MsgPackSerializer;

#[cfg(feature = "tracing")]
pub use tracing_metrics::TracingMetrics;
