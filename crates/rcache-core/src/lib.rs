//! rcache-core: Core traits and types for the rcache library
//!
//! This crate holds the pieces every other rcache crate builds on: the
//! error type, the value encoder, the [`StoreClient`] seam that store
//! implementations satisfy, and the [`CacheStore`] / [`ExtendedStore`]
//! capability sets exposed to callers.

mod encode;
mod error;
mod traits;
mod types;

pub use encode::{decode, Encode, Structured};
pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
