//! Core types for cache operations

mod expire;

pub use expire::ExpireCommand;
