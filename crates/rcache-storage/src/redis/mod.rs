//! Redis client implementation

mod client;
mod config;

pub use client::RedisClient;
pub use config::RedisConfig;
