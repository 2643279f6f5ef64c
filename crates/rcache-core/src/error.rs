//! Error types for cache operations

use thiserror::Error;

/// Main error type for all cache operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key (or list index, hash field, set member) not present in the store
    #[error("key not found: {0}")]
    NotFound(String),

    /// Value could not be serialized for storage
    #[error("encode error: {0}")]
    Encode(String),

    /// Stored bytes do not parse into the requested type
    #[error("decode error: {0}")]
    Decode(String),

    /// Could not obtain a connection to the store
    #[error("connection error: {0}")]
    Connection(String),

    /// The store rejected or failed a command
    #[error("backend error: {0}")]
    Backend(String),

    /// Raw command the client does not know how to execute
    #[error("unsupported command: {0}")]
    Unsupported(String),

    /// Malformed arguments for a raw command
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CacheError {
    /// True for the "key absent" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }

    /// True for failures that come from talking to the store
    pub fn is_transport(&self) -> bool {
        matches!(self, CacheError::Connection(_) | CacheError::Backend(_))
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
