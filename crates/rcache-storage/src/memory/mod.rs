//! In-memory store implementation

mod store;

pub use store::{MemoryStore, MIN_PURGE_PERIOD};
