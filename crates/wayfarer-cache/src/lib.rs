// Fast key-value cache tier
// Small JSON documents that should survive restarts without touching the main store

pub mod cache;
pub mod error;

pub use cache::{CacheManager, CachedEntry};
pub use error::{CacheError, Result};
