//! Result cache
//!
//! A pure memoization layer in front of the database: results are read
//! before execution and written after a successful, non-null execution.
//! There is no invalidation; entries live until the store evicts them.

mod key;
mod memory;

pub use key::cache_key;
pub use memory::{CacheStats, MemoryCache};

use serde_json::Value;

/// Object cache collaborator. Reads and writes are best effort.
pub trait CacheStore {
    /// Look up `key` within `group`
    fn get(&self, key: &str, group: &str) -> Option<Value>;

    /// Store `value` under `key` within `group`
    fn set(&self, key: &str, value: Value, group: &str);
}
