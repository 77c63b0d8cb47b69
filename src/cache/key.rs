//! Cache key derivation
//!
//! Keys are `{group}_{sha256(normalized spec)}`. The digest covers the
//! canonical JSON text, so identical requests map to the same key in every
//! process.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Derive the cache key for a normalized request.
pub fn cache_key(group: &str, normalized: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.to_string().as_bytes());
    format!("{}_{:x}", group, hasher.finalize())
}
