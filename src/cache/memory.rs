//! In-process cache store
//!
//! Entries are namespaced by group and never expire. Safe to share between
//! threads; concurrent identical misses may both compute and store, which
//! only repeats work.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::CacheStore;

/// Cache statistics (passive only).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of values stored.
    pub stores: u64,
}

/// Thread-safe map-backed [`CacheStore`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(String, String), Value>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(String, String), Value>> {
        // A panic while holding the lock cannot leave a half-written entry.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Number of stored entries across all groups.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop every entry in `group`.
    pub fn flush_group(&self, group: &str) {
        self.entries().retain(|(g, _), _| g != group);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str, group: &str) -> Option<Value> {
        let found = self
            .entries()
            .get(&(group.to_string(), key.to_string()))
            .cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    fn set(&self, key: &str, value: Value, group: &str) {
        self.entries()
            .insert((group.to_string(), key.to_string()), value);
        self.stores.fetch_add(1, Ordering::Relaxed);
    }
}
