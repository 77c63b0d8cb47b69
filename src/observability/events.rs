//! Observable events for aggregate queries
//!
//! Events are explicit and typed. They are emitted only in debug mode.

use std::fmt;

use super::logger::Severity;

/// Observable events in the aggregate query lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Table schema described
    SchemaLoaded,
    /// Request rejected before any SQL was built
    QueryRejected,
    /// Statement assembled
    QueryBuilt,
    /// Cached result returned
    CacheHit,
    /// No cached result
    CacheMiss,
    /// Cached entry could not be decoded and was ignored
    CacheDecodeFailed,
    /// Result stored in the cache
    CacheStored,
    /// Statement executed successfully
    QueryExecuted,
    /// Database reported an error
    QueryFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaLoaded => "AGG_SCHEMA_LOADED",
            Event::QueryRejected => "AGG_QUERY_REJECTED",
            Event::QueryBuilt => "AGG_QUERY_BUILT",
            Event::CacheHit => "AGG_CACHE_HIT",
            Event::CacheMiss => "AGG_CACHE_MISS",
            Event::CacheDecodeFailed => "AGG_CACHE_DECODE_FAILED",
            Event::CacheStored => "AGG_CACHE_STORED",
            Event::QueryExecuted => "AGG_QUERY_COMPLETE",
            Event::QueryFailed => "AGG_QUERY_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryFailed => Severity::Error,
            Event::QueryRejected | Event::CacheDecodeFailed => Severity::Warn,
            _ => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
