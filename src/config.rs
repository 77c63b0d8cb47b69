//! Query configuration
//!
//! Process-level defaults for the fixed request options. A request that
//! names an option overrides the configured default for that request only.

/// Default cache group for stored results
pub const DEFAULT_CACHE_GROUP: &str = "aggregate_queries";

/// Defaults applied when a request leaves an option unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Whether results are memoized in the cache store.
    pub caching_enabled: bool,
    /// Cache group (namespace) for stored results.
    pub cache_group: String,
    /// Force debug mode for every request.
    pub debug: bool,
    /// Default opaque context tag handed to the extension hook.
    pub context: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            cache_group: DEFAULT_CACHE_GROUP.to_string(),
            debug: false,
            context: String::new(),
        }
    }
}

impl QueryConfig {
    /// Config with result caching disabled.
    pub fn uncached() -> Self {
        Self {
            caching_enabled: false,
            ..Self::default()
        }
    }

    /// Config with debug events on for every request.
    pub fn debug() -> Self {
        Self {
            debug: true,
            ..Self::default()
        }
    }

    /// Use a different cache group.
    pub fn with_cache_group(mut self, group: impl Into<String>) -> Self {
        self.cache_group = group.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert!(config.caching_enabled);
        assert_eq!(config.cache_group, "aggregate_queries");
        assert!(!config.debug);
        assert!(config.context.is_empty());
    }

    #[test]
    fn test_uncached() {
        assert!(!QueryConfig::uncached().caching_enabled);
    }

    #[test]
    fn test_with_cache_group() {
        let config = QueryConfig::debug().with_cache_group("reports");
        assert!(config.debug);
        assert_eq!(config.cache_group, "reports");
    }
}
