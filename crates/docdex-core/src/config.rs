//! Resolver configuration

use docdex_cache::CacheConfig;
use docdex_symbol::MergeConfig;
use std::time::Duration;

/// Configuration for [`DocResolver`](crate::DocResolver).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Collision policy for inventory merging.
    pub merge: MergeConfig,
    /// Parse cache tunables.
    pub cache: CacheConfig,
    /// Retry delay after a package's first inventory-fetch failure.
    pub retry_initial: Duration,
    /// Retry delay once a package has already failed this cycle.
    pub retry_repeat: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            merge: MergeConfig::default(),
            cache: CacheConfig::default(),
            retry_initial: Duration::from_secs(2 * 60),
            retry_repeat: Duration::from_secs(5 * 60),
        }
    }
}

impl ResolverConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the merge collision policy.
    #[must_use]
    pub fn with_merge(mut self, merge: MergeConfig) -> Self {
        self.merge = merge;
        self
    }

    /// Override the parse cache tunables.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Override both retry delays.
    #[must_use]
    pub fn with_retry_delays(mut self, initial: Duration, repeat: Duration) -> Self {
        self.retry_initial = initial;
        self.retry_repeat = repeat;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backoff_matches_policy() {
        let config = ResolverConfig::new();
        assert_eq!(config.retry_initial, Duration::from_secs(120));
        assert_eq!(config.retry_repeat, Duration::from_secs(300));
    }

    #[test]
    fn builders_override_fields() {
        let config = ResolverConfig::new()
            .with_retry_delays(Duration::from_secs(1), Duration::from_secs(2))
            .with_merge(MergeConfig::default().with_priority_packages(["rust"]));
        assert_eq!(config.retry_initial, Duration::from_secs(1));
        assert!(config.merge.priority_packages.contains("rust"));
    }
}
