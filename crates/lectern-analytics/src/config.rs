//! Environment driven configuration for the analytics service.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use lectern_core::defaults::{
    CACHE_MAX_SIZE, CACHE_TTL_SECS, ENV_CACHE_MAX_SIZE, ENV_CACHE_TTL_SECS,
    ENV_RUNTIME_CONFIG_PATH, RUNTIME_CONFIG_PATH,
};
use lectern_core::env::{env_or, parse_env};

/// Settings for the results cache and the model runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Lifetime of a cache entry, from insertion.
    pub cache_ttl: Duration,
    /// Maximum number of cache entries.
    pub cache_max_size: NonZeroUsize,
    /// File handed to the model runtime on first initialization.
    pub runtime_config_path: PathBuf,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            cache_max_size: default_max_size(),
            runtime_config_path: PathBuf::from(RUNTIME_CONFIG_PATH),
        }
    }
}

impl AnalyticsConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `ANALYTICS_CACHE_TTL_SECS` (default: 600)
    /// - `ANALYTICS_CACHE_MAX_SIZE` (default: 1024, zero falls back to default)
    /// - `ANALYTICS_RUNTIME_CONFIG_PATH` (default: config/analytics_runtime.json)
    ///
    /// The classification depth limit is read by the store, see
    /// `lectern_store::MemoryStore::from_env`.
    pub fn from_env() -> Self {
        let cache_ttl_secs: u64 = env_or(ENV_CACHE_TTL_SECS, CACHE_TTL_SECS);

        let cache_max_size = match parse_env::<usize>(ENV_CACHE_MAX_SIZE) {
            Some(size) => NonZeroUsize::new(size).unwrap_or_else(|| {
                warn!(
                    "{} must be positive, using default {}",
                    ENV_CACHE_MAX_SIZE, CACHE_MAX_SIZE
                );
                default_max_size()
            }),
            None => default_max_size(),
        };

        let runtime_config_path = std::env::var(ENV_RUNTIME_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(RUNTIME_CONFIG_PATH));

        let config = Self {
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_max_size,
            runtime_config_path,
        };
        info!(
            cache_ttl_secs,
            cache_max_size = config.cache_max_size.get(),
            runtime_config = %config.runtime_config_path.display(),
            "Analytics configuration loaded"
        );
        config
    }

    pub fn with_cache(mut self, ttl: Duration, max_size: NonZeroUsize) -> Self {
        self.cache_ttl = ttl;
        self.cache_max_size = max_size;
        self
    }
}

fn default_max_size() -> NonZeroUsize {
    NonZeroUsize::new(CACHE_MAX_SIZE).unwrap_or(NonZeroUsize::MIN)
}
