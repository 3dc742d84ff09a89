//! Centralized default constants for lectern.
//!
//! Crates reference these constants instead of defining their own magic
//! numbers. Environment overrides are parsed with [`crate::env`].

// =============================================================================
// RESULTS CACHE
// =============================================================================

/// Time-to-live for a cached analysis output, measured from insertion.
pub const CACHE_TTL_SECS: u64 = 600;

/// Maximum number of cached analysis outputs.
pub const CACHE_MAX_SIZE: usize = 1024;

// =============================================================================
// MODEL RUNTIME
// =============================================================================

/// Runtime configuration file handed to the model runtime on first use.
pub const RUNTIME_CONFIG_PATH: &str = "config/analytics_runtime.json";

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Maximum ancestor hops allowed when validating a tag/category lineage.
pub const CLASSIFICATION_MAX_DEPTH: usize = 10;

/// Separator used when rendering a classification path.
pub const CLASSIFICATION_PATH_SEPARATOR: &str = " -> ";

// =============================================================================
// PERMISSIONS
// =============================================================================

/// Permission required to persist an analysis result.
pub const PERM_ADD_ANALYSIS_RESULTS: &str = "analytics.add_analysisresults";

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_CACHE_TTL_SECS: &str = "ANALYTICS_CACHE_TTL_SECS";
pub const ENV_CACHE_MAX_SIZE: &str = "ANALYTICS_CACHE_MAX_SIZE";
pub const ENV_RUNTIME_CONFIG_PATH: &str = "ANALYTICS_RUNTIME_CONFIG_PATH";
pub const ENV_CLASSIFICATION_MAX_DEPTH: &str = "CLASSIFICATION_MAX_DEPTH";
