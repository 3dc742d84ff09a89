//! Structured logging field name constants for lectern.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, request continues (e.g. save denied) |
//! | INFO  | Lifecycle events (runtime init, model registration, saved results) |
//! | DEBUG | Decision points (cache hit/miss, eviction, input shape) |
//! | TRACE | Per-item iteration (hierarchy nodes, lineage hops) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "analytics", "store", "classification"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "results_cache", "input_resolver", "model_registry"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "analyze", "resolve", "build_hierarchy"
pub const OPERATION: &str = "op";

/// Username of the acting user.
pub const ACTOR: &str = "actor";

/// Owning tenant id.
pub const CLIENT_ID: &str = "client_id";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Results cache key (`{actor}:{analysis_name}`).
pub const CACHE_KEY: &str = "cache_key";

/// Model family from the request descriptor.
pub const MODEL_FAMILY: &str = "model_family";

/// Model name from the request descriptor.
pub const MODEL_NAME: &str = "model_name";

/// Document association id supplied as model input.
pub const RESOURCE_ID: &str = "resource_id";

/// Persisted analysis result id.
pub const RESULT_ID: &str = "result_id";

/// Classification node id.
pub const NODE_ID: &str = "node_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records returned or processed.
pub const RESULT_COUNT: &str = "result_count";

/// Number of entries held by a cache.
pub const CACHE_SIZE: &str = "cache_size";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
