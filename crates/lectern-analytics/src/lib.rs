//! # lectern-analytics
//!
//! Text analytics request pipeline for lectern.
//!
//! This crate provides:
//! - [`TextAnalyticsService`]: validation, caching, model invocation and
//!   permission gated persistence of analysis outputs
//! - [`ResultsCache`]: TTL bounded LRU cache keyed by `{actor}:{analysis_name}`
//! - [`ModelRegistry`]: `(family, name)` to model lookup
//! - [`InputResolver`]: loads text pairs from stored document associations
//! - [`AnalyticsConfig`]: environment driven settings
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lectern_analytics::{AnalyticsConfig, ModelRegistry, TextAnalyticsService};
//!
//! let config = AnalyticsConfig::from_env();
//! let registry = ModelRegistry::new().with_model(descriptor, Arc::new(my_model));
//! let service = TextAnalyticsService::new(&config, Arc::new(registry), runtime, repos);
//! let outcome = service.analyze(&ctx, request).await?;
//! ```

pub mod cache;
pub mod config;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod service;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use cache::ResultsCache;
pub use config::AnalyticsConfig;
pub use registry::ModelRegistry;
pub use resolver::InputResolver;
pub use runtime::RuntimeInitializer;
pub use service::{
    AnalysisOutcome, PersistenceStatus, Repositories, RequestContext, TextAnalyticsService,
};

// Re-export core types
pub use lectern_core::*;
