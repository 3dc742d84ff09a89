//! # lectern-store
//!
//! In-memory storage layer for lectern.
//!
//! This crate provides:
//! - Repository implementations for documents, associations, tags,
//!   categories and analysis results
//! - Tenant and group membership lookups
//! - Access scope evaluation on every list query
//! - Lineage validation on every classification write
//!
//! ## Example
//!
//! ```rust,ignore
//! use lectern_store::{MemoryStore, ClassificationRepository, CreateClassificationRequest};
//! use lectern_core::ClassificationKind;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     let tag = store
//!         .classifications
//!         .create(CreateClassificationRequest::new(ClassificationKind::Tag, "legal", 1))
//!         .await?;
//!     println!("Created tag: {}", tag.id);
//!     Ok(())
//! }
//! ```

pub mod analysis_results;
pub mod classifications;
pub mod clients;
pub mod documents;
pub mod pool;

// Test fixtures for integration tests
pub mod test_fixtures;

use std::sync::Arc;

use lectern_core::defaults::CLASSIFICATION_MAX_DEPTH;
use tracing::info;

pub use analysis_results::MemoryAnalysisResultRepository;
pub use classifications::MemoryClassificationRepository;
pub use clients::MemoryClientRepository;
pub use documents::MemoryDocumentRepository;
pub use pool::{DirectorySnapshot, MemoryPool};

// Re-export core types
pub use lectern_core::*;

/// All repositories over one shared pool.
pub struct MemoryStore {
    /// The shared tables.
    pub pool: Arc<MemoryPool>,
    /// Tenants and group memberships.
    pub clients: MemoryClientRepository,
    /// Documents and document associations.
    pub documents: MemoryDocumentRepository,
    /// Tags and categories.
    pub classifications: MemoryClassificationRepository,
    /// Persisted analysis outputs.
    pub results: MemoryAnalysisResultRepository,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_depth(CLASSIFICATION_MAX_DEPTH)
    }

    /// Store whose classification depth limit comes from
    /// `CLASSIFICATION_MAX_DEPTH` (invalid values fall back to the default).
    pub fn from_env() -> Self {
        let max_depth = lectern_core::env::classification_max_depth();
        info!(max_depth, "Classification depth limit loaded");
        Self::with_max_depth(max_depth)
    }

    /// Store whose classification writes allow at most `max_depth` ancestors.
    pub fn with_max_depth(max_depth: usize) -> Self {
        let pool = MemoryPool::new();
        Self {
            clients: MemoryClientRepository::new(pool.clone()),
            documents: MemoryDocumentRepository::new(pool.clone()),
            classifications: MemoryClassificationRepository::with_max_depth(
                pool.clone(),
                max_depth,
            ),
            results: MemoryAnalysisResultRepository::new(pool.clone()),
            pool,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
