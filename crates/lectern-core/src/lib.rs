//! # lectern-core
//!
//! Core types, traits, and abstractions for the lectern document analytics
//! backend.
//!
//! This crate provides the data model shared by the storage and analytics
//! crates, the error taxonomy, tenant access predicates, classification
//! lineage validation and the tag/category hierarchy builder.

pub mod access;
pub mod classification;
pub mod defaults;
pub mod env;
pub mod error;
pub mod hierarchy;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use access::{AccessScopeFilter, ScopeDirectory, ScopePredicate, Scoped};
pub use classification::{
    validate_lineage, ClassificationDomain, ClassificationKind, ClassificationNode,
    ClassificationTarget, CreateClassificationRequest, LineageCandidate,
};
pub use error::{Error, ErrorKind, Result};
pub use hierarchy::{HierarchyBuilder, HierarchyEntry, HierarchyView, TargetGroups};
pub use models::*;
pub use traits::*;
