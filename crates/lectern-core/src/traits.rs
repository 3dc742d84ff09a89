//! Core traits for lectern abstractions.
//!
//! These traits define the interfaces that storage backends and analysis
//! models must satisfy, keeping the pipeline pluggable and testable.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::access::ScopePredicate;
use crate::classification::{ClassificationKind, ClassificationNode, CreateClassificationRequest};
use crate::error::Result;
use crate::models::*;

// =============================================================================
// STORAGE TRAITS
// =============================================================================

/// Read access to documents and their pairwise associations.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fetch a document. Fails with `DocumentNotFound` when absent.
    async fn get_document(&self, id: RecordId) -> Result<Document>;

    /// Fetch an association. Fails with `AssociationNotFound` when absent.
    async fn get_association(&self, id: RecordId) -> Result<DocumentAssociation>;

    /// List associations visible under `scope`.
    async fn list_associations(&self, scope: &ScopePredicate) -> Result<Vec<DocumentAssociation>>;
}

/// Repository for persisted analysis outputs.
#[async_trait]
pub trait AnalysisResultRepository: Send + Sync {
    /// Insert a new result. The write is atomic.
    async fn insert(&self, req: CreateAnalysisResultRequest) -> Result<AnalysisResult>;

    /// Fetch a result by id.
    async fn get(&self, id: RecordId) -> Result<Option<AnalysisResult>>;

    /// List results visible under `scope`, most recently updated first.
    async fn list(&self, scope: &ScopePredicate) -> Result<Vec<AnalysisResult>>;
}

/// Repository for tags and categories.
#[async_trait]
pub trait ClassificationRepository: Send + Sync {
    /// Create a node after validating its lineage.
    async fn create(&self, req: CreateClassificationRequest) -> Result<ClassificationNode>;

    /// Fetch a node by id.
    async fn get(&self, kind: ClassificationKind, id: RecordId)
        -> Result<Option<ClassificationNode>>;

    /// Re-parent a node after validating its new lineage.
    async fn set_parent(
        &self,
        kind: ClassificationKind,
        id: RecordId,
        parent_id: Option<RecordId>,
        user: UserId,
    ) -> Result<ClassificationNode>;

    /// Delete a node. Its children lose their parent; they are not deleted,
    /// and their update is credited to `user`.
    async fn delete(&self, kind: ClassificationKind, id: RecordId, user: UserId) -> Result<()>;

    /// List nodes visible under `scope`, most recently updated first.
    async fn list(
        &self,
        kind: ClassificationKind,
        scope: &ScopePredicate,
    ) -> Result<Vec<ClassificationNode>>;
}

/// Tenant lookups.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn get_client(&self, id: ClientId) -> Result<Option<Client>>;

    /// Fetch the given tenants; unknown ids are skipped.
    async fn get_clients(&self, ids: &[ClientId]) -> Result<Vec<Client>>;
}

// =============================================================================
// MODEL TRAITS
// =============================================================================

/// An analyzable model resolved from the registry.
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    /// Convert the resolved text pair into the model's native input.
    fn convert_input(&self, input: &ResolvedInput) -> Result<JsonValue>;

    /// Run the model. Output must be JSON serializable.
    async fn analyze(&self, input: JsonValue, params: &JsonValue) -> Result<JsonValue>;
}

/// Process wide runtime the models run on (weights, vocabularies, devices).
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Start the runtime from its configuration file.
    async fn initialize(&self, config_path: &Path) -> Result<()>;
}
