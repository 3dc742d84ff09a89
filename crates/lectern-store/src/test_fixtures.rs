//! Test fixtures for store and service tests.
//!
//! Provides a seeded [`MemoryStore`] with one system tenant and two real
//! tenants, plus builders for common records.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lectern_store::test_fixtures::{seeded_store, document_pair, ACME_CLIENT};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let store = seeded_store().await;
//!     let association = document_pair(&store, ACME_CLIENT, 10, "passage", "question").await;
//!     // Run your tests...
//! }
//! ```

use lectern_core::{
    AssociationPurpose, Client, ClientId, CreateAssociationRequest, CreateDocumentRequest,
    DocumentAssociation, DocumentType, UserId,
};

use crate::MemoryStore;

pub const SYSTEM_CLIENT: ClientId = 1;
pub const ACME_CLIENT: ClientId = 2;
pub const GLOBEX_CLIENT: ClientId = 3;

/// Site used for every fixture record.
pub const TEST_SITE: i64 = 1;

pub fn client(id: ClientId, name: &str, is_system: bool) -> Client {
    Client {
        id,
        client_id: name.to_lowercase(),
        name: name.to_string(),
        is_system,
    }
}

/// Store with the `System`, `Acme` and `Globex` tenants registered.
pub async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    for c in [
        client(SYSTEM_CLIENT, "System", true),
        client(ACME_CLIENT, "Acme", false),
        client(GLOBEX_CLIENT, "Globex", false),
    ] {
        if let Err(e) = store.clients.insert(c).await {
            panic!("Failed to seed client: {}", e);
        }
    }
    store
}

/// Store a reference/auxiliary document pair and link them with a
/// question association owned by `client` and `user`.
pub async fn document_pair(
    store: &MemoryStore,
    client: ClientId,
    user: UserId,
    reference_text: &str,
    auxiliary_text: &str,
) -> DocumentAssociation {
    let reference = store
        .documents
        .insert_document(
            CreateDocumentRequest::inline("ref_doc", client, reference_text)
                .with_type(DocumentType::Reference)
                .by_user(user, TEST_SITE),
        )
        .await
        .unwrap_or_else(|e| panic!("Failed to insert reference document: {}", e));
    let auxiliary = store
        .documents
        .insert_document(
            CreateDocumentRequest::inline("aux_doc", client, auxiliary_text)
                .with_type(DocumentType::Auxiliary)
                .by_user(user, TEST_SITE),
        )
        .await
        .unwrap_or_else(|e| panic!("Failed to insert auxiliary document: {}", e));

    store
        .documents
        .insert_association(CreateAssociationRequest {
            from_document_id: reference.id,
            to_document_id: auxiliary.id,
            client_id: client,
            purpose: AssociationPurpose::Question,
            user_id: user,
            site: TEST_SITE,
        })
        .await
        .unwrap_or_else(|e| panic!("Failed to insert association: {}", e))
}
