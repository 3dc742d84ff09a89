//! Document and document association repository.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use lectern_core::{
    AuditFields, CreateAssociationRequest, CreateDocumentRequest, Document, DocumentAssociation,
    DocumentRepository, Error, RecordId, Result, ScopePredicate,
};

use crate::pool::MemoryPool;

/// In-memory implementation of DocumentRepository.
#[derive(Clone)]
pub struct MemoryDocumentRepository {
    pool: Arc<MemoryPool>,
}

impl MemoryDocumentRepository {
    pub fn new(pool: Arc<MemoryPool>) -> Self {
        Self { pool }
    }

    pub async fn insert_document(&self, req: CreateDocumentRequest) -> Result<Document> {
        if req.name.trim().is_empty() {
            return Err(Error::InvalidInput("Document name is required".to_string()));
        }
        let doc = Document {
            id: self.pool.next_id(),
            name: req.name,
            client_id: req.client_id,
            document_type: req.document_type,
            mime_type: req.mime_type,
            title: req.title,
            description: req.description,
            content: req.content,
            audit: AuditFields::new(req.user_id, req.site),
        };
        debug!(document_id = doc.id, client_id = doc.client_id, "Inserted document");
        self.pool.documents.write().await.insert(doc.id, doc.clone());
        Ok(doc)
    }

    /// Link two stored documents. At most one association exists per
    /// (from, to, purpose).
    pub async fn insert_association(
        &self,
        req: CreateAssociationRequest,
    ) -> Result<DocumentAssociation> {
        {
            let documents = self.pool.documents.read().await;
            for id in [req.from_document_id, req.to_document_id] {
                if !documents.contains_key(&id) {
                    return Err(Error::DocumentNotFound(id));
                }
            }
        }

        let mut associations = self.pool.associations.write().await;
        let duplicate = associations.values().any(|a| {
            a.from_document_id == req.from_document_id
                && a.to_document_id == req.to_document_id
                && a.purpose == req.purpose
        });
        if duplicate {
            return Err(Error::InvalidInput(format!(
                "Association {} -> {} with purpose {:?} already exists",
                req.from_document_id, req.to_document_id, req.purpose
            )));
        }

        let association = DocumentAssociation {
            id: self.pool.next_id(),
            from_document_id: req.from_document_id,
            to_document_id: req.to_document_id,
            client_id: req.client_id,
            purpose: req.purpose,
            audit: AuditFields::new(req.user_id, req.site),
        };
        info!(
            resource_id = association.id,
            from = association.from_document_id,
            to = association.to_document_id,
            "Created document association"
        );
        associations.insert(association.id, association.clone());
        Ok(association)
    }

    /// Documents visible under `scope`, most recently updated first.
    pub async fn list_documents(&self, scope: &ScopePredicate) -> Result<Vec<Document>> {
        let directory = self.pool.directory().await;
        let mut docs: Vec<Document> = self
            .pool
            .documents
            .read()
            .await
            .values()
            .filter(|d| scope.matches(*d, &directory))
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.audit.update_time.cmp(&a.audit.update_time).then(b.id.cmp(&a.id)));
        Ok(docs)
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn get_document(&self, id: RecordId) -> Result<Document> {
        self.pool
            .documents
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::DocumentNotFound(id))
    }

    async fn get_association(&self, id: RecordId) -> Result<DocumentAssociation> {
        self.pool
            .associations
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::AssociationNotFound(id))
    }

    async fn list_associations(&self, scope: &ScopePredicate) -> Result<Vec<DocumentAssociation>> {
        let directory = self.pool.directory().await;
        let mut associations: Vec<DocumentAssociation> = self
            .pool
            .associations
            .read()
            .await
            .values()
            .filter(|a| scope.matches(*a, &directory))
            .cloned()
            .collect();
        associations
            .sort_by(|a, b| b.audit.update_time.cmp(&a.audit.update_time).then(b.id.cmp(&a.id)));
        Ok(associations)
    }
}
