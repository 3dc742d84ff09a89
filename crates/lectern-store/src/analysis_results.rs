//! Analysis result repository.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use lectern_core::{
    AnalysisResult, AnalysisResultRepository, AuditFields, CreateAnalysisResultRequest, Error,
    RecordId, Result, ScopePredicate,
};

use crate::pool::MemoryPool;

/// In-memory implementation of AnalysisResultRepository.
#[derive(Clone)]
pub struct MemoryAnalysisResultRepository {
    pool: Arc<MemoryPool>,
}

impl MemoryAnalysisResultRepository {
    pub fn new(pool: Arc<MemoryPool>) -> Self {
        Self { pool }
    }

    /// `"{from_document.name}:{to_document.name}"` for an association.
    async fn association_name(&self, association_id: RecordId) -> Result<String> {
        let (from, to) = {
            let associations = self.pool.associations.read().await;
            let association = associations
                .get(&association_id)
                .ok_or(Error::AssociationNotFound(association_id))?;
            (association.from_document_id, association.to_document_id)
        };
        let documents = self.pool.documents.read().await;
        let from_name = &documents
            .get(&from)
            .ok_or(Error::DocumentNotFound(from))?
            .name;
        let to_name = &documents.get(&to).ok_or(Error::DocumentNotFound(to))?.name;
        Ok(format!("{}:{}", from_name, to_name))
    }
}

#[async_trait]
impl AnalysisResultRepository for MemoryAnalysisResultRepository {
    async fn insert(&self, req: CreateAnalysisResultRequest) -> Result<AnalysisResult> {
        let name = match (req.name, req.documents) {
            (Some(name), _) => Some(name),
            (None, Some(association_id)) => Some(self.association_name(association_id).await?),
            (None, None) => None,
        };

        let result = AnalysisResult {
            id: self.pool.next_id(),
            input: req.input,
            output: req.output,
            name,
            description: req.description,
            documents: req.documents,
            client_id: req.client_id,
            audit: AuditFields::new(req.user_id, req.site),
        };
        info!(
            result_id = result.id,
            client_id = result.client_id,
            resource_id = ?result.documents,
            "Saved analysis result"
        );
        self.pool
            .results
            .write()
            .await
            .insert(result.id, result.clone());
        Ok(result)
    }

    async fn get(&self, id: RecordId) -> Result<Option<AnalysisResult>> {
        Ok(self.pool.results.read().await.get(&id).cloned())
    }

    async fn list(&self, scope: &ScopePredicate) -> Result<Vec<AnalysisResult>> {
        let directory = self.pool.directory().await;
        let mut results: Vec<AnalysisResult> = self
            .pool
            .results
            .read()
            .await
            .values()
            .filter(|r| scope.matches(*r, &directory))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.audit.update_time.cmp(&a.audit.update_time).then(b.id.cmp(&a.id)));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(name: Option<&str>, documents: Option<RecordId>) -> CreateAnalysisResultRequest {
        CreateAnalysisResultRequest {
            input: json!({"text_reference": "a", "text_auxiliary": "b"}),
            output: json!({"best_span_str": "a"}),
            name: name.map(String::from),
            description: None,
            documents,
            client_id: 1,
            user_id: 1,
            site: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = MemoryAnalysisResultRepository::new(MemoryPool::new());
        let saved = repo.insert(request(Some("run"), None)).await.unwrap();

        let loaded = repo.get(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.name.as_deref(), Some("run"));
        assert_eq!(loaded.output["best_span_str"], "a");
        assert_eq!(loaded.audit.version, 1);
    }

    #[tokio::test]
    async fn test_unnamed_without_association_stays_unnamed() {
        let repo = MemoryAnalysisResultRepository::new(MemoryPool::new());
        let saved = repo.insert(request(None, None)).await.unwrap();
        assert!(saved.name.is_none());
    }

    #[tokio::test]
    async fn test_unknown_association_rejected() {
        let repo = MemoryAnalysisResultRepository::new(MemoryPool::new());
        let err = repo.insert(request(None, Some(42))).await.unwrap_err();
        assert!(matches!(err, Error::AssociationNotFound(42)));
    }
}
