//! Tag and category repository.
//!
//! Both populations live in separate tables with identical rules. Every
//! write that sets a parent runs [`validate_lineage`] under the table's write
//! lock, so no concurrent write can slip a cycle in between check and save.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use lectern_core::defaults::CLASSIFICATION_MAX_DEPTH;
use lectern_core::{
    validate_lineage, AuditFields, ClassificationKind, ClassificationNode,
    ClassificationRepository, CreateClassificationRequest, Error, LineageCandidate, RecordId,
    Result, ScopePredicate, UserId,
};

use crate::pool::MemoryPool;

/// In-memory implementation of ClassificationRepository.
#[derive(Clone)]
pub struct MemoryClassificationRepository {
    pool: Arc<MemoryPool>,
    max_depth: usize,
}

impl MemoryClassificationRepository {
    pub fn new(pool: Arc<MemoryPool>) -> Self {
        Self::with_max_depth(pool, CLASSIFICATION_MAX_DEPTH)
    }

    pub fn with_max_depth(pool: Arc<MemoryPool>, max_depth: usize) -> Self {
        Self { pool, max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Render `"root -> ... -> name"` for a stored node.
    pub async fn path(&self, kind: ClassificationKind, id: RecordId) -> Result<String> {
        let table = self.pool.classification_table(kind).read().await;
        let node = table
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))?;
        Ok(node.path(|pid| table.get(&pid), self.max_depth))
    }
}

#[async_trait]
impl ClassificationRepository for MemoryClassificationRepository {
    async fn create(&self, req: CreateClassificationRequest) -> Result<ClassificationNode> {
        if req.name.trim().is_empty() {
            return Err(Error::InvalidInput(format!("{} name is required", req.kind)));
        }

        let mut table = self.pool.classification_table(req.kind).write().await;

        if table
            .values()
            .any(|n| n.client_id == req.client_id && n.name == req.name)
        {
            return Err(Error::InvalidInput(format!(
                "{} {} already exists for client {}",
                req.kind, req.name, req.client_id
            )));
        }

        let candidate = LineageCandidate {
            id: None,
            name: &req.name,
            parent_id: req.parent_id,
        };
        validate_lineage(candidate, |id| table.get(&id), self.max_depth)?;

        let node = ClassificationNode {
            id: self.pool.next_id(),
            kind: req.kind,
            name: req.name,
            description: req.description,
            parent_id: req.parent_id,
            target: req.target,
            domain: req.domain,
            client_id: req.client_id,
            audit: AuditFields::new(req.user_id, req.site),
        };
        info!(
            node_id = node.id,
            kind = %node.kind,
            parent_id = ?node.parent_id,
            client_id = node.client_id,
            "Created classification"
        );
        table.insert(node.id, node.clone());
        Ok(node)
    }

    async fn get(
        &self,
        kind: ClassificationKind,
        id: RecordId,
    ) -> Result<Option<ClassificationNode>> {
        Ok(self
            .pool
            .classification_table(kind)
            .read()
            .await
            .get(&id)
            .cloned())
    }

    async fn set_parent(
        &self,
        kind: ClassificationKind,
        id: RecordId,
        parent_id: Option<RecordId>,
        user: UserId,
    ) -> Result<ClassificationNode> {
        let mut table = self.pool.classification_table(kind).write().await;
        let name = table
            .get(&id)
            .map(|n| n.name.clone())
            .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))?;

        let candidate = LineageCandidate {
            id: Some(id),
            name: &name,
            parent_id,
        };
        validate_lineage(candidate, |pid| table.get(&pid), self.max_depth)?;

        let node = table
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))?;
        node.parent_id = parent_id;
        node.audit.touch(user);
        debug!(node_id = id, parent_id = ?parent_id, "Re-parented classification");
        Ok(node.clone())
    }

    async fn delete(&self, kind: ClassificationKind, id: RecordId, user: UserId) -> Result<()> {
        let mut table = self.pool.classification_table(kind).write().await;
        table
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))?;

        let mut orphaned = 0usize;
        for child in table.values_mut().filter(|n| n.parent_id == Some(id)) {
            child.parent_id = None;
            child.audit.touch(user);
            orphaned += 1;
        }
        info!(node_id = id, kind = %kind, orphaned, "Deleted classification");
        Ok(())
    }

    async fn list(
        &self,
        kind: ClassificationKind,
        scope: &ScopePredicate,
    ) -> Result<Vec<ClassificationNode>> {
        let directory = self.pool.directory().await;
        let mut nodes: Vec<ClassificationNode> = self
            .pool
            .classification_table(kind)
            .read()
            .await
            .values()
            .filter(|n| scope.matches(*n, &directory))
            .cloned()
            .collect();
        nodes.sort_by(|a, b| b.audit.update_time.cmp(&a.audit.update_time).then(b.id.cmp(&a.id)));
        Ok(nodes)
    }
}
