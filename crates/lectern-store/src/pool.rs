//! Shared in-memory tables.
//!
//! Every repository holds an `Arc<MemoryPool>` the way a database repository
//! holds a connection pool. Each table sits behind its own `RwLock`; a write
//! touching several tables takes their locks in declaration order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use lectern_core::{
    AnalysisResult, ClassificationKind, ClassificationNode, Client, ClientId, Document,
    DocumentAssociation, GroupId, RecordId, ScopeDirectory, UserId,
};

/// Backing tables for all repositories.
#[derive(Default)]
pub struct MemoryPool {
    pub(crate) clients: RwLock<HashMap<ClientId, Client>>,
    pub(crate) memberships: RwLock<HashMap<UserId, Vec<GroupId>>>,
    pub(crate) documents: RwLock<HashMap<RecordId, Document>>,
    pub(crate) associations: RwLock<HashMap<RecordId, DocumentAssociation>>,
    pub(crate) tags: RwLock<HashMap<RecordId, ClassificationNode>>,
    pub(crate) categories: RwLock<HashMap<RecordId, ClassificationNode>>,
    pub(crate) results: RwLock<HashMap<RecordId, AnalysisResult>>,
    sequence: AtomicI64,
}

impl MemoryPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Next record id. Ids are unique across all tables and start at 1.
    pub(crate) fn next_id(&self) -> RecordId {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn classification_table(
        &self,
        kind: ClassificationKind,
    ) -> &RwLock<HashMap<RecordId, ClassificationNode>> {
        match kind {
            ClassificationKind::Tag => &self.tags,
            ClassificationKind::Category => &self.categories,
        }
    }

    /// Point-in-time copy of tenant and group data for predicate evaluation.
    pub(crate) async fn directory(&self) -> DirectorySnapshot {
        let system_clients = self
            .clients
            .read()
            .await
            .values()
            .filter(|c| c.is_system)
            .map(|c| c.id)
            .collect();
        let memberships = self.memberships.read().await.clone();
        DirectorySnapshot {
            system_clients,
            memberships,
        }
    }
}

/// Snapshot answering [`ScopeDirectory`] questions without holding locks.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    system_clients: Vec<ClientId>,
    memberships: HashMap<UserId, Vec<GroupId>>,
}

impl ScopeDirectory for DirectorySnapshot {
    fn is_system_client(&self, client: ClientId) -> bool {
        self.system_clients.contains(&client)
    }

    fn groups_of(&self, user: UserId) -> Vec<GroupId> {
        self.memberships.get(&user).cloned().unwrap_or_default()
    }
}
