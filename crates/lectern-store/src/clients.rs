//! Tenant and group membership repository.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use lectern_core::{Client, ClientId, ClientRepository, Error, GroupId, Result, UserId};

use crate::pool::MemoryPool;

/// In-memory implementation of ClientRepository.
#[derive(Clone)]
pub struct MemoryClientRepository {
    pool: Arc<MemoryPool>,
}

impl MemoryClientRepository {
    pub fn new(pool: Arc<MemoryPool>) -> Self {
        Self { pool }
    }

    /// Register a tenant. Ids must be unique.
    pub async fn insert(&self, client: Client) -> Result<()> {
        let mut clients = self.pool.clients.write().await;
        if clients.contains_key(&client.id) {
            return Err(Error::InvalidInput(format!(
                "Client {} already exists",
                client.id
            )));
        }
        debug!(client_id = client.id, is_system = client.is_system, "Registered client");
        clients.insert(client.id, client);
        Ok(())
    }

    /// Add `user` to `group`. Adding an existing membership is a no-op.
    pub async fn add_member(&self, user: UserId, group: GroupId) {
        let mut memberships = self.pool.memberships.write().await;
        let groups = memberships.entry(user).or_default();
        if !groups.contains(&group) {
            groups.push(group);
        }
    }

    /// Groups `user` belongs to.
    pub async fn groups_of(&self, user: UserId) -> Vec<GroupId> {
        self.pool
            .memberships
            .read()
            .await
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ClientRepository for MemoryClientRepository {
    async fn get_client(&self, id: ClientId) -> Result<Option<Client>> {
        Ok(self.pool.clients.read().await.get(&id).cloned())
    }

    async fn get_clients(&self, ids: &[ClientId]) -> Result<Vec<Client>> {
        let clients = self.pool.clients.read().await;
        Ok(ids.iter().filter_map(|id| clients.get(id).cloned()).collect())
    }
}
