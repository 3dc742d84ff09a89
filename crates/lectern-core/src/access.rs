//! Tenant, ownership and group based visibility predicates.
//!
//! [`AccessScopeFilter`] turns an actor and its tenant into a
//! [`ScopePredicate`]. The predicate is plain data; storage backends evaluate
//! it with [`ScopePredicate::matches`] against a [`ScopeDirectory`] that
//! answers tenant and group membership questions.

use crate::models::{
    Actor, AnalysisResult, Client, ClientId, Document, DocumentAssociation, GroupId, UserId,
};

/// Record carrying tenant and effective-user ownership.
pub trait Scoped {
    fn owner_client(&self) -> ClientId;
    fn effective_user(&self) -> UserId;
}

/// Lookups needed to evaluate a predicate.
pub trait ScopeDirectory {
    fn is_system_client(&self, client: ClientId) -> bool;
    fn groups_of(&self, user: UserId) -> Vec<GroupId>;
}

/// Composable visibility predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopePredicate {
    /// No restriction.
    All,
    /// Record owned by this tenant.
    Client(ClientId),
    /// Record owned by any system tenant.
    SystemClient,
    /// Record's effective user is this user.
    EffectiveUser(UserId),
    /// Record's effective user belongs to one of these groups.
    EffectiveUserInGroups(Vec<GroupId>),
    And(Vec<ScopePredicate>),
    Or(Vec<ScopePredicate>),
}

impl ScopePredicate {
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, ScopePredicate::All)
    }

    pub fn matches<R, D>(&self, record: &R, directory: &D) -> bool
    where
        R: Scoped + ?Sized,
        D: ScopeDirectory + ?Sized,
    {
        match self {
            ScopePredicate::All => true,
            ScopePredicate::Client(id) => record.owner_client() == *id,
            ScopePredicate::SystemClient => directory.is_system_client(record.owner_client()),
            ScopePredicate::EffectiveUser(id) => record.effective_user() == *id,
            ScopePredicate::EffectiveUserInGroups(groups) => {
                if groups.is_empty() {
                    return false;
                }
                directory
                    .groups_of(record.effective_user())
                    .iter()
                    .any(|g| groups.contains(g))
            }
            ScopePredicate::And(parts) => parts.iter().all(|p| p.matches(record, directory)),
            ScopePredicate::Or(parts) => parts.iter().any(|p| p.matches(record, directory)),
        }
    }
}

/// Builds visibility predicates for an actor within its tenant.
pub struct AccessScopeFilter;

impl AccessScopeFilter {
    /// Predicate for tenant protected records (documents, associations,
    /// analysis results).
    ///
    /// `client` is `None` before the tenant has been attached to the request,
    /// in which case every record is visible.
    pub fn protected(actor: &Actor, client: Option<&Client>) -> ScopePredicate {
        let Some(client) = client else {
            return ScopePredicate::All;
        };
        let owner = ScopePredicate::EffectiveUser(actor.id);
        let tenant = ScopePredicate::Client(client.id);

        if client.is_system {
            ScopePredicate::And(vec![owner, tenant])
        } else {
            // Own records stay visible even when the actor is in no group.
            ScopePredicate::And(vec![
                ScopePredicate::Or(vec![
                    ScopePredicate::EffectiveUserInGroups(actor.group_ids.clone()),
                    owner,
                ]),
                tenant,
            ])
        }
    }

    /// Predicate for tags and categories.
    ///
    /// Real tenants see everything their tenant owns plus system owned
    /// classifications. System tenant users see their own classifications and
    /// those owned by the system tenant.
    pub fn classification(actor: &Actor, client: Option<&Client>) -> ScopePredicate {
        let Some(client) = client else {
            return ScopePredicate::All;
        };
        if client.is_system {
            ScopePredicate::Or(vec![
                ScopePredicate::EffectiveUser(actor.id),
                ScopePredicate::Client(client.id),
            ])
        } else {
            ScopePredicate::Or(vec![
                ScopePredicate::Client(client.id),
                ScopePredicate::SystemClient,
            ])
        }
    }
}

impl Scoped for Document {
    fn owner_client(&self) -> ClientId {
        self.client_id
    }

    fn effective_user(&self) -> UserId {
        self.audit.effective_user
    }
}

impl Scoped for DocumentAssociation {
    fn owner_client(&self) -> ClientId {
        self.client_id
    }

    fn effective_user(&self) -> UserId {
        self.audit.effective_user
    }
}

impl Scoped for AnalysisResult {
    fn owner_client(&self) -> ClientId {
        self.client_id
    }

    fn effective_user(&self) -> UserId {
        self.audit.effective_user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Rec {
        client: ClientId,
        user: UserId,
    }

    impl Scoped for Rec {
        fn owner_client(&self) -> ClientId {
            self.client
        }

        fn effective_user(&self) -> UserId {
            self.user
        }
    }

    struct Dir {
        system_clients: Vec<ClientId>,
        groups: HashMap<UserId, Vec<GroupId>>,
    }

    impl ScopeDirectory for Dir {
        fn is_system_client(&self, client: ClientId) -> bool {
            self.system_clients.contains(&client)
        }

        fn groups_of(&self, user: UserId) -> Vec<GroupId> {
            self.groups.get(&user).cloned().unwrap_or_default()
        }
    }

    const SYSTEM: ClientId = 1;
    const ACME: ClientId = 2;
    const GLOBEX: ClientId = 3;

    fn dir() -> Dir {
        let mut groups = HashMap::new();
        groups.insert(10, vec![100]);
        groups.insert(11, vec![100]);
        groups.insert(12, vec![200]);
        Dir {
            system_clients: vec![SYSTEM],
            groups,
        }
    }

    fn client(id: ClientId, is_system: bool) -> Client {
        Client {
            id,
            client_id: format!("c{}", id),
            name: format!("client {}", id),
            is_system,
        }
    }

    #[test]
    fn test_no_tenant_is_unrestricted() {
        let actor = Actor::new(10, "alice");
        assert!(AccessScopeFilter::protected(&actor, None).is_unrestricted());
        assert!(AccessScopeFilter::classification(&actor, None).is_unrestricted());
    }

    #[test]
    fn test_protected_real_tenant_includes_group_members() {
        let dir = dir();
        let actor = Actor::new(10, "alice").with_groups([100]);
        let scope = AccessScopeFilter::protected(&actor, Some(&client(ACME, false)));

        assert!(scope.matches(&Rec { client: ACME, user: 10 }, &dir));
        assert!(scope.matches(&Rec { client: ACME, user: 11 }, &dir));
        assert!(!scope.matches(&Rec { client: ACME, user: 12 }, &dir));
        assert!(!scope.matches(&Rec { client: GLOBEX, user: 11 }, &dir));
    }

    #[test]
    fn test_protected_real_tenant_without_groups_keeps_own_records() {
        let dir = dir();
        let actor = Actor::new(10, "alice");
        let scope = AccessScopeFilter::protected(&actor, Some(&client(ACME, false)));

        assert!(scope.matches(&Rec { client: ACME, user: 10 }, &dir));
        assert!(!scope.matches(&Rec { client: ACME, user: 11 }, &dir));
    }

    #[test]
    fn test_protected_system_tenant_is_owner_only() {
        let dir = dir();
        let actor = Actor::new(10, "alice").with_groups([100]);
        let scope = AccessScopeFilter::protected(&actor, Some(&client(SYSTEM, true)));

        assert!(scope.matches(&Rec { client: SYSTEM, user: 10 }, &dir));
        assert!(!scope.matches(&Rec { client: SYSTEM, user: 11 }, &dir));
        assert!(!scope.matches(&Rec { client: ACME, user: 10 }, &dir));
    }

    #[test]
    fn test_classification_real_tenant_sees_system_records() {
        let dir = dir();
        let actor = Actor::new(10, "alice");
        let scope = AccessScopeFilter::classification(&actor, Some(&client(ACME, false)));

        assert!(scope.matches(&Rec { client: ACME, user: 12 }, &dir));
        assert!(scope.matches(&Rec { client: SYSTEM, user: 99 }, &dir));
        assert!(!scope.matches(&Rec { client: GLOBEX, user: 10 }, &dir));
    }

    #[test]
    fn test_classification_system_tenant() {
        let dir = dir();
        let actor = Actor::new(10, "alice");
        let scope = AccessScopeFilter::classification(&actor, Some(&client(SYSTEM, true)));

        assert!(scope.matches(&Rec { client: SYSTEM, user: 99 }, &dir));
        assert!(scope.matches(&Rec { client: ACME, user: 10 }, &dir));
        assert!(!scope.matches(&Rec { client: GLOBEX, user: 12 }, &dir));
    }

    #[test]
    fn test_empty_group_list_matches_nothing() {
        let dir = dir();
        let scope = ScopePredicate::EffectiveUserInGroups(vec![]);
        assert!(!scope.matches(&Rec { client: ACME, user: 10 }, &dir));
    }
}
