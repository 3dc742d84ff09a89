//! Parent/children tree reconstruction for tag and category navigation.
//!
//! The input is a flat, already access-filtered collection of
//! [`ClassificationNode`]s. The output groups root trees first by the owning
//! tenant's display name, then by classification target.
//!
//! A node whose parent was filtered out is not promoted to a root: only nodes
//! whose own record has no parent start a tree, so such a node is simply
//! never rendered.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::classification::{ClassificationNode, ClassificationTarget};
use crate::models::{Client, ClientId, RecordId};

/// One rendered node: its name and its rendered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub name: String,
    pub children: Vec<HierarchyEntry>,
}

/// Root trees of one tenant, keyed by target.
pub type TargetGroups = BTreeMap<ClassificationTarget, Vec<HierarchyEntry>>;

/// Tenant display name to the target groups of every tenant carrying that
/// name (normally exactly one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchyView(pub BTreeMap<String, Vec<TargetGroups>>);

impl HierarchyView {
    /// Root trees for a tenant name and target, across same-named tenants.
    pub fn roots(&self, tenant: &str, target: ClassificationTarget) -> Vec<&HierarchyEntry> {
        self.0
            .get(tenant)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(|g| g.get(&target))
                    .flatten()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn tenants(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Builds a [`HierarchyView`] from a flat node collection.
pub struct HierarchyBuilder {
    client_names: HashMap<ClientId, String>,
}

impl HierarchyBuilder {
    /// `clients` supplies display names for the owning tenants.
    pub fn new<'a>(clients: impl IntoIterator<Item = &'a Client>) -> Self {
        Self {
            client_names: clients
                .into_iter()
                .map(|c| (c.id, c.name.clone()))
                .collect(),
        }
    }

    pub fn build(&self, nodes: &[ClassificationNode]) -> HierarchyView {
        // Children of each parent id, as indices into `nodes`, in input order.
        let mut children: HashMap<RecordId, Vec<usize>> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            match node.parent_id {
                Some(parent) => children.entry(parent).or_default().push(idx),
                None => {
                    children.entry(node.id).or_default();
                }
            }
        }

        let roots: Vec<usize> = (0..nodes.len()).filter(|&i| nodes[i].is_root()).collect();

        let mut tenants: Vec<ClientId> = Vec::new();
        for &idx in &roots {
            let client = nodes[idx].client_id;
            if !tenants.contains(&client) {
                tenants.push(client);
            }
        }

        debug!(
            node_count = nodes.len(),
            root_count = roots.len(),
            tenant_count = tenants.len(),
            "Building classification hierarchy"
        );

        let mut view = HierarchyView::default();
        for client in tenants {
            let mut groups = TargetGroups::new();
            for &idx in roots.iter().filter(|&&i| nodes[i].client_id == client) {
                let entry = self.render(nodes, &children, idx, 0);
                groups.entry(nodes[idx].target).or_default().push(entry);
            }
            view.0
                .entry(self.client_name(client))
                .or_default()
                .push(groups);
        }
        view
    }

    fn render(
        &self,
        nodes: &[ClassificationNode],
        children: &HashMap<RecordId, Vec<usize>>,
        idx: usize,
        depth: usize,
    ) -> HierarchyEntry {
        let node = &nodes[idx];
        trace!(node_id = node.id, depth, "Rendering hierarchy node");

        // A tree can never be deeper than the collection is long; stopping
        // there keeps malformed input (duplicate ids) from recursing forever.
        let rendered = if depth < nodes.len() {
            children
                .get(&node.id)
                .map(|kids| {
                    kids.iter()
                        .map(|&child| self.render(nodes, children, child, depth + 1))
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        HierarchyEntry {
            name: node.name.clone(),
            children: rendered,
        }
    }

    fn client_name(&self, client: ClientId) -> String {
        self.client_names
            .get(&client)
            .cloned()
            .unwrap_or_else(|| client.to_string())
    }
}
