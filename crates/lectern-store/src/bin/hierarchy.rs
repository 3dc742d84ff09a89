//! Lectern Hierarchy Viewer
//!
//! Load tenants and tags/categories from a seed file into an in-memory store,
//! then print the hierarchy one user would see as JSON.
//!
//! Usage:
//!   cargo run --bin lectern-hierarchy -- --seed seed.json --client 2 --user 10
//!   cargo run --bin lectern-hierarchy -- --seed seed.json --kind category --client 1 --user 10
//!
//! Seed file shape:
//!
//! ```json
//! {
//!   "clients": [{"id": 1, "client_id": "system", "name": "System", "is_system": true}],
//!   "memberships": [{"user": 10, "group": 100}],
//!   "classifications": [
//!     {"kind": "tag", "name": "legal", "client_id": 1, "user_id": 10},
//!     {"kind": "tag", "name": "contracts", "parent": "legal", "client_id": 1, "user_id": 10}
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use tracing::info;

use lectern_store::{
    AccessScopeFilter, Actor, ClassificationDomain, ClassificationKind, ClassificationRepository,
    ClassificationTarget, Client, ClientId, ClientRepository, CreateClassificationRequest,
    GroupId, HierarchyBuilder, MemoryStore, RecordId, UserId,
};

#[derive(Debug)]
struct Args {
    seed: PathBuf,
    kind: ClassificationKind,
    client: Option<ClientId>,
    user: UserId,
}

#[derive(Debug, Deserialize)]
struct Seed {
    clients: Vec<Client>,
    #[serde(default)]
    memberships: Vec<Membership>,
    #[serde(default)]
    classifications: Vec<SeedNode>,
}

#[derive(Debug, Deserialize)]
struct Membership {
    user: UserId,
    group: GroupId,
}

#[derive(Debug, Deserialize)]
struct SeedNode {
    kind: ClassificationKind,
    name: String,
    #[serde(default)]
    description: Option<String>,
    /// Name of an earlier node of the same kind and client.
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    target: ClassificationTarget,
    #[serde(default)]
    domain: ClassificationDomain,
    client_id: ClientId,
    #[serde(default)]
    user_id: UserId,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = env::args().collect();
    let mut seed = None;
    let mut kind = ClassificationKind::Tag;
    let mut client = None;
    let mut user = 0;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--seed" | "-s", Some(v)) => seed = Some(PathBuf::from(v)),
            ("--kind" | "-k", Some(v)) => {
                kind = match v.to_lowercase().as_str() {
                    "tag" => ClassificationKind::Tag,
                    "category" => ClassificationKind::Category,
                    other => bail!("Unknown kind: {}", other),
                }
            }
            ("--client" | "-c", Some(v)) => client = Some(v.parse().context("--client")?),
            ("--user" | "-u", Some(v)) => user = v.parse().context("--user")?,
            (flag, _) => bail!("Unexpected argument: {}", flag),
        }
        i += 2;
    }

    Ok(Args {
        seed: seed.ok_or_else(|| anyhow!("--seed is required"))?,
        kind,
        client,
        user,
    })
}

async fn load(store: &MemoryStore, seed: Seed) -> anyhow::Result<()> {
    for client in seed.clients {
        store.clients.insert(client).await?;
    }
    for m in seed.memberships {
        store.clients.add_member(m.user, m.group).await;
    }

    let mut ids: HashMap<(ClassificationKind, ClientId, String), RecordId> = HashMap::new();
    for node in seed.classifications {
        let mut req = CreateClassificationRequest::new(node.kind, node.name.clone(), node.client_id)
            .with_target(node.target)
            .by_user(node.user_id, 0);
        req.description = node.description;
        req.domain = node.domain;
        if let Some(parent) = node.parent {
            let parent_id = ids
                .get(&(node.kind, node.client_id, parent.clone()))
                .copied()
                .ok_or_else(|| anyhow!("Parent {} of {} not seeded yet", parent, node.name))?;
            req = req.with_parent(parent_id);
        }
        let created = store
            .classifications
            .create(req)
            .await
            .with_context(|| format!("Seeding {} {}", node.kind, node.name))?;
        ids.insert((node.kind, node.client_id, node.name), created.id);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lectern_store=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;

    let raw = std::fs::read_to_string(&args.seed)
        .with_context(|| format!("Reading {}", args.seed.display()))?;
    let seed: Seed = serde_json::from_str(&raw).context("Parsing seed file")?;

    let store = MemoryStore::from_env();
    load(&store, seed).await?;

    let client = match args.client {
        Some(id) => Some(
            store
                .clients
                .get_client(id)
                .await?
                .ok_or_else(|| anyhow!("Unknown client {}", id))?,
        ),
        None => None,
    };
    let actor = Actor::new(args.user, format!("user{}", args.user))
        .with_groups(store.clients.groups_of(args.user).await);

    let scope = AccessScopeFilter::classification(&actor, client.as_ref());
    let nodes = store.classifications.list(args.kind, &scope).await?;
    let mut owners: Vec<ClientId> = nodes.iter().map(|n| n.client_id).collect();
    owners.sort_unstable();
    owners.dedup();
    let clients = store.clients.get_clients(&owners).await?;

    let view = HierarchyBuilder::new(&clients).build(&nodes);
    info!(
        kind = %args.kind,
        result_count = nodes.len(),
        "Hierarchy built"
    );
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
