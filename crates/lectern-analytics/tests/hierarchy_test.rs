use std::sync::Arc;

use lectern_analytics::mock::MockRuntime;
use lectern_analytics::{
    Actor, AnalyticsConfig, ClassificationKind, ClassificationNode, ClassificationRepository,
    ClassificationTarget, ClientId, CreateClassificationRequest, HierarchyEntry, ModelRegistry,
    Repositories, TextAnalyticsService,
};
use lectern_store::test_fixtures::{seeded_store, ACME_CLIENT, GLOBEX_CLIENT, SYSTEM_CLIENT};
use lectern_store::{ClientRepository, MemoryStore};

fn service(store: &MemoryStore) -> TextAnalyticsService {
    let repos = Repositories {
        documents: Arc::new(store.documents.clone()),
        results: Arc::new(store.results.clone()),
        classifications: Arc::new(store.classifications.clone()),
        clients: Arc::new(store.clients.clone()),
    };
    TextAnalyticsService::new(
        &AnalyticsConfig::default(),
        Arc::new(ModelRegistry::new()),
        Arc::new(MockRuntime::new()),
        repos,
    )
}

async fn tag(
    store: &MemoryStore,
    name: &str,
    client: ClientId,
    parent: Option<&ClassificationNode>,
) -> ClassificationNode {
    let mut req = CreateClassificationRequest::new(ClassificationKind::Tag, name, client)
        .with_target(ClassificationTarget::Reference)
        .by_user(10, 1);
    if let Some(parent) = parent {
        req = req.with_parent(parent.id);
    }
    store.classifications.create(req).await.unwrap()
}

fn names(entries: &[&HierarchyEntry]) -> Vec<String> {
    let mut names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_real_tenant_sees_own_and_system_trees() {
    let store = seeded_store().await;
    let root1 = tag(&store, "root1", ACME_CLIENT, None).await;
    let root2 = tag(&store, "root2", ACME_CLIENT, None).await;
    tag(&store, "child1", ACME_CLIENT, Some(&root1)).await;
    tag(&store, "child2", ACME_CLIENT, Some(&root2)).await;
    tag(&store, "shared", SYSTEM_CLIENT, None).await;
    tag(&store, "rival", GLOBEX_CLIENT, None).await;

    let acme = store.clients.get_client(ACME_CLIENT).await.unwrap().unwrap();
    let view = service(&store)
        .build_hierarchy(ClassificationKind::Tag, &Actor::new(10, "alice"), Some(&acme))
        .await
        .unwrap();

    let mut tenants: Vec<&str> = view.tenants().collect();
    tenants.sort();
    assert_eq!(tenants, vec!["Acme", "System"]);

    let roots = view.roots("Acme", ClassificationTarget::Reference);
    assert_eq!(names(&roots), vec!["root1", "root2"]);
    for root in roots {
        assert_eq!(root.children.len(), 1);
        let child = &root.children[0];
        assert_eq!(child.name, root.name.replace("root", "child"));
        assert!(child.children.is_empty());
    }

    let shared = view.roots("System", ClassificationTarget::Reference);
    assert_eq!(names(&shared), vec!["shared"]);
}

#[tokio::test]
async fn test_system_tenant_sees_own_and_authored() {
    let store = seeded_store().await;
    tag(&store, "shared", SYSTEM_CLIENT, None).await;
    // Authored by user 10 under Globex.
    tag(&store, "authored", GLOBEX_CLIENT, None).await;

    let system = store.clients.get_client(SYSTEM_CLIENT).await.unwrap().unwrap();
    let svc = service(&store);

    let author = svc
        .build_hierarchy(ClassificationKind::Tag, &Actor::new(10, "alice"), Some(&system))
        .await
        .unwrap();
    let mut tenants: Vec<&str> = author.tenants().collect();
    tenants.sort();
    assert_eq!(tenants, vec!["Globex", "System"]);

    let stranger = svc
        .build_hierarchy(ClassificationKind::Tag, &Actor::new(99, "mallory"), Some(&system))
        .await
        .unwrap();
    assert_eq!(stranger.tenants().collect::<Vec<_>>(), vec!["System"]);
}

#[tokio::test]
async fn test_categories_are_separate_from_tags() {
    let store = seeded_store().await;
    tag(&store, "legal", ACME_CLIENT, None).await;

    let acme = store.clients.get_client(ACME_CLIENT).await.unwrap().unwrap();
    let view = service(&store)
        .build_hierarchy(ClassificationKind::Category, &Actor::new(10, "alice"), Some(&acme))
        .await
        .unwrap();
    assert!(view.is_empty());
}

#[tokio::test]
async fn test_reparent_moves_subtree() {
    let store = seeded_store().await;
    let root1 = tag(&store, "root1", ACME_CLIENT, None).await;
    let root2 = tag(&store, "root2", ACME_CLIENT, None).await;
    let child = tag(&store, "child", ACME_CLIENT, Some(&root1)).await;

    store
        .classifications
        .set_parent(ClassificationKind::Tag, child.id, Some(root2.id), 10)
        .await
        .unwrap();

    let acme = store.clients.get_client(ACME_CLIENT).await.unwrap().unwrap();
    let view = service(&store)
        .build_hierarchy(ClassificationKind::Tag, &Actor::new(10, "alice"), Some(&acme))
        .await
        .unwrap();

    for root in view.roots("Acme", ClassificationTarget::Reference) {
        match root.name.as_str() {
            "root1" => assert!(root.children.is_empty()),
            "root2" => assert_eq!(root.children[0].name, "child"),
            other => panic!("unexpected root {}", other),
        }
    }
}
