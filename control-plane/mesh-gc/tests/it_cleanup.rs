mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::OPERATOR_NS;
use mesh_gc::cleanup::WebhookCleanup;
use mesh_gc::cleanup::crd_annotation::INJECT_CA_BUNDLE_KEY;
use mesh_gc::cleanup::webhooks::obsolete_webhook_objects;
use mesh_gc::config::GcConfig;
use mesh_gc::crd::CONTROL_PLANE_CRD_NAME;
use mesh_gc::runtime::Runnable;
use mesh_gc::store::memory::{Fault, MemoryStore, Verb, object};
use mesh_gc::store::{ObjectKey, ResourceKind};
use tokio_util::sync::CancellationToken;

async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (kind, key) in obsolete_webhook_objects(OPERATOR_NS) {
        store.insert(kind, object(kind, &key, &[])).await;
    }
    let mut crd = object(
        ResourceKind::CustomResourceDefinition,
        &ObjectKey::cluster(CONTROL_PLANE_CRD_NAME),
        &[],
    );
    crd.metadata.annotations = Some(BTreeMap::from([(
        INJECT_CA_BUNDLE_KEY.to_string(),
        "true".to_string(),
    )]));
    store.insert(ResourceKind::CustomResourceDefinition, crd).await;
    store
}

fn replica(store: &MemoryStore) -> Arc<WebhookCleanup> {
    let mut cfg = GcConfig::for_namespace(OPERATOR_NS);
    cfg.retry.base_ms = 1;
    Arc::new(WebhookCleanup::new(Arc::new(store.clone()), &cfg))
}

async fn annotation(store: &MemoryStore) -> Option<String> {
    store
        .fetch(
            ResourceKind::CustomResourceDefinition,
            &ObjectKey::cluster(CONTROL_PLANE_CRD_NAME),
        )
        .await?
        .metadata
        .annotations?
        .get(INJECT_CA_BUNDLE_KEY)
        .cloned()
}

async fn assert_converged(store: &MemoryStore) {
    for (kind, key) in obsolete_webhook_objects(OPERATOR_NS) {
        assert!(!store.contains(kind, &key).await, "{kind} {key} survived");
    }
    assert_eq!(annotation(store).await.as_deref(), Some("false"));
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_replicas_converge() {
    let store = seeded_store().await;
    let replicas: Vec<_> = (0..3).map(|_| replica(&store)).collect();

    let handles: Vec<_> = replicas
        .iter()
        .cloned()
        .map(|r| tokio::spawn(async move { r.start(CancellationToken::new()).await }))
        .collect();
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert!(replicas.iter().all(|r| r.done()));
    assert_converged(&store).await;
    assert_eq!(store.update_count().await, 1);
}

#[tokio::test]
async fn replicas_tolerate_conflict_and_racing_delete() {
    let store = seeded_store().await;
    store
        .inject(
            Verb::Update,
            Some(ResourceKind::CustomResourceDefinition),
            Fault::Conflict,
        )
        .await;
    store
        .inject(Verb::Delete, Some(ResourceKind::Secret), Fault::ConcurrentDelete)
        .await;

    let a = replica(&store);
    let b = replica(&store);
    let (ra, rb) = tokio::join!(
        a.start(CancellationToken::new()),
        b.start(CancellationToken::new()),
    );
    ra.unwrap();
    rb.unwrap();

    assert!(a.done() && b.done());
    assert_converged(&store).await;
}

#[tokio::test]
async fn rerun_after_success_is_a_no_op() {
    let store = seeded_store().await;
    let task = replica(&store);
    task.start(CancellationToken::new()).await.unwrap();
    let deleted = store.deleted().await.len();

    let again = replica(&store);
    again.start(CancellationToken::new()).await.unwrap();
    assert_eq!(store.deleted().await.len(), deleted);
    assert_eq!(store.update_count().await, 1);
}

#[tokio::test]
#[ignore]
async fn cleanup_against_cluster() {
    let client = kube::Client::try_default().await.expect("kube client");
    let cfg = GcConfig::for_namespace(OPERATOR_NS);
    let task = mesh_gc::cleanup::new_cleanup_runnable(client, &cfg);
    task.start(CancellationToken::new()).await.unwrap();
    assert!(task.done());
}
