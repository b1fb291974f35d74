//! Mirror status transitions, failure handling and teardown.

use std::sync::Arc;

use dossier_db::config::RegistryConfig;
use dossier_db::error::StoreError;
use dossier_db::mirror::{MirrorEvent, MirrorStatus, SyncMirror};
use dossier_db::store::MemoryStore;
use parking_lot::Mutex;
use serde_json::json;

use crate::support::init_tracing;

const UNITS: &str = "artifacts/m/public/data/houses";
const ADMIN: &str = "artifacts/m/public/data/admin/general";

fn config(seed_on_empty: bool) -> Arc<RegistryConfig> {
    Arc::new(
        RegistryConfig::default()
            .with_app_id("m")
            .with_seed_on_empty(seed_on_empty),
    )
}

fn populated_store() -> MemoryStore {
    MemoryStore::with_documents([
        (format!("{UNITS}/unit-1"), json!({"numero": 1, "etapa": 1, "doc_fachada": "OK"})),
        (format!("{UNITS}/unit-2"), json!({"numero": 2, "etapa": 1})),
    ])
}

fn record_events(mirror: &SyncMirror) -> Arc<Mutex<Vec<MirrorEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    // Listener lives as long as the mirror.
    let _keep = mirror.on_change(move |e| sink.lock().push(e.clone()));
    log
}

#[test]
fn first_snapshot_moves_loading_to_ready() {
    init_tracing();
    let store = populated_store();
    let mirror = SyncMirror::new(config(true));
    let events = record_events(&mirror);

    mirror.start(&store);

    let statuses: Vec<MirrorStatus> = events
        .lock()
        .iter()
        .filter_map(|e| match e {
            MirrorEvent::StatusChanged(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(statuses, [MirrorStatus::Loading, MirrorStatus::Ready]);
    assert_eq!(mirror.units().len(), 2);
}

#[test]
fn empty_collection_asks_for_seed_and_stays_loading() {
    init_tracing();
    let store = MemoryStore::new();
    let mirror = SyncMirror::new(config(true));
    let events = record_events(&mirror);

    mirror.start(&store);

    assert_eq!(mirror.status(), MirrorStatus::Loading);
    assert!(events
        .lock()
        .iter()
        .any(|e| matches!(e, MirrorEvent::CollectionEmpty { .. })));

    store.put_raw(format!("{UNITS}/unit-1"), json!({"numero": 1}));
    assert!(mirror.is_ready());
}

#[test]
fn subscription_failure_keeps_last_snapshot_and_recovers() {
    init_tracing();
    let store = populated_store();
    let mirror = SyncMirror::new(config(true));
    mirror.start(&store);
    let before = mirror.units();

    store.fail_subscriptions(UNITS, "connection reset");
    match mirror.status() {
        MirrorStatus::Error(StoreError::Subscription { path, message }) => {
            assert_eq!(path, UNITS);
            assert_eq!(message, "connection reset");
        }
        other => panic!("expected subscription error, got {other:?}"),
    }
    assert!(mirror.is_stale());
    assert_eq!(mirror.units(), before);

    store.put_raw(format!("{UNITS}/unit-3"), json!({"numero": 3}));
    assert!(mirror.is_ready());
    assert!(!mirror.is_stale());
    assert_eq!(mirror.units().len(), 3);
}

#[test]
fn admin_snapshot_does_not_clear_units_failure() {
    init_tracing();
    let store = populated_store();
    let mirror = SyncMirror::new(config(true));
    mirror.start(&store);

    store.fail_subscriptions(UNITS, "connection reset");
    store.put_raw(ADMIN, json!({"doc_rfc": "OK"}));
    assert!(mirror.admin().exists);
    assert!(matches!(
        mirror.status(),
        MirrorStatus::Error(StoreError::Subscription { ref path, .. }) if path == UNITS
    ));
    assert!(mirror.is_stale());

    store.put_raw(format!("{UNITS}/unit-3"), json!({"numero": 3}));
    assert_eq!(mirror.status(), MirrorStatus::Ready);
    assert!(!mirror.is_stale());
}

#[test]
fn unit_snapshot_does_not_clear_admin_failure() {
    init_tracing();
    let store = populated_store();
    let mirror = SyncMirror::new(config(true));
    mirror.start(&store);

    store.fail_subscriptions(ADMIN, "permission denied");
    store.put_raw(format!("{UNITS}/unit-3"), json!({"numero": 3}));
    assert_eq!(mirror.units().len(), 3);
    assert!(matches!(
        mirror.status(),
        MirrorStatus::Error(StoreError::Subscription { ref path, .. }) if path == ADMIN
    ));

    store.refresh(ADMIN);
    assert_eq!(mirror.status(), MirrorStatus::Ready);
}

#[test]
fn failure_before_first_snapshot_is_not_stale() {
    let store = MemoryStore::new();
    let mirror = SyncMirror::new(config(true));
    mirror.start(&store);
    store.fail_subscriptions(UNITS, "denied");
    assert!(mirror.status().error().is_some());
    assert!(!mirror.is_stale());
}

#[test]
fn admin_missing_fires_once_per_absence() {
    let store = populated_store();
    let mirror = SyncMirror::new(config(false));
    let events = record_events(&mirror);
    mirror.start(&store);

    store.refresh(ADMIN);
    let missing = |log: &[MirrorEvent]| {
        log.iter()
            .filter(|e| matches!(e, MirrorEvent::AdminMissing))
            .count()
    };
    assert_eq!(missing(events.lock().as_slice()), 1);

    store.put_raw(ADMIN, json!({"doc_rfc": "OK"}));
    assert!(mirror.admin().exists);
    store.put_raw(ADMIN, json!(null));
    assert!(!mirror.admin().exists);
    assert_eq!(missing(events.lock().as_slice()), 2);
}

#[test]
fn torn_down_mirror_ignores_late_errors() {
    let store = populated_store();
    let mirror = SyncMirror::new(config(true));
    mirror.start(&store);
    mirror.teardown();
    store.fail_subscriptions(UNITS, "late");
    assert_eq!(mirror.status(), MirrorStatus::Ready);
}

#[test]
fn restart_after_teardown_resubscribes() {
    let store = populated_store();
    let mirror = SyncMirror::new(config(true));
    mirror.start(&store);
    mirror.teardown();
    store.put_raw(format!("{UNITS}/unit-9"), json!({"numero": 9}));
    assert_eq!(mirror.units().len(), 2);

    mirror.start(&store);
    assert_eq!(mirror.units().len(), 3);
    assert_eq!(store.subscriber_count(), 2);
}

#[tokio::test]
async fn wait_ready_resolves_after_first_snapshot() {
    let store = MemoryStore::new();
    let mirror = SyncMirror::new(config(true));
    mirror.start(&store);
    let waiter = {
        let mirror = mirror.clone();
        tokio::spawn(async move { mirror.wait_ready().await })
    };
    tokio::task::yield_now().await;
    store.put_raw(format!("{UNITS}/unit-1"), json!({"numero": 1}));
    tokio::time::timeout(crate::support::WAIT, waiter)
        .await
        .expect("mirror became ready")
        .expect("task joined")
        .expect("status channel open");
}
