//! SyncMirror — owns the latest normalized snapshot of the store.
//!
//! # Threading model
//!
//! `SyncMirror` is a cheap `Clone` handle over shared state. State lives behind
//! one `parking_lot::Mutex` that is never held while listeners run. Changes fan
//! out through an [`EventEmitter`] and the status is also published on a
//! `tokio::sync::watch` channel for async waiters.
//!
//! Store callbacks hold a `Weak` reference and the epoch they were registered
//! under. `teardown` bumps the epoch, so deliveries already in flight from a
//! cancelled subscription are dropped instead of reaching consumers.
//!
//! # Failures
//!
//! Each subscription keeps its own last error. A fresh delivery clears only
//! the error of the subscription it came from, so the mirror stays in
//! `Error` until every failed subscription has delivered again.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::config::RegistryConfig;
use crate::emitter::EventEmitter;
use crate::error::{DossierError, Result, StoreError};
use crate::store::{RecordStore, Subscription, Unsubscribe};
use crate::types::{AdminRecord, CollectionSnapshot, DocumentSnapshot, UnitRecord};

use super::event::{MirrorEvent, MirrorStatus};
use super::normalize::{normalize_admin, normalize_units};

// ============================================================================
// Public snapshot type
// ============================================================================

/// A read-only view of the mirror at one instant.
#[derive(Debug, Clone)]
pub struct MirrorSnapshot {
    pub status: MirrorStatus,
    pub snapshot_id: Option<u64>,
    pub units: Arc<Vec<UnitRecord>>,
    pub admin: Arc<AdminRecord>,
}

// ============================================================================
// Internal state
// ============================================================================

/// The two subscriptions a mirror holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Units,
    Admin,
}

struct MirrorState {
    status: MirrorStatus,
    units: Arc<Vec<UnitRecord>>,
    admin: Arc<AdminRecord>,
    snapshot_id: Option<u64>,
    /// A unit snapshot has been applied at least once.
    has_snapshot: bool,
    /// `AdminMissing` already fired for the current absence.
    admin_requested: bool,
    units_error: Option<StoreError>,
    admin_error: Option<StoreError>,
    epoch: u64,
    active: bool,
    subscriptions: Vec<Subscription>,
}

impl MirrorState {
    fn new() -> Self {
        Self {
            status: MirrorStatus::Uninitialized,
            units: Arc::new(Vec::new()),
            admin: Arc::new(AdminRecord::missing()),
            snapshot_id: None,
            has_snapshot: false,
            admin_requested: false,
            units_error: None,
            admin_error: None,
            epoch: 0,
            active: false,
            subscriptions: Vec::new(),
        }
    }

    fn accepts(&self, epoch: u64) -> bool {
        self.active && self.epoch == epoch
    }

    /// Move to `next`, returning the event to publish if the status changed.
    fn transition(&mut self, next: MirrorStatus) -> Option<MirrorStatus> {
        if self.status == next {
            return None;
        }
        self.status = next.clone();
        Some(next)
    }

    fn error_slot(&mut self, feed: Feed) -> &mut Option<StoreError> {
        match feed {
            Feed::Units => &mut self.units_error,
            Feed::Admin => &mut self.admin_error,
        }
    }

    /// Status implied by the outstanding errors and the data held. A units
    /// failure is reported ahead of an admin failure.
    fn settled_status(&self) -> MirrorStatus {
        if let Some(error) = self.units_error.as_ref().or(self.admin_error.as_ref()) {
            MirrorStatus::Error(error.clone())
        } else if self.has_snapshot {
            MirrorStatus::Ready
        } else {
            MirrorStatus::Loading
        }
    }

    /// Clear `feed`'s error after a good delivery and settle the status.
    fn recover(&mut self, feed: Feed) -> Option<MirrorStatus> {
        *self.error_slot(feed) = None;
        let next = self.settled_status();
        self.transition(next)
    }
}

struct MirrorInner {
    config: Arc<RegistryConfig>,
    state: Mutex<MirrorState>,
    emitter: EventEmitter<MirrorEvent>,
    status_tx: watch::Sender<MirrorStatus>,
}

impl MirrorInner {
    fn publish(&self, events: Vec<MirrorEvent>) {
        for event in events {
            if let MirrorEvent::StatusChanged(status) = &event {
                self.status_tx.send_replace(status.clone());
            }
            self.emitter.emit(&event);
        }
    }

    fn on_units(&self, epoch: u64, snapshot: CollectionSnapshot) {
        let units = normalize_units(&snapshot.documents, &self.config);
        let events = {
            let mut st = self.state.lock();
            if !st.accepts(epoch) {
                tracing::trace!(snapshot_id = snapshot.snapshot_id, "dropping stale unit snapshot");
                return;
            }
            let mut events = Vec::new();
            if snapshot.documents.is_empty() && self.config.seed_on_empty {
                events.extend(st.recover(Feed::Units).map(MirrorEvent::StatusChanged));
                events.push(MirrorEvent::CollectionEmpty {
                    snapshot_id: snapshot.snapshot_id,
                });
            } else {
                let count = units.len();
                st.units = Arc::new(units);
                st.snapshot_id = Some(snapshot.snapshot_id);
                st.has_snapshot = true;
                events.push(MirrorEvent::UnitsReplaced {
                    snapshot_id: snapshot.snapshot_id,
                    count,
                });
                events.extend(st.recover(Feed::Units).map(MirrorEvent::StatusChanged));
                tracing::debug!(snapshot_id = snapshot.snapshot_id, units = count, "unit snapshot applied");
            }
            events
        };
        self.publish(events);
    }

    fn on_admin(&self, epoch: u64, snapshot: DocumentSnapshot) {
        let admin = normalize_admin(&snapshot);
        let events = {
            let mut st = self.state.lock();
            if !st.accepts(epoch) {
                return;
            }
            let mut events = vec![MirrorEvent::AdminReplaced {
                exists: admin.exists,
            }];
            if admin.exists {
                st.admin_requested = false;
            } else if !st.admin_requested {
                st.admin_requested = true;
                events.push(MirrorEvent::AdminMissing);
            }
            st.admin = Arc::new(admin);
            events.extend(st.recover(Feed::Admin).map(MirrorEvent::StatusChanged));
            events
        };
        self.publish(events);
    }

    fn on_error(&self, epoch: u64, feed: Feed, error: StoreError) {
        let events = {
            let mut st = self.state.lock();
            if !st.accepts(epoch) {
                return;
            }
            tracing::warn!(feed = ?feed, error = %error, stale = st.has_snapshot, "mirror subscription failed; serving last snapshot");
            *st.error_slot(feed) = Some(error);
            let next = st.settled_status();
            st.transition(next)
                .map(MirrorEvent::StatusChanged)
                .into_iter()
                .collect()
        };
        self.publish(events);
    }
}

// ============================================================================
// SyncMirror
// ============================================================================

/// Local, normalized copy of the unit collection and the administration
/// document.
///
/// Readers always get a consistent snapshot: unit lists are replaced
/// wholesale behind an `Arc`, never edited in place.
#[derive(Clone)]
pub struct SyncMirror {
    inner: Arc<MirrorInner>,
}

impl SyncMirror {
    /// A mirror in `Uninitialized`. Nothing is subscribed until [`start`](Self::start).
    pub fn new(config: Arc<RegistryConfig>) -> Self {
        let (status_tx, _) = watch::channel(MirrorStatus::Uninitialized);
        Self {
            inner: Arc::new(MirrorInner {
                config,
                state: Mutex::new(MirrorState::new()),
                emitter: EventEmitter::new(),
                status_tx,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Subscribe to the unit collection and the administration document.
    ///
    /// The store may deliver initial snapshots before this returns. Calling
    /// `start` on a running mirror does nothing.
    pub fn start(&self, store: &dyn RecordStore) {
        let (epoch, loading) = {
            let mut st = self.inner.state.lock();
            if st.active {
                return;
            }
            st.active = true;
            st.epoch += 1;
            st.units_error = None;
            st.admin_error = None;
            (st.epoch, st.transition(MirrorStatus::Loading))
        };
        self.inner
            .publish(loading.map(MirrorEvent::StatusChanged).into_iter().collect());

        let paths = self.inner.config.paths();
        let units_path = paths.units_collection();
        let admin_path = paths.admin_document();
        tracing::info!(units = %units_path, admin = %admin_path, "mirror subscribing");

        let units = {
            let weak = Arc::downgrade(&self.inner);
            let weak_err = Weak::clone(&weak);
            store.subscribe_collection(
                &units_path,
                Arc::new(move |snapshot| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_units(epoch, snapshot);
                    }
                }),
                Arc::new(move |error| {
                    if let Some(inner) = weak_err.upgrade() {
                        inner.on_error(epoch, Feed::Units, error);
                    }
                }),
            )
        };
        self.adopt(epoch, Subscription::new(units_path, units));

        let admin = {
            let weak = Arc::downgrade(&self.inner);
            let weak_err = Weak::clone(&weak);
            store.subscribe_document(
                &admin_path,
                Arc::new(move |snapshot| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_admin(epoch, snapshot);
                    }
                }),
                Arc::new(move |error| {
                    if let Some(inner) = weak_err.upgrade() {
                        inner.on_error(epoch, Feed::Admin, error);
                    }
                }),
            )
        };
        self.adopt(epoch, Subscription::new(admin_path, admin));
    }

    /// Keep `subscription` if the mirror is still on `epoch`, else release it.
    fn adopt(&self, epoch: u64, subscription: Subscription) {
        let rejected = {
            let mut st = self.inner.state.lock();
            if st.accepts(epoch) {
                st.subscriptions.push(subscription);
                None
            } else {
                Some(subscription)
            }
        };
        drop(rejected);
    }

    /// Cancel both subscriptions. Idempotent; later deliveries are dropped.
    pub fn teardown(&self) {
        let subscriptions = {
            let mut st = self.inner.state.lock();
            if !st.active {
                return;
            }
            st.active = false;
            st.epoch += 1;
            std::mem::take(&mut st.subscriptions)
        };
        let released: Vec<&str> = subscriptions.iter().map(Subscription::label).collect();
        tracing::info!(subscriptions = ?released, "mirror torn down");
        drop(subscriptions);
    }

    /// Subscribed and not torn down.
    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn status(&self) -> MirrorStatus {
        self.inner.state.lock().status.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.state.lock().status.is_ready()
    }

    /// A unit snapshot has been applied at least once, so [`units`] holds
    /// the full known id set even if a subscription has failed since.
    ///
    /// [`units`]: SyncMirror::units
    pub fn has_snapshot(&self) -> bool {
        self.inner.state.lock().has_snapshot
    }

    /// Serving an older snapshot because the subscription has since failed.
    pub fn is_stale(&self) -> bool {
        let st = self.inner.state.lock();
        st.has_snapshot && st.status.error().is_some()
    }

    /// Units in ascending number order.
    pub fn units(&self) -> Arc<Vec<UnitRecord>> {
        Arc::clone(&self.inner.state.lock().units)
    }

    /// The administration record. A missing document reads as all pending.
    pub fn admin(&self) -> Arc<AdminRecord> {
        Arc::clone(&self.inner.state.lock().admin)
    }

    /// The unit with document id `id` in the current snapshot.
    pub fn unit(&self, id: &str) -> Option<UnitRecord> {
        self.inner
            .state
            .lock()
            .units
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    /// Status, units and admin record read under one lock.
    pub fn snapshot(&self) -> MirrorSnapshot {
        let st = self.inner.state.lock();
        MirrorSnapshot {
            status: st.status.clone(),
            snapshot_id: st.snapshot_id,
            units: Arc::clone(&st.units),
            admin: Arc::clone(&st.admin),
        }
    }

    pub fn config(&self) -> &Arc<RegistryConfig> {
        &self.inner.config
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    /// Call `callback` after every change. Returns an [`Unsubscribe`] closure.
    pub fn on_change(
        &self,
        callback: impl Fn(&MirrorEvent) + Send + Sync + 'static,
    ) -> Unsubscribe {
        let id = self.inner.emitter.on(callback);
        let weak = Arc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.emitter.off(id);
            }
        })
    }

    /// A receiver that sees every status change.
    pub fn watch_status(&self) -> watch::Receiver<MirrorStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Resolve once the mirror is `Ready`.
    pub async fn wait_ready(&self) -> Result<()> {
        let mut rx = self.watch_status();
        rx.wait_for(|status| status.is_ready())
            .await
            .map(|_| ())
            .map_err(|_| DossierError::Internal("mirror status channel closed".to_string()))
    }
}

impl std::fmt::Debug for SyncMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.inner.state.lock();
        f.debug_struct("SyncMirror")
            .field("status", &st.status)
            .field("units", &st.units.len())
            .field("active", &st.active)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
