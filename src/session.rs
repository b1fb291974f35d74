//! Session — the explicit lifetime of one connected dashboard.
//!
//! `init` validates the configuration, starts the mirror and reacts to its
//! events: an empty collection is seeded and a missing administration document
//! is created, both on the ambient tokio runtime. `dispose` (or dropping the
//! session) cancels every subscription.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::config::RegistryConfig;
use crate::error::{DossierError, Result, StoreError};
use crate::metrics::{admin_metrics, compute_metrics, AdminStats, Metrics};
use crate::mirror::{MirrorEvent, MirrorStatus, SyncMirror};
use crate::mutation::MutationGateway;
use crate::query::{filter_units, paginate, sort_units, UnitPage, ViewState};
use crate::seed::Seeder;
use crate::store::{RecordStore, Unsubscribe};
use crate::types::AdminRecord;

/// Everything a dashboard renders for one view state.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub status: MirrorStatus,
    /// Data shown is from before the latest subscription failure.
    pub stale: bool,
    pub page: UnitPage,
    /// Computed over the filtered set, not just the visible page.
    pub metrics: Metrics,
    pub admin: Arc<AdminRecord>,
    pub admin_stats: AdminStats,
}

/// One running dashboard: a started [`SyncMirror`], its [`MutationGateway`]
/// and the listener that seeds an empty collection and creates a missing
/// administration document.
///
/// Dropping the session disposes it.
pub struct Session {
    store: Arc<dyn RecordStore>,
    config: Arc<RegistryConfig>,
    mirror: SyncMirror,
    gateway: MutationGateway,
    listener: Mutex<Option<Unsubscribe>>,
    disposed: AtomicBool,
}

impl Session {
    /// Validate `config`, start mirroring and return the running session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(store: Arc<dyn RecordStore>, config: RegistryConfig) -> Result<Self> {
        if config.app_id.trim().is_empty() {
            return Err(StoreError::ConfigurationMissing {
                reason: "app_id is empty".to_string(),
            }
            .into());
        }
        config.validate()?;
        let handle = Handle::try_current()
            .map_err(|e| DossierError::Internal(format!("no tokio runtime: {e}")))?;

        let config = Arc::new(config);
        let mirror = SyncMirror::new(Arc::clone(&config));
        let gateway = MutationGateway::new(Arc::clone(&store), Arc::clone(&config), mirror.clone());
        let listener = Self::watch_mirror(
            &mirror,
            handle,
            Seeder::new(Arc::clone(&config)),
            Arc::clone(&store),
            gateway.clone(),
        );

        tracing::info!(app_id = %config.app_id, units = config.unit_count, "session starting");
        mirror.start(store.as_ref());

        Ok(Self {
            store,
            config,
            mirror,
            gateway,
            listener: Mutex::new(Some(listener)),
            disposed: AtomicBool::new(false),
        })
    }

    fn watch_mirror(
        mirror: &SyncMirror,
        handle: Handle,
        seeder: Seeder,
        store: Arc<dyn RecordStore>,
        gateway: MutationGateway,
    ) -> Unsubscribe {
        let seeding = Arc::new(AtomicBool::new(false));
        mirror.on_change(move |event| match event {
            MirrorEvent::CollectionEmpty { snapshot_id } => {
                if seeding.swap(true, Ordering::AcqRel) {
                    tracing::debug!(snapshot_id = *snapshot_id, "seed already in flight");
                    return;
                }
                let seeder = seeder.clone();
                let store = Arc::clone(&store);
                let seeding = Arc::clone(&seeding);
                handle.spawn(async move {
                    // The next empty snapshot tries again.
                    if let Err(e) = seeder.seed(store.as_ref()).await {
                        tracing::debug!(error = %e, "seed attempt failed; waiting for next empty snapshot");
                    }
                    seeding.store(false, Ordering::Release);
                });
            }
            MirrorEvent::AdminMissing => {
                let gateway = gateway.clone();
                handle.spawn(async move {
                    if let Err(e) = gateway.create_admin().await {
                        tracing::warn!(error = %e, "administration document not created");
                    }
                });
            }
            _ => {}
        })
    }

    pub fn mirror(&self) -> &SyncMirror {
        &self.mirror
    }

    /// The write path for this session.
    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    pub fn config(&self) -> &Arc<RegistryConfig> {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// A view state sized by the configured page size.
    pub fn view(&self) -> ViewState {
        ViewState::new(self.config.page_size)
    }

    /// Resolve once the first unit snapshot has been applied.
    pub async fn wait_ready(&self) -> Result<()> {
        self.mirror.wait_ready().await
    }

    /// Run `view` against the current snapshot.
    pub fn dashboard(&self, view: &ViewState) -> Dashboard {
        let snapshot = self.mirror.snapshot();
        let filtered = filter_units(&snapshot.units, view.filter());
        let metrics = compute_metrics(&filtered, &self.config.tracked_kinds);
        let page = paginate(&sort_units(filtered, &view.sort()), view.page());
        Dashboard {
            stale: self.mirror.is_stale(),
            status: snapshot.status,
            page,
            metrics,
            admin_stats: admin_metrics(&snapshot.admin),
            admin: snapshot.admin,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Stop mirroring. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(unsubscribe) = self.listener.lock().take() {
            unsubscribe();
        }
        self.mirror.teardown();
        tracing::info!(app_id = %self.config.app_id, "session disposed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("app_id", &self.config.app_id)
            .field("mirror", &self.mirror)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
