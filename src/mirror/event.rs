//! MirrorEvent — what changed in the mirror.
//!
//! Emitted after the mirror's state has been updated and its lock released,
//! so listeners may read the mirror freely.

use crate::error::StoreError;

/// Lifecycle of the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MirrorStatus {
    /// Not subscribed yet.
    #[default]
    Uninitialized,
    /// Subscribed, waiting for the first usable collection snapshot.
    Loading,
    /// Serving the latest snapshot.
    Ready,
    /// The last subscription delivery failed. The previous snapshot (if any)
    /// is still served; the next good snapshot returns to `Ready`.
    Error(StoreError),
}

impl MirrorStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// The subscription failure, when in `Error`.
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    /// The unit list was replaced by a new snapshot.
    UnitsReplaced { snapshot_id: u64, count: usize },
    /// The collection is empty; the owner should seed it.
    CollectionEmpty { snapshot_id: u64 },
    /// The administration record was replaced.
    AdminReplaced { exists: bool },
    /// The administration document does not exist; the owner should create it.
    /// Fired once per absence.
    AdminMissing,
    /// The mirror moved to a new status.
    StatusChanged(MirrorStatus),
}
