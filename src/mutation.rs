//! Mutation Gateway: validated partial writes to unit and admin records.
//!
//! Writes go straight to the store as field merges. The mirror is never
//! touched here; it picks the change up from the next snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::RegistryConfig;
use crate::error::{MutationError, Result};
use crate::mirror::SyncMirror;
use crate::store::RecordStore;
use crate::types::{
    now_millis, AdminDocumentKind, DocStatus, DocumentKey, DocumentKind, FIELD_ID, FIELD_NUMBER,
    FIELD_STAGE, FIELD_UPDATED_AT,
};

/// Field names that identify a unit and can never be patched.
const IMMUTABLE_FIELDS: &[&str] = &[FIELD_ID, FIELD_NUMBER, FIELD_STAGE, "number", "stage"];

// ============================================================================
// UnitPatch
// ============================================================================

/// Status changes for one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitPatch {
    changes: BTreeMap<DocumentKind, DocStatus>,
}

impl UnitPatch {
    /// An empty patch. Submitting it fails with `EmptyPatch`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `kind` to `status`, replacing an earlier change to the same kind.
    pub fn set(mut self, kind: DocumentKind, status: DocStatus) -> Self {
        self.changes.insert(kind, status);
        self
    }

    /// Build a patch from raw field names, as a form or an API body would send
    /// them. Accepts `doc_<kind>` and bare `<kind>` keys with label values.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, MutationError> {
        let mut patch = Self::new();
        for (field, value) in fields {
            if IMMUTABLE_FIELDS.contains(&field.as_str()) {
                return Err(MutationError::ImmutableField {
                    field: field.clone(),
                });
            }
            if field == FIELD_UPDATED_AT {
                return Err(MutationError::ReservedField {
                    field: field.clone(),
                });
            }
            let kind = DocumentKind::from_field(field)
                .or_else(|| DocumentKind::from_name(field))
                .ok_or_else(|| MutationError::UnknownField {
                    field: field.clone(),
                })?;
            let status = value
                .as_str()
                .and_then(DocStatus::from_label)
                .ok_or_else(|| MutationError::InvalidStatus {
                    field: field.clone(),
                    value: value.to_string(),
                })?;
            patch.changes.insert(kind, status);
        }
        patch.ensure_not_empty()?;
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of kinds changed.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// The status this patch writes for `kind`, if any.
    pub fn get(&self, kind: DocumentKind) -> Option<DocStatus> {
        self.changes.get(&kind).copied()
    }

    /// Changes in kind declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (DocumentKind, DocStatus)> + '_ {
        self.changes.iter().map(|(k, s)| (*k, *s))
    }

    fn ensure_not_empty(&self) -> Result<(), MutationError> {
        if self.is_empty() {
            Err(MutationError::EmptyPatch)
        } else {
            Ok(())
        }
    }

    /// The merge body: one field per change plus `updatedAt`.
    pub fn to_fields(&self, now: i64) -> Map<String, Value> {
        let mut fields: Map<String, Value> = self
            .iter()
            .map(|(k, s)| (k.field().to_string(), Value::String(s.label().to_string())))
            .collect();
        fields.insert(FIELD_UPDATED_AT.to_string(), Value::from(now));
        fields
    }
}

// ============================================================================
// MutationGateway
// ============================================================================

/// The only write path for unit and admin statuses.
///
/// Every update is validated against the configuration and the mirror's last
/// unit snapshot, then sent as a field merge. Failures come back to the caller
/// and are never retried. Cloning is cheap: store, config and mirror are
/// shared handles.
#[derive(Clone)]
pub struct MutationGateway {
    store: Arc<dyn RecordStore>,
    config: Arc<RegistryConfig>,
    mirror: SyncMirror,
}

impl MutationGateway {
    /// Build a gateway writing to `store` and checking ids against `mirror`.
    pub fn new(store: Arc<dyn RecordStore>, config: Arc<RegistryConfig>, mirror: SyncMirror) -> Self {
        Self {
            store,
            config,
            mirror,
        }
    }

    /// Check `patch` against the deployment without writing anything.
    ///
    /// Ids are checked against the last applied unit snapshot, also while the
    /// mirror is in `Error`. Before the first snapshot every update fails with
    /// [`MutationError::NotReady`].
    pub fn validate_unit(&self, id: &str, patch: &UnitPatch) -> Result<(), MutationError> {
        patch.ensure_not_empty()?;
        if let Some((kind, _)) = patch.iter().find(|(k, _)| !self.config.is_tracked(*k)) {
            return Err(MutationError::UntrackedKind {
                kind: kind.name().to_string(),
            });
        }
        // Unit records are only ever created by the seeder; a merge into an
        // unseen id would create an orphan document.
        if !self.mirror.has_snapshot() {
            return Err(MutationError::NotReady);
        }
        if self.mirror.unit(id).is_none() {
            return Err(MutationError::UnknownUnit { id: id.to_string() });
        }
        Ok(())
    }

    /// Merge the patched statuses and a fresh `updatedAt` into unit `id`.
    pub async fn update_unit(&self, id: &str, patch: &UnitPatch) -> Result<()> {
        self.validate_unit(id, patch)?;
        let path = self.config.paths().unit_document(id);
        let fields = patch.to_fields(now_millis());
        tracing::debug!(unit = %id, changes = patch.len(), "submitting unit update");
        if let Err(e) = self.store.merge_write(&path, fields).await {
            tracing::warn!(unit = %id, error = %e, "unit update rejected");
            return Err(e.into());
        }
        Ok(())
    }

    /// Convenience for a single status change.
    pub async fn set_unit_status(&self, id: &str, kind: DocumentKind, status: DocStatus) -> Result<()> {
        self.update_unit(id, &UnitPatch::new().set(kind, status)).await
    }

    /// Merge one status into the administration document.
    pub async fn update_admin(&self, kind: AdminDocumentKind, status: DocStatus) -> Result<()> {
        let path = self.config.paths().admin_document();
        let mut fields = Map::new();
        fields.insert(kind.field().to_string(), Value::String(status.label().to_string()));
        fields.insert(FIELD_UPDATED_AT.to_string(), Value::from(now_millis()));
        tracing::debug!(kind = kind.name(), status = %status, "submitting admin update");
        if let Err(e) = self.store.merge_write(&path, fields).await {
            tracing::warn!(kind = kind.name(), error = %e, "admin update rejected");
            return Err(e.into());
        }
        Ok(())
    }

    /// Create the administration document with every kind pending.
    ///
    /// Nothing is written if the document already exists, so statuses set by
    /// another client after our last snapshot survive. Returns whether this
    /// call created it.
    pub async fn create_admin(&self) -> Result<bool> {
        let path = self.config.paths().admin_document();
        let mut fields: Map<String, Value> = AdminDocumentKind::ALL
            .iter()
            .map(|k| {
                (
                    k.field().to_string(),
                    Value::String(DocStatus::Pending.label().to_string()),
                )
            })
            .collect();
        fields.insert(FIELD_UPDATED_AT.to_string(), Value::from(now_millis()));
        tracing::info!(path = %path, "creating administration document");
        let created = self.store.create_document(&path, fields).await?;
        if !created {
            tracing::debug!(path = %path, "administration document already exists");
        }
        Ok(created)
    }
}

impl std::fmt::Debug for MutationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationGateway")
            .field("app_id", &self.config.app_id)
            .finish()
    }
}
