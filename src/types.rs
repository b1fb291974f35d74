use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Wire field names
// ============================================================================

/// Unit number field as stored remotely.
pub const FIELD_NUMBER: &str = "numero";
/// Stage field as stored remotely.
pub const FIELD_STAGE: &str = "etapa";
/// Last-mutation timestamp (epoch milliseconds).
pub const FIELD_UPDATED_AT: &str = "updatedAt";
/// Document id. Never stored inside the document body, but rejected in patches.
pub const FIELD_ID: &str = "id";

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ============================================================================
// DocStatus
// ============================================================================

/// Tri-state review status of a single document.
///
/// The wire labels are the ones the deployed data uses. `Ord` follows the
/// labels as plain strings (`"OK" < "Pendiente" < "Revisión"`), not review
/// priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DocStatus {
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Revisión")]
    InReview,
    #[serde(rename = "OK")]
    Approved,
}

impl DocStatus {
    pub const ALL: [DocStatus; 3] = [DocStatus::Pending, DocStatus::InReview, DocStatus::Approved];

    /// The wire label: `Pendiente`, `Revisión` or `OK`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::InReview => "Revisión",
            Self::Approved => "OK",
        }
    }

    /// Parse a wire label. Anything else is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    pub fn is_approved(self) -> bool {
        self == Self::Approved
    }
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl PartialOrd for DocStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DocStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.label().cmp(other.label())
    }
}

// ============================================================================
// Document kinds
// ============================================================================

/// A closed set of document kinds stored as flat `doc_<name>` fields.
pub trait DocumentKey:
    Copy + Ord + Eq + std::hash::Hash + fmt::Debug + Send + Sync + 'static
{
    /// Every kind, in declaration order.
    const ALL: &'static [Self];

    /// Short name (`"fachada"`).
    fn name(self) -> &'static str;

    /// Remote field name (`"doc_fachada"`).
    fn field(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    fn from_field(field: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.field() == field)
    }
}

/// Per-unit document kinds, in the order they were introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Façade photo.
    Fachada,
    /// Property-tax receipt.
    Predial,
    /// Lien certificate.
    Gravamen,
    /// Meter-site photo.
    Medidor,
    /// Owner ID.
    Ine,
    /// Application form.
    Solicitud,
}

impl DocumentKey for DocumentKind {
    const ALL: &'static [Self] = &[
        Self::Fachada,
        Self::Predial,
        Self::Gravamen,
        Self::Medidor,
        Self::Ine,
        Self::Solicitud,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Fachada => "fachada",
            Self::Predial => "predial",
            Self::Gravamen => "gravamen",
            Self::Medidor => "medidor",
            Self::Ine => "ine",
            Self::Solicitud => "solicitud",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Fachada => "doc_fachada",
            Self::Predial => "doc_predial",
            Self::Gravamen => "doc_gravamen",
            Self::Medidor => "doc_medidor",
            Self::Ine => "doc_ine",
            Self::Solicitud => "doc_solicitud",
        }
    }
}

/// Development-wide document kinds held by the administration singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminDocumentKind {
    /// Association form.
    ActaAsociacion,
    /// Entrance photo.
    FotoAcceso,
    /// Tax ID.
    Rfc,
    /// Administrator ID.
    IneAdmin,
    /// Site plan.
    Plano,
}

impl DocumentKey for AdminDocumentKind {
    const ALL: &'static [Self] = &[
        Self::ActaAsociacion,
        Self::FotoAcceso,
        Self::Rfc,
        Self::IneAdmin,
        Self::Plano,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::ActaAsociacion => "acta_asociacion",
            Self::FotoAcceso => "foto_acceso",
            Self::Rfc => "rfc",
            Self::IneAdmin => "ine_admin",
            Self::Plano => "plano",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::ActaAsociacion => "doc_acta_asociacion",
            Self::FotoAcceso => "doc_foto_acceso",
            Self::Rfc => "doc_rfc",
            Self::IneAdmin => "doc_ine_admin",
            Self::Plano => "doc_plano",
        }
    }
}

// ============================================================================
// DocumentSet
// ============================================================================

/// Fully populated status map for a fixed list of kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSet<K: DocumentKey> {
    statuses: BTreeMap<K, DocStatus>,
}

impl<K: DocumentKey> DocumentSet<K> {
    /// Every kind in `kinds` set to `Pending`.
    pub fn pending(kinds: &[K]) -> Self {
        Self {
            statuses: kinds.iter().map(|k| (*k, DocStatus::Pending)).collect(),
        }
    }

    /// Status of `kind`; kinds outside the set read as `Pending`.
    pub fn status(&self, kind: K) -> DocStatus {
        self.statuses.get(&kind).copied().unwrap_or_default()
    }

    pub fn set(&mut self, kind: K, status: DocStatus) {
        self.statuses.insert(kind, status);
    }

    pub fn with(mut self, kind: K, status: DocStatus) -> Self {
        self.set(kind, status);
        self
    }

    pub fn contains(&self, kind: K) -> bool {
        self.statuses.contains_key(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, DocStatus)> + '_ {
        self.statuses.iter().map(|(k, s)| (*k, *s))
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Kinds currently `OK`.
    pub fn approved_count(&self) -> usize {
        self.statuses.values().filter(|s| s.is_approved()).count()
    }

    /// True when every kind in the set is approved.
    pub fn all_approved(&self) -> bool {
        self.statuses.values().all(|s| s.is_approved())
    }

    /// Flat `doc_<kind>: label` fields.
    pub fn to_fields(&self) -> Map<String, Value> {
        self.statuses
            .iter()
            .map(|(k, s)| (k.field().to_string(), Value::String(s.label().to_string())))
            .collect()
    }
}

// ============================================================================
// Unit record
// ============================================================================

/// Values derived from a unit's documents. Computed once per snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitProgress {
    /// Number of tracked kinds that are approved.
    pub approved: usize,
    /// Number of tracked kinds.
    pub tracked: usize,
    /// Every tracked kind is approved.
    pub complete: bool,
}

impl UnitProgress {
    pub fn derive(documents: &DocumentSet<DocumentKind>) -> Self {
        Self {
            approved: documents.approved_count(),
            tracked: documents.len(),
            complete: documents.all_approved(),
        }
    }
}

/// One housing unit, normalized and with its progress derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub id: String,
    pub number: u32,
    pub stage: u8,
    pub documents: DocumentSet<DocumentKind>,
    pub updated_at: Option<i64>,
    pub progress: UnitProgress,
}

impl UnitRecord {
    pub fn new(
        id: impl Into<String>,
        number: u32,
        stage: u8,
        documents: DocumentSet<DocumentKind>,
        updated_at: Option<i64>,
    ) -> Self {
        let progress = UnitProgress::derive(&documents);
        Self {
            id: id.into(),
            number,
            stage,
            documents,
            updated_at,
            progress,
        }
    }

    /// Status of `kind`. Untracked kinds read as pending.
    pub fn status(&self, kind: DocumentKind) -> DocStatus {
        self.documents.status(kind)
    }

    /// Binary completeness: every tracked kind approved.
    pub fn is_complete(&self) -> bool {
        self.progress.complete
    }

    /// Remote document body (the id is the document key, not a field).
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(FIELD_NUMBER.to_string(), Value::from(self.number));
        fields.insert(FIELD_STAGE.to_string(), Value::from(self.stage));
        fields.extend(self.documents.to_fields());
        if let Some(ts) = self.updated_at {
            fields.insert(FIELD_UPDATED_AT.to_string(), Value::from(ts));
        }
        fields
    }
}

// ============================================================================
// Administration record
// ============================================================================

/// The development-wide singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRecord {
    pub documents: DocumentSet<AdminDocumentKind>,
    pub updated_at: Option<i64>,
    /// False while the remote document has not been created yet.
    pub exists: bool,
}

impl AdminRecord {
    /// All kinds pending, not yet stored remotely.
    pub fn missing() -> Self {
        Self {
            documents: DocumentSet::pending(AdminDocumentKind::ALL),
            updated_at: None,
            exists: false,
        }
    }

    pub fn status(&self, kind: AdminDocumentKind) -> DocStatus {
        self.documents.status(kind)
    }

    pub fn is_complete(&self) -> bool {
        self.documents.all_approved()
    }
}

impl Default for AdminRecord {
    fn default() -> Self {
        Self::missing()
    }
}

// ============================================================================
// Store wire types
// ============================================================================

/// A document as delivered by a collection subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub data: Value,
}

/// One delivery of a collection subscription: the full current contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub snapshot_id: u64,
    pub documents: Vec<RawDocument>,
}

/// One delivery of a single-document subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub exists: bool,
    pub data: Option<Value>,
}

/// A full-document write inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentWrite {
    pub path: String,
    pub data: Map<String, Value>,
}

// ============================================================================
// Tests
// ============================================================================
