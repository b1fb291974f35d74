//! Decoding of raw store documents into fully populated records.
//!
//! This is the only place that looks at raw fields. Absent or unreadable
//! statuses become `Pending`; nothing is written back.

use serde_json::Value;

use crate::config::RegistryConfig;
use crate::seed::stage_for_number;
use crate::types::{
    AdminDocumentKind, AdminRecord, DocStatus, DocumentKey, DocumentSet, DocumentSnapshot,
    RawDocument, UnitRecord, FIELD_NUMBER, FIELD_STAGE, FIELD_UPDATED_AT,
};

/// Decode a status field. Missing, non-string and unknown labels read as
/// `Pending`.
pub fn decode_status(field: &str, value: Option<&Value>) -> DocStatus {
    match value {
        None | Some(Value::Null) => DocStatus::Pending,
        Some(Value::String(label)) => DocStatus::from_label(label).unwrap_or_else(|| {
            tracing::debug!(field = %field, label = %label, "unknown status label, reading as pending");
            DocStatus::Pending
        }),
        Some(other) => {
            tracing::debug!(field = %field, value = %other, "non-string status, reading as pending");
            DocStatus::Pending
        }
    }
}

fn decode_positive_int(value: Option<&Value>) -> Option<u64> {
    let decoded = match value? {
        Value::Number(n) => match n.as_u64() {
            Some(v) => Some(v),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u64),
        },
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    decoded.filter(|v| *v > 0)
}

fn decode_timestamp(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

fn decode_documents<K: DocumentKey>(data: &Value, kinds: &[K]) -> DocumentSet<K> {
    let mut documents = DocumentSet::pending(kinds);
    for kind in kinds {
        documents.set(*kind, decode_status(kind.field(), data.get(kind.field())));
    }
    documents
}

/// Decode one unit. Returns `None` when the document has no usable number.
///
/// A missing or out-of-range stage falls back to the band of the number, the
/// value seeding would have written.
pub fn normalize_unit(doc: &RawDocument, config: &RegistryConfig) -> Option<UnitRecord> {
    let number = match decode_positive_int(doc.data.get(FIELD_NUMBER)) {
        Some(n) if n <= u32::MAX as u64 => n as u32,
        _ => {
            tracing::warn!(id = %doc.id, "unit document without a usable number; skipped");
            return None;
        }
    };

    let stage = decode_positive_int(doc.data.get(FIELD_STAGE))
        .filter(|s| *s <= crate::config::MAX_STAGE as u64)
        .map(|s| s as u8)
        .unwrap_or_else(|| stage_for_number(&config.stage_bands, number));

    Some(UnitRecord::new(
        doc.id.clone(),
        number,
        stage,
        decode_documents(&doc.data, &config.tracked_kinds),
        decode_timestamp(doc.data.get(FIELD_UPDATED_AT)),
    ))
}

/// Decode a whole collection snapshot, ordered by ascending unit number.
///
/// The sort is stable, so duplicate numbers keep the store's delivery order.
pub fn normalize_units(docs: &[RawDocument], config: &RegistryConfig) -> Vec<UnitRecord> {
    let mut units: Vec<UnitRecord> = docs
        .iter()
        .filter_map(|doc| normalize_unit(doc, config))
        .collect();
    units.sort_by_key(|u| u.number);
    units
}

/// Decode the administration document. Absent reads as all pending.
pub fn normalize_admin(snapshot: &DocumentSnapshot) -> AdminRecord {
    match (&snapshot.data, snapshot.exists) {
        (Some(data), true) => AdminRecord {
            documents: decode_documents(data, AdminDocumentKind::ALL),
            updated_at: decode_timestamp(data.get(FIELD_UPDATED_AT)),
            exists: true,
        },
        _ => AdminRecord::missing(),
    }
}
