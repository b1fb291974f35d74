//! Legacy documents must behave exactly like their explicit-`Pendiente` twins.

use dossier_db::config::RegistryConfig;
use dossier_db::metrics::compute_metrics;
use dossier_db::mirror::{normalize_admin, normalize_units};
use dossier_db::query::{filter_units, Completion, UnitFilter};
use dossier_db::types::{
    AdminDocumentKind, DocStatus, DocumentKey, DocumentKind, DocumentSnapshot, RawDocument,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn raw(number: u32, fields: Map<String, Value>) -> RawDocument {
    let mut data = fields;
    data.insert("numero".to_string(), json!(number));
    data.insert("etapa".to_string(), json!(1 + number % 4));
    RawDocument {
        id: format!("unit-{number}"),
        data: Value::Object(data),
    }
}

fn label_strategy() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        Just(None),
        Just(Some("Pendiente")),
        Just(Some("Revisión")),
        Just(Some("OK")),
    ]
}

/// Per unit: an optional label for each kind (None = field absent).
fn legacy_units() -> impl Strategy<Value = Vec<Vec<Option<&'static str>>>> {
    proptest::collection::vec(
        proptest::collection::vec(label_strategy(), DocumentKind::ALL.len()),
        1..30,
    )
}

fn build(units: &[Vec<Option<&'static str>>], explicit: bool) -> Vec<RawDocument> {
    units
        .iter()
        .enumerate()
        .map(|(i, labels)| {
            let mut fields = Map::new();
            for (kind, label) in DocumentKind::ALL.iter().zip(labels) {
                match (label, explicit) {
                    (Some(l), _) => {
                        fields.insert(kind.field().to_string(), json!(l));
                    }
                    (None, true) => {
                        fields.insert(kind.field().to_string(), json!("Pendiente"));
                    }
                    (None, false) => {}
                }
            }
            raw(i as u32 + 1, fields)
        })
        .collect()
}

#[test]
fn unit_with_only_original_kinds_is_filled() {
    let config = RegistryConfig::default();
    let mut fields = Map::new();
    fields.insert("doc_fachada".to_string(), json!("OK"));
    let units = normalize_units(&[raw(5, fields)], &config);
    assert_eq!(units[0].documents.len(), DocumentKind::ALL.len());
    assert_eq!(units[0].status(DocumentKind::Solicitud), DocStatus::Pending);
}

#[test]
fn garbage_labels_read_as_pending() {
    let config = RegistryConfig::default();
    let mut fields = Map::new();
    fields.insert("doc_ine".to_string(), json!("ok"));
    fields.insert("doc_medidor".to_string(), json!(true));
    let units = normalize_units(&[raw(1, fields)], &config);
    assert_eq!(units[0].status(DocumentKind::Ine), DocStatus::Pending);
    assert_eq!(units[0].status(DocumentKind::Medidor), DocStatus::Pending);
}

#[test]
fn admin_document_written_before_new_kinds_is_filled() {
    let admin = normalize_admin(&DocumentSnapshot {
        exists: true,
        data: Some(json!({"doc_acta_asociacion": "OK"})),
    });
    assert_eq!(admin.documents.len(), AdminDocumentKind::ALL.len());
    assert_eq!(admin.status(AdminDocumentKind::ActaAsociacion), DocStatus::Approved);
    assert_eq!(admin.status(AdminDocumentKind::IneAdmin), DocStatus::Pending);
}

proptest! {
    #[test]
    fn missing_fields_equal_explicit_pending(units in legacy_units(), kind_index in 0usize..6) {
        let config = RegistryConfig::default();
        let legacy = normalize_units(&build(&units, false), &config);
        let explicit = normalize_units(&build(&units, true), &config);
        prop_assert_eq!(&legacy, &explicit);

        let kind = DocumentKind::ALL[kind_index];
        for filter in [
            UnitFilter::new().with_document(kind, DocStatus::Pending),
            UnitFilter::new().with_completion(Completion::Incomplete),
            UnitFilter::new().with_stage(2),
        ] {
            prop_assert_eq!(filter_units(&legacy, &filter), filter_units(&explicit, &filter));
        }
        prop_assert_eq!(
            compute_metrics(&legacy, &config.tracked_kinds),
            compute_metrics(&explicit, &config.tracked_kinds)
        );
    }
}
