//! Tests for unit filters.

use dossier_db::query::{apply_predicates, filter_units, Completion, Predicate, UnitFilter};
use dossier_db::types::{DocStatus, DocumentKey, DocumentKind, DocumentSet, UnitRecord};
use proptest::prelude::*;

use crate::support::{numbers, unit};

fn status_strategy() -> impl Strategy<Value = DocStatus> {
    prop_oneof![
        Just(DocStatus::Pending),
        Just(DocStatus::InReview),
        Just(DocStatus::Approved),
    ]
}

fn unit_strategy() -> impl Strategy<Value = UnitRecord> {
    (
        1u32..150,
        1u8..=4,
        proptest::collection::vec(status_strategy(), DocumentKind::ALL.len()),
    )
        .prop_map(|(number, stage, statuses)| {
            let mut docs = DocumentSet::pending(DocumentKind::ALL);
            for (kind, status) in DocumentKind::ALL.iter().zip(statuses) {
                docs.set(*kind, status);
            }
            UnitRecord::new(format!("unit-{number}"), number, stage, docs, None)
        })
}

fn filter_strategy() -> impl Strategy<Value = UnitFilter> {
    (
        proptest::option::of(1u8..=4),
        proptest::option::of(prop_oneof![
            Just(Completion::Complete),
            Just(Completion::Incomplete)
        ]),
        proptest::option::of((0..DocumentKind::ALL.len(), status_strategy())),
        proptest::option::of("[0-9]{0,2}"),
    )
        .prop_map(|(stage, completion, document, search)| {
            let mut filter = UnitFilter::new();
            filter.stage = stage;
            filter.completion = completion;
            if let Some((index, status)) = document {
                filter.documents.insert(DocumentKind::ALL[index], status);
            }
            filter.number_contains = search;
            filter
        })
}

// ============================================================================
// Individual predicates
// ============================================================================

#[test]
fn stage_predicate_matches_exactly() {
    let units = vec![unit(1, 1, &[]), unit(40, 2, &[]), unit(41, 2, &[])];
    let result = filter_units(&units, &UnitFilter::new().with_stage(2));
    assert_eq!(numbers(&result), [40, 41]);
}

#[test]
fn in_review_does_not_count_as_approved() {
    let reviewed = UnitRecord::new(
        "unit-7",
        7,
        1,
        DocumentSet::pending(DocumentKind::ALL).with(DocumentKind::Ine, DocStatus::InReview),
        None,
    );
    let units = vec![reviewed, unit(8, 1, &[DocumentKind::Ine])];
    let result = filter_units(
        &units,
        &UnitFilter::new().with_document(DocumentKind::Ine, DocStatus::Approved),
    );
    assert_eq!(numbers(&result), [8]);
}

#[test]
fn search_matches_decimal_text() {
    let units: Vec<UnitRecord> = (1..=114).map(|n| unit(n, 1, &[])).collect();
    let result = filter_units(&units, &UnitFilter::new().with_number_search("11"));
    assert_eq!(numbers(&result), [11, 110, 111, 112, 113, 114]);
}

#[test]
fn input_is_left_untouched() {
    let units = vec![unit(2, 1, &[]), unit(1, 1, &[])];
    let before = units.clone();
    let _ = filter_units(&units, &UnitFilter::new().with_stage(1));
    assert_eq!(units, before);
}

// ============================================================================
// Conjunction
// ============================================================================

#[test]
fn stage_then_document_equals_document_then_stage() {
    // Six stage-2 units, two of them fully approved, plus stage-1 noise.
    let mut units = vec![unit(1, 1, DocumentKind::ALL), unit(2, 1, &[])];
    units.extend((5..=10).map(|n| {
        if n == 6 || n == 9 {
            unit(n, 2, DocumentKind::ALL)
        } else {
            unit(n, 2, &[DocumentKind::Fachada])
        }
    }));

    let stage = Predicate::Stage(2);
    let approved = Predicate::Document(DocumentKind::Ine, DocStatus::Approved);
    let a = apply_predicates(&units, &[stage.clone(), approved.clone()]);
    let b = apply_predicates(&units, &[approved, stage]);
    assert_eq!(numbers(&a), [6, 9]);
    assert_eq!(a, b);

    let filter = UnitFilter::new()
        .with_stage(2)
        .with_document(DocumentKind::Ine, DocStatus::Approved);
    assert_eq!(filter_units(&units, &filter), a);
}

proptest! {
    #[test]
    fn predicate_order_never_changes_the_result(
        units in proptest::collection::vec(unit_strategy(), 0..40),
        filter in filter_strategy(),
    ) {
        let forward = filter.predicates();
        let mut backward = forward.clone();
        backward.reverse();
        let mut rotated = forward.clone();
        if !rotated.is_empty() {
            rotated.rotate_left(1);
        }

        let expected = filter_units(&units, &filter);
        prop_assert_eq!(&apply_predicates(&units, &forward), &expected);
        prop_assert_eq!(&apply_predicates(&units, &backward), &expected);
        prop_assert_eq!(&apply_predicates(&units, &rotated), &expected);
    }

    #[test]
    fn completion_partitions_the_set(units in proptest::collection::vec(unit_strategy(), 0..40)) {
        let complete = filter_units(&units, &UnitFilter::new().with_completion(Completion::Complete));
        let incomplete = filter_units(&units, &UnitFilter::new().with_completion(Completion::Incomplete));
        prop_assert_eq!(complete.len() + incomplete.len(), units.len());
        prop_assert!(complete.iter().all(|u| u.documents.all_approved()));
    }
}
