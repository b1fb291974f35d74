//! Tests for unit sorting.

use dossier_db::query::{sort_units, SortDirection, SortKey, SortState};
use dossier_db::types::{DocStatus, DocumentKind, DocumentSet, UnitRecord};
use proptest::prelude::*;

use crate::support::{numbers, unit};

fn with_fachada(number: u32, status: DocStatus) -> UnitRecord {
    let docs = DocumentSet::pending(&[DocumentKind::Fachada]).with(DocumentKind::Fachada, status);
    UnitRecord::new(format!("unit-{number}"), number, 1, docs, None)
}

fn by(key: SortKey, direction: SortDirection) -> SortState {
    SortState::new(key, direction)
}

#[test]
fn number_descending() {
    let units = vec![unit(3, 1, &[]), unit(1, 1, &[]), unit(2, 1, &[])];
    let sorted = sort_units(units, &by(SortKey::Number, SortDirection::Desc));
    assert_eq!(numbers(&sorted), [3, 2, 1]);
}

#[test]
fn numbers_compare_arithmetically() {
    let units = vec![unit(100, 1, &[]), unit(9, 1, &[]), unit(20, 1, &[])];
    let sorted = sort_units(units, &SortState::default());
    assert_eq!(numbers(&sorted), [9, 20, 100]);
}

#[test]
fn stage_ties_keep_input_order() {
    let units = vec![unit(8, 2, &[]), unit(3, 1, &[]), unit(5, 2, &[]), unit(1, 1, &[])];
    let asc = sort_units(units.clone(), &by(SortKey::Stage, SortDirection::Asc));
    assert_eq!(numbers(&asc), [3, 1, 8, 5]);
    let desc = sort_units(units, &by(SortKey::Stage, SortDirection::Desc));
    assert_eq!(numbers(&desc), [8, 5, 3, 1]);
}

#[test]
fn document_ties_keep_original_relative_order() {
    let units = vec![
        with_fachada(3, DocStatus::Approved),
        with_fachada(1, DocStatus::Pending),
        with_fachada(2, DocStatus::Approved),
    ];
    let key = SortKey::Document(DocumentKind::Fachada);
    let asc = sort_units(units.clone(), &by(key, SortDirection::Asc));
    assert_eq!(numbers(&asc), [3, 2, 1]);
    let desc = sort_units(units, &by(key, SortDirection::Desc));
    assert_eq!(numbers(&desc), [1, 3, 2]);
}

#[test]
fn header_clicks_cycle_direction() {
    let mut sort = SortState::default();
    let key = SortKey::Document(DocumentKind::Gravamen);
    sort.toggle(key);
    assert_eq!(sort, by(key, SortDirection::Asc));
    sort.toggle(key);
    assert_eq!(sort, by(key, SortDirection::Desc));
    sort.toggle(SortKey::Number);
    assert_eq!(sort, by(SortKey::Number, SortDirection::Asc));
}

fn status_strategy() -> impl Strategy<Value = DocStatus> {
    prop_oneof![
        Just(DocStatus::Pending),
        Just(DocStatus::InReview),
        Just(DocStatus::Approved),
    ]
}

proptest! {
    #[test]
    fn ties_keep_relative_order_in_both_directions(
        statuses in proptest::collection::vec(status_strategy(), 0..60),
        descending in any::<bool>(),
    ) {
        // Input position doubles as the unit number.
        let units: Vec<UnitRecord> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| with_fachada(i as u32 + 1, *s))
            .collect();
        let direction = if descending { SortDirection::Desc } else { SortDirection::Asc };
        let sorted = sort_units(units, &by(SortKey::Document(DocumentKind::Fachada), direction));

        for pair in sorted.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (la, lb) = (a.status(DocumentKind::Fachada).label(), b.status(DocumentKind::Fachada).label());
            if descending {
                prop_assert!(la >= lb);
            } else {
                prop_assert!(la <= lb);
            }
            if la == lb {
                prop_assert!(a.number < b.number);
            }
        }
    }
}
