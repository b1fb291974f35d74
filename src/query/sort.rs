//! Single-key stable sorting of units.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{DocumentKind, UnitRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Column a unit table can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Number,
    Stage,
    Document(DocumentKind),
}

/// The active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Same key flips the direction; a new key starts ascending.
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }

    /// By-value form of [`toggle`](Self::toggle).
    pub fn toggled(mut self, key: SortKey) -> Self {
        self.toggle(key);
        self
    }
}

/// Ascending comparison of two units on `key`.
///
/// Numbers and stages compare arithmetically. Document statuses compare by
/// their wire label as plain strings.
pub fn compare_units(a: &UnitRecord, b: &UnitRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Number => a.number.cmp(&b.number),
        SortKey::Stage => a.stage.cmp(&b.stage),
        SortKey::Document(kind) => a.status(kind).label().cmp(b.status(kind).label()),
    }
}

/// Sorted copy of `units`. Ties keep their input order in both directions.
pub fn sort_units(mut units: Vec<UnitRecord>, sort: &SortState) -> Vec<UnitRecord> {
    units.sort_by(|a, b| {
        let cmp = compare_units(a, b, sort.key);
        match sort.direction {
            SortDirection::Asc => cmp,
            SortDirection::Desc => cmp.reverse(),
        }
    });
    units
}
