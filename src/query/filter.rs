//! Unit filters: a conjunction of independent predicates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DocStatus, DocumentKind, UnitRecord};

/// Global completeness of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Completion {
    /// Every tracked kind approved.
    Complete,
    Incomplete,
}

impl Completion {
    pub fn of(unit: &UnitRecord) -> Self {
        if unit.is_complete() {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }
}

/// One active filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Stage(u8),
    Completion(Completion),
    Document(DocumentKind, DocStatus),
    /// Substring of the decimal unit number.
    NumberContains(String),
}

impl Predicate {
    pub fn matches(&self, unit: &UnitRecord) -> bool {
        match self {
            Self::Stage(stage) => unit.stage == *stage,
            Self::Completion(c) => Completion::of(unit) == *c,
            Self::Document(kind, status) => unit.status(*kind) == *status,
            Self::NumberContains(needle) => unit.number.to_string().contains(needle.as_str()),
        }
    }
}

/// Filter state. Every field defaults to "match all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFilter {
    pub stage: Option<u8>,
    pub completion: Option<Completion>,
    pub documents: BTreeMap<DocumentKind, DocStatus>,
    /// An empty string matches every unit.
    pub number_contains: Option<String>,
}

impl UnitFilter {
    /// A filter that matches every unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only units in `stage`.
    pub fn with_stage(mut self, stage: u8) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Require `kind` to be in `status`. One condition per kind.
    pub fn with_document(mut self, kind: DocumentKind, status: DocStatus) -> Self {
        self.documents.insert(kind, status);
        self
    }

    /// Keep units whose number contains `needle` as decimal text. An empty
    /// needle matches everything.
    pub fn with_number_search(mut self, needle: impl Into<String>) -> Self {
        self.number_contains = Some(needle.into());
        self
    }

    /// True when no condition is active.
    pub fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }

    /// Active predicates. Their order carries no meaning.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(stage) = self.stage {
            predicates.push(Predicate::Stage(stage));
        }
        if let Some(completion) = self.completion {
            predicates.push(Predicate::Completion(completion));
        }
        for (kind, status) in &self.documents {
            predicates.push(Predicate::Document(*kind, *status));
        }
        if let Some(needle) = self.number_contains.as_ref().filter(|n| !n.is_empty()) {
            predicates.push(Predicate::NumberContains(needle.clone()));
        }
        predicates
    }

    pub fn matches(&self, unit: &UnitRecord) -> bool {
        self.predicates().iter().all(|p| p.matches(unit))
    }
}

/// Units matching every predicate of `filter`, in input order.
pub fn filter_units(units: &[UnitRecord], filter: &UnitFilter) -> Vec<UnitRecord> {
    let predicates = filter.predicates();
    units
        .iter()
        .filter(|u| predicates.iter().all(|p| p.matches(u)))
        .cloned()
        .collect()
}

/// Narrow `units` one predicate at a time, in the given order.
pub fn apply_predicates(units: &[UnitRecord], predicates: &[Predicate]) -> Vec<UnitRecord> {
    let mut current = units.to_vec();
    for predicate in predicates {
        current.retain(|u| predicate.matches(u));
    }
    current
}
