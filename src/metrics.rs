//! Metrics Engine: completion statistics over a set of units.
//!
//! Two schemes are reported side by side. Closure counts a unit only when every
//! tracked kind is approved; progress counts each approved kind. Closure can
//! never exceed progress for the same set.

use serde::Serialize;

use crate::config::MAX_STAGE;
use crate::types::{AdminRecord, DocumentKind, UnitRecord};

/// `numerator / denominator` as a percentage with one decimal, rounded half
/// up. A zero denominator yields `0.0`.
pub fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let num = numerator as u128;
    let den = denominator as u128;
    // Tenths of a percent, rounded half up in integer arithmetic.
    let tenths = (num * 2000 + den) / (2 * den);
    tenths as f64 / 10.0
}

/// Counts and both completion percentages for one set of units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletionStats {
    pub total: usize,
    pub complete: usize,
    pub approved_kinds: usize,
    pub possible_kinds: usize,
    /// Complete units over all units.
    pub closure_pct: f64,
    /// Approved kinds over all tracked kind slots.
    pub progress_pct: f64,
}

impl CompletionStats {
    fn from_units<'a>(units: impl IntoIterator<Item = &'a UnitRecord>, tracked: usize) -> Self {
        let mut total = 0;
        let mut complete = 0;
        let mut approved_kinds = 0;
        for unit in units {
            total += 1;
            if unit.is_complete() {
                complete += 1;
            }
            approved_kinds += unit.progress.approved;
        }
        let possible_kinds = total * tracked;
        Self {
            total,
            complete,
            approved_kinds,
            possible_kinds,
            closure_pct: percentage(complete, total),
            progress_pct: percentage(approved_kinds, possible_kinds),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageStats {
    pub stage: u8,
    pub stats: CompletionStats,
}

/// Units still missing approval of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bottleneck {
    pub kind: DocumentKind,
    pub outstanding: usize,
}

/// Everything the dashboard header shows for the filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub global: CompletionStats,
    /// One entry per stage 1..=4, including empty stages.
    pub stages: Vec<StageStats>,
    /// One entry per tracked kind, in declaration order.
    pub bottlenecks: Vec<Bottleneck>,
}

impl Metrics {
    pub fn stage(&self, stage: u8) -> Option<&StageStats> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// The kind with the most outstanding units. Ties go to the kind declared
    /// first; `None` when nothing is outstanding.
    pub fn top_bottleneck(&self) -> Option<Bottleneck> {
        self.bottlenecks
            .iter()
            .filter(|b| b.outstanding > 0)
            .fold(None, |best: Option<Bottleneck>, b| match best {
                Some(best) if best.outstanding >= b.outstanding => Some(best),
                _ => Some(*b),
            })
    }
}

/// Compute every metric for `units` against `tracked_kinds`.
pub fn compute_metrics(units: &[UnitRecord], tracked_kinds: &[DocumentKind]) -> Metrics {
    let tracked = tracked_kinds.len();
    let global = CompletionStats::from_units(units, tracked);

    let stages = (1..=MAX_STAGE)
        .map(|stage| StageStats {
            stage,
            stats: CompletionStats::from_units(units.iter().filter(|u| u.stage == stage), tracked),
        })
        .collect();

    let mut kinds = tracked_kinds.to_vec();
    kinds.sort();
    kinds.dedup();
    let bottlenecks = kinds
        .into_iter()
        .map(|kind| Bottleneck {
            kind,
            outstanding: units
                .iter()
                .filter(|u| !u.status(kind).is_approved())
                .count(),
        })
        .collect();

    Metrics {
        global,
        stages,
        bottlenecks,
    }
}

/// Approved over total administration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdminStats {
    pub approved: usize,
    pub total: usize,
    pub pct: f64,
}

/// Approved over total kinds of the administration record.
pub fn admin_metrics(admin: &AdminRecord) -> AdminStats {
    let total = admin.documents.len();
    let approved = admin.documents.approved_count();
    AdminStats {
        approved,
        total,
        pct: percentage(approved, total),
    }
}
