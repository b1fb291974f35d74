//! Fixtures shared by the integration test targets.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dossier_db::config::{RegistryConfig, StageBand};
use dossier_db::store::MemoryStore;
use dossier_db::types::{DocStatus, DocumentKey, DocumentKind, DocumentSet, UnitRecord};

/// Install a test-writer subscriber once; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const WAIT: Duration = Duration::from_secs(2);

/// A unit tracking every kind, with `approved` set to `OK`.
pub fn unit(number: u32, stage: u8, approved: &[DocumentKind]) -> UnitRecord {
    unit_with(number, stage, DocumentKind::ALL, approved)
}

pub fn unit_with(
    number: u32,
    stage: u8,
    tracked: &[DocumentKind],
    approved: &[DocumentKind],
) -> UnitRecord {
    let mut docs = DocumentSet::pending(tracked);
    for kind in approved {
        docs.set(*kind, DocStatus::Approved);
    }
    UnitRecord::new(format!("unit-{number}"), number, stage, docs, None)
}

pub fn numbers(units: &[UnitRecord]) -> Vec<u32> {
    units.iter().map(|u| u.number).collect()
}

/// Ten units in two stages.
pub fn small_config() -> RegistryConfig {
    RegistryConfig::default()
        .with_app_id("test-app")
        .with_unit_count(10)
        .with_bands(vec![StageBand::new(1, 4, 1), StageBand::new(5, 10, 2)])
}

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}
