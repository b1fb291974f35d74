//! Seeder — one-shot population of the unit collection.
//!
//! Ids are a pure function of the unit number, so running the seed twice
//! (two observers both seeing an empty collection) writes the same documents
//! twice and converges instead of duplicating units.

use std::sync::Arc;

use crate::config::{RegistryConfig, StageBand};
use crate::error::Result;
use crate::store::RecordStore;
use crate::types::{now_millis, DocumentSet, DocumentWrite, UnitRecord};

/// Stage of `number` under `bands`.
///
/// Numbers past the last band take the last band's stage; numbers before the
/// first band (only 0 for a valid config) take the first band's stage.
pub fn stage_for_number(bands: &[StageBand], number: u32) -> u8 {
    if let Some(band) = bands.iter().find(|b| b.contains(number)) {
        return band.stage;
    }
    match (bands.first(), bands.last()) {
        (Some(first), _) if number < first.start => first.stage,
        (_, Some(last)) => last.stage,
        _ => 1,
    }
}

/// The unit record seeding creates for `number`.
pub fn seed_unit(config: &RegistryConfig, number: u32, now: i64) -> UnitRecord {
    UnitRecord::new(
        config.unit_id(number),
        number,
        stage_for_number(&config.stage_bands, number),
        DocumentSet::pending(&config.tracked_kinds),
        Some(now),
    )
}

/// Full-document writes for units `1..=unit_count`.
pub fn plan_seed(config: &RegistryConfig, now: i64) -> Vec<DocumentWrite> {
    let paths = config.paths();
    (1..=config.unit_count)
        .map(|number| {
            let unit = seed_unit(config, number, now);
            DocumentWrite {
                path: paths.unit_document(&unit.id),
                data: unit.to_fields(),
            }
        })
        .collect()
}

/// Populates an empty unit collection.
///
/// The whole plan goes out as one atomic batch, so a failed attempt leaves the
/// collection empty and the next empty snapshot can try again.
#[derive(Debug, Clone)]
pub struct Seeder {
    config: Arc<RegistryConfig>,
}

impl Seeder {
    pub fn new(config: Arc<RegistryConfig>) -> Self {
        Self { config }
    }

    /// Seed with the current time. Returns the number of units written.
    pub async fn seed(&self, store: &dyn RecordStore) -> Result<usize> {
        self.seed_at(store, now_millis()).await
    }

    /// Submit the whole plan as one atomic batch stamped with `now`.
    pub async fn seed_at(&self, store: &dyn RecordStore, now: i64) -> Result<usize> {
        let writes = plan_seed(&self.config, now);
        let count = writes.len();
        tracing::info!(
            units = count,
            app_id = %self.config.app_id,
            "seeding empty unit collection"
        );
        if let Err(e) = store.write_batch(writes).await {
            tracing::warn!(error = %e, "seed batch rejected; collection stays empty");
            return Err(e.into());
        }
        tracing::debug!(units = count, "seed batch committed");
        Ok(count)
    }
}
