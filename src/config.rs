//! Deployment configuration: collection size, stage bands, tracked kinds and
//! store paths.
//!
//! Loaded from TOML; every field has a default matching the reference
//! deployment (114 units in four stages, six tracked document kinds).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{DocumentKey, DocumentKind};

/// Maximum stage value accepted in a band.
pub const MAX_STAGE: u8 = 4;

// ============================================================================
// StageBand
// ============================================================================

/// Inclusive range of unit numbers assigned to one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageBand {
    pub start: u32,
    pub end: u32,
    pub stage: u8,
}

impl StageBand {
    pub const fn new(start: u32, end: u32, stage: u8) -> Self {
        Self { start, end, stage }
    }

    pub fn contains(&self, number: u32) -> bool {
        (self.start..=self.end).contains(&number)
    }
}

/// Bands of the reference deployment.
pub fn default_bands() -> Vec<StageBand> {
    vec![
        StageBand::new(1, 34, 1),
        StageBand::new(35, 62, 2),
        StageBand::new(63, 88, 3),
        StageBand::new(89, 114, 4),
    ]
}

// ============================================================================
// RegistryConfig
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Namespace of the deployment inside the store.
    pub app_id: String,
    /// Number of units created by seeding (`N`).
    pub unit_count: u32,
    /// Unit ids are `unit_id_prefix + number`.
    pub unit_id_prefix: String,
    /// Contiguous bands starting at 1; the last band absorbs numbers past its end.
    pub stage_bands: Vec<StageBand>,
    /// Kinds that count toward completeness and metrics.
    pub tracked_kinds: Vec<DocumentKind>,
    /// Seed the collection when a snapshot reports it empty.
    pub seed_on_empty: bool,
    /// Default page size for views.
    pub page_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            app_id: "residencial-docs-v1".to_string(),
            unit_count: 114,
            unit_id_prefix: "unit-".to_string(),
            stage_bands: default_bands(),
            tracked_kinds: DocumentKind::ALL.to_vec(),
            seed_on_empty: true,
            page_size: 20,
        }
    }
}

impl RegistryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the deployment id used in every document path.
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Set how many units the seeder creates.
    pub fn with_unit_count(mut self, unit_count: u32) -> Self {
        self.unit_count = unit_count;
        self
    }

    /// Replace the stage bands. They must be contiguous from 1.
    pub fn with_bands(mut self, bands: Vec<StageBand>) -> Self {
        self.stage_bands = bands;
        self
    }

    /// Replace the tracked document kinds.
    pub fn with_tracked_kinds(mut self, kinds: Vec<DocumentKind>) -> Self {
        self.tracked_kinds = kinds;
        self
    }

    /// Whether an empty collection triggers seeding.
    pub fn with_seed_on_empty(mut self, seed: bool) -> Self {
        self.seed_on_empty = seed;
        self
    }

    /// Check the invariants the seeder and mirror rely on: contiguous bands
    /// starting at 1, valid stages, at least one tracked kind without duplicates
    /// and a non-zero page size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unit_count == 0 {
            return Err(ConfigError::InvalidUnitCount(self.unit_count));
        }
        if self.stage_bands.is_empty() {
            return Err(ConfigError::NoBands);
        }

        let mut expected = 1u32;
        for (index, band) in self.stage_bands.iter().enumerate() {
            if band.start != expected {
                return Err(ConfigError::NonContiguousBand {
                    index,
                    expected,
                    start: band.start,
                });
            }
            if band.end < band.start {
                return Err(ConfigError::InvertedBand {
                    index,
                    start: band.start,
                    end: band.end,
                });
            }
            if band.stage == 0 || band.stage > MAX_STAGE {
                return Err(ConfigError::InvalidStage(band.stage));
            }
            expected = band.end.saturating_add(1);
        }

        if self.tracked_kinds.is_empty() {
            return Err(ConfigError::NoTrackedKinds);
        }
        let mut seen = HashSet::new();
        for kind in &self.tracked_kinds {
            if !seen.insert(*kind) {
                return Err(ConfigError::DuplicateKind(kind.name().to_string()));
            }
        }

        if self.page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }
        Ok(())
    }

    /// Distinct stage values, ascending.
    pub fn stages(&self) -> Vec<u8> {
        let mut stages: Vec<u8> = self.stage_bands.iter().map(|b| b.stage).collect();
        stages.sort_unstable();
        stages.dedup();
        stages
    }

    pub fn is_tracked(&self, kind: DocumentKind) -> bool {
        self.tracked_kinds.contains(&kind)
    }

    /// Document id of unit `number`.
    pub fn unit_id(&self, number: u32) -> String {
        format!("{}{}", self.unit_id_prefix, number)
    }

    pub fn paths(&self) -> StorePaths {
        StorePaths::new(&self.app_id)
    }
}

// ============================================================================
// StorePaths
// ============================================================================

/// Document paths of one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: String,
}

impl StorePaths {
    pub fn new(app_id: &str) -> Self {
        Self {
            root: format!("artifacts/{app_id}/public/data"),
        }
    }

    /// `artifacts/<app_id>/public/data/houses`
    pub fn units_collection(&self) -> String {
        format!("{}/houses", self.root)
    }

    pub fn unit_document(&self, id: &str) -> String {
        format!("{}/houses/{id}", self.root)
    }

    /// `artifacts/<app_id>/public/data/admin/general`
    pub fn admin_document(&self) -> String {
        format!("{}/admin/general", self.root)
    }
}

// ============================================================================
// Tests
// ============================================================================
