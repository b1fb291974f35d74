use thiserror::Error;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failures reported by (or about) the record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store cannot be used at all. Fatal for the whole session.
    #[error("Record store is not configured: {reason}")]
    ConfigurationMissing { reason: String },

    /// A live subscription failed. The mirror keeps serving its last snapshot.
    #[error("Subscription to \"{path}\" failed: {message}")]
    Subscription { path: String, message: String },

    /// A write was rejected. The mutation is dropped, never retried.
    #[error("Write to \"{path}\" failed: {message}")]
    Write { path: String, message: String },
}

// ---------------------------------------------------------------------------
// MutationError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Cannot modify immutable field \"{field}\"")]
    ImmutableField { field: String },

    #[error("Field \"{field}\" is managed by the gateway and cannot be written directly")]
    ReservedField { field: String },

    #[error("Unknown field \"{field}\"")]
    UnknownField { field: String },

    #[error("Invalid status {value} for field \"{field}\"")]
    InvalidStatus { field: String, value: String },

    #[error("Document kind \"{kind}\" is not tracked by this deployment")]
    UntrackedKind { kind: String },

    #[error("Unit \"{id}\" does not exist")]
    UnknownUnit { id: String },

    /// No unit snapshot has arrived yet, so ids cannot be checked.
    #[error("Unit records are not loaded yet")]
    NotReady,

    #[error("Patch contains no changes")]
    EmptyPatch,
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unit count must be at least 1, got {0}")]
    InvalidUnitCount(u32),

    #[error("At least one stage band is required")]
    NoBands,

    #[error("Stage band #{index} must start at {expected}, starts at {start}")]
    NonContiguousBand {
        index: usize,
        expected: u32,
        start: u32,
    },

    #[error("Stage band #{index} is inverted: {start}..={end}")]
    InvertedBand { index: usize, start: u32, end: u32 },

    #[error("Stage {0} is outside 1..=4")]
    InvalidStage(u8),

    #[error("At least one document kind must be tracked")]
    NoTrackedKinds,

    #[error("Document kind \"{0}\" is tracked more than once")]
    DuplicateKind(String),

    #[error("Page size must be at least 1")]
    InvalidPageSize,

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// DossierError — top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DossierError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DossierError {
    /// True for failures that end the session (nothing can be read or written).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::ConfigurationMissing { .. }) | Self::Config(_)
        )
    }
}

/// Convenience alias — the default error type is `DossierError`.
pub type Result<T, E = DossierError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
