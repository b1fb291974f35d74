//! Sync mirror — the in-process copy of the unit collection and the
//! administration singleton.
//!
//! - [`normalize`] — raw document decoding with `Pending` fallbacks.
//! - [`event`] — [`MirrorStatus`] and [`MirrorEvent`].
//! - [`sync_mirror`] — [`SyncMirror`], the snapshot owner.

pub mod event;
pub mod normalize;
pub mod sync_mirror;

pub use event::{MirrorEvent, MirrorStatus};
pub use normalize::{decode_status, normalize_admin, normalize_unit, normalize_units};
pub use sync_mirror::{MirrorSnapshot, SyncMirror};
