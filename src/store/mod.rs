//! Record store boundary.
//!
//! - [`traits`] — the [`RecordStore`] contract consumed by the rest of the crate.
//! - [`subscription`] — RAII [`Subscription`] handle around an [`Unsubscribe`].
//! - [`memory`] — [`MemoryStore`], an in-process store with the same merge,
//!   batch and snapshot semantics.

pub mod memory;
pub mod subscription;
pub mod traits;

pub use memory::MemoryStore;
pub use subscription::Subscription;
pub use traits::{
    CollectionCallback, DocumentCallback, ErrorCallback, RecordStore, Unsubscribe,
};
