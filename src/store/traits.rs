//! The record store contract.
//!
//! Subscriptions are callback based: the store calls `on_snapshot` with the
//! full current state once on subscribe and again after every change, in the
//! order it produces them, and `on_error` when the subscription fails.
//! Writes are `async` and resolve once the store has acknowledged them.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::types::{CollectionSnapshot, DocumentSnapshot, DocumentWrite};

/// An owned one-shot closure that cancels a subscription when called.
pub type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Receives every snapshot of a collection subscription.
pub type CollectionCallback = Arc<dyn Fn(CollectionSnapshot) + Send + Sync>;
pub type DocumentCallback = Arc<dyn Fn(DocumentSnapshot) + Send + Sync>;
/// Receives subscription failures. The subscription may deliver again later.
pub type ErrorCallback = Arc<dyn Fn(StoreError) + Send + Sync>;

/// A remote document store with live subscriptions.
///
/// Implementations must deliver each subscription's snapshots in order and
/// must not hold internal locks while calling back.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Watch every document directly under `path`.
    fn subscribe_collection(
        &self,
        path: &str,
        on_snapshot: CollectionCallback,
        on_error: ErrorCallback,
    ) -> Unsubscribe;

    /// Watch the single document at `path`.
    fn subscribe_document(
        &self,
        path: &str,
        on_snapshot: DocumentCallback,
        on_error: ErrorCallback,
    ) -> Unsubscribe;

    /// Replace every listed document atomically: all writes land or none do.
    async fn write_batch(&self, writes: Vec<DocumentWrite>) -> Result<(), StoreError>;

    /// Merge top-level `fields` into the document at `path`, creating it if
    /// absent. Fields not listed are left untouched.
    async fn merge_write(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Create the document at `path` with `fields` only if it does not exist.
    /// Returns `false`, writing nothing, when a document is already there.
    async fn create_document(&self, path: &str, fields: Map<String, Value>) -> Result<bool, StoreError>;
}
