//! MemoryStore — an in-process [`RecordStore`].
//!
//! Documents live in a `BTreeMap` keyed by full path; a collection is every
//! document whose parent path equals the collection path. Every committed
//! change bumps a sequence number and is broadcast through an
//! [`EventEmitter`]; each subscription listener rebuilds its snapshot from the
//! current state and calls its callback with no lock held.
//!
//! Failure injection (`fail_writes`, `fail_subscriptions`) lets callers drive
//! the error paths of the mirror and the gateway.
//!
//! ## Lock ordering
//!
//! `state` is never held while the emitter runs listeners.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::emitter::EventEmitter;
use crate::error::StoreError;
use crate::types::{CollectionSnapshot, DocumentSnapshot, DocumentWrite, RawDocument};

use super::traits::{
    CollectionCallback, DocumentCallback, ErrorCallback, RecordStore, Unsubscribe,
};

// ============================================================================
// Internal state
// ============================================================================

#[derive(Debug, Clone)]
enum StoreEvent {
    Changed { paths: Vec<String> },
    Failed { path: String, message: String },
}

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<String, Map<String, Value>>,
    sequence: u64,
    write_failure: Option<String>,
    batches: usize,
    merges: usize,
}

impl MemoryState {
    fn collection_snapshot(&self, collection: &str) -> CollectionSnapshot {
        let documents = self
            .documents
            .iter()
            .filter(|(path, _)| parent_path(path) == Some(collection))
            .map(|(path, data)| RawDocument {
                id: document_id(path).to_string(),
                data: Value::Object(data.clone()),
            })
            .collect();
        CollectionSnapshot {
            snapshot_id: self.sequence,
            documents,
        }
    }

    fn document_snapshot(&self, path: &str) -> DocumentSnapshot {
        match self.documents.get(path) {
            Some(data) => DocumentSnapshot {
                exists: true,
                data: Some(Value::Object(data.clone())),
            },
            None => DocumentSnapshot {
                exists: false,
                data: None,
            },
        }
    }
}

fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

fn document_id(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, id)| id).unwrap_or(path)
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process [`RecordStore`] with failure injection.
///
/// Subscriptions are delivered synchronously: the initial snapshot arrives
/// before `subscribe_*` returns and every committed write notifies before
/// the write future resolves.
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    emitter: Arc<EventEmitter<StoreEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            emitter: Arc::new(EventEmitter::new()),
        }
    }

    /// Store pre-populated with raw documents, e.g. legacy records.
    pub fn with_documents<I, P>(documents: I) -> Self
    where
        I: IntoIterator<Item = (P, Value)>,
        P: Into<String>,
    {
        let store = Self::new();
        {
            let mut st = store.state.lock();
            for (path, data) in documents {
                if let Value::Object(fields) = data {
                    st.documents.insert(path.into(), fields);
                }
            }
            st.sequence += 1;
        }
        store
    }

    /// Replace a document outside the write API, as another client would.
    pub fn put_raw(&self, path: impl Into<String>, data: Value) {
        let path = path.into();
        {
            let mut st = self.state.lock();
            match data {
                Value::Object(fields) => {
                    st.documents.insert(path.clone(), fields);
                }
                _ => {
                    st.documents.remove(&path);
                }
            }
            st.sequence += 1;
        }
        self.emitter.emit(&StoreEvent::Changed { paths: vec![path] });
    }

    /// Current body of the document at `path`.
    pub fn document(&self, path: &str) -> Option<Value> {
        self.state
            .lock()
            .documents
            .get(path)
            .map(|fields| Value::Object(fields.clone()))
    }

    /// Number of documents directly under `collection`.
    pub fn collection_len(&self, collection: &str) -> usize {
        self.state
            .lock()
            .documents
            .keys()
            .filter(|path| parent_path(path) == Some(collection))
            .count()
    }

    /// Full snapshot of `collection` without subscribing.
    pub fn collection(&self, collection: &str) -> CollectionSnapshot {
        self.state.lock().collection_snapshot(collection)
    }

    /// Reject every write until [`restore_writes`](Self::restore_writes).
    pub fn fail_writes(&self, message: impl Into<String>) {
        self.state.lock().write_failure = Some(message.into());
    }

    /// Accept writes again after [`fail_writes`](Self::fail_writes).
    pub fn restore_writes(&self) {
        self.state.lock().write_failure = None;
    }

    /// Report a failure to every subscription on `path`.
    pub fn fail_subscriptions(&self, path: impl Into<String>, message: impl Into<String>) {
        self.emitter.emit(&StoreEvent::Failed {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Re-deliver the current state to every subscription on `path`.
    pub fn refresh(&self, path: impl Into<String>) {
        let path = path.into();
        self.state.lock().sequence += 1;
        // A collection subscription matches on the parent of a changed path.
        let changed = format!("{path}/");
        self.emitter.emit(&StoreEvent::Changed {
            paths: vec![path, changed],
        });
    }

    /// Committed `write_batch` calls.
    pub fn batch_count(&self) -> usize {
        self.state.lock().batches
    }

    /// Committed `merge_write` calls.
    pub fn merge_count(&self) -> usize {
        self.state.lock().merges
    }

    /// Live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.emitter.len()
    }

    fn check_writable(&self, st: &MemoryState, path: &str) -> Result<(), StoreError> {
        match &st.write_failure {
            Some(message) => Err(StoreError::Write {
                path: path.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn register(&self, listener: impl Fn(&StoreEvent) + Send + Sync + 'static) -> Unsubscribe {
        let id = self.emitter.on(listener);
        let emitter = Arc::clone(&self.emitter);
        Box::new(move || {
            emitter.off(id);
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn subscribe_collection(
        &self,
        path: &str,
        on_snapshot: CollectionCallback,
        on_error: ErrorCallback,
    ) -> Unsubscribe {
        let collection = path.to_string();
        let state = Arc::clone(&self.state);
        let callback = Arc::clone(&on_snapshot);

        let unsubscribe = self.register(move |event| match event {
            StoreEvent::Changed { paths } => {
                if paths
                    .iter()
                    .any(|p| parent_path(p) == Some(collection.as_str()))
                {
                    let snapshot = state.lock().collection_snapshot(&collection);
                    callback(snapshot);
                }
            }
            StoreEvent::Failed { path, message } => {
                if *path == collection {
                    on_error(StoreError::Subscription {
                        path: path.clone(),
                        message: message.clone(),
                    });
                }
            }
        });

        let initial = self.state.lock().collection_snapshot(path);
        on_snapshot(initial);
        unsubscribe
    }

    fn subscribe_document(
        &self,
        path: &str,
        on_snapshot: DocumentCallback,
        on_error: ErrorCallback,
    ) -> Unsubscribe {
        let target = path.to_string();
        let state = Arc::clone(&self.state);
        let callback = Arc::clone(&on_snapshot);

        let unsubscribe = self.register(move |event| match event {
            StoreEvent::Changed { paths } => {
                if paths.iter().any(|p| *p == target) {
                    let snapshot = state.lock().document_snapshot(&target);
                    callback(snapshot);
                }
            }
            StoreEvent::Failed { path, message } => {
                if *path == target {
                    on_error(StoreError::Subscription {
                        path: path.clone(),
                        message: message.clone(),
                    });
                }
            }
        });

        let initial = self.state.lock().document_snapshot(path);
        on_snapshot(initial);
        unsubscribe
    }

    async fn write_batch(&self, writes: Vec<DocumentWrite>) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }
        let paths = {
            let mut st = self.state.lock();
            self.check_writable(&st, &writes[0].path)?;
            let mut paths = Vec::with_capacity(writes.len());
            for write in writes {
                st.documents.insert(write.path.clone(), write.data);
                paths.push(write.path);
            }
            st.sequence += 1;
            st.batches += 1;
            paths
        };
        self.emitter.emit(&StoreEvent::Changed { paths });
        Ok(())
    }

    async fn merge_write(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        {
            let mut st = self.state.lock();
            self.check_writable(&st, path)?;
            let doc = st.documents.entry(path.to_string()).or_default();
            for (key, value) in fields {
                doc.insert(key, value);
            }
            st.sequence += 1;
            st.merges += 1;
        }
        self.emitter.emit(&StoreEvent::Changed {
            paths: vec![path.to_string()],
        });
        Ok(())
    }

    async fn create_document(&self, path: &str, fields: Map<String, Value>) -> Result<bool, StoreError> {
        {
            let mut st = self.state.lock();
            self.check_writable(&st, path)?;
            if st.documents.contains_key(path) {
                return Ok(false);
            }
            st.documents.insert(path.to_string(), fields);
            st.sequence += 1;
        }
        self.emitter.emit(&StoreEvent::Changed {
            paths: vec![path.to_string()],
        });
        Ok(true)
    }
}

// ============================================================================
// Tests
// ============================================================================
