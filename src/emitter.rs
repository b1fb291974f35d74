//! EventEmitter<T> — typed synchronous fan-out used by the in-memory store and
//! by the mirror's change listeners.
//!
//! Listeners are held as `Arc<dyn Fn(&T)>`; `emit` clones the list under the
//! lock and calls every listener with the lock released, so a listener may
//! register or remove listeners (including itself) while being called. A
//! listener removed during an emission still runs in that round; one added
//! during an emission first runs on the next one.
//!
//! A panicking listener is logged and skipped; the remaining listeners still
//! run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Returned by [`EventEmitter::on`]; pass it to [`EventEmitter::off`].
pub type ListenerId = u64;

pub type ListenerFn<T> = dyn Fn(&T) + Send + Sync;

/// Typed synchronous event emitter.
///
/// The listener list sits behind a `parking_lot::Mutex` that is never held
/// while a listener runs.
pub struct EventEmitter<T> {
    listeners: Mutex<Vec<(ListenerId, Arc<ListenerFn<T>>)>>,
    next_id: AtomicU64,
}

impl<T> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `listener` and return its id.
    pub fn on(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Call every registered listener; returns how many were called.
    pub fn emit(&self, event: &T) -> usize {
        let snapshot: Vec<(ListenerId, Arc<ListenerFn<T>>)> = self
            .listeners
            .lock()
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        for (id, cb) in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| cb(event))).is_err() {
                tracing::warn!(listener = id, "listener panicked; continuing with the rest");
            }
        }
        snapshot.len()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
