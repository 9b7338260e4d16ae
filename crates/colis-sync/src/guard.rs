//! Single-flight guard shared by the sync entry points.
//!
//! Both the bulk drain and the single-item retry acquire the guard before
//! touching the queue, so two concurrent triggers can never double-bump
//! retry counters or race on deletion; the second caller simply waits its
//! turn. The `syncing` flag mirrors the held state for UI consumption.

use std::sync::Arc;

use tokio::sync::{watch, Mutex, OwnedMutexGuard};

/// Cloneable guard handle. All clones share the same lock and flag.
#[derive(Clone)]
pub struct SyncGuard {
    lock: Arc<Mutex<()>>,
    syncing_tx: Arc<watch::Sender<bool>>,
}

impl SyncGuard {
    pub fn new() -> Self {
        let (syncing_tx, _) = watch::channel(false);
        Self {
            lock: Arc::new(Mutex::new(())),
            syncing_tx: Arc::new(syncing_tx),
        }
    }

    /// Acquire the guard, waiting if another sync is in flight. The
    /// returned permit flips the `syncing` flag for its lifetime.
    pub async fn begin(&self) -> SyncPermit {
        let guard = self.lock.clone().lock_owned().await;
        self.syncing_tx.send_replace(true);
        SyncPermit {
            _guard: guard,
            syncing_tx: Arc::clone(&self.syncing_tx),
        }
    }

    /// Whether a sync currently holds the guard.
    pub fn is_syncing(&self) -> bool {
        *self.syncing_tx.borrow()
    }

    /// Subscribe to the syncing flag (emits current value immediately).
    pub fn watch_syncing(&self) -> watch::Receiver<bool> {
        self.syncing_tx.subscribe()
    }
}

impl Default for SyncGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the duration of one sync operation.
pub struct SyncPermit {
    _guard: OwnedMutexGuard<()>,
    syncing_tx: Arc<watch::Sender<bool>>,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.syncing_tx.send_replace(false);
    }
}
