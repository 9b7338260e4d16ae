use thiserror::Error;

/// Errors from the engine/store boundary.
///
/// Expected outcomes (queued, nothing to sync, end of pagination, ...) are
/// modelled as enum variants on the engine results, never as errors; this
/// type only covers local-resource failures.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(#[from] colis_store::StoreError),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Background task failed: {0}")]
    Join(String),
}
