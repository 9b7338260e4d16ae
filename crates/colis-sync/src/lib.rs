//! # colis-sync
//!
//! The submission and synchronization engines of the delivery client:
//! send-now-or-queue submission, single-item retry, bulk queue drain,
//! and the remote-backed history paging cache with its debounced feed.
//!
//! All engines take their collaborators (API client, database handle) by
//! constructor injection; nothing here is a process-wide global. Database
//! work always runs through `with_db` on the blocking pool so no SQLite
//! call ever sits on the caller's async thread.

pub mod bulk;
pub mod detail;
pub mod feed;
pub mod guard;
pub mod pager;
pub mod proofs;
pub mod submit;

mod error;

#[cfg(test)]
mod testutil;

use std::sync::{Arc, Mutex};

use colis_store::Database;

pub use bulk::{BulkSyncEngine, SyncOutcome};
pub use detail::fetch_history_detail;
pub use error::SyncError;
pub use feed::{FeedConfig, FeedSnapshot, HistoryFeed};
pub use guard::SyncGuard;
pub use pager::{HistoryPager, LoadDirection, PageLoad, PagerError};
pub use submit::{SubmissionEngine, SubmitOutcome};

/// Shared handle to the one process-wide [`Database`]. Constructed once at
/// startup and injected into every engine; tests build their own for
/// isolation.
pub type SharedDatabase = Arc<Mutex<Database>>;

/// Wrap a database in the shared handle the engines expect.
pub fn shared_database(db: Database) -> SharedDatabase {
    Arc::new(Mutex::new(db))
}

/// Run a store operation on the blocking pool.
pub(crate) async fn with_db<T, F>(db: &SharedDatabase, op: F) -> Result<T, SyncError>
where
    T: Send + 'static,
    F: FnOnce(&mut Database) -> colis_store::Result<T> + Send + 'static,
{
    let db = Arc::clone(db);
    let result = tokio::task::spawn_blocking(move || {
        let mut guard = db.lock().map_err(|_| SyncError::LockPoisoned)?;
        op(&mut guard).map_err(SyncError::Store)
    })
    .await
    .map_err(|e| SyncError::Join(e.to_string()))?;
    result
}
