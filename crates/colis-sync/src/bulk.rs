//! The bulk sync engine: drain the whole pending queue in one request.
//!
//! The queue is read once at the start, as a point-in-time snapshot. Rows
//! enqueued while the network call is in flight are not part of the batch
//! and are left untouched for the next drain.

use std::sync::Arc;

use tracing::{info, warn};

use colis_net::{ApiClient, NetworkOutcome};
use colis_shared::wire::DeliveryPayload;

use crate::guard::SyncGuard;
use crate::{proofs, with_db, SharedDatabase};

/// Result of one bulk drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The batch was acknowledged; this many rows were cleared.
    Synced(usize),
    /// The queue was empty; no network call was made.
    NothingToSync,
    /// The batch was rejected or never arrived; every snapshot row had its
    /// retry counter bumped. Carries the HTTP status text or transport
    /// error for classification.
    Failed(String),
}

pub struct BulkSyncEngine {
    api: Arc<ApiClient>,
    db: SharedDatabase,
    guard: SyncGuard,
}

impl BulkSyncEngine {
    pub fn new(api: Arc<ApiClient>, db: SharedDatabase, guard: SyncGuard) -> Self {
        Self { api, db, guard }
    }

    /// Send every queued record in one bulk request.
    ///
    /// On a 2xx answer the snapshot rows are deleted in one batch and their
    /// proof files removed best-effort. On any failure the snapshot rows
    /// get `retry_count + 1` and nothing is deleted.
    pub async fn sync_all(&self) -> SyncOutcome {
        let _permit = self.guard.begin().await;

        let snapshot = match with_db(&self.db, |db| db.all_pending()).await {
            Ok(snapshot) => snapshot,
            Err(e) => return SyncOutcome::Failed(e.to_string()),
        };
        if snapshot.is_empty() {
            return SyncOutcome::NothingToSync;
        }

        // Encode proofs one by one; a single unreadable file degrades that
        // entry to an empty proof instead of aborting the batch.
        let mut payloads = Vec::with_capacity(snapshot.len());
        for entity in &snapshot {
            let proof = proofs::encode_proof(entity.receiver_proof_path.as_deref()).await;
            payloads.push(DeliveryPayload::from_form(&entity.to_form(), proof));
        }
        let ids: Vec<i64> = snapshot.iter().map(|entity| entity.id).collect();

        match self.api.post_deliveries_bulk(&payloads).await {
            NetworkOutcome::Success { status, .. } if (200..=299).contains(&status) => {
                for entity in &snapshot {
                    proofs::delete_proof(entity.receiver_proof_path.as_deref()).await;
                }
                let count = ids.len();
                match with_db(&self.db, move |db| db.delete_pending(&ids)).await {
                    Ok(_) => {
                        info!(count, "bulk sync cleared queue snapshot");
                        SyncOutcome::Synced(count)
                    }
                    Err(e) => SyncOutcome::Failed(e.to_string()),
                }
            }
            NetworkOutcome::Success { status, .. } => {
                self.bump_retries(ids).await;
                SyncOutcome::Failed(format!("Server returned code {status}"))
            }
            NetworkOutcome::Failure { error } => {
                self.bump_retries(ids).await;
                SyncOutcome::Failed(error)
            }
        }
    }

    async fn bump_retries(&self, ids: Vec<i64>) {
        let count = ids.len();
        if let Err(e) = with_db(&self.db, move |db| db.increment_retry(&ids)).await {
            warn!(error = %e, "could not bump retry counters after failed bulk sync");
        } else {
            info!(count, "bulk sync failed, retry counters bumped");
        }
    }
}
