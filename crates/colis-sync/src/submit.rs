//! The submission engine: send now, queue on failure, retry one later.
//!
//! The network call always precedes the persistence decision: the queue
//! state is a consequence of the network outcome, never the reverse. A
//! record is enqueued at most once per `submit` call; a retried record is
//! updated in place, never re-inserted.

use std::sync::Arc;

use tracing::{debug, info, warn};

use colis_net::ApiClient;
use colis_shared::types::DeliveryForm;
use colis_shared::wire::DeliveryPayload;

use crate::guard::SyncGuard;
use crate::{proofs, with_db, SharedDatabase};

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server acknowledged the record; nothing was queued.
    Sent,
    /// The record is parked in the local queue under this id.
    Queued(i64),
    /// The record could be neither sent nor queued (or, for
    /// [`SubmissionEngine::sync_single`], the id is unknown).
    Failure(String),
}

pub struct SubmissionEngine {
    api: Arc<ApiClient>,
    db: SharedDatabase,
    guard: SyncGuard,
}

impl SubmissionEngine {
    pub fn new(api: Arc<ApiClient>, db: SharedDatabase, guard: SyncGuard) -> Self {
        Self { api, db, guard }
    }

    /// Submit a freshly filled form.
    ///
    /// 2xx: the local proof file is deleted and nothing touches the queue.
    /// Any other status, or a transport failure, enqueues the record
    /// exactly once and reports the assigned id.
    pub async fn submit(&self, form: DeliveryForm) -> SubmitOutcome {
        let proof = proofs::encode_proof(form.receiver_proof_path.as_deref()).await;
        let payload = DeliveryPayload::from_form(&form, proof);

        match self.api.post_delivery(&payload).await {
            outcome if outcome.is_success() => {
                proofs::delete_proof(form.receiver_proof_path.as_deref()).await;
                info!(item = %form.item, "delivery sent");
                SubmitOutcome::Sent
            }
            outcome => {
                debug!(?outcome, "send failed, queueing delivery");
                match with_db(&self.db, move |db| db.insert_pending(&form)).await {
                    Ok(id) => {
                        info!(id, "delivery queued for later sync");
                        SubmitOutcome::Queued(id)
                    }
                    Err(e) => {
                        warn!(error = %e, "could not queue delivery");
                        SubmitOutcome::Failure(e.to_string())
                    }
                }
            }
        }
    }

    /// Retry one queued record by id.
    ///
    /// Success deletes the queue row (and its proof file); failure bumps
    /// the row's retry counter in place. An unknown id is a plain
    /// `Failure("not found")` with no state change.
    pub async fn sync_single(&self, id: i64) -> SubmitOutcome {
        let _permit = self.guard.begin().await;

        let entity = match with_db(&self.db, move |db| db.pending_by_id(id)).await {
            Ok(Some(entity)) => entity,
            Ok(None) => return SubmitOutcome::Failure("not found".to_string()),
            Err(e) => return SubmitOutcome::Failure(e.to_string()),
        };

        let proof = proofs::encode_proof(entity.receiver_proof_path.as_deref()).await;
        let payload = DeliveryPayload::from_form(&entity.to_form(), proof);

        match self.api.post_delivery(&payload).await {
            outcome if outcome.is_success() => {
                proofs::delete_proof(entity.receiver_proof_path.as_deref()).await;
                match with_db(&self.db, move |db| db.delete_pending(&[id])).await {
                    Ok(_) => {
                        info!(id, "queued delivery synced");
                        SubmitOutcome::Sent
                    }
                    Err(e) => SubmitOutcome::Failure(e.to_string()),
                }
            }
            outcome => {
                debug!(id, ?outcome, "retry failed, bumping counter");
                if let Err(e) = with_db(&self.db, move |db| db.increment_retry(&[id])).await {
                    warn!(id, error = %e, "could not bump retry counter");
                }
                SubmitOutcome::Queued(id)
            }
        }
    }
}
