//! Model structs persisted in the local database.
//!
//! [`HistoryRecord`] itself lives in `colis-shared` because it is produced
//! by wire parsing and consumed by the UI; this module holds the rows the
//! store owns outright.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use colis_shared::types::DeliveryForm;

/// Lifecycle marker for a queued delivery.
///
/// Rows are deleted as soon as a send is acknowledged, so `Sent` only ever
/// appears transiently; `Failed` marks a row whose retry counter has been
/// bumped at least once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PendingStatus {
    Pending,
    Failed,
    Sent,
}

impl PendingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingStatus::Pending => "PENDING",
            PendingStatus::Failed => "FAILED",
            PendingStatus::Sent => "SENT",
        }
    }

    /// Unknown markers from older schema versions degrade to `Pending`
    /// rather than failing the row read.
    pub fn from_str(s: &str) -> Self {
        match s {
            "FAILED" => PendingStatus::Failed,
            "SENT" => PendingStatus::Sent,
            _ => PendingStatus::Pending,
        }
    }
}

/// One delivery record awaiting server acknowledgement.
///
/// A row exists in the queue if and only if the remote endpoint has not yet
/// accepted the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingDelivery {
    /// Locally assigned rowid, monotonic across the database's lifetime.
    pub id: i64,
    pub item: String,
    pub serial_number: String,
    pub sim: String,
    pub merchant: String,
    pub shop: String,
    pub receiver: String,
    pub delivery_agent: String,
    /// Path to the locally stored proof photo, if one was captured.
    pub receiver_proof_path: Option<String>,
    /// Assigned when the row is enqueued.
    pub created_at: DateTime<Utc>,
    /// Number of failed send attempts so far.
    pub retry_count: u32,
    pub status: PendingStatus,
    /// Code assigned by the server, once one is known. The current
    /// endpoints never return one; the column is kept for forward
    /// compatibility.
    pub server_code: Option<String>,
}

impl PendingDelivery {
    /// Rebuild the submit form this row was created from.
    pub fn to_form(&self) -> DeliveryForm {
        DeliveryForm {
            item: self.item.clone(),
            serial_number: self.serial_number.clone(),
            sim: self.sim.clone(),
            merchant: self.merchant.clone(),
            shop: self.shop.clone(),
            receiver: self.receiver.clone(),
            delivery_agent: self.delivery_agent.clone(),
            receiver_proof_path: self.receiver_proof_path.clone(),
        }
    }
}

/// Forward/backward page keys for one history paging session.
///
/// A single row per query context; `next_key = None` signals that the last
/// fetched page was short, i.e. end of data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageCursor {
    /// `"HISTORY"` for the unfiltered session, `"HISTORY:{keyword}"` for a
    /// keyword session.
    pub query_key: String,
    pub prev_key: Option<u32>,
    pub next_key: Option<u32>,
}
