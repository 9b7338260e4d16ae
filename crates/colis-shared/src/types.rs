//! Cross-crate domain types.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a UI layer over IPC.

use serde::{Deserialize, Serialize};

/// A filled delivery-confirmation form, as captured by the caller.
///
/// No field validation happens in the core; an empty string is sent as-is.
/// The proof is referenced by local file path; the file itself is only
/// read (and base64-encoded) at send time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryForm {
    pub item: String,
    pub serial_number: String,
    pub sim: String,
    pub merchant: String,
    pub shop: String,
    pub receiver: String,
    pub delivery_agent: String,
    /// Path to the locally saved proof photo, if one was captured.
    pub receiver_proof_path: Option<String>,
}

/// One row of the server-paginated delivery history, as cached locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Stable key: the server id, falling back to the delivery code, falling
    /// back to a synthetic `"{page}_{index}"` (see [`crate::wire`]).
    pub id: String,
    pub item: String,
    pub serial_number: String,
    pub sim: String,
    pub merchant: String,
    pub shop: String,
    pub receiver: String,
    pub delivery_agent: String,
    pub code: String,
    /// Proof reference as delivered by the server: a remote URL, a path, or
    /// inline base64. The core treats it as opaque.
    pub receiver_proof: Option<String>,
    /// ISO-8601 timestamp string from the server, stored verbatim.
    pub created_at: Option<String>,
    /// Monotonic local sort key preserving server order across pages.
    pub row_order: i64,
}

/// Detail view of one history entry, fetched by delivery code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDetail {
    pub item: String,
    pub serial_number: String,
    pub sim: String,
    pub merchant: String,
    pub shop: String,
    pub receiver: String,
    pub delivery_agent: String,
    pub code: String,
    pub receiver_proof: Option<String>,
}
