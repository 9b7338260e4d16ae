//! Wire payloads for the delivery API, and defensive parsing of what the
//! server sends back.
//!
//! The history endpoints are not strict about field names: depending on the
//! deployment, the proof may arrive under `receiverProofPath` (a path/URL)
//! or `receiverProof` (inline base64), and a row may or may not carry an
//! explicit `id`. The fallback order is resolved in exactly one place,
//! `RawHistoryItem::into_record`, rather than scattered per call site:
//!
//! 1. proof: `receiverProofPath`, then `receiverProof`, else none;
//! 2. row id: `id`, then `code`, else the synthetic `"{page}_{index}"`.

use serde::{Deserialize, Serialize};

use crate::types::{DeliveryForm, HistoryDetail, HistoryRecord};

/// JSON object POSTed to the submit endpoints. The bulk endpoint takes a
/// plain array of these.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPayload {
    pub item: String,
    pub serial_number: String,
    pub sim: String,
    pub merchant: String,
    pub shop: String,
    pub receiver: String,
    pub delivery_agent: String,
    /// Base64-encoded proof photo, or the empty string when no readable
    /// proof file exists.
    pub receiver_proof: String,
}

impl DeliveryPayload {
    /// Build the wire object from a form plus the already-encoded proof.
    pub fn from_form(form: &DeliveryForm, receiver_proof: String) -> Self {
        Self {
            item: form.item.clone(),
            serial_number: form.serial_number.clone(),
            sim: form.sim.clone(),
            merchant: form.merchant.clone(),
            shop: form.shop.clone(),
            receiver: form.receiver.clone(),
            delivery_agent: form.delivery_agent.clone(),
            receiver_proof,
        }
    }
}

/// One history row as the server actually sends it: everything optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHistoryItem {
    id: Option<String>,
    item: Option<String>,
    serial_number: Option<String>,
    sim: Option<String>,
    merchant: Option<String>,
    shop: Option<String>,
    receiver: Option<String>,
    delivery_agent: Option<String>,
    code: Option<String>,
    receiver_proof_path: Option<String>,
    receiver_proof: Option<String>,
    created_at: Option<String>,
}

impl RawHistoryItem {
    /// Resolve the fallbacks (see module docs) and assign the local row
    /// order `(page - 1) * limit + index`.
    fn into_record(self, page: u32, limit: u32, index: usize) -> HistoryRecord {
        let code = self.code.unwrap_or_default();
        let id = self
            .id
            .filter(|s| !s.is_empty())
            .or_else(|| Some(code.clone()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| format!("{page}_{index}"));
        let receiver_proof = self
            .receiver_proof_path
            .filter(|s| !s.is_empty())
            .or(self.receiver_proof);

        HistoryRecord {
            id,
            item: self.item.unwrap_or_default(),
            serial_number: self.serial_number.unwrap_or_default(),
            sim: self.sim.unwrap_or_default(),
            merchant: self.merchant.unwrap_or_default(),
            shop: self.shop.unwrap_or_default(),
            receiver: self.receiver.unwrap_or_default(),
            delivery_agent: self.delivery_agent.unwrap_or_default(),
            code,
            receiver_proof,
            created_at: self.created_at,
            row_order: (page as i64 - 1) * limit as i64 + index as i64,
        }
    }
}

/// Parse one page of history. `page` and `limit` are the request parameters,
/// needed to compute each row's order key.
pub fn parse_history_page(
    body: &str,
    page: u32,
    limit: u32,
) -> Result<Vec<HistoryRecord>, serde_json::Error> {
    let raw: Vec<RawHistoryItem> = serde_json::from_str(body)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, item)| item.into_record(page, limit, i))
        .collect())
}

/// Parse a single history-detail object, with the same proof fallback as
/// page rows.
pub fn parse_history_detail(body: &str) -> Result<HistoryDetail, serde_json::Error> {
    let raw: RawHistoryItem = serde_json::from_str(body)?;
    let receiver_proof = raw
        .receiver_proof_path
        .filter(|s| !s.is_empty())
        .or(raw.receiver_proof);
    Ok(HistoryDetail {
        item: raw.item.unwrap_or_default(),
        serial_number: raw.serial_number.unwrap_or_default(),
        sim: raw.sim.unwrap_or_default(),
        merchant: raw.merchant.unwrap_or_default(),
        shop: raw.shop.unwrap_or_default(),
        receiver: raw.receiver.unwrap_or_default(),
        delivery_agent: raw.delivery_agent.unwrap_or_default(),
        code: raw.code.unwrap_or_default(),
        receiver_proof,
    })
}
