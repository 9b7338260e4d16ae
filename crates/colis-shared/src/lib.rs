//! # colis-shared
//!
//! Domain types shared by every crate of the delivery client core: the
//! delivery form, the wire payload and its defensive parsing, the
//! user-facing failure classifier, and protocol constants.

pub mod classify;
pub mod constants;
pub mod types;
pub mod wire;

pub use classify::{classify, FailureCategory};
pub use types::{DeliveryForm, HistoryDetail, HistoryRecord};
pub use wire::{parse_history_detail, parse_history_page, DeliveryPayload};
