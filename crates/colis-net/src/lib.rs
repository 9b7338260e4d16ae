// HTTP transport for the delivery API. Wraps every outbound call in a
// tagged outcome so no error ever escapes this boundary.

pub mod client;
pub mod config;

pub use client::{ApiClient, NetError, NetworkOutcome};
pub use config::ApiConfig;
