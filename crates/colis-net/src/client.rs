//! The delivery API client.
//!
//! Every method returns a [`NetworkOutcome`], a tagged success (HTTP status
//! plus body) or failure (error text), and never panics or propagates an
//! error to the caller. The queue/retry engines decide what to do with a
//! non-2xx status; this layer only reports it.

use thiserror::Error;
use tracing::debug;

use colis_shared::wire::DeliveryPayload;

use crate::config::ApiConfig;

/// Result of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkOutcome {
    /// The server answered; any status, body as received (if readable).
    Success { status: u16, body: Option<String> },
    /// The exchange never completed: DNS, connect, TLS, timeout, ...
    Failure { error: String },
}

impl NetworkOutcome {
    fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// True when the server answered with a 2xx status.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { status, .. } if (200..=299).contains(status))
    }
}

/// Errors constructing the client itself (never returned by requests).
#[derive(Error, Debug)]
pub enum NetError {
    #[error("Invalid base URL: {0}")]
    BaseUrl(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Thin wrapper over `reqwest` for the four delivery endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, NetError> {
        // Validate the base URL once so request paths can assume it parses.
        let base_url = config.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| NetError::BaseUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    /// POST a single delivery record.
    pub async fn post_delivery(&self, payload: &DeliveryPayload) -> NetworkOutcome {
        let url = format!("{}/api/rest/v1/deliveries", self.base_url);
        debug!(%url, "posting delivery");
        self.outcome(self.http.post(&url).json(payload).send().await)
            .await
    }

    /// POST the whole pending queue as one JSON array.
    pub async fn post_deliveries_bulk(&self, payloads: &[DeliveryPayload]) -> NetworkOutcome {
        let url = format!("{}/api/rest/v1/deliveries/bulk", self.base_url);
        debug!(%url, count = payloads.len(), "posting bulk deliveries");
        self.outcome(self.http.post(&url).json(payloads).send().await)
            .await
    }

    /// GET one page of delivery history. A blank keyword is treated as no
    /// keyword; encoding is handled by the query builder.
    pub async fn get_history_page(
        &self,
        page: u32,
        limit: u32,
        keyword: Option<&str>,
    ) -> NetworkOutcome {
        let url = format!("{}/api/rest/v1/deliveries/history", self.base_url);
        let mut req = self
            .http
            .get(&url)
            .query(&[("page", page), ("limit", limit)]);
        if let Some(k) = keyword.filter(|k| !k.trim().is_empty()) {
            req = req.query(&[("keyword", k)]);
        }
        debug!(%url, page, limit, keyword = keyword.unwrap_or(""), "fetching history page");
        self.outcome(req.send().await).await
    }

    /// GET the detail of one history entry by its delivery code. The code
    /// is inserted as a percent-encoded path segment.
    pub async fn get_history_detail(&self, code: &str) -> NetworkOutcome {
        let mut url = match reqwest::Url::parse(&self.base_url) {
            Ok(u) => u,
            Err(e) => return NetworkOutcome::failure(e.to_string()),
        };
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments
                    .pop_if_empty()
                    .extend(["api", "rest", "v1", "deliveries", "history", code]);
            }
            Err(()) => return NetworkOutcome::failure("base URL cannot carry a path"),
        }
        debug!(%url, "fetching history detail");
        self.outcome(self.http.get(url).send().await).await
    }

    async fn outcome(
        &self,
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> NetworkOutcome {
        match result {
            Ok(resp) => {
                let status = resp.status().as_u16();
                match resp.text().await {
                    Ok(body) => NetworkOutcome::Success {
                        status,
                        body: Some(body),
                    },
                    Err(e) => NetworkOutcome::failure(e.to_string()),
                }
            }
            Err(e) => NetworkOutcome::failure(e.to_string()),
        }
    }
}
