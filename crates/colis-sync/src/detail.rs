//! One-shot fetch of a history entry's detail by delivery code.

use colis_net::{ApiClient, NetworkOutcome};
use colis_shared::types::HistoryDetail;
use colis_shared::wire::parse_history_detail;

use crate::pager::PagerError;

/// Fetch and parse the detail view for `code`.
///
/// A malformed body is reported as a load error for this fetch only; it
/// cannot touch the cached history pages.
pub async fn fetch_history_detail(
    api: &ApiClient,
    code: &str,
) -> Result<HistoryDetail, PagerError> {
    match api.get_history_detail(code).await {
        NetworkOutcome::Success { status, body } if (200..=299).contains(&status) => {
            Ok(parse_history_detail(body.as_deref().unwrap_or("{}"))?)
        }
        NetworkOutcome::Success { status, .. } => Err(PagerError::Server(status)),
        NetworkOutcome::Failure { error } => Err(PagerError::Network(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::extract::Path;
    use axum::routing::get;
    use axum::Router;

    use colis_net::ApiConfig;

    async fn spawn_detail_server(body: &'static str) -> String {
        let app = Router::new().route(
            "/api/rest/v1/deliveries/history/:code",
            get(move |Path(_code): Path<String>| async move { body }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn parses_a_detail_object() {
        let base =
            spawn_detail_server(r#"{"code": "DLV-1", "item": "Router", "receiverProof": "abc"}"#)
                .await;
        let api = ApiClient::new(&ApiConfig::default().with_base_url(&base)).unwrap();

        let detail = fetch_history_detail(&api, "DLV-1").await.unwrap();
        assert_eq!(detail.code, "DLV-1");
        assert_eq!(detail.item, "Router");
        assert_eq!(detail.receiver_proof.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let base = spawn_detail_server("{not json").await;
        let api = ApiClient::new(&ApiConfig::default().with_base_url(&base)).unwrap();

        let err = fetch_history_detail(&api, "DLV-1").await.unwrap_err();
        assert!(matches!(err, PagerError::Parse(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let api =
            ApiClient::new(&ApiConfig::default().with_base_url("http://127.0.0.1:1")).unwrap();
        let err = fetch_history_detail(&api, "DLV-1").await.unwrap_err();
        assert!(matches!(err, PagerError::Network(_)));
    }
}
