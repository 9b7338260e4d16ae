//! Scripted loopback API server used by the engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;

/// Mutable response script, shared with the running server.
pub struct Script {
    pub submit_status: AtomicU16,
    pub bulk_status: AtomicU16,
    pub history_status: AtomicU16,
    /// Size of the fake history dataset served page by page.
    pub history_total: AtomicUsize,
    pub submit_hits: AtomicUsize,
    pub bulk_hits: AtomicUsize,
    pub history_hits: AtomicUsize,
    pub last_keyword: Mutex<Option<String>>,
    pub last_bulk_body: Mutex<Option<String>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            submit_status: AtomicU16::new(200),
            bulk_status: AtomicU16::new(200),
            history_status: AtomicU16::new(200),
            history_total: AtomicUsize::new(0),
            submit_hits: AtomicUsize::new(0),
            bulk_hits: AtomicUsize::new(0),
            history_hits: AtomicUsize::new(0),
            last_keyword: Mutex::new(None),
            last_bulk_body: Mutex::new(None),
        }
    }
}

pub async fn spawn_api(script: Arc<Script>) -> String {
    let app = Router::new()
        .route("/api/rest/v1/deliveries", post(submit_handler))
        .route("/api/rest/v1/deliveries/bulk", post(bulk_handler))
        .route("/api/rest/v1/deliveries/history", get(history_handler))
        .with_state(script);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn submit_handler(State(script): State<Arc<Script>>) -> StatusCode {
    script.submit_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::from_u16(script.submit_status.load(Ordering::SeqCst)).unwrap()
}

async fn bulk_handler(State(script): State<Arc<Script>>, body: String) -> StatusCode {
    script.bulk_hits.fetch_add(1, Ordering::SeqCst);
    *script.last_bulk_body.lock().unwrap() = Some(body);
    StatusCode::from_u16(script.bulk_status.load(Ordering::SeqCst)).unwrap()
}

async fn history_handler(
    State(script): State<Arc<Script>>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    script.history_hits.fetch_add(1, Ordering::SeqCst);
    *script.last_keyword.lock().unwrap() = query.get("keyword").cloned();

    let status = script.history_status.load(Ordering::SeqCst);
    if !(200..=299).contains(&status) {
        return (StatusCode::from_u16(status).unwrap(), String::new());
    }

    let page: usize = query
        .get("page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    let limit: usize = query
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);
    let total = script.history_total.load(Ordering::SeqCst);

    let start = (page - 1) * limit;
    let end = (start + limit).min(total);
    let items: Vec<_> = (start..end)
        .map(|n| {
            json!({
                "id": format!("srv-{n}"),
                "code": format!("C{n}"),
                "item": format!("item-{n}"),
                "serialNumber": "SN",
                "sim": "SIM",
                "merchant": "M",
                "shop": "S",
                "receiver": "R",
                "deliveryAgent": "A",
                "createdAt": "2025-12-22T11:22:01+00:00"
            })
        })
        .collect();

    (StatusCode::OK, serde_json::to_string(&items).unwrap())
}
