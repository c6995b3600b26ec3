//! Shared test utilities: an in-process mock IxNetwork appliance.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const API_KEY: &str = "0123456789abcdef";
pub const PASSWORD: &str = "admin";
pub const CONFIG_BYTES: &[u8] = &[0x50, 0x4b, 0x03, 0x04, 0x00, 0xff];

/// One request as the appliance saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct ApplianceState {
    counters: Mutex<HashMap<String, usize>>,
    seen: Mutex<Vec<SeenRequest>>,
}

/// Mock appliance served over HTTP on an ephemeral port.
pub struct TestAppliance {
    pub addr: SocketAddr,
    state: Arc<ApplianceState>,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestAppliance {
    pub async fn spawn() -> Self {
        let state = Arc::new(ApplianceState::default());

        let router = Router::new()
            .route("/api/v1/auth/session", post(login))
            .fallback(handle)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Authenticated requests received so far (login excluded).
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn seen_ending_with(&self, suffix: &str) -> Vec<SeenRequest> {
        self.seen()
            .into_iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid credentials" })),
        )
            .into_response();
    }
    Json(json!({
        "id": 1,
        "username": body["username"],
        "apiKey": API_KEY,
    }))
    .into_response()
}

async fn handle(
    State(state): State<Arc<ApplianceState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Not authorized" })))
            .into_response();
    }

    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let body: Option<Value> = serde_json::from_slice(&body).ok();
    state.seen.lock().unwrap().push(SeenRequest {
        method: method.clone(),
        path: path.clone(),
        body: body.clone(),
    });

    if method == Method::GET {
        return get_resource(&path);
    }
    if method == Method::PATCH {
        return Json(json!({})).into_response();
    }

    if path.ends_with("/operations/select") {
        let from = body
            .as_ref()
            .and_then(|b| b["selects"][0]["from"].as_str())
            .unwrap_or_default()
            .to_string();
        return Json(select(&from)).into_response();
    }
    if path.contains("/operations/") || path.ends_with("/singleValue") {
        return Json(json!({ "state": "SUCCESS" })).into_response();
    }

    let items = match &body {
        Some(Value::Array(items)) => items.len().max(1),
        _ => 1,
    };
    let mut counters = state.counters.lock().unwrap();
    let counter = counters.entry(path.clone()).or_insert(0);
    let links: Vec<Value> = (0..items)
        .map(|_| {
            *counter += 1;
            json!({ "rel": "self", "method": "GET", "href": format!("{}/{}", path, counter) })
        })
        .collect();
    (StatusCode::CREATED, Json(json!({ "links": links }))).into_response()
}

fn get_resource(path: &str) -> Response {
    if path.contains("/files?filename=") {
        return (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            CONFIG_BYTES.to_vec(),
        )
            .into_response();
    }
    if path.contains("/ipv4/") {
        let id = path.rsplit('/').next().unwrap_or_default();
        return Json(json!({
            "href": path,
            "address": format!("/api/v1/sessions/1/ixnetwork/multivalue/{}01", id),
            "prefix": format!("/api/v1/sessions/1/ixnetwork/multivalue/{}02", id),
            "gatewayIp": format!("/api/v1/sessions/1/ixnetwork/multivalue/{}03", id),
        }))
        .into_response();
    }
    Json(json!({ "href": path })).into_response()
}

fn select(from: &str) -> Value {
    if from == "/statistics" {
        json!({
            "result": [{
                "href": "/api/v1/sessions/1/ixnetwork/statistics",
                "view": [
                    { "id": 1, "caption": "Port Statistics", "csvFileName": "Port Statistics.csv" },
                    { "id": 12, "caption": "Flow Statistics", "csvFileName": "Flow Statistics.csv" }
                ]
            }]
        })
    } else {
        json!({
            "result": [{
                "href": format!("/api/v1/sessions/1/ixnetwork{}", from),
                "columnCaptions": ["Tx Port", "Rx Port", "Tx Frames", "Rx Frames", "Loss %"],
                "pageValues": [
                    [["left_side", "right_side", "81274", "81274", "0.000"]],
                    [["right_side", "left_side", "81274", "81270", "0.005"]]
                ]
            }]
        })
    }
}
