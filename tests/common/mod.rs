//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{connect_info::MockConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use rpc_access_filter::config::GatewayConfig;
use rpc_access_filter::config::Properties;
use rpc_access_filter::net::PeerInfo;
use rpc_access_filter::CompositeFilterConfig;

/// What the mock upstream has seen.
#[derive(Default)]
pub struct UpstreamLog {
    pub calls: AtomicU32,
    pub request_ids: Mutex<Vec<String>>,
    pub bodies: Mutex<Vec<Value>>,
}

impl UpstreamLog {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A JSON-RPC server answering every request with `{"result": "ok"}`.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub log: Arc<UpstreamLog>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

async fn upstream_handler(
    State(log): State<Arc<UpstreamLog>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    log.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        log.request_ids.lock().unwrap().push(id.to_string());
    }
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    log.bodies.lock().unwrap().push(body);
    Json(json!({ "jsonrpc": "2.0", "result": "ok", "id": id }))
}

/// Start the mock upstream on an ephemeral port.
pub async fn start_mock_upstream() -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(UpstreamLog::default());

    let app = Router::new()
        .route("/", post(upstream_handler))
        .with_state(log.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, log }
}

/// An address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

/// Gateway config forwarding to `upstream_url` with inline access properties.
pub fn gateway_config(upstream_url: &str, access_properties: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.url = upstream_url.to_string();
    config.access.properties = toml::from_str(access_properties).unwrap();
    config
}

/// Parse access properties text under the default prefix.
pub fn access_config(text: &str) -> CompositeFilterConfig {
    CompositeFilterConfig::from_properties(&Properties::parse(text).unwrap()).unwrap()
}

/// POST a JSON-RPC body from a plain TCP `peer` and return status, JSON
/// body and headers.
pub async fn call(
    router: Router,
    peer: SocketAddr,
    body: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, Value, HeaderMap) {
    call_from(router, PeerInfo::plain(peer), body, headers).await
}

/// POST a JSON-RPC body over the connection described by `peer`.
pub async fn call_from(
    router: Router,
    peer: PeerInfo,
    body: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, Value, HeaderMap) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = router
        .layer(MockConnectInfo(peer))
        .oneshot(request)
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value, headers)
}

pub fn localhost() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40000))
}

/// A TLS connection from localhost that presented `principals`.
pub fn tls_peer(principals: &[&str]) -> PeerInfo {
    PeerInfo {
        addr: localhost(),
        secure: true,
        principals: principals.iter().map(|p| p.to_string()).collect(),
    }
}
