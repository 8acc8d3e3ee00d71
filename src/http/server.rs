//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the JSON-RPC endpoint
//! - Wire up middleware (tracing, timeout, request ID, access control)
//! - Serve over plain TCP or TLS with graceful shutdown
//! - Forward allowed requests to the upstream JSON-RPC server
//! - Apply access policy updates as they arrive

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    serve::Listener,
    Router,
};
use rustls::ServerConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{CompositeFilterConfig, ConfigError, GatewayConfig};
use crate::filter::{CompositeFilter, SharedFilter};
use crate::http::middleware::access_control_middleware;
use crate::http::request::{request_id, request_id_middleware, X_REQUEST_ID};
use crate::net::{PeerInfo, TlsListener};
use crate::observability::metrics;

/// Errors that stop the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub filter: Arc<SharedFilter>,
    pub max_body_bytes: usize,
    pub client: reqwest::Client,
    pub upstream_url: reqwest::Url,
}

/// JSON-RPC access gateway.
pub struct GatewayServer {
    router: Router,
    filter: Arc<SharedFilter>,
}

impl GatewayServer {
    /// Create a gateway enforcing `filter` in front of the configured upstream.
    pub fn new(config: &GatewayConfig, filter: CompositeFilter) -> Result<Self, GatewayError> {
        let upstream_url = reqwest::Url::parse(&config.upstream.url).map_err(|e| {
            ConfigError::Invalid {
                key: "upstream.url".to_string(),
                reason: e.to_string(),
            }
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream.timeout_secs))
            .build()?;

        let filter = Arc::new(SharedFilter::new(filter));

        let state = AppState {
            filter: filter.clone(),
            max_body_bytes: config.listener.max_body_bytes,
            client,
            upstream_url,
        };

        let router = Self::build_router(config, state);
        Ok(Self { router, filter })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", post(forward_handler))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                access_control_middleware,
            ))
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the active access policy.
    pub fn filter(&self) -> Arc<SharedFilter> {
        self.filter.clone()
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        policy_updates: Option<mpsc::UnboundedReceiver<CompositeFilterConfig>>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), GatewayError> {
        tracing::info!(address = %listener.local_addr()?, "Access gateway starting");

        if let Some(updates) = policy_updates {
            spawn_policy_reloader(self.filter.clone(), updates);
        }

        let app = self.router.into_make_service_with_connect_info::<PeerInfo>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Access gateway stopped");
        Ok(())
    }

    /// Serve HTTPS on `listener` until `shutdown` fires.
    ///
    /// Requests count as secure, and a verified client certificate
    /// supplies the request's principal.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: Arc<ServerConfig>,
        policy_updates: Option<mpsc::UnboundedReceiver<CompositeFilterConfig>>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), GatewayError> {
        let listener = TlsListener::new(listener, tls)?;
        tracing::info!(address = %listener.local_addr()?, "Access gateway starting (TLS)");

        if let Some(updates) = policy_updates {
            spawn_policy_reloader(self.filter.clone(), updates);
        }

        let app = self.router.into_make_service_with_connect_info::<PeerInfo>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Access gateway stopped");
        Ok(())
    }
}

/// Rebuild and publish the access policy for every update received.
///
/// Hostname resolution runs on the blocking pool. A failed rebuild leaves
/// the current policy in force.
pub fn spawn_policy_reloader(
    filter: Arc<SharedFilter>,
    mut updates: mpsc::UnboundedReceiver<CompositeFilterConfig>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            let filter = filter.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || filter.reload(config)).await {
                tracing::error!(error = %e, "Access policy reload task failed");
            }
        }
    })
}

/// Forward an allowed JSON-RPC request to the upstream server.
async fn forward_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = request_id(&headers).to_string();

    let result = state
        .client
        .post(state.upstream_url.clone())
        .header(header::CONTENT_TYPE, "application/json")
        .header(X_REQUEST_ID, request_id.as_str())
        .body(body)
        .send()
        .await;

    let upstream = match result {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_upstream_error();
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();

    match upstream.bytes().await {
        Ok(bytes) => {
            let mut response = (status, bytes).into_response();
            if let Some(content_type) = content_type {
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
            }
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream response error");
            metrics::record_upstream_error();
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
