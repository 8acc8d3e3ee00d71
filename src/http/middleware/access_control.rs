//! Access control middleware.
//!
//! Parses the JSON-RPC request, builds its [`MessageContext`] from the
//! connection and evaluates the active access policy before the request
//! reaches the upstream handler.
//!
//! # Design Decisions
//! - Denials are JSON-RPC error responses with HTTP status 200
//! - The client sees only the denial code and message
//! - The buffered body is handed on unchanged to the next handler
//! - HTTPS and principals come from the connection, never from headers
//! - Non-POST requests pass straight through to the router's 405

use axum::{
    body::Body,
    extract::{ConnectInfo, Request as HttpRequest, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::filter::{Filter, FilterResult};
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::net::PeerInfo;
use crate::observability::metrics;
use crate::rpc::{MessageContext, Request, RpcError, RpcErrorResponse};

pub async fn access_control_middleware(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<PeerInfo>,
    request: HttpRequest,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let request_id = request_id(request.headers()).to_string();
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected request body");
            metrics::record_rejected_message("too_large");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let rpc_request = match Request::from_json(&bytes) {
        Ok(rpc_request) => rpc_request,
        Err(error) => {
            let kind = if error.code == RpcError::PARSE_ERROR {
                "parse_error"
            } else {
                "invalid_request"
            };
            tracing::debug!(request_id = %request_id, code = error.code, "Malformed JSON-RPC request");
            metrics::record_rejected_message(kind);
            return Json(RpcErrorResponse::new(error, None)).into_response();
        }
    };

    let client = peer.addr.ip();
    let context = MessageContext::new()
        .secure(peer.secure)
        .with_client_address(client.to_string())
        .with_principals(peer.principals);

    let result = state.filter.evaluate(&rpc_request, &context);
    metrics::record_decision(&result);

    match result {
        FilterResult::Allowed => {
            tracing::debug!(
                request_id = %request_id,
                method = %rpc_request.method(),
                client = %client,
                "Access allowed"
            );
            next.run(HttpRequest::from_parts(parts, Body::from(bytes))).await
        }
        FilterResult::Denied(reason) => {
            tracing::info!(
                request_id = %request_id,
                method = %rpc_request.method(),
                client = %client,
                reason = reason.as_str(),
                code = reason.code(),
                "Access denied"
            );
            let response = RpcErrorResponse::new(reason.into(), rpc_request.id().cloned());
            Json(response).into_response()
        }
    }
}
