//! JSON-RPC 2.0 error objects.
//!
//! Access denials are converted here and nowhere else, so the filters stay
//! independent of the wire protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::AccessDeniedReason;

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(Self::PARSE_ERROR, "JSON parse error").with_data(detail.into())
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(Self::INVALID_REQUEST, "Invalid request").with_data(detail.into())
    }
}

impl AccessDeniedReason {
    /// JSON-RPC error for this denial, with optional extra data.
    pub fn to_rpc_error(self, data: Option<Value>) -> RpcError {
        RpcError {
            code: self.code(),
            message: self.message().to_string(),
            data,
        }
    }
}

impl From<AccessDeniedReason> for RpcError {
    fn from(reason: AccessDeniedReason) -> Self {
        reason.to_rpc_error(None)
    }
}

/// Error response envelope sent back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct RpcErrorResponse {
    jsonrpc: &'static str,
    pub error: RpcError,
    pub id: Value,
}

impl RpcErrorResponse {
    pub fn new(error: RpcError, id: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            error,
            id: id.unwrap_or(Value::Null),
        }
    }
}
