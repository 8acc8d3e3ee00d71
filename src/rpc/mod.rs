//! JSON-RPC 2.0 message model.
//!
//! # Data Flow
//! ```text
//! HTTP body
//!     → message.rs (Request::from_json)
//!     → filter evaluation (Request + MessageContext)
//!     → error.rs (AccessDeniedReason → RpcError → RpcErrorResponse)
//! ```

pub mod error;
pub mod message;

pub use error::{RpcError, RpcErrorResponse};
pub use message::{MessageContext, Params, ParamsShape, Request};
