//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, tracing, timeout)
//!     → request.rs (request ID)
//!     → middleware/access_control.rs (parse JSON-RPC, evaluate policy)
//!         denied  → JSON-RPC error response
//!         allowed → server.rs forward_handler → upstream
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{spawn_policy_reloader, AppState, GatewayError, GatewayServer};
