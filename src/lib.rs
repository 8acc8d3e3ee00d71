//! Access control filters for JSON-RPC 2.0 servers.
//!
//! A [`CompositeFilter`] is built once from flat key/value configuration and
//! then evaluated for every request:
//!
//! ```text
//! Request + MessageContext
//!     → HostFilter → TransportSecurityFilter → CertificateFilter → ApiKeyFilter
//!     → Allowed | Denied(AccessDeniedReason) → JSON-RPC error
//! ```
//!
//! The crate also ships `access-gateway`, an HTTP front end that enforces
//! the policy in front of an upstream JSON-RPC server, and `access-cli`.

// Core
pub mod config;
pub mod filter;
pub mod rpc;
pub mod security;

// Gateway
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::{CompositeFilterConfig, ConfigError, GatewayConfig, Properties};
pub use filter::{AccessDeniedReason, CompositeFilter, Filter, FilterChain, FilterResult, SharedFilter};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use rpc::{MessageContext, Params, Request};
pub use security::{ApiKey, DistinguishedName};
