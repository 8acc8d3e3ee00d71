//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! access policy (.properties file + inline [access.properties])
//!     → properties.rs (flat key/value)
//!     → access.rs (typed, immutable CompositeFilterConfig)
//!     → filter::CompositeFilter
//!
//! On change:
//!     watcher.rs detects change
//!     → loader.rs re-reads the policy
//!     → new CompositeFilter is built
//!     → atomic swap in filter::SharedFilter
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a full rebuild
//! - All fields have defaults to allow minimal configs
//! - A policy that fails to load never replaces the one in force

pub mod access;
pub mod error;
pub mod loader;
pub mod properties;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use access::{ApiKeysConfig, CompositeFilterConfig, HostsConfig, HttpsConfig, DEFAULT_PREFIX};
pub use error::ConfigError;
pub use properties::Properties;
pub use schema::{AccessConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, UpstreamConfig};
pub use validation::ValidationError;
