//! Gateway configuration schema.
//!
//! The gateway reads one TOML file. The access policy itself is expressed
//! as flat properties, taken from a `.properties` file, from an inline
//! `[access.properties]` table, or both (inline entries win).
//!
//! ```toml
//! [listener]
//! bind_address = "0.0.0.0:8443"
//! tls = { cert_path = "server.pem", key_path = "server.key", client_ca_path = "clients-ca.pem" }
//!
//! [upstream]
//! url = "http://127.0.0.1:3000/"
//!
//! [access]
//! properties_path = "access.properties"
//!
//! [access.properties]
//! https.requireClientCert = true
//! apiKeys.exemptedMethods = ["ws.getName", "ws.getTime"]
//! ```

use serde::{Deserialize, Serialize};

use crate::config::access::DEFAULT_PREFIX;

/// Root configuration for the access gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// JSON-RPC server that allowed requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Access policy sources.
    pub access: AccessConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration. When present, requests count as secure
    /// and client certificates supply the principals.
    pub tls: Option<TlsConfig>,

    /// Largest JSON-RPC request body accepted, in bytes.
    pub max_body_bytes: usize,

    /// Request timeout (filter + upstream round trip) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_body_bytes: 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,

    /// CA certificates (PEM) that client certificates are verified against.
    /// Without it no client certificate is requested.
    #[serde(default)]
    pub client_ca_path: Option<String>,
}

/// Upstream JSON-RPC server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Endpoint URL requests are POSTed to.
    pub url: String,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000/".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Where the access policy comes from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Optional `.properties` file with the access policy.
    pub properties_path: Option<String>,

    /// Key prefix of the access properties.
    pub prefix: String,

    /// Reload the policy when the properties file changes.
    pub watch: bool,

    /// Inline properties, relative to `prefix`. Nested tables flatten to
    /// dotted keys; arrays join with spaces.
    pub properties: toml::Table,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            properties_path: None,
            prefix: DEFAULT_PREFIX.to_string(),
            watch: true,
            properties: toml::Table::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.listener.tls.is_none());
        assert_eq!(config.access.prefix, "access.");
        assert!(config.access.watch);
        assert!(config.access.properties.is_empty());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_full_config() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:8443"
            tls = { cert_path = "server.pem", key_path = "server.key", client_ca_path = "ca.pem" }

            [upstream]
            url = "http://10.0.0.5:3000/rpc"
            timeout_secs = 3

            [access]
            properties_path = "access.properties"
            watch = false

            [access.properties]
            https.requireClientCert = true
            apiKeys.exemptedMethods = ["ws.getName", "ws.getTime"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:8443");
        assert_eq!(config.listener.tls.as_ref().unwrap().cert_path, "server.pem");
        assert_eq!(config.upstream.timeout_secs, 3);
        assert_eq!(config.access.properties_path.as_deref(), Some("access.properties"));
        assert_eq!(
            config.listener.tls.as_ref().unwrap().client_ca_path.as_deref(),
            Some("ca.pem")
        );
        assert!(!config.access.watch);
        assert!(config.access.properties.contains_key("https"));
    }
}
