//! Access policy configuration.
//!
//! Example properties, under the default `access.` prefix:
//!
//! ```text
//! access.https.require=true
//! access.https.requireClientCert=true
//! access.https.clientCertPrincipal=cn=John Doe,ou=people,dc=company,dc=org
//!
//! access.hosts.allow=*
//!
//! access.apiKeys.require=true
//! access.apiKeys.parameterName=apiKey
//! access.apiKeys.exemptedMethods=ws.getName ws.getVersion ws.getTime
//! access.apiKeys.map.f70defbe-b881-41f8-8138-bea52b6e1b9c=sso.login sso.logout sso.getSession
//! access.apiKeys.map.d881afe0-4d7d-4520-9fda-bffffc3022ba=*
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::{ConfigError, Properties};
use crate::filter::{ALLOW_ANY_HOST, DEFAULT_API_KEY_PARAMETER_NAME};
use crate::security::{ApiKey, DistinguishedName};

/// Default property key prefix.
pub const DEFAULT_PREFIX: &str = "access.";

fn split_list(value: &str) -> HashSet<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// HTTPS and client certificate policy (`https.*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpsConfig {
    /// Refuse requests received over plain HTTP.
    pub require: bool,
    /// Require a trusted client certificate. Only applies when `require` is set.
    pub require_client_cert: bool,
    /// Subject the client certificate must match; `None` accepts any.
    pub client_cert_principal: Option<DistinguishedName>,
}

impl HttpsConfig {
    pub const DEFAULT_REQUIRE: bool = true;
    pub const DEFAULT_REQUIRE_CLIENT_CERT: bool = false;

    fn from_properties(prefix: &str, props: &Properties) -> Result<Self, ConfigError> {
        let require = props.get_bool(&format!("{prefix}https.require"), Self::DEFAULT_REQUIRE)?;
        let require_client_cert = props.get_bool(
            &format!("{prefix}https.requireClientCert"),
            Self::DEFAULT_REQUIRE_CLIENT_CERT,
        )?;

        let principal_key = format!("{prefix}https.clientCertPrincipal");
        let client_cert_principal = props
            .get_non_blank(&principal_key)
            .map(|value| {
                DistinguishedName::parse(value).map_err(|source| ConfigError::InvalidPrincipal {
                    key: principal_key.clone(),
                    value: value.to_string(),
                    source,
                })
            })
            .transpose()?;

        Ok(Self {
            require,
            require_client_cert,
            client_cert_principal,
        })
    }
}

impl Default for HttpsConfig {
    fn default() -> Self {
        Self {
            require: Self::DEFAULT_REQUIRE,
            require_client_cert: Self::DEFAULT_REQUIRE_CLIENT_CERT,
            client_cert_principal: None,
        }
    }
}

/// Client host policy (`hosts.*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostsConfig {
    /// Space-separated IPs and hostnames allowed access, or `*` for any.
    pub allow: String,
}

impl HostsConfig {
    fn from_properties(prefix: &str, props: &Properties) -> Self {
        Self {
            allow: props.get_string(&format!("{prefix}hosts.allow"), ALLOW_ANY_HOST),
        }
    }
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            allow: ALLOW_ANY_HOST.to_string(),
        }
    }
}

/// API key policy (`apiKeys.*`).
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeysConfig {
    /// Require an API key with each non-exempted request.
    pub require: bool,
    /// Named parameter carrying the key.
    pub parameter_name: String,
    /// Methods callable without a key.
    pub exempted_methods: HashSet<String>,
    /// Keys and the methods each may call (`*` for all).
    pub map: HashMap<ApiKey, HashSet<String>>,
}

impl ApiKeysConfig {
    pub const DEFAULT_REQUIRE: bool = true;

    fn from_properties(prefix: &str, props: &Properties) -> Result<Self, ConfigError> {
        let require = props.get_bool(&format!("{prefix}apiKeys.require"), Self::DEFAULT_REQUIRE)?;
        let parameter_name = props.get_string(
            &format!("{prefix}apiKeys.parameterName"),
            DEFAULT_API_KEY_PARAMETER_NAME,
        );

        if !require {
            return Ok(Self {
                require,
                parameter_name,
                ..Self::default()
            });
        }

        let exempted_methods = props
            .get_non_blank(&format!("{prefix}apiKeys.exemptedMethods"))
            .map(split_list)
            .unwrap_or_default();

        let map_prefix = format!("{prefix}apiKeys.map.");
        let map = props
            .with_prefix(&map_prefix)
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, methods)| (ApiKey::new(key), split_list(methods)))
            .collect();

        Ok(Self {
            require,
            parameter_name,
            exempted_methods,
            map,
        })
    }
}

impl Default for ApiKeysConfig {
    fn default() -> Self {
        Self {
            require: Self::DEFAULT_REQUIRE,
            parameter_name: DEFAULT_API_KEY_PARAMETER_NAME.to_string(),
            exempted_methods: HashSet::new(),
            map: HashMap::new(),
        }
    }
}

impl fmt::Debug for ApiKeysConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeysConfig")
            .field("require", &self.require)
            .field("parameter_name", &self.parameter_name)
            .field("exempted_methods", &self.exempted_methods)
            .field("keys", &self.map.len())
            .finish()
    }
}

/// Immutable configuration of a [`CompositeFilter`](crate::filter::CompositeFilter).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeFilterConfig {
    pub https: HttpsConfig,
    pub hosts: HostsConfig,
    pub api_keys: ApiKeysConfig,
}

impl CompositeFilterConfig {
    /// Parse from properties under [`DEFAULT_PREFIX`].
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        Self::from_properties_with_prefix(DEFAULT_PREFIX, props)
    }

    /// Parse from properties under a custom prefix (e.g. `"myapp.access."`).
    pub fn from_properties_with_prefix(
        prefix: &str,
        props: &Properties,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            https: HttpsConfig::from_properties(prefix, props)?,
            hosts: HostsConfig::from_properties(prefix, props),
            api_keys: ApiKeysConfig::from_properties(prefix, props)?,
        })
    }

    /// Log the effective policy at INFO level. Key values are not logged.
    pub fn log_summary(&self) {
        let principal = self
            .https
            .client_cert_principal
            .as_ref()
            .map(|dn| dn.to_string())
            .unwrap_or_else(|| "any".to_string());

        tracing::info!(
            https_required = self.https.require,
            client_cert_required = self.https.require_client_cert,
            client_cert_principal = %principal,
            allowed_hosts = %self.hosts.allow,
            "Transport access policy"
        );

        if !self.api_keys.require {
            tracing::info!(api_key_required = false, "API key access policy");
            return;
        }

        let mut exempted: Vec<&str> = self
            .api_keys
            .exempted_methods
            .iter()
            .map(String::as_str)
            .collect();
        exempted.sort_unstable();

        tracing::info!(
            api_key_required = true,
            parameter_name = %self.api_keys.parameter_name,
            exempted_methods = %exempted.join(" "),
            keys = self.api_keys.map.len(),
            "API key access policy"
        );
    }
}
