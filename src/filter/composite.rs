//! Access policy assembled from a [`CompositeFilterConfig`].
//!
//! # Design Decisions
//! - Assembly order is fixed: host, HTTPS, client certificate, API key
//! - The certificate filter is only added when HTTPS is required as well
//! - The composite owns its chain; it does not extend it

use std::sync::Arc;

use crate::config::{CompositeFilterConfig, ConfigError};
use crate::filter::{
    ApiKeyFilter, CertificateFilter, Filter, FilterChain, FilterResult, HostFilter, Resolver,
    SystemResolver, TransportSecurityFilter,
};
use crate::rpc::{MessageContext, Request};

/// The root filter a JSON-RPC server plugs in.
#[derive(Debug)]
pub struct CompositeFilter {
    config: Arc<CompositeFilterConfig>,
    chain: FilterChain,
}

impl CompositeFilter {
    /// Build the filter chain, resolving allowed hosts with the system resolver.
    ///
    /// Blocks while hostnames in `hosts.allow` are resolved.
    pub fn new(config: CompositeFilterConfig) -> Result<Self, ConfigError> {
        Self::with_resolver(config, &SystemResolver)
    }

    pub fn with_resolver(
        config: CompositeFilterConfig,
        resolver: &dyn Resolver,
    ) -> Result<Self, ConfigError> {
        let mut chain = FilterChain::new();

        chain.push(HostFilter::with_resolver(&config.hosts.allow, resolver)?);

        if config.https.require {
            chain.push(TransportSecurityFilter::new(true));

            if config.https.require_client_cert {
                chain.push(CertificateFilter::new(
                    true,
                    config.https.client_cert_principal.clone(),
                ));
            }
        }

        if config.api_keys.require {
            chain.push(
                ApiKeyFilter::new(
                    config.api_keys.map.clone(),
                    config.api_keys.exempted_methods.clone(),
                )
                .with_parameter_name(config.api_keys.parameter_name.as_str()),
            );
        }

        config.log_summary();
        tracing::debug!(filters = ?chain.names(), "Access filter chain assembled");

        Ok(Self {
            config: Arc::new(config),
            chain,
        })
    }

    /// The configuration this filter was built from.
    pub fn config(&self) -> &CompositeFilterConfig {
        &self.config
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }
}

impl Filter for CompositeFilter {
    fn evaluate(&self, request: &Request, context: &MessageContext) -> FilterResult {
        self.chain.evaluate(request, context)
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Properties;
    use crate::filter::AccessDeniedReason;
    use crate::rpc::Params;
    use serde_json::json;

    fn config(text: &str) -> CompositeFilterConfig {
        CompositeFilterConfig::from_properties(&Properties::parse(text).unwrap()).unwrap()
    }

    fn named(value: serde_json::Value) -> Params {
        match value {
            serde_json::Value::Object(map) => Params::Named(map),
            _ => unreachable!("test params must be an object"),
        }
    }

    #[test]
    fn test_default_assembly() {
        let filter = CompositeFilter::new(CompositeFilterConfig::default()).unwrap();
        assert_eq!(filter.chain().names(), vec!["host", "transport_security", "api_key"]);
    }

    #[test]
    fn test_full_assembly_order() {
        let filter = CompositeFilter::new(config(
            "access.https.requireClientCert=true\naccess.hosts.allow=127.0.0.1\n",
        ))
        .unwrap();
        assert_eq!(
            filter.chain().names(),
            vec!["host", "transport_security", "client_certificate", "api_key"]
        );
    }

    #[test]
    fn test_client_cert_ignored_without_https() {
        let filter = CompositeFilter::new(config(
            "access.https.require=false\naccess.https.requireClientCert=true\naccess.apiKeys.require=false\n",
        ))
        .unwrap();
        assert_eq!(filter.chain().names(), vec!["host"]);
    }

    #[test]
    fn test_parameter_name_reaches_api_key_filter() {
        let filter = CompositeFilter::new(config(
            "access.https.require=false\n\
             access.apiKeys.parameterName=api_key\n\
             access.apiKeys.map.KEY1=sso.login\n",
        ))
        .unwrap();
        assert_eq!(filter.config().api_keys.parameter_name, "api_key");

        let ctx = MessageContext::new().with_client_address("127.0.0.1");
        let request = Request::new("sso.login", named(json!({"api_key": "KEY1"})));
        assert!(filter.evaluate(&request, &ctx).is_allowed());
    }

    #[test]
    fn test_end_to_end() {
        let filter = CompositeFilter::new(config(
            "access.https.require=true\n\
             access.https.requireClientCert=true\n\
             access.https.clientCertPrincipal=cn=John Doe,ou=people,dc=org\n\
             access.hosts.allow=*\n\
             access.apiKeys.require=true\n\
             access.apiKeys.map.KEY1=sso.login sso.logout\n",
        ))
        .unwrap();

        let ctx = MessageContext::new()
            .secure(true)
            .with_client_address("127.0.0.1")
            .with_principal("cn=John Doe,ou=people,dc=org");
        let request = Request::new("sso.login", named(json!({"apiKey": "KEY1"})));

        assert!(filter.evaluate(&request, &ctx).is_allowed());

        let insecure = ctx.clone().secure(false);
        assert_eq!(
            filter.evaluate(&request, &insecure).reason(),
            Some(AccessDeniedReason::HttpsRequired)
        );

        let no_key = Request::new("sso.login", named(json!({})));
        assert_eq!(
            filter.evaluate(&no_key, &ctx).reason(),
            Some(AccessDeniedReason::MissingApiKey)
        );
    }

    #[test]
    fn test_host_checked_first() {
        let filter = CompositeFilter::new(config("access.hosts.allow=10.0.0.1\n")).unwrap();
        let ctx = MessageContext::new().with_client_address("127.0.0.1");
        assert_eq!(
            filter
                .evaluate(&Request::new("sso.login", Params::None), &ctx)
                .reason(),
            Some(AccessDeniedReason::ClientIpDenied)
        );
    }
}
