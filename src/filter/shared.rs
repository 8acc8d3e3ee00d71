//! Hot-swappable handle to the active access policy.
//!
//! Evaluations load the current [`CompositeFilter`] without locking. A reload
//! builds a complete new filter first and then publishes it atomically, so an
//! in-flight evaluation always sees one consistent policy.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::{CompositeFilterConfig, ConfigError};
use crate::filter::{CompositeFilter, Filter, FilterResult};
use crate::observability::metrics;
use crate::rpc::{MessageContext, Request};

#[derive(Debug)]
pub struct SharedFilter {
    current: ArcSwap<CompositeFilter>,
}

impl SharedFilter {
    pub fn new(filter: CompositeFilter) -> Self {
        Self {
            current: ArcSwap::from_pointee(filter),
        }
    }

    /// Snapshot of the filter in force.
    pub fn load(&self) -> Arc<CompositeFilter> {
        self.current.load_full()
    }

    /// Publish an already built filter.
    pub fn replace(&self, filter: CompositeFilter) {
        self.current.store(Arc::new(filter));
        metrics::record_reload(true);
        tracing::info!("Access policy replaced");
    }

    /// Build a filter from `config` and publish it.
    ///
    /// On error the current policy stays in force. Blocks while allowed
    /// hostnames are resolved.
    pub fn reload(&self, config: CompositeFilterConfig) -> Result<(), ConfigError> {
        match CompositeFilter::new(config) {
            Ok(filter) => {
                self.replace(filter);
                Ok(())
            }
            Err(e) => {
                metrics::record_reload(false);
                tracing::error!(error = %e, "Access policy reload failed. Keeping current policy.");
                Err(e)
            }
        }
    }
}

impl Filter for SharedFilter {
    fn evaluate(&self, request: &Request, context: &MessageContext) -> FilterResult {
        self.current.load().evaluate(request, context)
    }

    fn name(&self) -> &'static str {
        "shared"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Properties;
    use crate::filter::AccessDeniedReason;
    use crate::rpc::Params;

    fn config(text: &str) -> CompositeFilterConfig {
        CompositeFilterConfig::from_properties(&Properties::parse(text).unwrap()).unwrap()
    }

    fn request() -> Request {
        Request::new("ws.getTime", Params::None)
    }

    #[test]
    fn test_reload_swaps_policy() {
        let shared = SharedFilter::new(
            CompositeFilter::new(config("access.apiKeys.require=false\n")).unwrap(),
        );
        let ctx = MessageContext::new().with_client_address("127.0.0.1");
        assert_eq!(
            shared.evaluate(&request(), &ctx).reason(),
            Some(AccessDeniedReason::HttpsRequired)
        );

        let before = shared.load();
        shared
            .reload(config("access.https.require=false\naccess.apiKeys.require=false\n"))
            .unwrap();

        assert!(shared.evaluate(&request(), &ctx).is_allowed());
        // snapshots taken before the swap keep the old policy
        assert!(before.evaluate(&request(), &ctx).is_denied());
    }

    #[test]
    fn test_failed_reload_keeps_policy() {
        let shared = SharedFilter::new(CompositeFilter::new(config("")).unwrap());
        let bad = config("access.hosts.allow=no-such-host.invalid\n");

        assert!(matches!(
            shared.reload(bad),
            Err(ConfigError::UnresolvableHost { .. })
        ));
        assert_eq!(shared.load().config().hosts.allow, "*");
    }
}
