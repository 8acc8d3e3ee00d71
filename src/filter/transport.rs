//! HTTPS requirement.

use crate::filter::{AccessDeniedReason, Filter, FilterResult};
use crate::rpc::{MessageContext, Request};

/// Denies requests that did not arrive over a secure transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSecurityFilter {
    require_secure: bool,
}

impl TransportSecurityFilter {
    pub fn new(require_secure: bool) -> Self {
        Self { require_secure }
    }

    pub fn requires_secure(&self) -> bool {
        self.require_secure
    }
}

impl Default for TransportSecurityFilter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Filter for TransportSecurityFilter {
    fn evaluate(&self, _request: &Request, context: &MessageContext) -> FilterResult {
        if !self.require_secure || context.is_secure() {
            FilterResult::ALLOWED
        } else {
            AccessDeniedReason::HttpsRequired.into()
        }
    }

    fn name(&self) -> &'static str {
        "transport_security"
    }
}
