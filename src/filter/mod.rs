//! Access filter subsystem.
//!
//! # Data Flow
//! ```text
//! Request + MessageContext
//!     → CompositeFilter (assembled from CompositeFilterConfig)
//!         → host.rs        (client IP allow list)
//!         → transport.rs   (HTTPS requirement)
//!         → certificate.rs (client certificate principal)
//!         → api_key.rs     (API key per method)
//!     → FilterResult: Allowed | Denied(AccessDeniedReason)
//! ```
//!
//! # Design Decisions
//! - Filters are immutable once built; evaluation is a pure read
//! - No I/O during evaluation; hostnames are resolved at construction
//! - Cheap structural checks run before credential checks
//! - Reconfiguration swaps in a freshly built filter (shared.rs)

mod api_key;
mod certificate;
mod chain;
mod composite;
mod host;
mod reason;
mod shared;
mod transport;

use std::fmt;
use std::sync::Arc;

use crate::rpc::{MessageContext, Request};

pub use api_key::{ApiKeyFilter, ANY_METHOD, DEFAULT_API_KEY_PARAMETER_NAME};
pub use certificate::CertificateFilter;
pub use chain::FilterChain;
pub use composite::CompositeFilter;
pub use host::{HostFilter, Resolver, SystemResolver, ALLOW_ANY_HOST};
pub use reason::AccessDeniedReason;
pub use shared::SharedFilter;
pub use transport::TransportSecurityFilter;

/// Outcome of evaluating one request.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    Allowed,
    Denied(AccessDeniedReason),
}

impl FilterResult {
    /// Reusable allowed result.
    pub const ALLOWED: FilterResult = FilterResult::Allowed;

    pub fn is_allowed(&self) -> bool {
        matches!(self, FilterResult::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// The denial reason, if access was denied.
    pub fn reason(&self) -> Option<AccessDeniedReason> {
        match self {
            FilterResult::Allowed => None,
            FilterResult::Denied(reason) => Some(*reason),
        }
    }
}

impl From<AccessDeniedReason> for FilterResult {
    fn from(reason: AccessDeniedReason) -> Self {
        FilterResult::Denied(reason)
    }
}

/// Access policy applied to a request before it is executed.
pub trait Filter: Send + Sync + fmt::Debug {
    /// Decide whether the request may proceed.
    fn evaluate(&self, request: &Request, context: &MessageContext) -> FilterResult;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

impl<F: Filter + ?Sized> Filter for Arc<F> {
    fn evaluate(&self, request: &Request, context: &MessageContext) -> FilterResult {
        (**self).evaluate(request, context)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    fn evaluate(&self, request: &Request, context: &MessageContext) -> FilterResult {
        (**self).evaluate(request, context)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
