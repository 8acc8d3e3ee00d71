//! Client X.509 certificate principal check.
//!
//! The transport has already validated the certificate chain; this filter
//! only looks at the verified principal names it exposes.

use crate::filter::{AccessDeniedReason, Filter, FilterResult};
use crate::rpc::{MessageContext, Request};
use crate::security::DistinguishedName;

/// Requires a client certificate, optionally with a specific subject DN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFilter {
    require_cert: bool,
    required_principal: Option<DistinguishedName>,
}

impl CertificateFilter {
    /// `required_principal` of `None` accepts any verified principal.
    pub fn new(require_cert: bool, required_principal: Option<DistinguishedName>) -> Self {
        Self {
            require_cert,
            required_principal,
        }
    }

    pub fn requires_cert(&self) -> bool {
        self.require_cert
    }

    pub fn required_principal(&self) -> Option<&DistinguishedName> {
        self.required_principal.as_ref()
    }
}

impl Filter for CertificateFilter {
    fn evaluate(&self, _request: &Request, context: &MessageContext) -> FilterResult {
        if !self.require_cert {
            return FilterResult::ALLOWED;
        }

        let mut principals = context
            .principals()
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .peekable();

        if principals.peek().is_none() {
            return AccessDeniedReason::ClientCertRequired.into();
        }

        let Some(required) = &self.required_principal else {
            return FilterResult::ALLOWED;
        };

        for principal in principals {
            match DistinguishedName::parse(principal) {
                Ok(dn) if dn == *required => return FilterResult::ALLOWED,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "Unparseable client principal");
                    return AccessDeniedReason::InvalidClientPrincipalDn.into();
                }
            }
        }

        AccessDeniedReason::ClientPrincipalDenied.into()
    }

    fn name(&self) -> &'static str {
        "client_certificate"
    }
}
