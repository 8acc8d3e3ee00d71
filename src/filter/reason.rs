//! Access denial reasons.
//!
//! Codes live in the reserved band [-31100 .. -31199] and are part of the
//! client-facing contract; they must never be renumbered or reused.

use std::fmt;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessDeniedReason {
    /// [-31100] Requests must be sent over HTTPS.
    HttpsRequired,
    /// [-31105] Client IP address not on the allow list.
    ClientIpDenied,
    /// [-31110] A trusted client certificate is required.
    ClientCertRequired,
    /// [-31111] The client certificate principal is not a valid DN.
    InvalidClientPrincipalDn,
    /// [-31112] The client certificate principal does not match.
    ClientPrincipalDenied,
    /// [-31120] The API key check needs named parameters.
    ApiKeyRequiresNamedParam,
    /// [-31121] No API key parameter in the request.
    MissingApiKey,
    /// [-31123] Unknown API key, or key not valid for the method.
    ApiKeyDenied,
}

impl AccessDeniedReason {
    pub const ALL: [AccessDeniedReason; 8] = [
        AccessDeniedReason::HttpsRequired,
        AccessDeniedReason::ClientIpDenied,
        AccessDeniedReason::ClientCertRequired,
        AccessDeniedReason::InvalidClientPrincipalDn,
        AccessDeniedReason::ClientPrincipalDenied,
        AccessDeniedReason::ApiKeyRequiresNamedParam,
        AccessDeniedReason::MissingApiKey,
        AccessDeniedReason::ApiKeyDenied,
    ];

    /// Stable numeric error code.
    pub fn code(self) -> i32 {
        match self {
            AccessDeniedReason::HttpsRequired => -31100,
            AccessDeniedReason::ClientIpDenied => -31105,
            AccessDeniedReason::ClientCertRequired => -31110,
            AccessDeniedReason::InvalidClientPrincipalDn => -31111,
            AccessDeniedReason::ClientPrincipalDenied => -31112,
            AccessDeniedReason::ApiKeyRequiresNamedParam => -31120,
            AccessDeniedReason::MissingApiKey => -31121,
            AccessDeniedReason::ApiKeyDenied => -31123,
        }
    }

    /// Human-readable message returned to the client.
    pub fn message(self) -> &'static str {
        match self {
            AccessDeniedReason::HttpsRequired => "Requests must be sent over HTTPS",
            AccessDeniedReason::ClientIpDenied => "Client IP address denied access",
            AccessDeniedReason::ClientCertRequired => "Trusted client X.509 certificate required",
            AccessDeniedReason::InvalidClientPrincipalDn => {
                "Invalid client X.509 certificate principal DN"
            }
            AccessDeniedReason::ClientPrincipalDenied => {
                "Client X.509 certificate principal denied"
            }
            AccessDeniedReason::ApiKeyRequiresNamedParam => {
                "API key filter requires named JSON-RPC 2.0 parameters"
            }
            AccessDeniedReason::MissingApiKey => "Missing API key",
            AccessDeniedReason::ApiKeyDenied => "API key denied access",
        }
    }

    /// Short identifier used as a log field and metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessDeniedReason::HttpsRequired => "https_required",
            AccessDeniedReason::ClientIpDenied => "client_ip_denied",
            AccessDeniedReason::ClientCertRequired => "client_cert_required",
            AccessDeniedReason::InvalidClientPrincipalDn => "invalid_client_principal_dn",
            AccessDeniedReason::ClientPrincipalDenied => "client_principal_denied",
            AccessDeniedReason::ApiKeyRequiresNamedParam => "api_key_requires_named_param",
            AccessDeniedReason::MissingApiKey => "missing_api_key",
            AccessDeniedReason::ApiKeyDenied => "api_key_denied",
        }
    }
}

impl fmt::Display for AccessDeniedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AccessDeniedReason::HttpsRequired.code(), -31100);
        assert_eq!(AccessDeniedReason::ClientIpDenied.code(), -31105);
        assert_eq!(AccessDeniedReason::ClientCertRequired.code(), -31110);
        assert_eq!(AccessDeniedReason::InvalidClientPrincipalDn.code(), -31111);
        assert_eq!(AccessDeniedReason::ClientPrincipalDenied.code(), -31112);
        assert_eq!(AccessDeniedReason::ApiKeyRequiresNamedParam.code(), -31120);
        assert_eq!(AccessDeniedReason::MissingApiKey.code(), -31121);
        assert_eq!(AccessDeniedReason::ApiKeyDenied.code(), -31123);
    }

    #[test]
    fn test_codes_unique_and_in_band() {
        let codes: HashSet<i32> = AccessDeniedReason::ALL.iter().map(|r| r.code()).collect();
        assert_eq!(codes.len(), AccessDeniedReason::ALL.len());
        assert!(codes.iter().all(|c| (-31199..=-31100).contains(c)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            AccessDeniedReason::MissingApiKey.to_string(),
            "[-31121] Missing API key"
        );
    }
}
