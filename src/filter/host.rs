//! Client IP address allow list.
//!
//! # Design Decisions
//! - Hostnames are resolved once, when the filter is built; a host whose
//!   address changes later is only picked up by a rebuild
//! - Addresses are compared as parsed `IpAddr`s, with IPv4-mapped IPv6
//!   addresses folded to IPv4, so textual variants of one address match

use std::collections::HashSet;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};

use crate::config::ConfigError;
use crate::filter::{AccessDeniedReason, Filter, FilterResult};
use crate::rpc::{MessageContext, Request};

/// Allow list value that admits every client.
pub const ALLOW_ANY_HOST: &str = "*";

/// Resolves an allow-list token to the addresses it denotes.
pub trait Resolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (literal IPs, hosts file, DNS).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        if let Some(ip) = parse_ip(host) {
            return Ok(vec![ip]);
        }

        let addrs: Vec<IpAddr> = (host, 0).to_socket_addrs()?.map(|a| a.ip()).collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "host resolved to no addresses",
            ));
        }
        Ok(addrs)
    }
}

fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

/// Parse a textual address, tolerating surrounding brackets on IPv6.
fn parse_ip(text: &str) -> Option<IpAddr> {
    let text = text.trim();
    let text = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(text);
    text.parse::<IpAddr>().ok().map(canonical)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostPolicy {
    AllowAny,
    Addresses(HashSet<IpAddr>),
}

/// Admits clients whose address is on the allow list.
#[derive(Debug, Clone)]
pub struct HostFilter {
    allow: String,
    policy: HostPolicy,
}

impl HostFilter {
    /// Build from a whitespace-separated list of IPs and hostnames, or `*`.
    ///
    /// Resolution uses the system resolver and may block.
    pub fn new(allow: &str) -> Result<Self, ConfigError> {
        Self::with_resolver(allow, &SystemResolver)
    }

    /// Build with a custom resolver.
    pub fn with_resolver(allow: &str, resolver: &dyn Resolver) -> Result<Self, ConfigError> {
        if allow.trim() == ALLOW_ANY_HOST {
            return Ok(Self::allow_any());
        }

        let mut addresses = HashSet::new();
        for host in allow.split_whitespace() {
            let resolved = resolver
                .resolve(host)
                .map_err(|source| ConfigError::UnresolvableHost {
                    host: host.to_string(),
                    source,
                })?;
            tracing::debug!(host = %host, addresses = ?resolved, "Resolved allowed host");
            addresses.extend(resolved.into_iter().map(canonical));
        }

        Ok(Self {
            allow: allow.to_string(),
            policy: HostPolicy::Addresses(addresses),
        })
    }

    /// A filter that admits every client, including ones with no known address.
    pub fn allow_any() -> Self {
        Self {
            allow: ALLOW_ANY_HOST.to_string(),
            policy: HostPolicy::AllowAny,
        }
    }

    /// The allow list as configured, before resolution.
    pub fn allowed_hosts(&self) -> &str {
        &self.allow
    }

    pub fn allows_any(&self) -> bool {
        self.policy == HostPolicy::AllowAny
    }

    /// Addresses the allow list resolved to; empty when any host is allowed.
    pub fn resolved_addresses(&self) -> Vec<IpAddr> {
        match &self.policy {
            HostPolicy::AllowAny => Vec::new(),
            HostPolicy::Addresses(set) => {
                let mut addrs: Vec<IpAddr> = set.iter().copied().collect();
                addrs.sort();
                addrs
            }
        }
    }

    /// Check a textual client address against the allow list.
    pub fn is_allowed(&self, address: &str) -> bool {
        match &self.policy {
            HostPolicy::AllowAny => true,
            HostPolicy::Addresses(set) => parse_ip(address).is_some_and(|ip| set.contains(&ip)),
        }
    }
}

impl Filter for HostFilter {
    fn evaluate(&self, _request: &Request, context: &MessageContext) -> FilterResult {
        let allowed = match context.client_address() {
            None => self.allows_any(),
            Some(address) => self.is_allowed(address),
        };

        if allowed {
            FilterResult::ALLOWED
        } else {
            AccessDeniedReason::ClientIpDenied.into()
        }
    }

    fn name(&self) -> &'static str {
        "host"
    }
}
