//! What the gateway knows about the connection a request arrived on.

use std::net::SocketAddr;

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use rustls::pki_types::CertificateDer;
use tokio::net::TcpListener;
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::prelude::{FromDer, X509Certificate, X509Name};

use crate::net::tls::TlsListener;

/// Connection facts, captured once per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub addr: SocketAddr,
    /// The connection is TLS.
    pub secure: bool,
    /// Subject DN of the verified client certificate, RFC 4514 form.
    pub principals: Vec<String>,
}

impl PeerInfo {
    /// A plain TCP peer.
    pub fn plain(addr: SocketAddr) -> Self {
        Self {
            addr,
            secure: false,
            principals: Vec::new(),
        }
    }

    /// A TLS peer, with the principal of the certificate it presented.
    pub fn tls(addr: SocketAddr, peer_certificates: Option<&[CertificateDer<'_>]>) -> Self {
        // only the leaf is verified to belong to the client
        let principals = peer_certificates
            .and_then(|chain| chain.first())
            .and_then(|leaf| subject_dn(leaf))
            .into_iter()
            .collect();
        Self {
            addr,
            secure: true,
            principals,
        }
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for PeerInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        Self::plain(*stream.remote_addr())
    }
}

impl Connected<IncomingStream<'_, TlsListener>> for PeerInfo {
    fn connect_info(stream: IncomingStream<'_, TlsListener>) -> Self {
        let (_, session) = stream.io().get_ref();
        Self::tls(*stream.remote_addr(), session.peer_certificates())
    }
}

/// The certificate's subject as an RFC 4514 string (last RDN first).
pub fn subject_dn(cert_der: &[u8]) -> Option<String> {
    let (_, cert) = match X509Certificate::from_der(cert_der) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable client certificate");
            return None;
        }
    };
    rfc4514(cert.subject())
}

fn rfc4514(name: &X509Name<'_>) -> Option<String> {
    let mut rdns = Vec::new();
    for rdn in name.iter() {
        let mut attributes = Vec::new();
        for attribute in rdn.iter() {
            let oid = attribute.attr_type();
            let attr_type = oid2abbrev(oid, oid_registry())
                .map(str::to_string)
                .unwrap_or_else(|_| oid.to_id_string());
            let value = match attribute.as_str() {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(attr_type = %attr_type, error = %e, "Non-string subject attribute");
                    return None;
                }
            };
            attributes.push(format!("{attr_type}={}", escape_value(value)));
        }
        rdns.push(attributes.join("+"));
    }
    rdns.reverse();
    Some(rdns.join(","))
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        let special = matches!(c, '"' | '+' | ',' | ';' | '<' | '>' | '\\')
            || (i == 0 && (c == '#' || c == ' '))
            || (i == last && c == ' ');
        if special {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::DistinguishedName;
    use rcgen::{CertificateParams, DnType, KeyPair};

    fn certificate(subject: &[(DnType, &str)]) -> Vec<u8> {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = rcgen::DistinguishedName::new();
        for (attr_type, value) in subject {
            params.distinguished_name.push(attr_type.clone(), *value);
        }
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().to_vec()
    }

    #[test]
    fn test_subject_in_rfc4514_order() {
        let der = certificate(&[
            (DnType::OrganizationName, "example"),
            (DnType::OrganizationalUnitName, "people"),
            (DnType::CommonName, "Doe, John"),
        ]);

        let subject = subject_dn(&der).unwrap();
        assert_eq!(subject, "CN=Doe\\, John,OU=people,O=example");
        assert_eq!(
            DistinguishedName::parse(&subject).unwrap(),
            DistinguishedName::parse("cn=Doe\\, John,ou=people,o=example").unwrap()
        );
    }

    #[test]
    fn test_garbage_certificate() {
        assert_eq!(subject_dn(b"not a certificate"), None);
    }

    #[test]
    fn test_only_leaf_counts() {
        let leaf = CertificateDer::from(certificate(&[(DnType::CommonName, "client")]));
        let other = CertificateDer::from(certificate(&[(DnType::CommonName, "admin")]));
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        let peer = PeerInfo::tls(addr, Some(&[leaf, other][..]));
        assert!(peer.secure);
        assert_eq!(peer.principals, vec!["CN=client".to_string()]);

        assert!(PeerInfo::tls(addr, None).principals.is_empty());
        assert!(!PeerInfo::plain(addr).secure);
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value(" #a+b "), "\\ #a\\+b\\ ");
        assert_eq!(escape_value("#x"), "\\#x");
        assert_eq!(escape_value("plain"), "plain");
    }
}
