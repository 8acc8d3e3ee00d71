//! TLS configuration, certificate loading and the TLS listener.
//!
//! # Design Decisions
//! - Client certificates are requested but optional when a client CA is
//!   configured, so a missing certificate surfaces as an access denial
//!   rather than a failed handshake
//! - Handshakes run on their own tasks; a slow client never holds up
//!   the accept loop

use std::fs::File;
use std::io::{self, BufReader};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::serve::Listener;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

use crate::config::schema::TlsConfig;
use crate::http::GatewayError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Completed handshakes waiting for the server to pick them up.
const ACCEPT_BACKLOG: usize = 128;

/// Build the rustls server configuration from the listener's PEM files.
pub fn load_tls_config(config: &TlsConfig) -> Result<Arc<ServerConfig>, GatewayError> {
    let server_chain = load_cert_chain(Path::new(&config.cert_path))?;
    let private_key = load_private_key(Path::new(&config.key_path))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ServerConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| GatewayError::Tls(e.to_string()))?;

    let builder = match &config.client_ca_path {
        Some(ca_path) => {
            let roots = load_root_store(Path::new(ca_path))?;
            let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
                .allow_unauthenticated()
                .build()
                .map_err(|e| {
                    GatewayError::Tls(format!("failed to build client verifier from {ca_path}: {e}"))
                })?;
            builder.with_client_cert_verifier(verifier)
        }
        None => builder.with_no_client_auth(),
    };

    let server_config = builder
        .with_single_cert(server_chain, private_key)
        .map_err(|e| GatewayError::Tls(format!("invalid certificate/key pair: {e}")))?;

    Ok(Arc::new(server_config))
}

fn open(path: &Path, what: &str) -> Result<BufReader<File>, GatewayError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| GatewayError::Tls(format!("{what} file {}: {e}", path.display())))
}

fn load_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>, GatewayError> {
    let mut reader = open(path, "certificate")?;
    let certificates = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            GatewayError::Tls(format!("failed to parse PEM certificates from {}: {e}", path.display()))
        })?;
    if certificates.is_empty() {
        return Err(GatewayError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certificates)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, GatewayError> {
    let mut reader = open(path, "private key")?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| {
            GatewayError::Tls(format!("failed to parse private key {}: {e}", path.display()))
        })?
        .ok_or_else(|| GatewayError::Tls(format!("no private key found in {}", path.display())))
}

fn load_root_store(path: &Path) -> Result<RootCertStore, GatewayError> {
    let mut roots = RootCertStore::empty();
    let (added, _ignored) = roots.add_parsable_certificates(load_cert_chain(path)?);
    if added == 0 {
        return Err(GatewayError::Tls(format!(
            "no valid CA certificates found in {}",
            path.display()
        )));
    }
    Ok(roots)
}

/// A listener yielding TLS streams for `axum::serve`.
pub struct TlsListener {
    local_addr: SocketAddr,
    streams: mpsc::Receiver<(TlsStream<TcpStream>, SocketAddr)>,
    accept_task: JoinHandle<()>,
}

impl TlsListener {
    /// Accept connections on `listener` and complete their handshakes.
    pub fn new(listener: TcpListener, config: Arc<ServerConfig>) -> io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let (tx, streams) = mpsc::channel(ACCEPT_BACKLOG);
        let accept_task = tokio::spawn(accept_loop(listener, TlsAcceptor::from(config), tx));

        Ok(Self {
            local_addr,
            streams,
            accept_task,
        })
    }
}

impl Drop for TlsListener {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

impl Listener for TlsListener {
    type Io = TlsStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        match self.streams.recv().await {
            Some(connection) => connection,
            // the accept loop only stops once this listener is dropped
            None => std::future::pending().await,
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        Ok(self.local_addr)
    }
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    tx: mpsc::Sender<(TlsStream<TcpStream>, SocketAddr)>,
) {
    while !tx.is_closed() {
        let (stream, peer) = match listener.accept().await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                Ok(Ok(tls_stream)) => {
                    let _ = tx.send((tls_stream, peer)).await;
                }
                Ok(Err(e)) => {
                    tracing::debug!(peer = %peer, error = %e, "TLS handshake failed");
                }
                Err(_) => tracing::debug!(peer = %peer, "TLS handshake timed out"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tls_config(cert: &Path, key: &Path) -> TlsConfig {
        TlsConfig {
            cert_path: cert.to_string_lossy().into_owned(),
            key_path: key.to_string_lossy().into_owned(),
            client_ca_path: None,
        }
    }

    #[test]
    fn test_missing_certificate() {
        let config = tls_config(
            Path::new("/nonexistent/server.pem"),
            Path::new("/nonexistent/server.key"),
        );
        let err = load_tls_config(&config).unwrap_err();
        assert!(err.to_string().contains("certificate file"));
    }

    #[test]
    fn test_invalid_pem() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("server.pem");
        let key = dir.path().join("server.key");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        let err = load_tls_config(&tls_config(&cert, &key)).unwrap_err();
        assert!(err.to_string().contains("no certificates found"));
    }

    #[test]
    fn test_server_and_client_ca() {
        let key = rcgen::KeyPair::generate().unwrap();
        let cert = rcgen::CertificateParams::new(vec!["localhost".to_string()])
            .unwrap()
            .self_signed(&key)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let cert_path = dir.path().join("server.pem");
        let key_path = dir.path().join("server.key");
        std::fs::write(&cert_path, cert.pem()).unwrap();
        std::fs::write(&key_path, key.serialize_pem()).unwrap();

        let mut config = tls_config(&cert_path, &key_path);
        assert!(load_tls_config(&config).is_ok());

        // the key file holds no certificate
        config.client_ca_path = Some(key_path.to_string_lossy().into_owned());
        assert!(matches!(load_tls_config(&config), Err(GatewayError::Tls(_))));

        config.client_ca_path = Some(cert_path.to_string_lossy().into_owned());
        assert!(load_tls_config(&config).is_ok());
    }
}
