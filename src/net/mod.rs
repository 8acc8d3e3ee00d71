//! Network layer subsystem.
//!
//! The gateway serves plain TCP and TLS through `axum::serve`. Every
//! connection is described by a [`PeerInfo`]: its address, whether it is
//! TLS, and the subject of the client certificate the TLS layer verified.
//! Requests are only secure, and only carry principals, when they really
//! arrived over TLS.

pub mod peer;
pub mod tls;

pub use peer::PeerInfo;
pub use tls::{load_tls_config, TlsListener};
