//! JSON-RPC access gateway.
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ listener ─▶ request ID ─▶ access control ──┼──▶ Upstream
//!                           │   (TCP/TLS)                   │              │    JSON-RPC
//!     JSON-RPC error        │                               │ denied       │    server
//!     ◀─────────────────────┼───────────────────────────────┘              │
//!                           │                                              │
//!                           │   access policy ◀── properties file watcher  │
//!                           └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use rpc_access_filter::config::loader::{load_access_config, load_gateway_config};
use rpc_access_filter::config::watcher::ConfigWatcher;
use rpc_access_filter::config::GatewayConfig;
use rpc_access_filter::filter::CompositeFilter;
use rpc_access_filter::http::GatewayServer;
use rpc_access_filter::lifecycle::Shutdown;
use rpc_access_filter::net::load_tls_config;
use rpc_access_filter::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "access-gateway")]
#[command(about = "Access-controlled front end for a JSON-RPC 2.0 server", long_about = None)]
struct Args {
    /// Gateway configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_gateway_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "access-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        upstream = %config.upstream.url,
        request_timeout_secs = config.listener.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    // hostname resolution blocks
    let access_config = load_access_config(&config.access)?;
    if access_config.https.require
        && access_config.https.require_client_cert
        && config.listener.tls.as_ref().and_then(|tls| tls.client_ca_path.as_ref()).is_none()
    {
        tracing::warn!(
            "Client certificates are required but no listener.tls.client_ca_path is set; \
             every request will be denied"
        );
    }
    let filter = tokio::task::spawn_blocking(move || CompositeFilter::new(access_config)).await??;

    let watcher = if config.access.watch {
        ConfigWatcher::new(config.access.clone())
    } else {
        None
    };
    let (_watcher, policy_updates) = match watcher {
        Some((watcher, updates)) => (Some(watcher.run()?), Some(updates)),
        None => (None, None),
    };

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = GatewayServer::new(&config, filter)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    match &config.listener.tls {
        Some(tls) => {
            let tls_config = load_tls_config(tls)?;
            server
                .run_tls(listener, tls_config, policy_updates, shutdown.subscribe())
                .await?;
        }
        None => {
            server.run(listener, policy_updates, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
