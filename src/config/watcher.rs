//! Access policy file watcher for hot reload.

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::access::CompositeFilterConfig;
use crate::config::loader::load_access_config;
use crate::config::schema::AccessConfig;

/// Monitors the access properties file and emits re-parsed policies.
pub struct ConfigWatcher {
    path: PathBuf,
    access: AccessConfig,
    update_tx: mpsc::UnboundedSender<CompositeFilterConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for the properties file named by `access`.
    ///
    /// Returns `None` when no properties file is configured, along with a
    /// receiver for policy updates otherwise.
    pub fn new(
        access: AccessConfig,
    ) -> Option<(Self, mpsc::UnboundedReceiver<CompositeFilterConfig>)> {
        let path = PathBuf::from(access.properties_path.as_ref()?);
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        Some((
            Self {
                path,
                access,
                update_tx,
            },
            update_rx,
        ))
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let access = self.access;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!("Access policy change detected, reloading...");
                    match load_access_config(&access) {
                        Ok(config) => {
                            publish(&tx, config);
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                "Failed to reload access policy. Keeping current policy."
                            );
                            crate::observability::metrics::record_reload(false);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Access policy watcher started");
        Ok(watcher)
    }
}

/// Hand a re-parsed policy to the reloader. Returns `false` once the
/// reloader is gone.
fn publish(
    tx: &mpsc::UnboundedSender<CompositeFilterConfig>,
    config: CompositeFilterConfig,
) -> bool {
    if tx.send(config).is_err() {
        tracing::warn!("Access policy reloader has stopped. Update not applied.");
        return false;
    }
    true
}
