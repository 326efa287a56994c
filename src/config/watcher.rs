//! Configuration file watcher for hot reload.
//!
//! Only the `[serializer]` section can change while the server runs. A
//! reload that leaves it untouched sends nothing, and edits to the listener,
//! timeout or observability sections are reported as needing a restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{SerializerConfig, ServerConfig};

/// Reloads the file and decides whether the serializer chain needs a rebuild.
#[derive(Debug)]
pub struct ConfigReloader {
    path: PathBuf,
    running: ServerConfig,
}

impl ConfigReloader {
    /// `running` is the configuration the server was started with.
    pub fn new(path: &Path, running: ServerConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            running,
        }
    }

    /// Load the file and return the serializer section if it changed.
    ///
    /// A file that fails to load or validate leaves the running
    /// configuration in place.
    pub fn reload(&mut self) -> Option<SerializerConfig> {
        match load_config(&self.path) {
            Ok(loaded) => self.accept(loaded),
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Failed to reload config, keeping current serializers");
                None
            }
        }
    }

    /// Compare a freshly loaded configuration with the running one.
    pub fn accept(&mut self, loaded: ServerConfig) -> Option<SerializerConfig> {
        if loaded.listener != self.running.listener
            || loaded.timeouts != self.running.timeouts
            || loaded.observability != self.running.observability
        {
            tracing::warn!(path = ?self.path, "Config changes outside [serializer] apply only after a restart");
        }

        if loaded.serializer == self.running.serializer {
            tracing::debug!(path = ?self.path, "Serializer section unchanged, skipping reload");
            return None;
        }

        self.running.serializer = loaded.serializer;
        Some(self.running.serializer.clone())
    }

    /// The serializer section most recently handed to the server.
    pub fn serializer(&self) -> &SerializerConfig {
        &self.running.serializer
    }
}

/// A watcher that forwards serializer changes in the configuration file.
pub struct ConfigWatcher {
    reloader: ConfigReloader,
    update_tx: mpsc::UnboundedSender<SerializerConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for serializer updates.
    pub fn new(
        path: &Path,
        running: ServerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SerializerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let reloader = ConfigReloader::new(path, running);
        (Self { reloader, update_tx }, update_rx)
    }

    /// Start watching the file. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.reloader.path.clone();
        let Self {
            mut reloader,
            update_tx,
        } = self;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(update) = reloader.reload() {
                        tracing::info!(
                            callback_header = %update.jsonp.callback_header,
                            "Serializer config changed"
                        );
                        if update_tx.send(update).is_err() {
                            tracing::warn!("Server stopped, dropping serializer update");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}
