//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo handlers
//! - Wire up middleware (request ID, tracing, timeout, serializer chain)
//! - Bind server to listener
//! - Swap in a new serializer chain when the configuration changes

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{SerializerConfig, ServerConfig};
use crate::http::handlers;
use crate::http::middleware::{chain_middleware, SharedChain};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::serializer::{SerializeError, SerializerChain};

/// HTTP server serving structured payloads through the serializer chain.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    chain: SharedChain,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self, SerializeError> {
        let chain = SerializerChain::from_config(&config.serializer)?;
        let chain: SharedChain = Arc::new(ArcSwap::from_pointee(chain));

        let router = Self::build_router(&config, chain.clone());
        Ok(Self {
            router,
            config,
            chain,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServerConfig, chain: SharedChain) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/items/{id}", get(handlers::get_item))
            .route("/fail", get(handlers::fail))
            .route("/raw", get(handlers::raw))
            .with_state(chain.clone())
            .layer(middleware::from_fn_with_state(chain, chain_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live serializer chain.
    pub fn chain(&self) -> SharedChain {
        self.chain.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, applying serializer updates
    /// as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<SerializerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let chain = self.chain.clone();
        tokio::spawn(async move {
            while let Some(serializer) = config_updates.recv().await {
                apply_config(&chain, &serializer);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Rebuild the serializer chain from `config` and swap it in.
///
/// Requests already in flight keep the chain they started with.
pub fn apply_config(chain: &SharedChain, config: &SerializerConfig) {
    match SerializerChain::from_config(config) {
        Ok(new_chain) => {
            chain.store(Arc::new(new_chain));
            tracing::info!(
                callback_header = %config.jsonp.callback_header,
                "Serializer chain reloaded"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Rejected serializer config, keeping current chain");
        }
    }
}
