//! HTTP Server
//!
//! Binds a TCP listener and serves the render router until shutdown.

use crate::handler::{self, AppState};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use d2render_core::application::constants::{DEFAULT_HOST, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT};
use d2render_core::application::{shutdown_channel, RenderService, ShutdownSender};
use d2render_core::port::IdProvider;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Request bodies above this size get 413
    pub max_body_bytes: usize,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// HTTP Server
pub struct HttpServer {
    config: HttpServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(
        config: HttpServerConfig,
        service: Arc<RenderService>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            config,
            state: Arc::new(AppState::new(service, id_provider)),
        }
    }

    /// Build the router (also used directly by tests)
    pub fn router(&self) -> Router {
        Router::new()
            .route("/render", post(handler::render))
            .route("/health", get(handler::health))
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .with_state(self.state.clone())
    }

    /// Bind and start serving in a background task
    ///
    /// Port 0 binds an ephemeral port; see [`ServerHandle::local_addr`].
    pub async fn start(self) -> std::io::Result<ServerHandle> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let local_addr = listener.local_addr()?;

        info!(
            host = %self.config.host,
            addr = %local_addr,
            max_body_bytes = self.config.max_body_bytes,
            "HTTP server listening"
        );

        let router = self.router();
        let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

        let join = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown_rx.wait().await })
                .await;
            if let Err(e) = &result {
                error!(error = %e, "HTTP server error");
            }
            result
        });

        Ok(ServerHandle {
            local_addr,
            shutdown: shutdown_tx,
            join,
        })
    }
}

/// Handle to a running server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: ShutdownSender,
    join: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections; in-flight requests are allowed to finish
    pub fn stop(&self) {
        self.shutdown.shutdown();
    }

    /// Wait until the server task has exited
    pub async fn stopped(self) -> std::io::Result<()> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e)),
        }
    }
}
