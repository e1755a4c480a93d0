//! d2render - Main Entry Point
//! HTTP server that renders D2 diagrams by shelling out to the d2 CLI

mod config;
mod logging;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use config::{DaemonConfig, LogSettings};
use d2render_api_http::HttpServer;
use d2render_core::application::constants::GRACEFUL_SHUTDOWN_TIMEOUT;
use d2render_core::application::RenderService;
use d2render_core::port::id_provider::UuidProvider;
use d2render_core::port::time_provider::SystemTimeProvider;
use d2render_infra_system::SubprocessRenderer;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging first so configuration warnings are visible
    let _log_guards = logging::init_logging(&LogSettings::from_env())?;

    info!("d2render v{} starting...", VERSION);

    // 2. Load configuration
    let config = DaemonConfig::from_env()?;

    let working_dir = match &config.renderer.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    // 3. Setup dependencies (DI wiring)
    let renderer = Arc::new(SubprocessRenderer::new(config.renderer.clone()));

    match renderer.version().await {
        Ok(version) => info!(
            program = %config.renderer.program,
            version = %version,
            "Renderer found"
        ),
        Err(e) => warn!(
            program = %config.renderer.program,
            error = %e,
            "Renderer probe failed; render requests will fail until it is installed"
        ),
    }

    let service = Arc::new(RenderService::new(renderer, Arc::new(SystemTimeProvider)));

    // 4. Start HTTP server
    let server = HttpServer::new(config.http.clone(), service, Arc::new(UuidProvider));
    let handle = server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server start failed: {}", e))?;

    info!(
        port = handle.local_addr().port(),
        working_dir = %working_dir.display(),
        output_mode = %config.renderer.output_mode,
        timeout = ?config.renderer.timeout,
        "D2 rendering service started"
    );
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    shutdown_signal().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown
    handle.stop();
    match tokio::time::timeout(GRACEFUL_SHUTDOWN_TIMEOUT, handle.stopped()).await {
        Ok(Ok(())) => info!("Shutdown complete."),
        Ok(Err(e)) => warn!(error = %e, "HTTP server exited with error"),
        Err(_) => warn!(
            timeout = ?GRACEFUL_SHUTDOWN_TIMEOUT,
            "In-flight requests did not finish in time"
        ),
    }

    Ok(())
}

/// Resolve on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}
