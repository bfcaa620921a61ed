use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Observability
    stationwx_obs::init("stationwxd");

    // Config
    let cfg = stationwx_config::AppConfig::load().context("failed to load configuration")?;
    let http_bind = cfg.http_bind();

    // A source that cannot be built leaves every endpoint on fallback data
    let source = match stationwx_source::connect(&cfg) {
        Ok(Some(source)) => Some(source),
        Ok(None) => {
            tracing::warn!("no data source configured, serving fallback data");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "data source unavailable, serving fallback data");
            None
        }
    };

    // Build app and state
    let (app, state) = stationwx_api::build_app(source, cfg.fallback_days())?;

    // Start HTTP server
    let addr: SocketAddr = http_bind
        .parse()
        .with_context(|| format!("invalid HTTP bind address {}", http_bind))?;
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;

    // Mark ready just before serving
    stationwx_api::set_ready(&state, true);

    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
