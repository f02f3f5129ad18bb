//! Expression editor API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use xedit_api::{create_router, ApiConfig, AppState};
use xedit_predictor::PredictorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("xedit=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("Starting xedit-api");

    let config = ApiConfig::from_env();
    let predictor_config = PredictorConfig::from_env();
    info!(
        host = %config.host,
        port = config.port,
        predictions_url = %predictor_config.predictions_url,
        "Loaded configuration"
    );

    let state = AppState::new(config.clone(), predictor_config).context("failed to create application state")?;
    let shutdown = state.shutdown.clone();

    match state.predictor.health_check().await {
        Ok(true) => info!("Prediction service is ready"),
        _ => warn!("Prediction service is not ready yet; edits may be rejected while it warms up"),
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid bind address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
    }
    info!("Received shutdown signal");
    // In-flight predictions stop polling
    shutdown.cancel();
}
