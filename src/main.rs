use std::sync::Arc;

use delivery_tracker::api;
use delivery_tracker::config::Config;
use delivery_tracker::engine::ticker::run_status_ticker;
use delivery_tracker::engine::Engine;
use delivery_tracker::error::AppError;
use delivery_tracker::state::AppState;
use delivery_tracker::store::FileBlobStore;
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let engine = Engine::from_config(&config)?;
    let shared_state = Arc::new(AppState::new(engine, config.event_buffer_size));

    let blobs = match &config.snapshot_dir {
        Some(dir) => Some(FileBlobStore::new(dir)?),
        None => None,
    };
    if let Some(blobs) = &blobs {
        if let Err(err) = shared_state.orders.load_from(blobs) {
            tracing::warn!(error = %err, "could not restore saved orders; starting empty");
        }
    }

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(run_status_ticker(
        shared_state.clone(),
        Duration::from_secs(config.status_tick_seconds),
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    if let Some(blobs) = &blobs {
        shared_state.orders.save_to(blobs)?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
