use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tracing::info;

use school_backend::{app::create_router, app_state::AppState, config, db, i18n, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let telemetry = telemetry::init_telemetry(None)
        .await
        .context("Failed to initialize telemetry")?;

    let config = config::init().context("Failed to load configuration")?;

    let pool = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    let localizer = i18n::init_i18n(config.app.locales_dir.as_deref().map(Path::new))
        .context("Failed to load locales")?;

    let state = AppState::new(pool, config.clone(), Arc::new(localizer));
    let app = create_router(state);

    let addr = config.server_addr();
    info!(app = %config.app.name, environment = config.app.environment.as_str(), %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    telemetry.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
