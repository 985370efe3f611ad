use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use attendance_api::{app, config, middleware};

/// How often connection pool gauges are refreshed.
const POOL_METRICS_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting attendance API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool)
        .await
        .context("database migrations failed")?;
    info!("Migrations completed");

    let metrics_pool = pool.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(POOL_METRICS_INTERVAL);
        loop {
            ticker.tick().await;
            persistence::metrics::record_pool_metrics(&metrics_pool);
        }
    });

    let addr = config.socket_addr().context("invalid server.host/server.port")?;
    info!(
        utc_offset_minutes = config.attendance.utc_offset_minutes,
        "Attendance day boundary configured"
    );

    let app = app::create_app(config, app::Stores::postgres(pool))?;

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
