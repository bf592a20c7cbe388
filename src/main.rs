use std::sync::Arc;

use covenant_monitor::{app::app, config, database::DatabaseManager, is_production, scheduler::SchedulerEngine};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Covenant Monitor API in {:?} mode", config.environment);

    if is_production!() && config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; every login and token check will fail");
    }

    if config.database.run_migrations {
        if let Err(e) = DatabaseManager::migrate().await {
            tracing::error!("Migrations not applied: {}", e);
        }
    }

    let engine = Arc::new(SchedulerEngine::with_postgres(&config.scheduler)?);
    let timers = if config.scheduler.enabled {
        for entry in engine.describe(chrono::Utc::now()) {
            tracing::info!("Rule {} ('{}') next fires at {:?}", entry.rule, entry.cron, entry.next_fire);
        }
        engine.spawn()
    } else {
        tracing::info!("Scheduler disabled");
        Vec::new()
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Covenant Monitor API listening on http://{}", bind_addr);

    axum::serve(listener, app(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for timer in timers {
        timer.abort();
    }
    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
