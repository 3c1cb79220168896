use std::sync::Arc;

use anyhow::Context;
use storage::{
    Database, Leaderboard, LeaderboardStore, MemoryStore,
    services::points::{PointsSource, RandomPoints, SeededPoints},
};

mod app;
mod config;
mod error;
mod features;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting leaderboard API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let store = build_store(&config).await?;
    let points: Arc<dyn PointsSource> = match config.points_seed {
        Some(seed) => {
            tracing::info!("Drawing award points from seed {}", seed);
            Arc::new(SeededPoints::new(seed))
        }
        None => Arc::new(RandomPoints),
    };
    let board = Leaderboard::new(store, points);

    board
        .seed_defaults(&config.default_participants)
        .await
        .context("Failed to seed default participants")?;
    board
        .reconcile()
        .await
        .context("Failed to reconcile participant ranks")?;

    let cors = app::cors_layer(config.cors_origin.as_deref()).context("Invalid CORS_ORIGIN")?;
    let router = app::router(board, cors);

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn LeaderboardStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL is not set, using the in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    };

    tracing::info!(
        "Connecting to database at: {}",
        database_url.split('@').next_back().unwrap_or("unknown")
    );
    let db = Database::new(database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    Ok(Arc::new(db.store()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
