//! BarberBot Server - appointment booking
//!
//! REST API over the booking core, backed by PostgreSQL and Redis.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use barberbot_server::{
    api,
    config::AppConfig,
    repository::{memory::MemoryStore, Repository},
    services::{
        calendar_sink::{CalendarSink, HttpCalendarSink},
        redis::RedisCache,
        reminders::TracingReminderSink,
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("barberbot_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting BarberBot Server v{}", env!("CARGO_PKG_VERSION"));

    let repository = if std::env::var("RUN_MODE").as_deref() == Ok("memory") {
        tracing::warn!("Running with the in-memory store; data is lost on exit");
        Repository::in_memory(MemoryStore::new())
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await
            .context("Failed to connect to database")?;

        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("Database migrations completed");
        Repository::postgres(pool)
    };

    let repository = if config.redis.enabled {
        let cache = RedisCache::new(&config.redis.url, config.redis.ttl_seconds)
            .await
            .context("Failed to connect to Redis")?;
        tracing::info!("Connected to Redis");
        repository.with_cache(cache)
    } else {
        repository
    };

    let calendar_sink: Option<Arc<dyn CalendarSink>> = if config.calendar.enabled {
        let sink = HttpCalendarSink::new(config.calendar.clone())?;
        tracing::info!("Calendar sync enabled ({})", config.calendar.base_url);
        Some(Arc::new(sink))
    } else {
        None
    };

    let services = Services::new(
        repository,
        &config.booking,
        calendar_sink,
        Arc::new(TracingReminderSink::new()),
    )?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
