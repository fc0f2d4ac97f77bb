// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use blog_backend::auth::session::purge_expired_sessions;
use blog_backend::config::Config;
use blog_backend::db::consistency::find_counter_drift;
use blog_backend::routes;
use blog_backend::state::AppState;
use blog_backend::storage::LocalFileStore;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment (.env is read if present)
    let config = Config::from_env().expect("DATABASE_URL and TOKEN_SECRET must be set");

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    report_startup_state(&pool).await;

    let state = AppState {
        pool: pool.clone(),
        files: Arc::new(LocalFileStore::new(&config.upload_dir)),
        config: config.clone(),
    };

    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Housekeeping that must never stop the server from starting.
async fn report_startup_state(pool: &PgPool) {
    match purge_expired_sessions(pool).await {
        Ok(n) if n > 0 => tracing::info!("Purged {} expired sessions", n),
        Ok(_) => {}
        Err(e) => tracing::error!("Failed to purge expired sessions: {:?}", e),
    }

    match find_counter_drift(pool).await {
        Ok(drift) => {
            for d in &drift {
                tracing::warn!(
                    "Counter drift on post {}: likes {} (actual {}), comments {} (actual {})",
                    d.post_id,
                    d.cached_likes,
                    d.actual_likes,
                    d.cached_comments,
                    d.actual_comments
                );
            }
        }
        Err(e) => tracing::error!("Failed to check post counters: {:?}", e),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down...");
}
