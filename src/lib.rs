pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::core::{bootstrap, config::Settings, redis::RedisHandle, shutdown, state::AppState};

/// Loads configuration, prepares storage and serves the API until a shutdown
/// signal arrives.
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load().context("loading configuration")?;
    core::telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db = db::connect(&settings).await.context("connecting to postgres")?;
    db::run_migrations(&db).await.context("applying migrations")?;
    let redis = connect_redis(&settings).await;

    let state = AppState::new(settings, db, redis.clone());
    if let Err(err) = bootstrap::ensure_admin(&state).await {
        tracing::error!(error = %err, "admin bootstrap failed");
    }

    let listen = state.settings().listen();
    let listener = TcpListener::bind(listen.bind_addr())
        .await
        .with_context(|| format!("binding {}", listen.bind_addr()))?;
    tracing::info!(
        addr = %listen.bind_addr(),
        environment = state.settings().runtime().environment.as_str(),
        "Exam portal listening"
    );

    let served = axum::serve(listener, api::router::router(state))
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await;
    redis.disconnect().await;
    served.context("serving http")
}

/// Rate limiting degrades to "always allowed" when Redis is unreachable, so a
/// failed connection is logged rather than fatal.
async fn connect_redis(settings: &Settings) -> RedisHandle {
    let redis = RedisHandle::new(settings.redis().url.clone());
    match redis.connect().await {
        Ok(()) => tracing::info!("redis connected"),
        Err(err) => tracing::error!(error = %err, "redis unavailable; rate limits disabled"),
    }
    redis
}
