use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::core::metrics;
use crate::core::redis::RedisHealth;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let api = state.settings().api();
    Json(RootResponse {
        message: api.project_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_prefix: api.prefix.clone(),
    })
}

/// A broken database makes the service unhealthy; a broken Redis only
/// degrades it since rate limiting fails open.
pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut components = BTreeMap::new();

    let database = sqlx::query("SELECT 1").execute(state.db()).await;
    let database_up = database.is_ok();
    components.insert(
        "database",
        database.map_or_else(|err| format!("unhealthy: {err}"), |_| "healthy".to_string()),
    );

    let redis = state.redis().health().await;
    let redis_broken = matches!(redis, RedisHealth::Unhealthy(_));
    components.insert(
        "redis",
        match redis {
            RedisHealth::Healthy => "healthy".to_string(),
            RedisHealth::Disconnected => "disconnected".to_string(),
            RedisHealth::Unhealthy(error) => format!("unhealthy: {error}"),
        },
    );

    let status = match (database_up, redis_broken) {
        (false, _) => "unhealthy",
        (true, true) => "degraded",
        (true, false) => "healthy",
    };
    Json(HealthResponse { service: env!("CARGO_PKG_NAME"), status, components })
}

pub(crate) async fn metrics(State(state): State<AppState>) -> Response {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => {
            ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
        }
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
