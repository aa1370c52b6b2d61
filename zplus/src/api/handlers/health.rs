use axum::{Json, extract::State};

use crate::{AppState, api::models::health::HealthResponse};

/// Liveness plus the reachability of the database and cache
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "disconnected"
        }
    };

    let cache = match &state.cache {
        None => "disabled",
        Some(cache) if cache.ping().await => "connected",
        Some(_) => "disconnected",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        database: database.to_string(),
        cache: cache.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
