use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
pub struct ServiceHealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: String,
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Health check under the user route prefix.
pub async fn user_health_check() -> Json<ServiceHealthResponse> {
    Json(ServiceHealthResponse {
        status: "healthy",
        service: "user",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match state.store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!("Readiness check failed ({}): {:#}", state.store.backend(), e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
