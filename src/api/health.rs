//! Health check endpoint
//!
//! - GET /api/health - Liveness plus a database ping

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

/// GET /api/health
///
/// Returns 503 when the database does not answer.
async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if let Err(e) = state.pool.ping().await {
        tracing::error!("Health check failed: {:#}", e);
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Database unavailable",
        ));
    }

    Ok(ApiResponse::ok(HealthStatus {
        status: "ok",
        database: "connected",
    }))
}
