//! Health check handler

use axum::Json;
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

/// Health check response data
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    /// Build revision (`git rev-parse --short HEAD`)
    #[schema(example = "a1b2c3d")]
    pub version: &'static str,
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
}

/// Liveness check. Does not require authentication.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("GIT_HASH"),
        timestamp_ms: Utc::now().timestamp_millis(),
    })
}
