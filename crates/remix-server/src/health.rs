use axum::{Json, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

/// Liveness payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "online",
            message: "Server is running",
        }),
    )
}
