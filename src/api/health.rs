//! Health check, welcome and fallback endpoints

use axum::Json;
use serde::Serialize;

use crate::error::{AppError, MessageResponse};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Welcome message at the root path
pub async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse::new(format!(
        "Welcome to the Library API v{}",
        env!("CARGO_PKG_VERSION")
    )))
}

/// Catch-all for unmatched routes
pub async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}
