// src/handlers/mod.rs

pub mod auth;
pub mod comment;
pub mod fight;
pub mod post;
pub mod profile;

use axum::{Json, response::IntoResponse};
use serde_json::json;

use crate::error::AppError;

/// Liveness probe.
pub async fn hello() -> impl IntoResponse {
    Json(json!({ "message": "Hello, World!" }))
}

/// Unknown `/api/*` paths get a JSON 404 instead of the client bundle.
pub async fn api_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
