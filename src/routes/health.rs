//! Health check endpoint for container orchestration.
//!
//! Provides a liveness probe that returns 200 OK with a fixed JSON status
//! whenever the process can respond to HTTP.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Path of the health check route
pub const HEALTH_PATH: &str = "/health";

/// Health check payload: `{"status":"ok","message":"Backend is healthy!"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Backend is healthy!".to_string(),
        }
    }
}

/// Health check handler.
pub fn health() -> Response {
    Json(HealthStatus::healthy()).into_response()
}
