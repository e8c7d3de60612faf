//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use store::Storefront;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub environment: String,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/health: liveness and environment name.
pub async fn check<S: Storefront>(State(state): State<Arc<AppState<S>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Server is running",
        environment: state.environment.clone(),
        timestamp: Utc::now(),
    })
}
