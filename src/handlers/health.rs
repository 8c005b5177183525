use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;

use crate::middleware::response::ApiResponse;

/// GET /health - public liveness check, outside the pipeline
pub async fn health() -> impl IntoResponse {
    ApiResponse::success(json!({
        "status": "ok",
        "timestamp": Utc::now(),
    }))
}
