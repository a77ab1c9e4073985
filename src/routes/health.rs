use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::{Value, json};

use crate::server::AppState;

/// Health check endpoint handler.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/health`
///
/// # Response Format
/// ```json
/// {
///   "status": "ok",
///   "timestamp": "2024-05-01T12:00:00+00:00",
///   "environment": "development"
/// }
/// ```
///
/// Used by load balancers and container probes; it touches no store.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.environment.as_str(),
    }))
}
