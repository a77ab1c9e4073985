use axum::{Json, extract::OriginalUri, http::StatusCode};
use serde_json::{Value, json};

pub const NOT_FOUND_MESSAGE: &str = "Rota não encontrada";

/// Fallback handler: `404 {success:false, error, path}`.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> (StatusCode, Json<Value>) {
    tracing::debug!("no route for {}", uri.path());
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": NOT_FOUND_MESSAGE,
            "path": uri.path(),
        })),
    )
}
