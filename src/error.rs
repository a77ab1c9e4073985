//! Server error type.
//!
//! Handlers return `Result<_, AppError>`; the conversion into a response
//! renders the `{success:false, error, ...}` envelope with a matching
//! status code. Internal failures are masked behind a generic message;
//! [`expose_internal_errors`] puts the error chain back in development.

use axum::{
    Json,
    extract::{
        Request, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::config::Environment;
use crate::database::StoreError;
use crate::response::ApiResponse;

pub const INTERNAL_ERROR_MESSAGE: &str = "Erro interno do servidor";

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What went wrong behind a masked 500, carried as a response extension.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail {
    pub message: String,
    pub stack: String,
}

/// Masked 500 envelope with the detail attached for [`expose_internal_errors`].
pub fn internal_error_response(message: String, stack: String) -> Response {
    let body = json!({ "success": false, "error": INTERNAL_ERROR_MESSAGE });
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    response
        .extensions_mut()
        .insert(InternalErrorDetail { message, stack });
    response
}

/// Middleware: in development, 500s also carry `message` and `stack`.
pub async fn expose_internal_errors(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if !environment.is_development() {
        return response;
    }
    let Some(detail) = response.extensions_mut().remove::<InternalErrorDetail>() else {
        return response;
    };

    let body = json!({
        "success": false,
        "error": INTERNAL_ERROR_MESSAGE,
        "message": detail.message,
        "stack": detail.stack,
    });
    (response.status(), Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Internal(err) => {
                tracing::error!("request failed: {:#}", err);
                return internal_error_response(err.to_string(), format!("{err:?}"));
            }
            Self::Validation { message, details } => {
                json!(ApiResponse::<()>::failure(message, details))
            }
            other => {
                tracing::debug!("request rejected ({}): {}", status, other);
                json!(ApiResponse::<()>::failure(other.to_string(), None))
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation {
            message: "Corpo da requisição inválido".to_string(),
            details: Some(json!({ "reason": rejection.body_text() })),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation {
            message: "Parâmetro de rota inválido".to_string(),
            details: Some(json!({ "reason": rejection.body_text() })),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found(err.to_string()),
            StoreError::DuplicateEmail | StoreError::DuplicateCpf | StoreError::InvalidTransition(_) => {
                Self::conflict(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::{Body, to_bytes},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn client_errors_carry_their_message() {
        let (status, body) = body_of(AppError::conflict("E-mail já cadastrado")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "success": false, "error": "E-mail já cadastrado" }));
    }

    #[tokio::test]
    async fn validation_errors_keep_details() {
        let err = AppError::Validation {
            message: "CPF inválido".into(),
            details: Some(json!({ "field": "cpf" })),
        };
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "cpf");
    }

    #[tokio::test]
    async fn internal_errors_are_masked_by_default() {
        let (status, body) = body_of(AppError::Internal(anyhow::anyhow!("pool exhausted"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);
        assert!(body.get("message").is_none());
        assert!(body.get("stack").is_none());
    }

    async fn failing() -> AppResult<&'static str> {
        Err(anyhow::anyhow!("pool exhausted").context("loading consultas").into())
    }

    async fn rejected() -> AppResult<&'static str> {
        Err(AppError::conflict("CPF já cadastrado"))
    }

    async fn call(environment: Environment, uri: &str) -> (StatusCode, Value) {
        let router: Router = Router::new()
            .route("/failing", get(failing))
            .route("/rejected", get(rejected))
            .layer(middleware::from_fn_with_state(environment, expose_internal_errors));
        let response = router
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn development_500_exposes_message_and_stack() {
        let (status, body) = call(Environment::Development, "/failing").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);
        assert_eq!(body["message"], "loading consultas");
        assert!(body["stack"].as_str().is_some_and(|s| s.contains("pool exhausted")));
    }

    #[tokio::test]
    async fn production_500_hides_internals() {
        for environment in [Environment::Production, Environment::Test] {
            let (status, body) = call(environment, "/failing").await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({ "success": false, "error": INTERNAL_ERROR_MESSAGE }));
        }
    }

    #[tokio::test]
    async fn development_leaves_client_errors_untouched() {
        let (status, body) = call(Environment::Development, "/rejected").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "success": false, "error": "CPF já cadastrado" }));
    }

    #[test]
    fn store_conflicts_map_to_409() {
        assert_eq!(AppError::from(StoreError::DuplicateCpf).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(StoreError::NotFound).status_code(), StatusCode::NOT_FOUND);
    }
}
