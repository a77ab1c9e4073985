//! # Server Module
//!
//! HTTP server setup and route configuration for the clinic server.

use std::any::Any;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::Method,
    middleware,
    response::Response,
    routing::get,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::JwtService;
use crate::config::{Config, Environment};
use crate::database::{ConsultaRepository, MemoryConsultaStore, MemoryUserStore, UserRepository};
use crate::error::{expose_internal_errors, internal_error_response};
use crate::routes::{auth, consultas, fallback::not_found, health::health};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: Arc<JwtService>,
    pub users: Arc<dyn UserRepository>,
    pub consultas: Arc<dyn ConsultaRepository>,
    pub environment: Environment,
}

impl AppState {
    /// State backed by the in-memory stores.
    pub fn in_memory(config: &Config) -> Self {
        Self {
            jwt_service: Arc::new(JwtService::new(
                &config.auth.jwt_secret,
                config.auth.token_ttl_hours,
            )),
            users: Arc::new(MemoryUserStore::new()),
            consultas: Arc::new(MemoryConsultaStore::new()),
            environment: config.environment,
        }
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(AnyOrigin)
}

/// Panics inside handlers become the regular 500 envelope.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!("handler panicked: {}", detail);

    internal_error_response(detail, "panic in request handler".to_string())
}

/// Assemble every route group, the 404 fallback and the middleware stack.
pub fn build_router(state: AppState) -> Router {
    let jwt_service = state.jwt_service.clone();

    Router::new()
        .route("/health", get(health))
        .merge(auth::create_auth_routes(jwt_service.clone()))
        .merge(consultas::create_consultas_routes(jwt_service))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(middleware::from_fn_with_state(state.environment, expose_internal_errors))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(state)
}

/// Starts the clinic HTTP server and serves until Ctrl-C.
pub async fn start(config: Config) -> Result<()> {
    let app = build_router(AppState::in_memory(&config));

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "failed to bind {}:{} - port may already be in use",
                config.server.host, config.server.port
            )
        })?;
    let addr = listener.local_addr().context("listener has no local address")?;

    tracing::info!("Clinic server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/health", addr);
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Frontend URL: {}", config.frontend_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    tracing::info!("Clinic server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {}", e);
        // without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestApp;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_status_and_environment() {
        let app = TestApp::new();
        let (status, body) = app.get("/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "test");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_route_is_a_404_envelope_with_path() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/nada/aqui", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Rota não encontrada");
        assert_eq!(body["path"], "/api/nada/aqui");
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin_without_credentials() {
        let app = TestApp::new();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/auth/login")
            .header("origin", "https://qualquer.exemplo")
            .header("access-control-request-method", "PATCH")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert!(headers["access-control-allow-methods"].to_str().unwrap().contains("PATCH"));
        assert!(headers.get("access-control-allow-credentials").is_none());
    }

    async fn boom() -> &'static str {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn panicking_handler_renders_generic_500() {
        let router: Router = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let response = router
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Erro interno do servidor");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn development_panic_body_carries_the_panic_message() {
        let config = Config::from_lookup(|key| match key {
            "APP_ENV" => Some("development".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::in_memory(&config);
        let router: Router = Router::new()
            .route("/boom", get(boom))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn_with_state(state.environment, expose_internal_errors))
                    .layer(CatchPanicLayer::custom(handle_panic)),
            );

        let response = router
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Erro interno do servidor");
        assert_eq!(body["message"], "kaboom");
        assert_eq!(body["stack"], "panic in request handler");
    }
}
