//! Authentication Middleware
//!
//! Axum middleware for JWT token validation and user authentication.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::jwt::JwtService;
use crate::error::AppError;

pub const MISSING_TOKEN_MESSAGE: &str = "Não autenticado";
pub const INVALID_TOKEN_MESSAGE: &str = "Token inválido ou expirado";

const TOKEN_COOKIE: &str = "access_token";

/// Authentication middleware that validates JWT tokens and injects user info
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function for validating JWT tokens.
    ///
    /// On success the request carries the decoded `Claims` as an extension.
    pub async fn validate_token(
        State(jwt_service): State<Arc<JwtService>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        tracing::debug!("[AuthMiddleware] Incoming request: {} {}", req.method(), req.uri());

        let Some(token) = extract_token(req.headers()) else {
            tracing::warn!("[AuthMiddleware] Missing Authorization header and access_token cookie");
            return Err(AppError::unauthorized(MISSING_TOKEN_MESSAGE));
        };

        let claims = match jwt_service.decode_claims(&token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("[AuthMiddleware] JWT validation failed: {:#}", e);
                return Err(AppError::unauthorized(INVALID_TOKEN_MESSAGE));
            }
        };
        tracing::debug!("[AuthMiddleware] JWT validated for sub={}", claims.sub);

        req.extensions_mut().insert(claims);

        Ok(next.run(req).await)
    }
}

/// Bearer token from the Authorization header, else the `access_token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .or_else(|| {
            CookieJar::from_headers(headers)
                .get(TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, models::UserType};
    use crate::database::UserRecord;
    use axum::{
        Extension, Router,
        body::Body,
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
    };
    use chrono::Utc;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn whoami(Extension(claims): Extension<Claims>, req: Request) -> String {
        let has_user = req.extensions().get::<crate::auth::AuthUser>().is_some();
        format!("{}|{}", claims.email, has_user)
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_claims_only() {
        let jwt_service = Arc::new(JwtService::new("middleware_secret", 1));
        let token = jwt_service
            .create_token(&UserRecord {
                id: Uuid::new_v4(),
                email: "ana@clinica.com".into(),
                cpf: "52998224725".into(),
                name: "Ana".into(),
                user_type: UserType::Paciente,
                password_hash: String::new(),
                created_at: Utc::now(),
            })
            .unwrap();
        let router: Router = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(jwt_service, AuthMiddleware::validate_token));

        let request = axum::http::Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ana@clinica.com|false");

        let anonymous = axum::http::Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        let response = router.oneshot(anonymous).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; access_token=xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_token(&headers).is_none());
    }
}
