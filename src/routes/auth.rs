//! Auth routes for sign-up, login, logout and user info

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{
    AuthMiddleware, Claims, JwtService,
    models::{AuthPayload, AuthUser, LoginRequest, MessagePayload, SignUpRequest},
    password::{hash_password, verify_password},
};
use crate::database::UserRecord;
use crate::error::{AppError, AppResult};
use crate::format::{clean_numbers, validate_cpf, validate_email};
use crate::response::ApiResponse;
use crate::routes::extract::ApiJson;
use crate::server::AppState;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Credenciais inválidas";
const MIN_PASSWORD_LEN: usize = 6;

fn invalid_field(field: &str, message: &str) -> AppError {
    AppError::Validation {
        message: message.to_string(),
        details: Some(json!({ "field": field })),
    }
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(invalid_field("name", "Nome é obrigatório"));
    }
    let email = payload.email.trim().to_lowercase();
    if !validate_email(&email) {
        return Err(invalid_field("email", "E-mail inválido"));
    }
    if !validate_cpf(&payload.cpf) {
        return Err(invalid_field("cpf", "CPF inválido"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid_field("password", "A senha deve ter pelo menos 6 caracteres"));
    }

    let record = UserRecord {
        id: Uuid::new_v4(),
        email,
        cpf: clean_numbers(&payload.cpf),
        name: name.to_string(),
        user_type: payload.user_type,
        password_hash: hash_password(&payload.password)?,
        created_at: Utc::now(),
    };
    let record = state.users.insert(record).await?;
    let token = state.jwt_service.create_token(&record)?;

    tracing::info!("registered {} account {}", record.user_type, record.id);

    let payload = AuthPayload {
        user: record.to_auth_user(),
        token,
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(payload))))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthPayload>>> {
    let identifier = payload.identifier.trim();
    if identifier.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Identificador e senha são obrigatórios"));
    }

    // an identifier with '@' is an e-mail, anything else a CPF
    let found = if identifier.contains('@') {
        state.users.find_by_email(&identifier.to_lowercase()).await
    } else {
        state.users.find_by_cpf(&clean_numbers(identifier)).await
    };

    let user = match found {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => {
            tracing::warn!("failed login attempt for a {} account", payload.user_type);
            return Err(AppError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        }
    };
    if user.user_type != payload.user_type {
        tracing::warn!(
            "login for {} rejected: registered as {}, requested {}",
            user.id,
            user.user_type,
            payload.user_type
        );
        return Err(AppError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
    }

    let token = state.jwt_service.create_token(&user)?;
    tracing::info!("user {} logged in as {}", user.id, user.user_type);

    Ok(Json(ApiResponse::ok(AuthPayload {
        user: user.to_auth_user(),
        token,
    })))
}

/// Revokes the presented token; other tokens of the same user stay valid.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<ApiResponse<MessagePayload>> {
    state.jwt_service.revoke(&claims);
    tracing::info!("user {} logged out", claims.sub);

    Json(ApiResponse::ok(MessagePayload {
        message: "Logout realizado com sucesso".to_string(),
    }))
}

/// /api/auth/me: the stored user behind a valid token.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<ApiResponse<AuthUser>>> {
    let user = state
        .users
        .find_by_id(claims.sub)
        .await
        .ok_or_else(|| AppError::unauthorized("Usuário não encontrado"))?;
    Ok(Json(ApiResponse::ok(user.to_auth_user())))
}

pub fn create_auth_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(jwt_service, AuthMiddleware::validate_token));

    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .merge(protected)
}
