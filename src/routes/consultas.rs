//! Appointment routes. Every endpoint requires authentication; patients
//! only ever see their own appointments.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, patch},
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AuthMiddleware, Claims, JwtService};
use crate::database::{Consulta, ConsultaStatus, NewConsulta};
use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::routes::extract::{ApiJson, ApiPath};
use crate::server::AppState;

const NOT_FOUND_MESSAGE: &str = "Consulta não encontrada";

fn visible_to(consulta: &Consulta, claims: &Claims) -> bool {
    claims.user_type.sees_all_consultas() || consulta.patient_id == claims.sub
}

pub async fn list_consultas(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<ApiResponse<Vec<Consulta>>> {
    let patient_filter = (!claims.user_type.sees_all_consultas()).then_some(claims.sub);
    Json(ApiResponse::ok(state.consultas.list(patient_filter).await))
}

pub async fn create_consulta(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(payload): ApiJson<NewConsulta>,
) -> AppResult<(StatusCode, Json<ApiResponse<Consulta>>)> {
    let specialty = payload.specialty.trim();
    if specialty.is_empty() {
        return Err(AppError::validation("Especialidade é obrigatória"));
    }
    let now = Utc::now();
    if payload.scheduled_at <= now {
        return Err(AppError::validation("A data da consulta deve estar no futuro"));
    }

    let consulta = Consulta {
        id: Uuid::new_v4(),
        patient_id: claims.sub,
        patient_name: claims.name.clone(),
        doctor_name: payload.doctor_name.filter(|name| !name.trim().is_empty()),
        specialty: specialty.to_string(),
        scheduled_at: payload.scheduled_at,
        status: ConsultaStatus::Agendada,
        notes: payload.notes,
        created_at: now,
    };
    let consulta = state.consultas.insert(consulta).await;
    tracing::info!("consulta {} scheduled for {} by {}", consulta.id, consulta.scheduled_at, claims.sub);

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(consulta))))
}

pub async fn get_consulta(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Consulta>>> {
    state
        .consultas
        .get(id)
        .await
        .filter(|consulta| visible_to(consulta, &claims))
        .map(|consulta| Json(ApiResponse::ok(consulta)))
        .ok_or_else(|| AppError::not_found(NOT_FOUND_MESSAGE))
}

pub async fn cancel_consulta(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Consulta>>> {
    match state.consultas.get(id).await {
        Some(consulta) if visible_to(&consulta, &claims) => {}
        _ => return Err(AppError::not_found(NOT_FOUND_MESSAGE)),
    }

    let consulta = state.consultas.update_status(id, ConsultaStatus::Cancelada).await?;
    tracing::info!("consulta {} cancelled by {}", id, claims.sub);
    Ok(Json(ApiResponse::ok(consulta)))
}

pub fn create_consultas_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    Router::new()
        .route("/api/consultas", get(list_consultas).post(create_consulta))
        .route("/api/consultas/{id}", get(get_consulta))
        .route("/api/consultas/{id}/cancelar", patch(cancel_consulta))
        .route_layer(middleware::from_fn_with_state(jwt_service, AuthMiddleware::validate_token))
}
