// src/handlers/revenue.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermRevenueCreate, PermRevenueRead, RequirePermission},
    },
    models::revenue::{CreateRevenuePayload, DailyRevenue, RevenueFilter},
};

// GET /api/revenue
#[utoipa::path(
    get,
    path = "/api/revenue",
    tag = "Revenue",
    params(RevenueFilter),
    responses(
        (status = 200, description = "Lançamentos visíveis", body = Vec<DailyRevenue>),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_entries(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermRevenueRead>,
    Query(filter): Query<RevenueFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .revenue_service
        .list_entries(&user, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}

// POST /api/revenue
#[utoipa::path(
    post,
    path = "/api/revenue",
    tag = "Revenue",
    request_body = CreateRevenuePayload,
    responses(
        (status = 201, description = "Lançamento criado", body = DailyRevenue),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Lançamento para usuário fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermRevenueCreate>,
    Json(payload): Json<CreateRevenuePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let entry = app_state
        .revenue_service
        .create_entry(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// DELETE /api/revenue/{id}
#[utoipa::path(
    delete,
    path = "/api/revenue/{id}",
    tag = "Revenue",
    params(("id" = Uuid, Path, description = "ID do lançamento")),
    responses(
        (status = 204, description = "Lançamento removido"),
        (status = 404, description = "Lançamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermRevenueCreate>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .revenue_service
        .delete_entry(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
