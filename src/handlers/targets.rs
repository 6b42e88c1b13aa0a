// src/handlers/targets.rs

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
        rbac::{PermTargetsManage, PermTargetsRead, RequirePermission},
    },
    models::target::{CreateTargetPayload, Target, TargetFilter, TargetProgress},
};

// GET /api/targets
#[utoipa::path(
    get,
    path = "/api/targets",
    tag = "Targets",
    params(TargetFilter),
    responses(
        (status = 200, description = "Metas visíveis", body = Vec<Target>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_targets(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermTargetsRead>,
    Query(filter): Query<TargetFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let targets = app_state
        .target_service
        .list_targets(&user, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(targets))
}

// POST /api/targets
#[utoipa::path(
    post,
    path = "/api/targets",
    tag = "Targets",
    request_body = CreateTargetPayload,
    responses(
        (status = 201, description = "Meta criada", body = Target),
        (status = 400, description = "Dados inválidos ou usuário inativo"),
        (status = 403, description = "Usuário fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_target(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermTargetsManage>,
    Json(payload): Json<CreateTargetPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let target = app_state
        .target_service
        .create_target(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(target)))
}

// DELETE /api/targets/{id}
#[utoipa::path(
    delete,
    path = "/api/targets/{id}",
    tag = "Targets",
    params(("id" = Uuid, Path, description = "ID da meta")),
    responses(
        (status = 204, description = "Meta removida"),
        (status = 404, description = "Meta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_target(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermTargetsManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .target_service
        .delete_target(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/targets/{id}/progress
#[utoipa::path(
    get,
    path = "/api/targets/{id}/progress",
    tag = "Targets",
    params(("id" = Uuid, Path, description = "ID da meta")),
    responses(
        (status = 200, description = "Realizado x meta no período", body = TargetProgress),
        (status = 404, description = "Meta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn target_progress(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermTargetsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = app_state
        .target_service
        .progress(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(progress))
}
