// src/handlers/leads.rs

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
        rbac::{
            PermCustomersCreate, PermLeadsAssign, PermLeadsCreate, PermLeadsDelete, PermLeadsRead,
            PermLeadsUpdate, RequirePermission,
        },
    },
    models::{
        customer::Customer,
        interaction::{CreateInteractionPayload, Interaction},
        lead::{AssignLeadPayload, ChangeStagePayload, CreateLeadPayload, Lead, LeadFilter, UpdateLeadPayload},
    },
};

// =============================================================================
//  LEADS
// =============================================================================

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(LeadFilter),
    responses(
        (status = 200, description = "Leads visíveis, mais novos primeiro", body = Vec<Lead>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsRead>,
    Query(filter): Query<LeadFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let leads = app_state
        .lead_service
        .list_leads(&user, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(leads))
}

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão ou responsável fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsCreate>,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .create_lead(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/leads/{id}
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .get_lead(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// PUT /api/leads/{id}
#[utoipa::path(
    put,
    path = "/api/leads/{id}",
    tag = "Leads",
    request_body = UpdateLeadPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .update_lead(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// DELETE /api/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 204, description = "Lead removido"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lead_service
        .delete_lead(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/leads/{id}/stage
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/stage",
    tag = "Leads",
    request_body = ChangeStagePayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Etapa alterada", body = Lead),
        (status = 404, description = "Lead não encontrado"),
        (status = 409, description = "Transição não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .change_stage(&user, id, payload.stage)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// PATCH /api/leads/{id}/assign
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/assign",
    tag = "Leads",
    request_body = AssignLeadPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Responsável alterado", body = Lead),
        (status = 400, description = "Responsável inexistente ou inativo"),
        (status = 403, description = "Responsável fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsAssign>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .assign_lead(&user, id, payload.assigned_to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// POST /api/leads/{id}/convert
#[utoipa::path(
    post,
    path = "/api/leads/{id}/convert",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 201, description = "Cliente criado a partir do lead", body = Customer),
        (status = 404, description = "Lead não encontrado"),
        (status = 409, description = "Lead já convertido")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermCustomersCreate>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .lead_service
        .convert_lead(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// =============================================================================
//  HISTÓRICO DE INTERAÇÕES
// =============================================================================

// GET /api/leads/{id}/interactions
#[utoipa::path(
    get,
    path = "/api/leads/{id}/interactions",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Interações do lead", body = Vec<Interaction>),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_interactions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let interactions = app_state
        .calendar_service
        .list_interactions(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(interactions))
}

// POST /api/leads/{id}/interactions
#[utoipa::path(
    post,
    path = "/api/leads/{id}/interactions",
    tag = "Leads",
    request_body = CreateInteractionPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 201, description = "Interação registrada", body = Interaction),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_interaction(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateInteractionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let interaction = app_state
        .calendar_service
        .add_interaction(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(interaction)))
}
