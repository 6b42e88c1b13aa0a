// src/handlers/calendar.rs

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
        rbac::{PermCalendarManage, PermCalendarRead, RequirePermission},
    },
    models::interaction::{CalendarEvent, CalendarQuery, CreateEventPayload, Interaction, UpdateEventPayload},
};

// GET /api/calendar/events
#[utoipa::path(
    get,
    path = "/api/calendar/events",
    tag = "Calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Eventos agendados no intervalo", body = Vec<CalendarEvent>),
        (status = 400, description = "Intervalo inválido (fim antes do início ou maior que 62 dias)")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_events(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermCalendarRead>,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let events = app_state
        .calendar_service
        .list_events(&user, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(events))
}

// POST /api/calendar/events
#[utoipa::path(
    post,
    path = "/api/calendar/events",
    tag = "Calendar",
    request_body = CreateEventPayload,
    responses(
        (status = 201, description = "Evento agendado", body = Interaction),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_event(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermCalendarManage>,
    Json(payload): Json<CreateEventPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let event = app_state
        .calendar_service
        .create_event(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(event)))
}

// PUT /api/calendar/events/{id}
#[utoipa::path(
    put,
    path = "/api/calendar/events/{id}",
    tag = "Calendar",
    request_body = UpdateEventPayload,
    params(("id" = Uuid, Path, description = "ID do evento")),
    responses(
        (status = 200, description = "Evento atualizado", body = Interaction),
        (status = 404, description = "Evento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_event(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermCalendarManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let event = app_state
        .calendar_service
        .update_event(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(event))
}

// PATCH /api/calendar/events/{id}/complete
#[utoipa::path(
    patch,
    path = "/api/calendar/events/{id}/complete",
    tag = "Calendar",
    params(("id" = Uuid, Path, description = "ID do evento")),
    responses(
        (status = 200, description = "Evento concluído", body = Interaction),
        (status = 404, description = "Evento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_event(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermCalendarManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let event = app_state
        .calendar_service
        .complete_event(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(event))
}

// DELETE /api/calendar/events/{id}
#[utoipa::path(
    delete,
    path = "/api/calendar/events/{id}",
    tag = "Calendar",
    params(("id" = Uuid, Path, description = "ID do evento")),
    responses(
        (status = 204, description = "Evento removido"),
        (status = 404, description = "Evento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_event(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermCalendarManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .calendar_service
        .delete_event(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
