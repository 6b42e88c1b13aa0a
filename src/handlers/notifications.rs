// src/handlers/notifications.rs

use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::notification::{MarkAllReadResponse, Notification, NotificationQuery, UnreadCountResponse},
};

// GET /api/notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notificações do usuário, mais novas primeiro", body = Vec<Notification>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = app_state
        .notification_service
        .list(user.id, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(notifications))
}

// GET /api/notifications/unread-count
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "Notifications",
    responses(
        (status = 200, description = "Quantidade de não lidas", body = UnreadCountResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn unread_count(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let count = app_state
        .notification_service
        .unread_count(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(UnreadCountResponse { count }))
}

// GET /api/notifications/stream (Server-Sent Events)
#[utoipa::path(
    get,
    path = "/api/notifications/stream",
    tag = "Notifications",
    responses(
        (status = 200, description = "Fluxo SSE; cada evento `notification` traz uma Notification em JSON", body = String, content_type = "text/event-stream")
    ),
    security(("api_jwt" = []))
)]
pub async fn stream_notifications(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = app_state
        .notification_service
        .stream(user.id)
        .filter_map(|notification| async move {
            match Event::default().event("notification").json_data(&notification) {
                Ok(event) => Some(Ok::<_, Infallible>(event)),
                Err(e) => {
                    tracing::warn!("Falha ao serializar notificação {}: {}", notification.id, e);
                    None
                }
            }
        });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// PATCH /api/notifications/{id}/read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Estado atualizado da notificação", body = Notification),
        (status = 404, description = "Notificação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = app_state
        .notification_service
        .mark_read(user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(notification))
}

// POST /api/notifications/read-all
#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    tag = "Notifications",
    responses(
        (status = 200, description = "Quantas notificações foram marcadas", body = MarkAllReadResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_all_read(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state
        .notification_service
        .mark_all_read(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MarkAllReadResponse { updated }))
}
