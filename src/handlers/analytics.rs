// src/handlers/analytics.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermAnalyticsRead, PermAnalyticsTeam, RequirePermission},
    },
    models::analytics::{AnalyticsSummary, PeriodQuery, StageSummary, UserRevenue},
};

// GET /api/analytics/pipeline
#[utoipa::path(
    get,
    path = "/api/analytics/pipeline",
    tag = "Analytics",
    responses(
        (status = 200, description = "Quantidade e valor por etapa (todas as etapas)", body = Vec<StageSummary>)
    ),
    security(("api_jwt" = []))
)]
pub async fn pipeline(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermAnalyticsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let stages = app_state
        .analytics_service
        .pipeline(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stages))
}

// GET /api/analytics/summary
#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    tag = "Analytics",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Resumo de leads e receita no período", body = AnalyticsSummary),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn summary(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermAnalyticsRead>,
    Query(period): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .analytics_service
        .summary(&user, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

// GET /api/analytics/revenue-by-user
#[utoipa::path(
    get,
    path = "/api/analytics/revenue-by-user",
    tag = "Analytics",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Receita e pedidos por usuário", body = Vec<UserRevenue>),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn revenue_by_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermAnalyticsTeam>,
    Query(period): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .analytics_service
        .revenue_by_user(&user, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}
