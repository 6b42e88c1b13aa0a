// src/handlers/imports.rs

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermLeadsImport, PermRevenueImport, RequirePermission},
    },
    models::import::{CsvUpload, ImportReport},
    services::import_service::MAX_UPLOAD_BYTES,
};

// Lê o campo `file` do formulário multipart
async fn read_csv_file(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if data.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest("file larger than 5 MiB".into()));
            }
            return Ok(data);
        }
    }
    Err(AppError::BadRequest("file".into()))
}

// POST /api/leads/import
#[utoipa::path(
    post,
    path = "/api/leads/import",
    tag = "Import",
    request_body(content = CsvUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resultado linha a linha", body = ImportReport),
        (status = 400, description = "Arquivo ausente ou cabeçalho inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermLeadsImport>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let data = read_csv_file(&mut multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .import_service
        .import_leads(&user, &data, &locale.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

// POST /api/revenue/import
#[utoipa::path(
    post,
    path = "/api/revenue/import",
    tag = "Import",
    request_body(content = CsvUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resultado linha a linha", body = ImportReport),
        (status = 400, description = "Arquivo ausente ou cabeçalho inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_revenue(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermRevenueImport>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let data = read_csv_file(&mut multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .import_service
        .import_revenue(&user, &data, &locale.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
