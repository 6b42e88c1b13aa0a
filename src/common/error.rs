// src/common/error.rs

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::{lead::LeadStage, rbac::Permission},
};

// Erro de domínio. Os serviços e repositórios só conhecem este tipo;
// a conversão para HTTP (com tradução) acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário inativo")]
    UserInactive,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Interação não encontrada")]
    InteractionNotFound,

    #[error("Meta não encontrada")]
    TargetNotFound,

    #[error("Receita não encontrada")]
    RevenueNotFound,

    #[error("Notificação não encontrada")]
    NotificationNotFound,

    #[error("Permissão ausente: {}", .0.slug())]
    MissingPermission(Permission),

    #[error("Registro fora do escopo do usuário")]
    OutOfScope,

    #[error("Responsável inválido")]
    InvalidAssignee,

    #[error("Transição de etapa inválida: {from} -> {to}")]
    InvalidStageTransition { from: LeadStage, to: LeadStage },

    #[error("Lead já convertido")]
    LeadAlreadyConverted,

    #[error("Lead não está ganho")]
    LeadNotWon,

    #[error("Cliente possui receitas")]
    CustomerHasRevenue,

    #[error("Alteração da própria conta não permitida")]
    SelfModification,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Intervalo de datas inválido")]
    InvalidDateRange,

    #[error("CSV inválido: {0}")]
    InvalidCsv(String),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidDateRange
            | AppError::InvalidCsv(_)
            | AppError::BadRequest(_)
            | AppError::InvalidAssignee => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken | AppError::UserInactive => {
                StatusCode::UNAUTHORIZED
            }

            AppError::MissingPermission(_) | AppError::OutOfScope | AppError::SelfModification => {
                StatusCode::FORBIDDEN
            }

            AppError::UserNotFound
            | AppError::LeadNotFound
            | AppError::CustomerNotFound
            | AppError::InteractionNotFound
            | AppError::TargetNotFound
            | AppError::RevenueNotFound
            | AppError::NotificationNotFound => StatusCode::NOT_FOUND,

            AppError::EmailAlreadyExists
            | AppError::InvalidStageTransition { .. }
            | AppError::LeadAlreadyConverted
            | AppError::LeadNotWon
            | AppError::CustomerHasRevenue
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        let error = match &self {
            AppError::ValidationError(errors) => {
                let details = validation_messages(errors, lang, store);
                return ApiError {
                    status,
                    error: store.translate(lang, "errors.validation"),
                    details: Some(json!(details)),
                };
            }
            AppError::EmailAlreadyExists => store.translate(lang, "errors.email_already_exists"),
            AppError::InvalidCredentials => store.translate(lang, "errors.invalid_credentials"),
            AppError::InvalidToken => store.translate(lang, "errors.invalid_token"),
            AppError::UserInactive => store.translate(lang, "errors.user_inactive"),
            AppError::UserNotFound => store.translate(lang, "errors.user_not_found"),
            AppError::LeadNotFound => store.translate(lang, "errors.lead_not_found"),
            AppError::CustomerNotFound => store.translate(lang, "errors.customer_not_found"),
            AppError::InteractionNotFound => store.translate(lang, "errors.interaction_not_found"),
            AppError::TargetNotFound => store.translate(lang, "errors.target_not_found"),
            AppError::RevenueNotFound => store.translate(lang, "errors.revenue_not_found"),
            AppError::NotificationNotFound => {
                store.translate(lang, "errors.notification_not_found")
            }
            AppError::MissingPermission(permission) => store.translate_with(
                lang,
                "errors.forbidden",
                &[("permission", permission.slug())],
            ),
            AppError::OutOfScope => store.translate(lang, "errors.forbidden_scope"),
            AppError::InvalidAssignee => store.translate(lang, "errors.invalid_assignee"),
            AppError::InvalidStageTransition { from, to } => store.translate_with(
                lang,
                "errors.invalid_stage_transition",
                &[("from", from.as_str()), ("to", to.as_str())],
            ),
            AppError::LeadAlreadyConverted => store.translate(lang, "errors.lead_already_converted"),
            AppError::LeadNotWon => store.translate(lang, "errors.lead_not_won"),
            AppError::CustomerHasRevenue => store.translate(lang, "errors.customer_has_revenue"),
            AppError::SelfModification => store.translate(lang, "errors.self_modification"),
            AppError::UniqueConstraintViolation(_) => {
                store.translate(lang, "errors.unique_violation")
            }
            AppError::InvalidDateRange => store.translate(lang, "errors.invalid_date_range"),
            AppError::InvalidCsv(reason) => {
                store.translate_with(lang, "errors.invalid_csv", &[("reason", reason.as_str())])
            }
            AppError::BadRequest(reason) => {
                store.translate_with(lang, "errors.bad_request", &[("reason", reason.as_str())])
            }

            // Todos os outros erros viram 500. O detalhe fica só no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                store.translate(lang, "errors.internal")
            }
        };

        ApiError {
            status,
            error,
            details: None,
        }
    }
}

/// Mensagens de validação por campo, já traduzidas.
/// As mensagens do `validator` são chaves curtas ("required", "invalid_email").
pub fn validation_messages(
    errors: &ValidationErrors,
    lang: &str,
    store: &I18nStore,
) -> BTreeMap<String, Vec<String>> {
    let mut details = BTreeMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages = field_errors
            .iter()
            .map(|e| {
                let key = e.message.as_deref().unwrap_or(e.code.as_ref());
                store.translate(lang, &format!("validation.{}", key))
            })
            .collect();
        // Erros de nível de struct (`#[validate(schema)]`) chegam como "__all__"
        let name = if field == "__all__" { "_" } else { field.as_ref() };
        details.insert(name.to_string(), messages);
    }
    details
}

// Resposta de erro enviada ao cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "invalid_email"))]
        email: String,
    }

    fn locale(lang: &str) -> Locale {
        Locale(lang.to_string())
    }

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::UserInactive.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::MissingPermission(Permission::LeadsDelete).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::LeadNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::LeadAlreadyConverted.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::InvalidCsv("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_error_carries_translated_details() {
        let store = I18nStore::load().unwrap();
        let errors = Sample { email: "nope".into() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&locale("pt"), &store);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert_eq!(details["email"][0], "O e-mail fornecido é inválido.");
    }

    #[test]
    fn internal_errors_hide_details() {
        let store = I18nStore::load().unwrap();
        let api = AppError::InternalServerError(anyhow::anyhow!("segredo do banco"))
            .to_api_error(&locale("en"), &store);
        assert_eq!(api.error, "An unexpected error occurred.");
        assert!(api.details.is_none());
    }

    #[test]
    fn stage_transition_message_names_both_stages() {
        let store = I18nStore::load().unwrap();
        let api = AppError::InvalidStageTransition {
            from: LeadStage::ClosedWon,
            to: LeadStage::Proposal,
        }
        .to_api_error(&locale("en"), &store);
        assert!(api.error.contains("closed_won"));
        assert!(api.error.contains("proposal"));
    }
}
