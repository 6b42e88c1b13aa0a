// src/models/interaction.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::calendar::CalendarView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "interaction_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Call,
    Email,
    Meeting,
    Note,
}

// Atividade ligada a um lead. Com `scheduled_at` preenchido vira evento de calendário.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub user_id: Uuid,
    pub kind: InteractionKind,

    #[schema(example = "Ligação de follow-up")]
    pub title: String,
    pub description: Option<String>,

    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Evento já com o nome do lead, para o calendário não precisar de outra chamada
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub lead_name: String,
    pub user_id: Uuid,
    pub kind: InteractionKind,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInteractionPayload {
    pub kind: InteractionKind,

    #[validate(length(min = 1, max = 200, message = "required"))]
    pub title: String,

    #[validate(length(max = 4000, message = "too_long"))]
    pub description: Option<String>,

    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventPayload {
    pub lead_id: Uuid,
    pub kind: InteractionKind,

    #[validate(length(min = 1, max = 200, message = "required"))]
    pub title: String,

    #[validate(length(max = 4000, message = "too_long"))]
    pub description: Option<String>,

    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventPayload {
    pub kind: Option<InteractionKind>,

    #[validate(length(min = 1, max = 200, message = "required"))]
    pub title: Option<String>,

    #[validate(length(max = 4000, message = "too_long"))]
    pub description: Option<String>,

    pub scheduled_at: Option<DateTime<Utc>>,
}

/// `view` + `date` ou `start` + `end` (inclusivos)
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CalendarQuery {
    pub view: Option<CalendarView>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}
