// src/db/interaction_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{calendar::DateRange, error::AppError, scope::Scope},
    models::interaction::{
        CalendarEvent, CreateEventPayload, CreateInteractionPayload, Interaction,
        UpdateEventPayload,
    },
};

// Um evento é visível se foi criado pelo usuário ou se o lead está no escopo dele
const EVENT_OWNERS: &[&str] = &["i.user_id", "l.assigned_to", "l.created_by"];

const EVENT_SELECT: &str = r#"
    SELECT
        i.id, i.lead_id, l.name AS lead_name, i.user_id, i.kind, i.title,
        i.description, i.scheduled_at, i.completed_at
    FROM interactions i
    JOIN leads l ON l.id = i.lead_id
    WHERE i.scheduled_at IS NOT NULL
"#;

#[derive(Clone)]
pub struct InteractionRepository {
    pool: PgPool,
}

impl InteractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_interaction(
        &self,
        lead_id: Uuid,
        user_id: Uuid,
        payload: &CreateInteractionPayload,
    ) -> Result<Interaction, AppError> {
        let interaction = sqlx::query_as::<_, Interaction>(
            r#"
            INSERT INTO interactions (
                lead_id, user_id, kind, title, description, scheduled_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(user_id)
        .bind(payload.kind)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.scheduled_at)
        .bind(payload.completed_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(interaction)
    }

    pub async fn create_event(
        &self,
        user_id: Uuid,
        payload: &CreateEventPayload,
    ) -> Result<Interaction, AppError> {
        let event = sqlx::query_as::<_, Interaction>(
            r#"
            INSERT INTO interactions (lead_id, user_id, kind, title, description, scheduled_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(payload.lead_id)
        .bind(user_id)
        .bind(payload.kind)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.scheduled_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn list_for_lead(&self, lead_id: Uuid) -> Result<Vec<Interaction>, AppError> {
        let interactions = sqlx::query_as::<_, Interaction>(
            r#"
            SELECT * FROM interactions
            WHERE lead_id = $1
            ORDER BY COALESCE(scheduled_at, created_at) DESC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(interactions)
    }

    /// Eventos agendados dentro do intervalo, em ordem cronológica
    pub async fn list_events(&self, range: &DateRange, scope: &Scope) -> Result<Vec<CalendarEvent>, AppError> {
        let (from, to) = range.utc_bounds();

        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        qb.push(" AND i.scheduled_at >= ").push_bind(from);
        qb.push(" AND i.scheduled_at < ").push_bind(to);
        scope.push_condition(&mut qb, EVENT_OWNERS);
        qb.push(" ORDER BY i.scheduled_at ASC");

        let events = qb.build_query_as::<CalendarEvent>().fetch_all(&self.pool).await?;
        Ok(events)
    }

    pub async fn find_event_visible(&self, id: Uuid, scope: &Scope) -> Result<Option<CalendarEvent>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        qb.push(" AND i.id = ").push_bind(id);
        scope.push_condition(&mut qb, EVENT_OWNERS);

        let event = qb.build_query_as::<CalendarEvent>().fetch_optional(&self.pool).await?;
        Ok(event)
    }

    pub async fn update_event(&self, id: Uuid, payload: &UpdateEventPayload) -> Result<Interaction, AppError> {
        let event = sqlx::query_as::<_, Interaction>(
            r#"
            UPDATE interactions SET
                kind = COALESCE($2, kind),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                scheduled_at = COALESCE($5, scheduled_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.kind)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.scheduled_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::InteractionNotFound)?;

        Ok(event)
    }

    pub async fn complete_event(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<Interaction, AppError> {
        let event = sqlx::query_as::<_, Interaction>(
            "UPDATE interactions SET completed_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::InteractionNotFound)?;

        Ok(event)
    }

    pub async fn delete_interaction(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM interactions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
