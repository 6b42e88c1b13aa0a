// src/services/calendar_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{
        calendar::{CalendarView, DateRange},
        error::AppError,
        scope::Scope,
    },
    db::{InteractionRepository, LeadRepository},
    models::{
        auth::User,
        interaction::{
            CalendarEvent, CalendarQuery, CreateEventPayload, CreateInteractionPayload,
            Interaction, UpdateEventPayload,
        },
    },
};

/// Resolve o intervalo pedido: `start`+`end` explícitos ou `view`+`date`
/// (padrão: mês corrente).
pub fn resolve_range(query: &CalendarQuery) -> Result<DateRange, AppError> {
    match (query.start, query.end) {
        (Some(start), Some(end)) => DateRange::explicit(start, end),
        (None, None) => {
            let view = query.view.unwrap_or(CalendarView::Month);
            let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
            Ok(DateRange::for_view(view, date))
        }
        _ => Err(AppError::BadRequest("start/end".into())),
    }
}

#[derive(Clone)]
pub struct CalendarService {
    repo: InteractionRepository,
    lead_repo: LeadRepository,
}

impl CalendarService {
    pub fn new(repo: InteractionRepository, lead_repo: LeadRepository) -> Self {
        Self { repo, lead_repo }
    }

    pub async fn list_events(&self, user: &User, query: &CalendarQuery) -> Result<Vec<CalendarEvent>, AppError> {
        let range = resolve_range(query)?;
        self.repo.list_events(&range, &Scope::of(user)).await
    }

    pub async fn create_event(&self, user: &User, payload: &CreateEventPayload) -> Result<Interaction, AppError> {
        self.ensure_lead_visible(user, payload.lead_id).await?;
        self.repo.create_event(user.id, payload).await
    }

    pub async fn update_event(&self, user: &User, id: Uuid, payload: &UpdateEventPayload) -> Result<Interaction, AppError> {
        self.ensure_event_visible(user, id).await?;
        self.repo.update_event(id, payload).await
    }

    pub async fn complete_event(&self, user: &User, id: Uuid) -> Result<Interaction, AppError> {
        self.ensure_event_visible(user, id).await?;
        self.repo.complete_event(id, Utc::now()).await
    }

    pub async fn delete_event(&self, user: &User, id: Uuid) -> Result<(), AppError> {
        self.ensure_event_visible(user, id).await?;
        self.repo.delete_interaction(id).await?;
        Ok(())
    }

    // --- Histórico de interações de um lead ---

    pub async fn list_interactions(&self, user: &User, lead_id: Uuid) -> Result<Vec<Interaction>, AppError> {
        self.ensure_lead_visible(user, lead_id).await?;
        self.repo.list_for_lead(lead_id).await
    }

    pub async fn add_interaction(
        &self,
        user: &User,
        lead_id: Uuid,
        payload: &CreateInteractionPayload,
    ) -> Result<Interaction, AppError> {
        self.ensure_lead_visible(user, lead_id).await?;
        self.repo.create_interaction(lead_id, user.id, payload).await
    }

    async fn ensure_lead_visible(&self, user: &User, lead_id: Uuid) -> Result<(), AppError> {
        self.lead_repo
            .find_visible(lead_id, &Scope::of(user))
            .await?
            .ok_or(AppError::LeadNotFound)?;
        Ok(())
    }

    async fn ensure_event_visible(&self, user: &User, id: Uuid) -> Result<(), AppError> {
        self.repo
            .find_event_visible(id, &Scope::of(user))
            .await?
            .ok_or(AppError::InteractionNotFound)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn explicit_bounds_win_over_view() {
        let query = CalendarQuery {
            view: Some(CalendarView::Day),
            date: Some(d(2024, 1, 1)),
            start: Some(d(2024, 2, 1)),
            end: Some(d(2024, 2, 10)),
        };
        let range = resolve_range(&query).unwrap();
        assert_eq!(range.start, d(2024, 2, 1));
        assert_eq!(range.end, d(2024, 2, 10));
    }

    #[test]
    fn half_open_explicit_bounds_are_rejected() {
        let query = CalendarQuery {
            start: Some(d(2024, 2, 1)),
            ..Default::default()
        };
        assert!(matches!(resolve_range(&query), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn default_is_the_current_month_grid() {
        let range = resolve_range(&CalendarQuery::default()).unwrap();
        let today = Utc::now().date_naive();
        assert!(range.start <= today && today <= range.end);
        assert_eq!(range.days() % 7, 0);
    }

    #[test]
    fn week_view_uses_given_date() {
        let query = CalendarQuery {
            view: Some(CalendarView::Week),
            date: Some(d(2024, 3, 14)),
            ..Default::default()
        };
        let range = resolve_range(&query).unwrap();
        assert_eq!(range.start, d(2024, 3, 11));
        assert_eq!(range.days(), 7);
    }
}
